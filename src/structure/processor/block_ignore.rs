//! Drop-list processor. Removes marker and scaffolding blocks from the output.

use std::collections::HashSet;

use serde::Deserialize;
use serde_json::Value;

use super::{ProcessorContext, StructureProcessor};
use crate::error::ProcessorError;
use crate::structure::palette::BlockRecord;
use crate::voxels::block::BlockState;

/// Drops every record whose block is on the list.
///
/// A bare name (`"structure_void"`) matches any state of that block; an
/// entry with properties (`"chest[facing=north]"`) matches only that exact
/// state.
#[derive(Clone, Debug, Default)]
pub struct BlockIgnoreProcessor {
    names: HashSet<String>,
    states: HashSet<BlockState>,
}

#[derive(Deserialize)]
struct BlockIgnoreConfig {
    blocks: Vec<String>,
}

impl BlockIgnoreProcessor {
    /// Registered type name.
    pub const TYPE_NAME: &'static str = "block_ignore";

    /// Creates a processor dropping the given block names.
    pub fn new<S: Into<String>>(blocks: impl IntoIterator<Item = S>) -> Self {
        BlockIgnoreProcessor {
            names: blocks.into_iter().map(Into::into).collect(),
            states: HashSet::new(),
        }
    }

    /// Also drops this exact state.
    pub fn with_state(mut self, state: BlockState) -> Self {
        self.states.insert(state);
        self
    }

    /// Builds the processor from `{ "blocks": [...] }`.
    pub fn from_config(config: &Value) -> Result<Self, serde_json::Error> {
        let config = BlockIgnoreConfig::deserialize(config)?;
        let mut processor = BlockIgnoreProcessor::default();
        for entry in config.blocks {
            match entry.parse::<BlockState>() {
                Ok(state) if !state.properties().is_empty() => {
                    processor.states.insert(state);
                }
                _ => {
                    processor.names.insert(entry);
                }
            }
        }
        Ok(processor)
    }

    /// Returns `true` if `state` is on the list.
    pub fn ignores(&self, state: &BlockState) -> bool {
        self.names.contains(state.name()) || self.states.contains(state)
    }
}

impl StructureProcessor for BlockIgnoreProcessor {
    fn name(&self) -> &str {
        Self::TYPE_NAME
    }

    fn process_block(
        &self,
        _ctx: &ProcessorContext<'_>,
        _original: &BlockRecord,
        current: BlockRecord,
    ) -> Result<Option<BlockRecord>, ProcessorError> {
        if self.ignores(&current.state) {
            Ok(None)
        } else {
            Ok(Some(current))
        }
    }
}
