//! Gravity processor. Drapes a template over the destination terrain.

use cgmath::Point3;
use serde::Deserialize;
use serde_json::Value;

use super::{ProcessorContext, StructureProcessor};
use crate::error::ProcessorError;
use crate::structure::palette::BlockRecord;

/// Recomputes each record's height as the terrain surface under it, plus a
/// fixed offset, plus the record's own height inside the template.
///
/// Reads the grid as it is before the placement commits anything.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GravityProcessor {
    /// Added to the surface height
    pub offset: i32,
}

impl GravityProcessor {
    /// Registered type name.
    pub const TYPE_NAME: &'static str = "gravity";

    /// Creates a processor with the given vertical offset.
    pub fn new(offset: i32) -> Self {
        GravityProcessor { offset }
    }

    /// Builds the processor from `{ "offset": n }`.
    pub fn from_config(config: &Value) -> Result<Self, serde_json::Error> {
        GravityProcessor::deserialize(config)
    }
}

impl StructureProcessor for GravityProcessor {
    fn name(&self) -> &str {
        Self::TYPE_NAME
    }

    fn process_block(
        &self,
        ctx: &ProcessorContext<'_>,
        original: &BlockRecord,
        current: BlockRecord,
    ) -> Result<Option<BlockRecord>, ProcessorError> {
        let surface = ctx.grid.surface_height(current.pos.x, current.pos.z);
        let pos = Point3::new(current.pos.x, surface + self.offset + original.pos.y, current.pos.z);
        Ok(Some(current.at(pos)))
    }
}
