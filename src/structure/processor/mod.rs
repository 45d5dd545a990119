//! # Processor Module
//!
//! Processors rewrite or drop block records between coordinate mapping and
//! commit. A chain runs in two phases:
//!
//! 1. **Per record**: every record is fed through each processor in order.
//!    A processor returning `None` drops the record and later processors
//!    never see it.
//! 2. **Finalize**: each processor then sees the whole list of survivors
//!    (aligned with the originals they came from) once, in chain order, and
//!    may return a replacement list.
//!
//! A replacement list must keep the length and order of its input. Order is
//! checked through the horizontal column of each record: a finalize step may
//! move a record up or down, but the record at index `i` must stay in the
//! x/z column it had. The chain discards any finalize result that breaks
//! either rule, logs it, and carries on with the list it had.
//!
//! ## Built-in processors
//!
//! * [`block_ignore::BlockIgnoreProcessor`] - drops listed blocks
//! * [`weathering::WeatheringProcessor`] - probabilistic aging substitution
//! * [`gravity::GravityProcessor`] - re-anchors records to the terrain
//! * [`capped::CappedProcessor`] - limits how many records a delegate touches
//!
//! New policies implement [`StructureProcessor`] and are registered in a
//! [`registry::ProcessorRegistry`]; the engine never needs to know them.

use std::sync::Arc;

use cgmath::Point3;
use log::{trace, warn};

use crate::error::ProcessorError;
use crate::structure::{palette::BlockRecord, settings::PlacementSettings};
use crate::voxels::grid::GridView;

pub mod block_ignore;
pub mod capped;
pub mod gravity;
pub mod registry;
pub mod weathering;

/// What a processor can see while it runs.
#[derive(Clone, Copy)]
pub struct ProcessorContext<'a> {
    /// The destination grid, read-only
    pub grid: &'a dyn GridView,
    /// Grid position the template origin maps to
    pub origin: Point3<i32>,
    /// Rotation pivot, template-relative
    pub pivot: Point3<i32>,
    /// Settings of the running placement
    pub settings: &'a PlacementSettings,
}

/// A pluggable rule applied to block records during placement.
///
/// `original` is always the record exactly as stored in the template
/// (template-relative position, untransformed state). `current` is the
/// candidate produced by the mapping step and the processors before this one:
/// grid-space position, transformed state.
pub trait StructureProcessor: Send + Sync {
    /// Name used in logs and errors.
    fn name(&self) -> &str;

    /// Rewrites one record, or drops it by returning `Ok(None)`.
    fn process_block(
        &self,
        ctx: &ProcessorContext<'_>,
        original: &BlockRecord,
        current: BlockRecord,
    ) -> Result<Option<BlockRecord>, ProcessorError>;

    /// Runs once over all survivors after the per-record phase.
    ///
    /// `originals[i]` is the template record `processed[i]` came from.
    /// Returning `Ok(None)` leaves the list as it is; a returned list must
    /// have the same length, in the same order. The chain detects length
    /// changes and records that left their x/z column; a permutation that
    /// keeps every column (records stacked in one column trading places)
    /// cannot be told apart and is the implementor's responsibility.
    fn finalize(
        &self,
        _ctx: &ProcessorContext<'_>,
        _originals: &[BlockRecord],
        _processed: &[BlockRecord],
    ) -> Result<Option<Vec<BlockRecord>>, ProcessorError> {
        Ok(None)
    }
}

/// An ordered list of processors run as one unit.
pub struct ProcessorChain<'a> {
    processors: &'a [Arc<dyn StructureProcessor>],
}

impl<'a> ProcessorChain<'a> {
    /// Wraps a processor list.
    pub fn new(processors: &'a [Arc<dyn StructureProcessor>]) -> Self {
        ProcessorChain { processors }
    }

    /// Feeds one record through every processor, stopping at the first drop.
    pub fn process_block(
        &self,
        ctx: &ProcessorContext<'_>,
        original: &BlockRecord,
        mapped: BlockRecord,
    ) -> Result<Option<BlockRecord>, ProcessorError> {
        let mut current = mapped;
        for processor in self.processors {
            match processor.process_block(ctx, original, current)? {
                Some(next) => current = next,
                None => {
                    trace!("{} dropped record at {:?}", processor.name(), original.pos);
                    return Ok(None);
                }
            }
        }
        Ok(Some(current))
    }

    /// Runs both phases over `pairs` of (template record, mapped record).
    ///
    /// Returns the surviving originals and the processed records, index
    /// aligned with each other.
    pub fn run(
        &self,
        ctx: &ProcessorContext<'_>,
        pairs: impl IntoIterator<Item = (BlockRecord, BlockRecord)>,
    ) -> Result<(Vec<BlockRecord>, Vec<BlockRecord>), ProcessorError> {
        let mut originals = Vec::new();
        let mut processed = Vec::new();
        for (original, mapped) in pairs {
            if let Some(record) = self.process_block(ctx, &original, mapped)? {
                originals.push(original);
                processed.push(record);
            }
        }

        for processor in self.processors {
            let Some(replacement) = processor.finalize(ctx, &originals, &processed)? else {
                continue;
            };
            if replacement.len() != processed.len() {
                warn!(
                    "discarding finalize result of {}: {} records in, {} out",
                    processor.name(),
                    processed.len(),
                    replacement.len()
                );
            } else if let Some(index) = first_moved_column(&processed, &replacement) {
                warn!(
                    "discarding finalize result of {}: record {} moved from column {:?} to {:?}",
                    processor.name(),
                    index,
                    (processed[index].pos.x, processed[index].pos.z),
                    (replacement[index].pos.x, replacement[index].pos.z)
                );
            } else {
                processed = replacement;
            }
        }
        Ok((originals, processed))
    }
}

/// Index of the first record whose x/z column differs between the lists.
fn first_moved_column(before: &[BlockRecord], after: &[BlockRecord]) -> Option<usize> {
    before
        .iter()
        .zip(after)
        .position(|(a, b)| a.pos.x != b.pos.x || a.pos.z != b.pos.z)
}
