//! # Placement Module
//!
//! Instantiates a [`Template`] into a [`Grid`]. A placement runs through a
//! fixed sequence of phases and never goes back:
//!
//! 1. **Select palette** - pick one variant; abort if there is nothing to
//!    place or the template has a degenerate size.
//! 2. **Map coordinates** - move every record into grid space and orient
//!    its state.
//! 3. **Process** - run the processor chain, per record then finalize.
//! 4. **Commit** - write surviving records, attach payloads, keep liquid.
//! 5. **Fluids** - let containers adopt neighboring sources (liquid mode
//!    [`LiquidMode::Apply`] only).
//! 6. **Shapes** - reconcile connection-dependent states (skipped for
//!    `known_shape`).
//! 7. **Entities** - spawn recorded entities (skipped for `ignore_entities`).
//!
//! The engine holds no state between calls. The processor chain runs to
//! completion before the first write, so a processor failure aborts the
//! placement with the grid untouched.

use std::fmt;

use cgmath::Point3;
use log::{debug, warn};
use serde_json::json;
use web_time::Instant;

use super::{
    palette::BlockRecord,
    processor::{ProcessorChain, ProcessorContext},
    settings::{LiquidMode, PlacementSettings},
    template::{map_record, Template},
};
use crate::error::ProcessorError;
use crate::voxels::{
    block::{fluid::FluidState, BlockState},
    bounding_box::BoundingBox,
    grid::{Grid, UpdateFlags},
};

pub mod entities;
pub mod fluid;
pub mod shape;

/// Block written first at cells that will receive a payload, so the grid
/// does not react to a half-initialized block.
pub const PLACEHOLDER_BLOCK: &str = "barrier";
/// Payload key naming a loot table; its presence marks a randomizable container.
pub const LOOT_TABLE_KEY: &str = "LootTable";
/// Payload key receiving a freshly drawn loot seed.
pub const LOOT_SEED_KEY: &str = "LootTableSeed";

/// Flags used for placeholder writes.
const PLACEHOLDER_FLAGS: UpdateFlags = UpdateFlags(UpdateFlags::INVISIBLE.0 | UpdateFlags::NO_SHAPE_UPDATE.0);

/// The phases of one placement, in order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum PlacementPhase {
    /// Choosing a palette variant
    SelectPalette,
    /// Moving records into grid space
    MapCoordinates,
    /// Running processors on each record
    PerRecordProcessing,
    /// Running processor finalize steps
    FinalizeProcessing,
    /// Writing records to the grid
    Commit,
    /// Resolving pending liquid
    FluidPropagation,
    /// Fixing up connection-dependent states
    ShapeReconciliation,
    /// Spawning entities
    EntityMaterialization,
    /// Finished
    Done,
}

impl fmt::Display for PlacementPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlacementPhase::SelectPalette => "select palette",
            PlacementPhase::MapCoordinates => "map coordinates",
            PlacementPhase::PerRecordProcessing => "per-record processing",
            PlacementPhase::FinalizeProcessing => "finalize processing",
            PlacementPhase::Commit => "commit",
            PlacementPhase::FluidPropagation => "fluid propagation",
            PlacementPhase::ShapeReconciliation => "shape reconciliation",
            PlacementPhase::EntityMaterialization => "entity materialization",
            PlacementPhase::Done => "done",
        };
        f.write_str(name)
    }
}

/// What the commit phase produced.
#[derive(Debug, Default)]
struct CommitOutcome {
    /// Committed cells, in commit order
    committed: Vec<Point3<i32>>,
    /// Box covering `committed`
    bounds: Option<BoundingBox>,
    /// Containers that still need a fluid source
    pending_fluids: Vec<Point3<i32>>,
}

/// Places `template` into `grid` with its origin at `origin`.
///
/// # Arguments
///
/// * `template` - The template to instantiate; not modified
/// * `grid` - The destination grid
/// * `origin` - Grid position the template origin maps to
/// * `settings` - Transform, clipping, processors and flags for this call
///
/// # Returns
///
/// * `Ok(true)` if the placement ran
/// * `Ok(false)` if there was nothing to place or the template size is
///   degenerate; the grid is untouched
/// * `Err` if a processor failed; nothing was written
pub fn place<G: Grid>(
    template: &Template,
    grid: &mut G,
    origin: Point3<i32>,
    settings: &PlacementSettings,
) -> Result<bool, ProcessorError> {
    let start = Instant::now();

    let Some(palette) = template.select_palette(settings, origin) else {
        debug!("template at {:?} has no palette, nothing placed", origin);
        return Ok(false);
    };
    let size = template.size();
    if size.x < 1 || size.y < 1 || size.z < 1 {
        warn!("template size {:?} is degenerate, nothing placed", size);
        return Ok(false);
    }
    if palette.is_empty() && (settings.ignore_entities || template.entities().is_empty()) {
        debug!("template at {:?} has no blocks and no entities to place", origin);
        return Ok(false);
    }
    debug!(
        "{}: {} records at {:?} ({:?}, {:?})",
        PlacementPhase::SelectPalette,
        palette.len(),
        origin,
        settings.mirror,
        settings.rotation
    );

    let records = {
        let ctx = ProcessorContext {
            grid: &*grid,
            origin,
            pivot: settings.pivot,
            settings,
        };
        let pairs = palette
            .records()
            .iter()
            .map(|record| (record.clone(), map_record(record, settings, origin)));
        let phase_start = Instant::now();
        let (_, processed) = ProcessorChain::new(&settings.processors).run(&ctx, pairs)?;
        debug!(
            "{} and {}: {} of {} records survived in {:?}",
            PlacementPhase::PerRecordProcessing,
            PlacementPhase::FinalizeProcessing,
            processed.len(),
            palette.len(),
            phase_start.elapsed()
        );
        processed
    };

    let outcome = commit(grid, records, settings);
    debug!(
        "{}: {} blocks written, {} containers waiting for fluid",
        PlacementPhase::Commit,
        outcome.committed.len(),
        outcome.pending_fluids.len()
    );

    if settings.liquid_mode == LiquidMode::Apply && !outcome.pending_fluids.is_empty() {
        let mut pending = outcome.pending_fluids;
        let adopted = fluid::propagate_fluids(grid, &mut pending);
        debug!(
            "{}: {} adopted, {} unresolved",
            PlacementPhase::FluidPropagation,
            adopted,
            pending.len()
        );
    }

    if !settings.known_shape {
        if let Some(bounds) = outcome.bounds {
            let changed = shape::reconcile_shapes(grid, bounds, &outcome.committed, settings.update_flags);
            debug!("{}: {} states changed", PlacementPhase::ShapeReconciliation, changed);
        }
    }

    if !settings.ignore_entities {
        let spawned = entities::materialize_entities(grid, template.entities(), origin, settings);
        debug!(
            "{}: {} of {} spawned",
            PlacementPhase::EntityMaterialization,
            spawned,
            template.entities().len()
        );
    }

    debug!("{} in {:?}", PlacementPhase::Done, start.elapsed());
    Ok(true)
}

/// Writes processed records to the grid.
fn commit<G: Grid>(grid: &mut G, records: Vec<BlockRecord>, settings: &PlacementSettings) -> CommitOutcome {
    let mut outcome = CommitOutcome::default();

    for record in records {
        let pos = record.pos;
        if settings.clip_box.is_some_and(|clip| !clip.contains(pos)) {
            continue;
        }

        let existing_fluid = match settings.liquid_mode {
            LiquidMode::Apply => grid.fluid(pos),
            LiquidMode::Ignore => FluidState::EMPTY,
        };

        if record.payload.is_some() {
            grid.set_block_state(pos, BlockState::new(PLACEHOLDER_BLOCK), PLACEHOLDER_FLAGS);
        }
        if !grid.set_block_state(pos, record.state.clone(), settings.update_flags) {
            continue;
        }

        match outcome.bounds.as_mut() {
            Some(bounds) => bounds.encapsulate(pos),
            None => outcome.bounds = Some(BoundingBox::from_corners(pos, pos)),
        }
        outcome.committed.push(pos);

        if let Some(mut payload) = record.payload {
            payload.insert("x".into(), json!(pos.x));
            payload.insert("y".into(), json!(pos.y));
            payload.insert("z".into(), json!(pos.z));
            if payload.contains_key(LOOT_TABLE_KEY) {
                let seed = settings.random_for(pos, |rng| rng.i64(..));
                payload.insert(LOOT_SEED_KEY.into(), json!(seed));
            }
            grid.attach_payload(pos, payload);
        }

        if !existing_fluid.is_empty() && record.state.is_fluid_container() {
            grid.place_fluid(pos, &record.state, existing_fluid);
            if !existing_fluid.is_source() {
                outcome.pending_fluids.push(pos);
            }
        }
    }
    outcome
}

impl Template {
    /// Places this template; see [`place`].
    pub fn place_in<G: Grid>(
        &self,
        grid: &mut G,
        origin: Point3<i32>,
        settings: &PlacementSettings,
    ) -> Result<bool, ProcessorError> {
        place(self, grid, origin, settings)
    }
}
