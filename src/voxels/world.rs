//! # World Module
//!
//! This module provides `World`, an in-memory voxel world that implements the
//! [`Grid`] collaborator the structure engine writes into.
//!
//! ## Architecture
//!
//! The world uses a sparse storage approach where only chunks that have been
//! written to are kept in memory. Reads from missing chunks return air, so
//! the world is effectively unbounded.
//!
//! ## Block Behavior
//!
//! The world models just enough block behavior to exercise every placement
//! pass:
//! - Water: a `water` block with level `0` (or no level) is a source, other
//!   levels flow; a `waterlogged=true` container holds a water source.
//! - Shapes: states carrying `north`/`east`/`south`/`west` flags connect to
//!   neighbors that are full cubes or connect themselves (fence-like).
//! - Payloads are dropped when the block at their cell changes kind.
//!
//! Every mutation is recorded as a [`WorldEvent`] so callers can inspect the
//! side effects of a placement.

use std::collections::{HashMap, HashSet};

use cgmath::Point3;
use log::trace;
use serde::Deserialize;

use super::block::{
    direction::Direction,
    fluid::{FluidKind, FluidState},
    BlockState, WATERLOGGED_PROPERTY,
};
use super::bounding_box::BoundingBox;
use super::chunk::{chunk_iteration::ChunkBlockIterator, Chunk, CHUNK_DIMENSION};
use super::grid::{
    EntityHandle, EntitySnapshot, EntitySpawn, Grid, GridView, TagPayload, UpdateFlags,
};

/// Payload key the world sets on entities that went through a finalize pass.
pub const FINALIZED_KEY: &str = "Finalized";

/// Static block and entity rules of a [`World`].
///
/// Loadable from JSON; missing fields fall back to the defaults.
///
/// ```
/// use voxel_structures::voxels::world::WorldConfig;
///
/// let config: WorldConfig = serde_json::from_str(r#"{ "full_cube_blocks": ["stone"] }"#).unwrap();
/// assert_eq!(config.full_cube_blocks, vec!["stone".to_string()]);
/// assert!(!config.finalizable_entities.is_empty());
/// ```
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Block names that fully occupy their cell with a static shape
    pub full_cube_blocks: Vec<String>,

    /// Entity kinds that receive a finalize pass when spawned from a structure
    pub finalizable_entities: Vec<String>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        let full_cubes = [
            "stone",
            "granite",
            "dirt",
            "grass_block",
            "cobblestone",
            "mossy_cobblestone",
            "stone_bricks",
            "mossy_stone_bricks",
            "cracked_stone_bricks",
            "chiseled_stone_bricks",
            "bricks",
            "oak_planks",
            "oak_log",
            "sand",
            "gravel",
            "obsidian",
            "crying_obsidian",
        ];
        let finalizable = ["zombie", "skeleton", "villager", "pillager", "iron_golem"];
        WorldConfig {
            full_cube_blocks: full_cubes.iter().map(|name| name.to_string()).collect(),
            finalizable_entities: finalizable.iter().map(|name| name.to_string()).collect(),
        }
    }
}

/// A side effect recorded by the world.
#[derive(Clone, Debug, PartialEq)]
pub enum WorldEvent {
    /// A state write that changed the cell.
    BlockSet {
        /// Cell written
        pos: Point3<i32>,
        /// New state
        state: BlockState,
        /// Flags passed with the write
        flags: UpdateFlags,
    },
    /// A payload was attached.
    PayloadAttached(Point3<i32>),
    /// A container took in a fluid.
    FluidPlaced(Point3<i32>),
    /// A face shape update ran for `pos` against `neighbor`.
    ShapeUpdated {
        /// Cell reacting
        pos: Point3<i32>,
        /// Cell reacted to
        neighbor: Point3<i32>,
    },
    /// Neighbors of the cell were notified.
    NeighborsNotified(Point3<i32>),
    /// An entity was inserted.
    EntitySpawned(EntityHandle),
}

/// An in-memory voxel world composed of sparse chunks.
///
/// # Examples
///
/// ```
/// use cgmath::Point3;
/// use voxel_structures::voxels::{block::BlockState, grid::GridView, world::World};
///
/// let mut world = World::new();
/// world.set_block(Point3::new(0, 4, 0), BlockState::new("stone"));
/// assert_eq!(world.block_state(Point3::new(0, 4, 0)).name(), "stone");
/// assert_eq!(world.surface_height(0, 0), 5);
/// ```
pub struct World {
    /// A mapping from chunk coordinates to chunk data.
    pub chunks: HashMap<Point3<i32>, Chunk>,
    payloads: HashMap<Point3<i32>, TagPayload>,
    entities: Vec<(EntityHandle, EntitySnapshot)>,
    next_entity_id: u64,
    full_cubes: HashSet<String>,
    finalizable: HashSet<String>,
    events: Vec<WorldEvent>,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    /// Creates a new, empty world with the default [`WorldConfig`].
    pub fn new() -> Self {
        Self::with_config(WorldConfig::default())
    }

    /// Creates a new, empty world with the given rules.
    pub fn with_config(config: WorldConfig) -> Self {
        World {
            chunks: HashMap::new(),
            payloads: HashMap::new(),
            entities: Vec::new(),
            next_entity_id: 1,
            full_cubes: config.full_cube_blocks.into_iter().collect(),
            finalizable: config.finalizable_entities.into_iter().collect(),
            events: Vec::new(),
        }
    }

    /// Adds a new empty chunk at the specified chunk coordinates if one
    /// doesn't already exist, and returns it.
    pub fn add_chunk_at(&mut self, position: Point3<i32>) -> &mut Chunk {
        self.chunks
            .entry(position)
            .or_insert_with(|| Chunk::empty(&position))
    }

    /// Retrieves the chunk at the specified chunk coordinates.
    pub fn get_chunk_at(&self, pos: Point3<i32>) -> Option<&Chunk> {
        self.chunks.get(&pos)
    }

    /// Writes a state without recording an event or touching payloads.
    /// Intended for setting up a world before placing into it.
    pub fn set_block(&mut self, pos: Point3<i32>, state: BlockState) {
        let (chunk, local) = Chunk::locate(pos);
        self.add_chunk_at(chunk).set_block_at(local, state);
    }

    /// Adds an entity directly, as if it had always been there.
    pub fn add_entity(&mut self, snapshot: EntitySnapshot) -> EntityHandle {
        let handle = EntityHandle(self.next_entity_id);
        self.next_entity_id += 1;
        self.entities.push((handle, snapshot));
        handle
    }

    /// All entities in insertion order.
    pub fn entities(&self) -> impl Iterator<Item = &EntitySnapshot> {
        self.entities.iter().map(|(_, snapshot)| snapshot)
    }

    /// Side effects recorded so far.
    pub fn events(&self) -> &[WorldEvent] {
        &self.events
    }

    /// Forgets recorded side effects.
    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    /// Iterates every non-air cell of the world.
    pub fn solid_cells(&self) -> impl Iterator<Item = (Point3<i32>, &BlockState)> {
        self.chunks.values().flat_map(ChunkBlockIterator::new)
    }

    /// Whether `state` attaches to a connecting neighbor.
    fn connects_to(&self, state: &BlockState) -> bool {
        self.is_full_cube(state)
            || Direction::horizontal()
                .iter()
                .any(|dir| state.property(dir.name()).is_some())
    }

    /// Recomputes one connection flag of `state` against `neighbor`.
    fn connection_for(&self, state: &BlockState, direction: Direction, neighbor: &BlockState) -> BlockState {
        if !direction.is_horizontal() || state.property(direction.name()).is_none() {
            return state.clone();
        }
        let connected = self.connects_to(neighbor);
        state.with_property(direction.name(), connected.to_string())
    }
}

impl GridView for World {
    fn block_state(&self, pos: Point3<i32>) -> BlockState {
        let (chunk, local) = Chunk::locate(pos);
        self.chunks
            .get(&chunk)
            .map(|chunk| chunk.get_block_at(local).clone())
            .unwrap_or_else(BlockState::air)
    }

    fn payload(&self, pos: Point3<i32>) -> Option<TagPayload> {
        self.payloads.get(&pos).cloned()
    }

    fn fluid(&self, pos: Point3<i32>) -> FluidState {
        self.block_state(pos).intrinsic_fluid()
    }

    fn surface_height(&self, x: i32, z: i32) -> i32 {
        let (chunk_column, local) = Chunk::locate(Point3::new(x, 0, z));
        let mut column_chunks: Vec<&Chunk> = self
            .chunks
            .values()
            .filter(|chunk| chunk.position.x == chunk_column.x && chunk.position.z == chunk_column.z)
            .collect();
        column_chunks.sort_by_key(|chunk| std::cmp::Reverse(chunk.position.y));

        for chunk in column_chunks {
            for local_y in (0..CHUNK_DIMENSION as usize).rev() {
                let cell = Point3::new(local.x, local_y, local.z);
                if chunk.is_block_solid(cell) {
                    return chunk.world_position(cell).y + 1;
                }
            }
        }
        0
    }

    fn is_full_cube(&self, state: &BlockState) -> bool {
        self.full_cubes.contains(state.name())
    }

    fn entities_within(&self, bounds: &BoundingBox) -> Vec<EntitySnapshot> {
        self.entities
            .iter()
            .filter(|(_, snapshot)| bounds.contains_point(snapshot.position))
            .map(|(_, snapshot)| snapshot.clone())
            .collect()
    }

    fn is_finalizable(&self, kind: &str) -> bool {
        self.finalizable.contains(kind)
    }
}

impl Grid for World {
    fn set_block_state(&mut self, pos: Point3<i32>, state: BlockState, flags: UpdateFlags) -> bool {
        let (chunk, local) = Chunk::locate(pos);
        let previous = self.add_chunk_at(chunk).set_block_at(local, state.clone());
        if previous == state {
            return false;
        }
        if previous.name() != state.name() {
            self.payloads.remove(&pos);
        }
        self.events.push(WorldEvent::BlockSet { pos, state, flags });
        true
    }

    fn attach_payload(&mut self, pos: Point3<i32>, payload: TagPayload) {
        self.payloads.insert(pos, payload);
        self.events.push(WorldEvent::PayloadAttached(pos));
    }

    fn place_fluid(&mut self, pos: Point3<i32>, state: &BlockState, fluid: FluidState) -> bool {
        if !state.is_fluid_container() || fluid.kind != FluidKind::Water || !fluid.is_source() {
            return false;
        }
        let waterlogged = state.with_property(WATERLOGGED_PROPERTY, "true");
        if self.set_block_state(pos, waterlogged, UpdateFlags::SEND_TO_CLIENTS) {
            self.events.push(WorldEvent::FluidPlaced(pos));
        }
        true
    }

    fn update_shape_across_face(
        &mut self,
        pos: Point3<i32>,
        neighbor: Point3<i32>,
        direction: Direction,
        flags: UpdateFlags,
    ) {
        let state = self.block_state(pos);
        let neighbor_state = self.block_state(neighbor);
        let updated = self.connection_for(&state, direction, &neighbor_state);
        self.events.push(WorldEvent::ShapeUpdated { pos, neighbor });
        if updated != state {
            trace!("shape of {:?} changed facing {:?}", pos, direction);
            self.set_block_state(pos, updated, flags);
        }
    }

    fn reconciled_state(&self, pos: Point3<i32>) -> BlockState {
        let state = self.block_state(pos);
        Direction::horizontal().into_iter().fold(state, |state, direction| {
            let neighbor = self.block_state(direction.offset(pos));
            self.connection_for(&state, direction, &neighbor)
        })
    }

    fn notify_neighbors(&mut self, pos: Point3<i32>) {
        self.events.push(WorldEvent::NeighborsNotified(pos));
    }

    fn finalize_spawn(&mut self, spawn: &mut EntitySpawn) {
        spawn.payload.insert(FINALIZED_KEY.into(), true.into());
    }

    fn spawn_entity(&mut self, spawn: EntitySpawn) -> Option<EntityHandle> {
        if spawn.kind.is_empty() {
            return None;
        }
        let handle = self.add_entity(EntitySnapshot {
            position: spawn.position,
            attached_to: None,
            payload: spawn.payload,
        });
        self.events.push(WorldEvent::EntitySpawned(handle));
        Some(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(text: &str) -> BlockState {
        text.parse().unwrap()
    }

    #[test]
    fn test_unwritten_cells_read_as_air() {
        let world = World::new();
        assert!(world.block_state(Point3::new(100, -40, 7)).is_air());
        assert!(world.fluid(Point3::new(0, 0, 0)).is_empty());
        assert_eq!(world.surface_height(0, 0), 0);
    }

    #[test]
    fn test_surface_height_spans_chunks() {
        let mut world = World::new();
        world.set_block(Point3::new(3, 2, -5), state("dirt"));
        world.set_block(Point3::new(3, 40, -5), state("stone"));
        world.set_block(Point3::new(4, 60, -5), state("stone"));
        assert_eq!(world.surface_height(3, -5), 41);
        assert_eq!(world.surface_height(4, -5), 61);
    }

    #[test]
    fn test_set_block_state_reports_changes_only() {
        let mut world = World::new();
        let pos = Point3::new(1, 1, 1);
        assert!(world.set_block_state(pos, state("stone"), UpdateFlags::SEND_TO_CLIENTS));
        assert!(!world.set_block_state(pos, state("stone"), UpdateFlags::SEND_TO_CLIENTS));
        assert_eq!(world.events().len(), 1);

        world.clear_events();
        assert!(world.events().is_empty());
        assert!(world.set_block_state(pos, state("dirt"), UpdateFlags::SEND_TO_CLIENTS));
        assert_eq!(world.events().len(), 1);
    }

    #[test]
    fn test_chunks_are_created_on_write() {
        let mut world = World::new();
        assert!(world.get_chunk_at(Point3::new(1, 0, -1)).is_none());
        world.set_block(Point3::new(17, 3, -1), state("stone"));

        let chunk = world.get_chunk_at(Point3::new(1, 0, -1)).unwrap();
        assert_eq!(chunk.get_block_at(Point3::new(1, 3, 15)).name(), "stone");
        assert!(world.get_chunk_at(Point3::new(0, 0, 0)).is_none());
    }

    #[test]
    fn test_payload_dropped_when_block_kind_changes() {
        let mut world = World::new();
        let pos = Point3::new(0, 0, 0);
        world.set_block_state(pos, state("chest[facing=north]"), UpdateFlags::NONE);
        world.attach_payload(pos, TagPayload::new());
        world.set_block_state(pos, state("chest[facing=south]"), UpdateFlags::NONE);
        assert!(world.payload(pos).is_some());
        world.set_block_state(pos, state("barrier"), UpdateFlags::NONE);
        assert!(world.payload(pos).is_none());
    }

    #[test]
    fn test_place_fluid_only_waterlogs_containers_with_sources() {
        let mut world = World::new();
        let pos = Point3::new(0, 0, 0);
        let slab = state("oak_slab[waterlogged=false]");
        world.set_block(pos, slab.clone());

        assert!(!world.place_fluid(pos, &slab, FluidState::flowing(FluidKind::Water)));
        assert!(!world.place_fluid(pos, &state("stone"), FluidState::source(FluidKind::Water)));
        assert!(world.place_fluid(pos, &slab, FluidState::source(FluidKind::Water)));
        assert!(world.fluid(pos).is_source());
    }

    #[test]
    fn test_fence_connections_reconcile() {
        let mut world = World::new();
        let fence = state("oak_fence[east=false,north=false,south=false,west=false]");
        world.set_block(Point3::new(0, 0, 0), fence);
        world.set_block(Point3::new(1, 0, 0), state("stone"));

        let reconciled = world.reconciled_state(Point3::new(0, 0, 0));
        assert_eq!(reconciled.property("east"), Some("true"));
        assert_eq!(reconciled.property("west"), Some("false"));

        world.update_shape_across_face(
            Point3::new(0, 0, 0),
            Point3::new(1, 0, 0),
            Direction::East,
            UpdateFlags::NONE,
        );
        assert_eq!(world.block_state(Point3::new(0, 0, 0)).property("east"), Some("true"));
    }

    #[test]
    fn test_config_from_json_keeps_defaults_for_missing_fields() {
        let config: WorldConfig =
            serde_json::from_str(r#"{ "finalizable_entities": ["golem"] }"#).unwrap();
        let world = World::with_config(config);
        assert!(world.is_finalizable("golem"));
        assert!(!world.is_finalizable("zombie"));
        assert!(world.is_full_cube(&state("stone")));
    }
}
