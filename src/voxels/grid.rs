//! # Grid Module
//!
//! The boundary between the structure engine and whatever voxel world it
//! writes into. The engine only ever talks to a world through these traits:
//!
//! * [`GridView`] - read-only queries (states, payloads, fluids, surface
//!   heights, entity scans). Processors receive a `&dyn GridView`.
//! * [`Grid`] - mutations (state writes, payload attachment, fluid placement,
//!   shape reconciliation hooks, neighbor notification, entity spawning).
//!
//! Every call is synchronous and its effect must be visible to the next call
//! made during the same placement.

use std::ops::{BitOr, BitOrAssign};

use cgmath::{Point3, Vector3};
use serde_json::{Map, Value};

use super::block::{direction::Direction, fluid::FluidState, BlockState};
use super::bounding_box::BoundingBox;

/// Per-instance extra data attached to a block (inventory contents, sign
/// text, ...) or describing an entity. Keys and values are opaque to the
/// engine except for the handful it rewrites during placement.
pub type TagPayload = Map<String, Value>;

/// Payload key holding an entity's kind.
pub const ENTITY_KIND_KEY: &str = "id";
/// Payload key holding an entity's persisted identity.
pub const ENTITY_IDENTITY_KEY: &str = "UUID";
/// Payload key holding an entity's position as three numbers.
pub const ENTITY_POSITION_KEY: &str = "Pos";
/// Payload key holding an entity's `[yaw, pitch]`.
pub const ENTITY_ROTATION_KEY: &str = "Rotation";

/// Bit set passed along with every state write.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct UpdateFlags(pub u32);

impl UpdateFlags {
    /// No side effects requested.
    pub const NONE: UpdateFlags = UpdateFlags(0);
    /// Notify neighboring cells of the change.
    pub const NOTIFY_NEIGHBORS: UpdateFlags = UpdateFlags(1);
    /// Propagate the change to observers of the grid.
    pub const SEND_TO_CLIENTS: UpdateFlags = UpdateFlags(2);
    /// Do not redraw the cell.
    pub const INVISIBLE: UpdateFlags = UpdateFlags(4);
    /// Do not run shape updates on neighbors in response to this write.
    pub const NO_SHAPE_UPDATE: UpdateFlags = UpdateFlags(16);

    /// Returns `true` if every bit of `other` is set.
    pub fn contains(self, other: UpdateFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns these flags with the bits of `other` cleared.
    pub fn without(self, other: UpdateFlags) -> UpdateFlags {
        UpdateFlags(self.0 & !other.0)
    }
}

impl BitOr for UpdateFlags {
    type Output = UpdateFlags;

    fn bitor(self, rhs: UpdateFlags) -> UpdateFlags {
        UpdateFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for UpdateFlags {
    fn bitor_assign(&mut self, rhs: UpdateFlags) {
        self.0 |= rhs.0;
    }
}

/// An entity as seen by a region scan.
#[derive(Clone, Debug, PartialEq)]
pub struct EntitySnapshot {
    /// World-space position
    pub position: Point3<f64>,
    /// Cell the entity is attached to when that differs from the cell it
    /// stands in (hanging decorations)
    pub attached_to: Option<Point3<i32>>,
    /// Full serialized entity, including its kind under [`ENTITY_KIND_KEY`]
    pub payload: TagPayload,
}

impl EntitySnapshot {
    /// The entity kind stored in the payload, if any.
    pub fn kind(&self) -> Option<&str> {
        self.payload.get(ENTITY_KIND_KEY).and_then(Value::as_str)
    }
}

/// A fully prepared entity about to enter the grid.
#[derive(Clone, Debug, PartialEq)]
pub struct EntitySpawn {
    /// Entity kind
    pub kind: String,
    /// Serialized entity with position and heading already rewritten
    pub payload: TagPayload,
    /// World-space position
    pub position: Point3<f64>,
    /// Heading in degrees
    pub yaw: f32,
    /// Pitch in degrees
    pub pitch: f32,
}

/// Opaque identifier of a spawned entity.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct EntityHandle(pub u64);

/// Read-only access to a voxel world.
pub trait GridView {
    /// The state at `pos`. Unloaded or untouched cells read as air.
    fn block_state(&self, pos: Point3<i32>) -> BlockState;

    /// Extra data attached to the block at `pos`.
    fn payload(&self, pos: Point3<i32>) -> Option<TagPayload>;

    /// Liquid content at `pos`.
    fn fluid(&self, pos: Point3<i32>) -> FluidState;

    /// Y coordinate of the first air cell above the highest non-air cell in
    /// the column at `(x, z)`.
    fn surface_height(&self, x: i32, z: i32) -> i32;

    /// Whether `state` fully occupies its cell with a static shape.
    fn is_full_cube(&self, state: &BlockState) -> bool;

    /// Entities whose position lies inside `bounds`.
    fn entities_within(&self, bounds: &BoundingBox) -> Vec<EntitySnapshot>;

    /// Whether entities of this kind take a finalize pass before entering the grid.
    fn is_finalizable(&self, _kind: &str) -> bool {
        false
    }
}

/// Mutable access to a voxel world.
pub trait Grid: GridView {
    /// Writes a state. Returns `false` if the grid refused or nothing changed.
    fn set_block_state(&mut self, pos: Point3<i32>, state: BlockState, flags: UpdateFlags) -> bool;

    /// Attaches extra data to the block at `pos`, replacing any previous data.
    fn attach_payload(&mut self, pos: Point3<i32>, payload: TagPayload);

    /// Lets the block at `pos` (currently `state`) take in `fluid`. Returns
    /// `true` if it did.
    fn place_fluid(&mut self, pos: Point3<i32>, state: &BlockState, fluid: FluidState) -> bool;

    /// Lets the block at `pos` react to its neighbor across `direction`.
    fn update_shape_across_face(
        &mut self,
        pos: Point3<i32>,
        neighbor: Point3<i32>,
        direction: Direction,
        flags: UpdateFlags,
    );

    /// The state the block at `pos` should have given its current neighbors.
    fn reconciled_state(&self, pos: Point3<i32>) -> BlockState;

    /// Tells the neighbors of `pos` that it changed.
    fn notify_neighbors(&mut self, pos: Point3<i32>);

    /// Last chance to adjust a finalizable entity before it is inserted.
    fn finalize_spawn(&mut self, _spawn: &mut EntitySpawn) {}

    /// Inserts an entity. Returns `None` if the grid rejected it.
    fn spawn_entity(&mut self, spawn: EntitySpawn) -> Option<EntityHandle>;
}

/// Reads a `[x, y, z]` number list out of a payload entry.
pub fn read_vec3(payload: &TagPayload, key: &str) -> Option<Vector3<f64>> {
    let list = payload.get(key)?.as_array()?;
    match list.as_slice() {
        [x, y, z] => Some(Vector3::new(x.as_f64()?, y.as_f64()?, z.as_f64()?)),
        _ => None,
    }
}
