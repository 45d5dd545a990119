use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use cgmath::Point3;

use crate::voxels::{
    block::{direction::Direction, fluid::FluidState, BlockState},
    bounding_box::BoundingBox,
    grid::{EntityHandle, EntitySnapshot, EntitySpawn, Grid, GridView, TagPayload, UpdateFlags},
};

/// A thread-safe, reference-counted resource container with read-write locking.
///
/// `MtResource` provides synchronized access to a value of type `T` that can be shared
/// across threads. It uses an `Arc<RwLock<T>>` internally to manage concurrent access.
///
/// When `T` is a [`Grid`], the resource is itself a grid that takes the lock for
/// the duration of each call. That is how several placements can write into
/// disjoint regions of one world from different threads: the engine never
/// locks anything, the shared grid serializes each individual access.
///
/// # Examples
///
/// ```
/// use std::thread;
/// use cgmath::Point3;
/// use voxel_structures::core::MtResource;
/// use voxel_structures::voxels::{block::BlockState, grid::{Grid, GridView, UpdateFlags}, world::World};
///
/// let world = MtResource::new(World::new());
/// let mut writer = world.clone();
///
/// thread::spawn(move || {
///     writer.set_block_state(Point3::new(0, 0, 0), BlockState::new("stone"), UpdateFlags::NONE);
/// })
/// .join()
/// .unwrap();
///
/// assert_eq!(world.block_state(Point3::new(0, 0, 0)).name(), "stone");
/// ```
///
/// # Performance Considerations
/// - Read operations (`get()`) can occur concurrently
/// - Write operations (`get_mut()`) are exclusive and will block other operations
/// - A grid behind an `MtResource` pays one lock acquisition per call
pub struct MtResource<T: Send + Sync> {
    /// The shared value behind its lock.
    pub resource: Arc<RwLock<T>>,
}

impl<T: Send + Sync + 'static> MtResource<T> {
    /// Creates a new `MtResource` containing the given value.
    pub fn new(resource: T) -> Self {
        Self {
            resource: Arc::new(RwLock::new(resource)),
        }
    }

    /// Returns a read-only guard that allows reading the contained value.
    ///
    /// A lock poisoned by a panicking writer is recovered rather than
    /// propagated; placement has no rollback, so the data is as consistent
    /// as it would have been without the panic.
    pub fn get(&self) -> RwLockReadGuard<'_, T> {
        self.resource.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns a mutable guard that allows modifying the contained value.
    pub fn get_mut(&self) -> RwLockWriteGuard<'_, T> {
        self.resource.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Send + Sync> Clone for MtResource<T> {
    fn clone(&self) -> Self {
        Self {
            resource: self.resource.clone(),
        }
    }
}

impl<G: GridView + Send + Sync + 'static> GridView for MtResource<G> {
    fn block_state(&self, pos: Point3<i32>) -> BlockState {
        self.get().block_state(pos)
    }

    fn payload(&self, pos: Point3<i32>) -> Option<TagPayload> {
        self.get().payload(pos)
    }

    fn fluid(&self, pos: Point3<i32>) -> FluidState {
        self.get().fluid(pos)
    }

    fn surface_height(&self, x: i32, z: i32) -> i32 {
        self.get().surface_height(x, z)
    }

    fn is_full_cube(&self, state: &BlockState) -> bool {
        self.get().is_full_cube(state)
    }

    fn entities_within(&self, bounds: &BoundingBox) -> Vec<EntitySnapshot> {
        self.get().entities_within(bounds)
    }

    fn is_finalizable(&self, kind: &str) -> bool {
        self.get().is_finalizable(kind)
    }
}

impl<G: Grid + Send + Sync + 'static> Grid for MtResource<G> {
    fn set_block_state(&mut self, pos: Point3<i32>, state: BlockState, flags: UpdateFlags) -> bool {
        self.get_mut().set_block_state(pos, state, flags)
    }

    fn attach_payload(&mut self, pos: Point3<i32>, payload: TagPayload) {
        self.get_mut().attach_payload(pos, payload)
    }

    fn place_fluid(&mut self, pos: Point3<i32>, state: &BlockState, fluid: FluidState) -> bool {
        self.get_mut().place_fluid(pos, state, fluid)
    }

    fn update_shape_across_face(
        &mut self,
        pos: Point3<i32>,
        neighbor: Point3<i32>,
        direction: Direction,
        flags: UpdateFlags,
    ) {
        self.get_mut()
            .update_shape_across_face(pos, neighbor, direction, flags)
    }

    fn reconciled_state(&self, pos: Point3<i32>) -> BlockState {
        self.get().reconciled_state(pos)
    }

    fn notify_neighbors(&mut self, pos: Point3<i32>) {
        self.get_mut().notify_neighbors(pos)
    }

    fn finalize_spawn(&mut self, spawn: &mut EntitySpawn) {
        self.get_mut().finalize_spawn(spawn)
    }

    fn spawn_entity(&mut self, spawn: EntitySpawn) -> Option<EntityHandle> {
        self.get_mut().spawn_entity(spawn)
    }
}
