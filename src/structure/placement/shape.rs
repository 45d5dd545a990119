//! # Shape Reconciliation
//!
//! Pasted blocks were written without regard for what ends up next to them.
//! This pass fixes up connection-dependent states (fences, panes, stairs)
//! in two steps:
//!
//! 1. Every face between a committed cell and a cell that was not committed
//!    gets a shape update in both directions, so blocks on either side of the
//!    paste boundary see each other.
//! 2. Every committed cell is recomputed from its current neighbors, written
//!    back if that changes it, and its neighbors are notified.
//!
//! Faces between two committed cells are skipped in step 1: both sides are
//! covered by step 2.

use bitvec::prelude::*;
use cgmath::Point3;

use crate::voxels::{
    block::direction::Direction,
    bounding_box::BoundingBox,
    grid::{Grid, UpdateFlags},
};

/// Dense occupancy bits over a box, one per cell.
pub struct OccupancyMask {
    bounds: BoundingBox,
    bits: BitVec,
}

impl OccupancyMask {
    /// Creates an empty mask covering `bounds`.
    pub fn new(bounds: BoundingBox) -> Self {
        let dims = bounds.dimensions();
        let len = (dims.x as usize) * (dims.y as usize) * (dims.z as usize);
        OccupancyMask {
            bounds,
            bits: bitvec![0; len],
        }
    }

    fn index_of(&self, pos: Point3<i32>) -> Option<usize> {
        if !self.bounds.contains(pos) {
            return None;
        }
        let dims = self.bounds.dimensions();
        let local = pos - self.bounds.min_corner();
        Some((local.x + dims.x * (local.z + dims.z * local.y)) as usize)
    }

    fn position_of(&self, index: usize) -> Point3<i32> {
        let dims = self.bounds.dimensions();
        let index = index as i32;
        let x = index % dims.x;
        let z = (index / dims.x) % dims.z;
        let y = index / (dims.x * dims.z);
        self.bounds.min_corner() + cgmath::Vector3::new(x, y, z)
    }

    /// Marks `pos` as filled. Positions outside the box are ignored.
    pub fn fill(&mut self, pos: Point3<i32>) {
        if let Some(index) = self.index_of(pos) {
            self.bits.set(index, true);
        }
    }

    /// Returns `true` if `pos` is inside the box and filled.
    pub fn is_filled(&self, pos: Point3<i32>) -> bool {
        self.index_of(pos).is_some_and(|index| self.bits[index])
    }

    /// Filled positions in index order.
    pub fn filled(&self) -> impl Iterator<Item = Point3<i32>> + '_ {
        self.bits.iter_ones().map(|index| self.position_of(index))
    }

    /// Number of filled cells.
    pub fn count(&self) -> usize {
        self.bits.count_ones()
    }
}

/// Runs shape updates across every face on the boundary of the mask.
///
/// # Returns
///
/// The number of faces updated.
pub fn update_boundary_faces<G: Grid + ?Sized>(grid: &mut G, mask: &OccupancyMask, flags: UpdateFlags) -> usize {
    let mut faces = 0;
    for pos in mask.filled() {
        for direction in Direction::all() {
            let neighbor = direction.offset(pos);
            if mask.is_filled(neighbor) {
                continue;
            }
            grid.update_shape_across_face(pos, neighbor, direction, flags);
            grid.update_shape_across_face(neighbor, pos, direction.opposite(), flags);
            faces += 1;
        }
    }
    faces
}

/// Full reconciliation pass over the committed cells.
///
/// # Arguments
///
/// * `grid` - The grid that was placed into
/// * `bounds` - Box covering every committed cell
/// * `committed` - Committed cells, in commit order
/// * `flags` - Flags the placement wrote with
///
/// # Returns
///
/// The number of committed cells whose state changed in step 2.
pub fn reconcile_shapes<G: Grid + ?Sized>(
    grid: &mut G,
    bounds: BoundingBox,
    committed: &[Point3<i32>],
    flags: UpdateFlags,
) -> usize {
    let mut mask = OccupancyMask::new(bounds);
    for &pos in committed {
        mask.fill(pos);
    }
    update_boundary_faces(grid, &mask, flags);

    let rewrite_flags = flags.without(UpdateFlags::NOTIFY_NEIGHBORS) | UpdateFlags::NO_SHAPE_UPDATE;
    let mut changed = 0;
    for &pos in committed {
        let current = grid.block_state(pos);
        let reconciled = grid.reconciled_state(pos);
        if reconciled != current && grid.set_block_state(pos, reconciled, rewrite_flags) {
            changed += 1;
        }
        grid.notify_neighbors(pos);
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voxels::{
        block::BlockState,
        grid::GridView,
        world::{World, WorldEvent},
    };

    #[test]
    fn test_mask_indexing_round_trips() {
        let bounds = BoundingBox::from_corners(Point3::new(-2, 3, 5), Point3::new(1, 4, 7));
        let mut mask = OccupancyMask::new(bounds);
        let cells = [Point3::new(-2, 3, 5), Point3::new(1, 4, 7), Point3::new(0, 3, 6)];
        for cell in cells {
            mask.fill(cell);
        }
        mask.fill(Point3::new(50, 0, 0));

        assert_eq!(mask.count(), 3);
        let mut filled: Vec<Point3<i32>> = mask.filled().collect();
        filled.sort_by_key(|p| (p.x, p.y, p.z));
        let mut expected = cells.to_vec();
        expected.sort_by_key(|p| (p.x, p.y, p.z));
        assert_eq!(filled, expected);
        assert!(!mask.is_filled(Point3::new(-1, 3, 5)));
    }

    #[test]
    fn test_boundary_faces_of_a_pair() {
        let mut world = World::new();
        let bounds = BoundingBox::from_corners(Point3::new(0, 0, 0), Point3::new(1, 0, 0));
        let mut mask = OccupancyMask::new(bounds);
        mask.fill(Point3::new(0, 0, 0));
        mask.fill(Point3::new(1, 0, 0));

        // Two cells side by side expose 10 faces; the shared one is skipped.
        assert_eq!(update_boundary_faces(&mut world, &mask, UpdateFlags::NONE), 10);
        let shape_updates = world
            .events()
            .iter()
            .filter(|e| matches!(e, WorldEvent::ShapeUpdated { .. }))
            .count();
        assert_eq!(shape_updates, 20);
    }

    #[test]
    fn test_fence_connects_to_outside_neighbor() {
        let mut world = World::new();
        world.set_block(Point3::new(1, 0, 0), BlockState::new("stone"));
        let fence: BlockState = "oak_fence[east=false,north=false,south=false,west=false]".parse().unwrap();
        world.set_block(Point3::new(0, 0, 0), fence);

        let bounds = BoundingBox::from_corners(Point3::new(0, 0, 0), Point3::new(0, 0, 0));
        reconcile_shapes(&mut world, bounds, &[Point3::new(0, 0, 0)], UpdateFlags::SEND_TO_CLIENTS);

        assert_eq!(world.block_state(Point3::new(0, 0, 0)).property("east"), Some("true"));
        assert!(world
            .events()
            .contains(&WorldEvent::NeighborsNotified(Point3::new(0, 0, 0))));
    }

    #[test]
    fn test_fences_inside_paste_connect_to_each_other() {
        let mut world = World::new();
        let fence: BlockState = "oak_fence[east=false,north=false,south=false,west=false]".parse().unwrap();
        world.set_block(Point3::new(0, 0, 0), fence.clone());
        world.set_block(Point3::new(1, 0, 0), fence);
        let committed = [Point3::new(0, 0, 0), Point3::new(1, 0, 0)];
        let bounds = BoundingBox::from_corners(committed[0], committed[1]);

        let changed = reconcile_shapes(&mut world, bounds, &committed, UpdateFlags::SEND_TO_CLIENTS);
        assert_eq!(changed, 2);
        assert_eq!(world.block_state(committed[0]).property("east"), Some("true"));
        assert_eq!(world.block_state(committed[1]).property("west"), Some("true"));

        let rewrite = world.events().iter().find_map(|e| match e {
            WorldEvent::BlockSet { pos, flags, .. } if *pos == committed[0] => Some(*flags),
            _ => None,
        });
        assert_eq!(rewrite, Some(UpdateFlags::SEND_TO_CLIENTS | UpdateFlags::NO_SHAPE_UPDATE));
    }
}
