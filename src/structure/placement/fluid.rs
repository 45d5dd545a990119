//! # Fluid Propagation
//!
//! After a paste, containers that were placed into flowing liquid are left
//! waiting for a source. This pass lets each of them adopt a neighboring
//! source, repeatedly, until a full sweep resolves nothing more. Sources
//! created by one adoption can feed the next, so liquid fills a pasted basin
//! from whatever sources border it.
//!
//! The sweep repeats for as long as it makes progress. Every adoption
//! removes a position from the pending list, so it always terminates, but a
//! large flooded region costs one sweep per position in the worst case.

use cgmath::Point3;
use log::trace;

use crate::voxels::{block::direction::Direction, grid::Grid};

/// Neighbors checked for a source, in order.
const FEED_DIRECTIONS: [Direction; 5] = [
    Direction::Up,
    Direction::North,
    Direction::East,
    Direction::South,
    Direction::West,
];

/// Resolves `pending` container positions against neighboring sources.
///
/// A position leaves the list once it holds a source, either because it
/// already does or because it adopted one from a neighbor that is not
/// pending itself. Positions with no reachable source stay in the list.
///
/// # Returns
///
/// The number of adoptions made. Calling this again on the same grid with
/// the list it left behind returns zero.
pub fn propagate_fluids<G: Grid + ?Sized>(grid: &mut G, pending: &mut Vec<Point3<i32>>) -> usize {
    let mut adopted = 0;
    let mut changed = true;

    while changed && !pending.is_empty() {
        changed = false;
        let mut index = 0;
        while index < pending.len() {
            let pos = pending[index];
            let mut fluid = grid.fluid(pos);
            for direction in FEED_DIRECTIONS {
                if fluid.is_source() {
                    break;
                }
                let neighbor = direction.offset(pos);
                let neighbor_fluid = grid.fluid(neighbor);
                if neighbor_fluid.is_source() && !pending.contains(&neighbor) {
                    fluid = neighbor_fluid;
                }
            }

            let state = grid.block_state(pos);
            if fluid.is_source() && state.is_fluid_container() {
                if grid.fluid(pos) != fluid && grid.place_fluid(pos, &state, fluid) {
                    trace!("{:?} adopted {:?}", pos, fluid.kind);
                    adopted += 1;
                }
                pending.remove(index);
                changed = true;
            } else {
                index += 1;
            }
        }
    }
    adopted
}
