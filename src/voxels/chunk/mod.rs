//! # Chunk Module
//!
//! This module provides the `Chunk` struct used by the in-memory [`World`]
//! to store 16x16x16 cells of block states.
//!
//! ## Memory Layout
//!
//! A chunk stores its cells palette-compressed:
//! - `palette`: the distinct states present in the chunk, air always at index 0;
//!   a slot no cell refers to any more is recycled for the next new state
//! - `indices`: one palette index per cell, in x-major, then z, then y order
//! - `solid_array`: a bit vector (1 bit per cell) marking non-air cells
//!
//! The bit vector answers "is anything here" in O(1) and lets iteration skip
//! empty space without touching the index array.
//!
//! [`World`]: super::world::World

use std::collections::HashMap;

use bitvec::prelude::BitVec;
use cgmath::Point3;

use super::block::BlockState;

pub mod chunk_iteration;

/// The dimension (width, height, depth) of a chunk in cells.
pub const CHUNK_DIMENSION: i32 = 16;
/// The number of cells in a single horizontal plane of a chunk.
pub const CHUNK_PLANE_SIZE: i32 = CHUNK_DIMENSION * CHUNK_DIMENSION;
/// The total number of cells in a chunk.
pub const CHUNK_SIZE: i32 = CHUNK_PLANE_SIZE * CHUNK_DIMENSION;

// Every palette slot except air's is held by at least one cell, so the
// palette never holds more than `CHUNK_SIZE + 1` slots.
const _: () = assert!(CHUNK_SIZE < u16::MAX as i32);

/// A 16x16x16 block of cells.
pub struct Chunk {
    /// The position of this chunk in chunk coordinates (not cell coordinates).
    pub position: Point3<i32>,

    /// Palette slots. Slot 0 is always air; other slots are only meaningful
    /// while `usage` is non-zero.
    palette: Vec<BlockState>,

    /// Number of cells referring to each slot.
    usage: Vec<u16>,

    /// Slot of every state currently in use.
    lookup: HashMap<BlockState, u16>,

    /// Released slots, reused before the palette grows.
    free_slots: Vec<u16>,

    /// Palette index of every cell.
    indices: Vec<u16>,

    /// One bit per cell, set when the cell is not air.
    pub solid_array: BitVec,
}

impl Chunk {
    /// Creates a new, completely empty chunk (all cells are air).
    ///
    /// # Arguments
    /// * `position` - The chunk coordinates of the new chunk
    pub fn empty(position: &Point3<i32>) -> Self {
        let mut solid_array = BitVec::with_capacity(CHUNK_SIZE as usize);
        solid_array.resize(CHUNK_SIZE as usize, false);
        Chunk {
            position: *position,
            palette: vec![BlockState::air()],
            usage: vec![CHUNK_SIZE as u16],
            lookup: HashMap::from([(BlockState::air(), 0)]),
            free_slots: Vec::new(),
            indices: vec![0; CHUNK_SIZE as usize],
            solid_array,
        }
    }

    /// Splits a world cell position into the chunk that holds it and the
    /// cell's local coordinates inside that chunk.
    pub fn locate(pos: Point3<i32>) -> (Point3<i32>, Point3<usize>) {
        let chunk = Point3::new(
            pos.x.div_euclid(CHUNK_DIMENSION),
            pos.y.div_euclid(CHUNK_DIMENSION),
            pos.z.div_euclid(CHUNK_DIMENSION),
        );
        let local = Point3::new(
            pos.x.rem_euclid(CHUNK_DIMENSION) as usize,
            pos.y.rem_euclid(CHUNK_DIMENSION) as usize,
            pos.z.rem_euclid(CHUNK_DIMENSION) as usize,
        );
        (chunk, local)
    }

    /// Converts local coordinates to the world position of the cell.
    pub fn world_position(&self, local: Point3<usize>) -> Point3<i32> {
        Point3::new(
            self.position.x * CHUNK_DIMENSION + local.x as i32,
            self.position.y * CHUNK_DIMENSION + local.y as i32,
            self.position.z * CHUNK_DIMENSION + local.z as i32,
        )
    }

    fn cell_index(local: Point3<usize>) -> usize {
        local.x + CHUNK_DIMENSION as usize * local.z + CHUNK_PLANE_SIZE as usize * local.y
    }

    /// Converts a cell index back into local coordinates.
    pub fn local_from_index(index: usize) -> Point3<usize> {
        let dim = CHUNK_DIMENSION as usize;
        let plane = CHUNK_PLANE_SIZE as usize;
        Point3::new(index % dim, index / plane, (index % plane) / dim)
    }

    /// Gets the state at the specified chunk-relative coordinates.
    ///
    /// # Panics
    /// Panics if the coordinates are out of bounds.
    pub fn get_block_at(&self, local: Point3<usize>) -> &BlockState {
        &self.palette[self.indices[Self::cell_index(local)] as usize]
    }

    /// Sets the state at the specified chunk-relative coordinates.
    ///
    /// Returns the previous state.
    pub fn set_block_at(&mut self, local: Point3<usize>, state: BlockState) -> BlockState {
        let index = Self::cell_index(local);
        let previous_slot = self.indices[index];
        let previous = self.palette[previous_slot as usize].clone();
        if previous == state {
            return previous;
        }

        self.release(previous_slot);
        let solid = !state.is_air();
        let slot = self.acquire(state);
        self.indices[index] = slot;
        self.solid_array.set(index, solid);
        previous
    }

    /// Drops one cell's reference to `slot`, recycling it once unused.
    fn release(&mut self, slot: u16) {
        let usage = &mut self.usage[slot as usize];
        *usage -= 1;
        if *usage == 0 && slot != 0 {
            self.lookup.remove(&self.palette[slot as usize]);
            self.free_slots.push(slot);
        }
    }

    /// Adds one cell's reference to the slot of `state`, assigning a slot
    /// if the state is new to the chunk.
    fn acquire(&mut self, state: BlockState) -> u16 {
        let slot = match self.lookup.get(&state).copied() {
            Some(slot) => slot,
            None => {
                let slot = match self.free_slots.pop() {
                    Some(slot) => {
                        self.palette[slot as usize] = state.clone();
                        slot
                    }
                    None => {
                        self.palette.push(state.clone());
                        self.usage.push(0);
                        (self.palette.len() - 1) as u16
                    }
                };
                self.lookup.insert(state, slot);
                slot
            }
        };
        self.usage[slot as usize] += 1;
        slot
    }

    /// Checks if the cell at the specified chunk-relative coordinates is not air.
    pub fn is_block_solid(&self, local: Point3<usize>) -> bool {
        self.solid_array[Self::cell_index(local)]
    }

    /// Returns `true` if every cell in the chunk is air.
    pub fn is_empty(&self) -> bool {
        self.solid_array.not_any()
    }

    /// Number of distinct states currently present, air included.
    pub fn distinct_states(&self) -> usize {
        self.lookup.len()
    }

    /// Number of palette slots allocated, recycled ones included.
    pub fn palette_slots(&self) -> usize {
        self.palette.len()
    }
}
