//! # Chunk Iteration Module
//!
//! An iterator over the non-air cells of a chunk. It walks the set bits of
//! the chunk's `solid_array`, so empty space costs one bit test per cell and
//! never touches the palette.

use bitvec::order::Lsb0;
use bitvec::slice::IterOnes;
use cgmath::Point3;

use crate::voxels::block::BlockState;

use super::Chunk;

/// An iterator over all non-air cells in a chunk, yielding world positions
/// in ascending cell-index order (x fastest, then z, then y).
pub struct ChunkBlockIterator<'a> {
    /// Reference to the chunk being iterated over
    chunk_ref: &'a Chunk,
    /// Remaining set bits of the solid array
    ones: IterOnes<'a, usize, Lsb0>,
}

impl<'a> ChunkBlockIterator<'a> {
    /// Creates a new `ChunkBlockIterator` for the given chunk.
    pub fn new(chunk_ref: &'a Chunk) -> Self {
        ChunkBlockIterator {
            chunk_ref,
            ones: chunk_ref.solid_array.iter_ones(),
        }
    }
}

impl<'a> Iterator for ChunkBlockIterator<'a> {
    type Item = (Point3<i32>, &'a BlockState);

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.ones.next()?;
        let local = Chunk::local_from_index(index);
        Some((
            self.chunk_ref.world_position(local),
            self.chunk_ref.get_block_at(local),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iterates_only_solid_cells_in_index_order() {
        let mut chunk = Chunk::empty(&Point3::new(1, 0, 0));
        chunk.set_block_at(Point3::new(0, 1, 0), BlockState::new("dirt"));
        chunk.set_block_at(Point3::new(2, 0, 0), BlockState::new("stone"));

        let cells: Vec<(Point3<i32>, String)> = ChunkBlockIterator::new(&chunk)
            .map(|(pos, state)| (pos, state.name().to_string()))
            .collect();

        assert_eq!(
            cells,
            vec![
                (Point3::new(18, 0, 0), "stone".to_string()),
                (Point3::new(16, 1, 0), "dirt".to_string()),
            ]
        );
    }
}
