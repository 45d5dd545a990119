//! # Voxels
//!
//! The voxel vocabulary the structure engine works in, plus a reference
//! world to place into.
//!
//! ## Architecture
//!
//! * **Block**: immutable block states, directions and orientation operators, fluids
//! * **Bounding box**: inclusive integer boxes used for clipping and scans
//! * **Grid**: the [`grid::GridView`] / [`grid::Grid`] traits every world implements
//! * **Chunk**: palette-compressed 16x16x16 storage with a solid-cell bit mask
//! * **World**: a sparse, in-memory chunked grid that records its side effects
//!
//! ## Thread Safety
//!
//! `World` is a plain value. Share it between threads by wrapping it in a
//! [`MtResource`](crate::core::MtResource), which implements the grid traits
//! by locking for each call.

pub mod block;
pub mod bounding_box;
pub mod chunk;
pub mod grid;
pub mod world;
