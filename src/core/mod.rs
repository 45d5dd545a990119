//! # Core Module
//!
//! Shared ownership primitives.
//!
//! ## Key Components
//! - `MtResource`: Thread-safe reference-counted resource with read-write locking.
//!   Wrapping a grid in one makes the grid shareable between concurrent placements.
//!
//! ## Usage
//! ```rust
//! use voxel_structures::core::MtResource;
//!
//! let counter = MtResource::new(0);
//! *counter.get_mut() += 1;
//! assert_eq!(*counter.get(), 1);
//! ```

/// Reference-counted, lock-protected shared resources.
pub mod mt_resource;

pub use mt_resource::MtResource;
