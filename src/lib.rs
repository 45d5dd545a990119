#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Voxel Structures
//!
//! A structure placement engine for voxel worlds: record a box of blocks and
//! entities as a palette-compressed template, then stamp it back into any
//! grid under rotation, mirroring and translation, with a pluggable chain of
//! processors rewriting the content on the way in.
//!
//! ## Key Modules
//!
//! * `core` - Shared ownership primitives for handing a grid to several threads
//! * `voxels` - Block states, the grid traits and an in-memory chunked world
//! * `structure` - Templates, the persisted format, processors and the placement engine
//! * `error` - Typed errors
//!
//! ## Usage
//!
//! ```rust
//! use cgmath::{Point3, Vector3};
//! use voxel_structures::structure::{settings::PlacementSettings, template::Template};
//! use voxel_structures::voxels::{block::BlockState, block::direction::Rotation, grid::GridView, world::World};
//!
//! let mut world = World::new();
//! world.set_block(Point3::new(0, 0, 0), BlockState::new("stone"));
//! world.set_block(Point3::new(1, 0, 0), BlockState::new("cobblestone"));
//!
//! let template = Template::scan(&world, Point3::new(0, 0, 0), Vector3::new(2, 1, 1), false, &[]).unwrap();
//!
//! let settings = PlacementSettings::new().with_rotation(Rotation::Clockwise90);
//! assert!(template.place_in(&mut world, Point3::new(10, 0, 10), &settings).unwrap());
//! assert_eq!(world.block_state(Point3::new(10, 0, 11)).name(), "cobblestone");
//! ```
//!
//! ## Determinism
//!
//! Without a caller supplied random source, every random decision of a
//! placement is drawn from a generator seeded by the placement origin, so the
//! same template placed at the same spot always comes out the same.

pub mod core;
pub mod error;
pub mod structure;
pub mod voxels;

/// Sets up `env_logger` on stdout, filtered by `RUST_LOG`.
///
/// Call once at startup; later calls are ignored.
pub fn init_logging() {
    let mut log_builder = env_logger::Builder::new();
    let _ = log_builder
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .try_init();
    log::info!("Logger initialized");
}
