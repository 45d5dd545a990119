//! # Structure Engine
//!
//! Records boxes of voxels as reusable templates and places them back into
//! a grid under a transform, a processor chain and post-placement passes.
//!
//! ## Data Flow
//!
//! 1. A [`template::Template`] is scanned from a grid or decoded from a
//!    [`format::TemplateDocument`]
//! 2. [`placement::place`] selects one of its palettes
//! 3. [`transform`] maps every record into grid space
//! 4. The [`processor`] chain rewrites or drops records
//! 5. Survivors are committed, then the fluid, shape and entity passes run
//!
//! Placement settings come from the builder on
//! [`settings::PlacementSettings`] or from a JSON
//! [`settings::PlacementConfig`] resolved through a
//! [`processor::registry::ProcessorRegistry`].

pub mod format;
pub mod palette;
pub mod placement;
pub mod processor;
pub mod settings;
pub mod template;
pub mod transform;
