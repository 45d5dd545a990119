//! # Errors
//!
//! Typed errors for the structure engine. Placement itself reports its
//! no-op cases (empty template, degenerate size) through a `false` return
//! rather than an error; only processor failures surface as [`ProcessorError`].

use cgmath::Vector3;
use thiserror::Error;

/// Failure to parse a `name[key=value,...]` block state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateParseError {
    /// Nothing before the property list.
    #[error("block state `{0}` has no block name")]
    MissingName(String),

    /// A `[` without its matching `]`.
    #[error("block state `{0}` has an unclosed property list")]
    UnclosedProperties(String),

    /// A property entry without `=`.
    #[error("malformed block property `{0}`")]
    MalformedProperty(String),
}

/// Failure to build or decode a template.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// A size component below one.
    #[error("template dimensions {0:?} must be at least 1 on every axis")]
    InvalidDimensions(Vector3<i32>),

    /// The document was not valid JSON or did not match the expected shape.
    #[error("malformed template document: {0}")]
    Format(#[from] serde_json::Error),

    /// The document was written by a newer format revision.
    #[error("template format version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version stored in the document
        found: u32,
        /// Newest version this crate reads
        supported: u32,
    },

    /// A block refers past the end of its palette.
    #[error("block at {pos:?} refers to palette index {index}, but the palette has {len} states")]
    PaletteIndexOutOfRange {
        /// Relative block position
        pos: [i32; 3],
        /// Offending index
        index: usize,
        /// Palette length
        len: usize,
    },

    /// Variant palettes of one template disagree in length.
    #[error("variant palettes are not aligned: expected {expected} states, found {found}")]
    MisalignedPalettes {
        /// Length of the first palette
        expected: usize,
        /// Length of the offending palette
        found: usize,
    },
}

/// A processor step failed. Propagated out of placement unchanged; blocks
/// committed before the failure stay in the grid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProcessorError {
    /// The processor gave up on a record.
    #[error("processor `{processor}` failed: {reason}")]
    Failed {
        /// Registered name of the failing processor
        processor: String,
        /// Human readable cause
        reason: String,
    },
}

impl ProcessorError {
    /// Shorthand for [`ProcessorError::Failed`].
    pub fn failed(processor: impl Into<String>, reason: impl Into<String>) -> Self {
        ProcessorError::Failed {
            processor: processor.into(),
            reason: reason.into(),
        }
    }
}

/// Failure to resolve a processor description through a registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// No factory registered under this name.
    #[error("no processor registered under `{0}`")]
    UnknownProcessor(String),

    /// The factory rejected its configuration.
    #[error("invalid configuration for processor `{name}`: {source}")]
    InvalidConfig {
        /// Processor type name
        name: String,
        /// Underlying decode error
        #[source]
        source: serde_json::Error,
    },
}
