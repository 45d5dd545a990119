//! # Fluid Module
//!
//! Fluid content of a cell, as reported by the grid. A cell's fluid is
//! independent of its block state in the sense that a container block (a
//! waterlogged slab, say) can hold a fluid while keeping its own shape.

use serde::{Deserialize, Serialize};

/// The kind of liquid occupying a cell.
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FluidKind {
    /// No fluid
    #[default]
    Empty,

    /// Water
    Water,

    /// Lava
    Lava,
}

/// Fluid content of a single cell.
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug, Default, Serialize, Deserialize)]
pub struct FluidState {
    /// What liquid is present
    pub kind: FluidKind,

    /// Whether the cell is a source (a full, self-sustaining body) rather than
    /// liquid flowing in from elsewhere
    pub source: bool,
}

impl FluidState {
    /// The empty fluid state.
    pub const EMPTY: FluidState = FluidState {
        kind: FluidKind::Empty,
        source: false,
    };

    /// A source of the given kind.
    pub fn source(kind: FluidKind) -> Self {
        FluidState { kind, source: kind != FluidKind::Empty }
    }

    /// Flowing liquid of the given kind.
    pub fn flowing(kind: FluidKind) -> Self {
        FluidState { kind, source: false }
    }

    /// Returns `true` if no liquid is present.
    pub fn is_empty(&self) -> bool {
        self.kind == FluidKind::Empty
    }

    /// Returns `true` if this cell is a liquid source.
    pub fn is_source(&self) -> bool {
        self.source && !self.is_empty()
    }
}
