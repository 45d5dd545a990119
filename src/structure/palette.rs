//! # Palette Module
//!
//! A palette is the ordered list of [`BlockRecord`]s that makes up one variant
//! of a template.
//!
//! ## Canonical Order
//!
//! Scanned records are split into three buckets:
//! 1. full-cube blocks with a static shape,
//! 2. everything else,
//! 3. blocks that carry a payload.
//!
//! Each bucket is sorted by `(y, x, z)` and the buckets are concatenated in
//! that order. Consumers may rely on payload-bearing records coming last:
//! by the time a container or sign is written, the solid shell around it is
//! already in place.
//!
//! ## State Ids
//!
//! [`StateArena`] assigns dense ids to distinct states in first-seen order.
//! Ids depend only on the sequence of states fed in, so scanning the same
//! region twice yields identical ids.

use std::collections::HashMap;

use cgmath::Point3;

use crate::voxels::{block::BlockState, grid::TagPayload};

/// One recorded cell of a template, relative to the template origin.
///
/// Records are immutable values: processors replace them, they never edit
/// them in place.
#[derive(Clone, Debug, PartialEq)]
pub struct BlockRecord {
    /// Position; relative to the template origin inside a palette, in grid
    /// space once handed to processors
    pub pos: Point3<i32>,
    /// Block configuration
    pub state: BlockState,
    /// Extra per-instance data
    pub payload: Option<TagPayload>,
}

impl BlockRecord {
    /// Creates a record.
    pub fn new(pos: Point3<i32>, state: BlockState, payload: Option<TagPayload>) -> Self {
        BlockRecord {
            pos,
            state,
            payload,
        }
    }

    /// Returns a copy of this record moved to `pos`.
    pub fn at(&self, pos: Point3<i32>) -> Self {
        BlockRecord {
            pos,
            ..self.clone()
        }
    }

    /// Returns a copy of this record with a different state.
    pub fn with_state(&self, state: BlockState) -> Self {
        BlockRecord {
            state,
            ..self.clone()
        }
    }
}

/// An ordered list of records forming one template variant.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Palette {
    records: Vec<BlockRecord>,
}

impl Palette {
    /// Wraps records that are already in their final order.
    pub fn from_records(records: Vec<BlockRecord>) -> Self {
        Palette { records }
    }

    /// Records in canonical order.
    pub fn records(&self) -> &[BlockRecord] {
        &self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the palette holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records whose block name matches `name`, in canonical order.
    pub fn records_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a BlockRecord> + 'a {
        self.records
            .iter()
            .filter(move |record| record.state.name() == name)
    }
}

/// Which bucket a scanned record falls into.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RecordBucket {
    /// Full cube with a static shape
    Full,
    /// Anything without a payload that is not a full cube
    Other,
    /// Carries a payload
    Payload,
}

/// Accumulates scanned records and emits them in canonical order.
#[derive(Default)]
pub struct PaletteBuilder {
    full: Vec<BlockRecord>,
    other: Vec<BlockRecord>,
    with_payload: Vec<BlockRecord>,
}

impl PaletteBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Classifies a record.
    ///
    /// Payload presence wins over shape: a full-cube block with a payload
    /// still goes last.
    pub fn bucket_for(record: &BlockRecord, is_full_cube: bool) -> RecordBucket {
        if record.payload.is_some() {
            RecordBucket::Payload
        } else if is_full_cube {
            RecordBucket::Full
        } else {
            RecordBucket::Other
        }
    }

    /// Adds a record to its bucket.
    pub fn push(&mut self, record: BlockRecord, is_full_cube: bool) {
        match Self::bucket_for(&record, is_full_cube) {
            RecordBucket::Full => self.full.push(record),
            RecordBucket::Other => self.other.push(record),
            RecordBucket::Payload => self.with_payload.push(record),
        }
    }

    /// Sorts each bucket by `(y, x, z)` and concatenates them.
    pub fn build(self) -> Palette {
        let PaletteBuilder {
            mut full,
            mut other,
            mut with_payload,
        } = self;
        for bucket in [&mut full, &mut other, &mut with_payload] {
            bucket.sort_by_key(|record| (record.pos.y, record.pos.x, record.pos.z));
        }

        let mut records = full;
        records.append(&mut other);
        records.append(&mut with_payload);
        Palette { records }
    }
}

/// Dense ids for distinct block states, assigned in first-seen order.
#[derive(Clone, Debug, Default)]
pub struct StateArena {
    states: Vec<BlockState>,
    ids: HashMap<BlockState, usize>,
}

impl StateArena {
    /// Creates an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id of `state`, assigning the next free id if it is new.
    pub fn intern(&mut self, state: &BlockState) -> usize {
        if let Some(&id) = self.ids.get(state) {
            return id;
        }
        let id = self.states.len();
        self.states.push(state.clone());
        self.ids.insert(state.clone(), id);
        id
    }

    /// Looks up an already interned state.
    pub fn id_of(&self, state: &BlockState) -> Option<usize> {
        self.ids.get(state).copied()
    }

    /// Resolves an id.
    pub fn state(&self, id: usize) -> Option<&BlockState> {
        self.states.get(id)
    }

    /// All states in id order.
    pub fn states(&self) -> &[BlockState] {
        &self.states
    }

    /// Number of distinct states.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Returns `true` if nothing was interned.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

impl FromIterator<BlockState> for StateArena {
    fn from_iter<I: IntoIterator<Item = BlockState>>(iter: I) -> Self {
        let mut arena = StateArena::new();
        for state in iter {
            arena.intern(&state);
        }
        arena
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(x: i32, y: i32, z: i32, name: &str, payload: bool) -> BlockRecord {
        BlockRecord::new(
            Point3::new(x, y, z),
            BlockState::new(name),
            payload.then(TagPayload::new),
        )
    }

    #[test]
    fn test_bucket_order_and_sort() {
        let mut builder = PaletteBuilder::new();
        builder.push(record(0, 1, 0, "chest", true), false);
        builder.push(record(1, 0, 0, "torch", false), false);
        builder.push(record(0, 1, 0, "stone", false), true);
        builder.push(record(1, 0, 0, "stone", false), true);
        builder.push(record(0, 0, 1, "stone", false), true);
        builder.push(record(0, 0, 0, "furnace", true), true);

        let names: Vec<(String, [i32; 3])> = builder
            .build()
            .records()
            .iter()
            .map(|r| (r.state.name().to_string(), [r.pos.x, r.pos.y, r.pos.z]))
            .collect();

        assert_eq!(
            names,
            vec![
                ("stone".to_string(), [0, 0, 1]),
                ("stone".to_string(), [1, 0, 0]),
                ("stone".to_string(), [0, 1, 0]),
                ("torch".to_string(), [1, 0, 0]),
                ("furnace".to_string(), [0, 0, 0]),
                ("chest".to_string(), [0, 1, 0]),
            ]
        );
    }

    #[test]
    fn test_arena_assigns_first_seen_ids() {
        let mut arena = StateArena::new();
        assert_eq!(arena.intern(&BlockState::new("stone")), 0);
        assert_eq!(arena.intern(&BlockState::new("dirt")), 1);
        assert_eq!(arena.intern(&BlockState::new("stone")), 0);
        assert_eq!(arena.len(), 2);
        assert_eq!(arena.state(1).map(BlockState::name), Some("dirt"));
        assert_eq!(arena.id_of(&BlockState::new("glass")), None);
    }

    #[test]
    fn test_records_named() {
        let palette = Palette::from_records(vec![
            record(0, 0, 0, "stone", false),
            record(1, 0, 0, "jigsaw", false),
            record(2, 0, 0, "jigsaw", false),
        ]);
        assert_eq!(palette.records_named("jigsaw").count(), 2);
        assert_eq!(palette.len(), 3);
    }
}
