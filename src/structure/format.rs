//! # Template Document Format
//!
//! The persisted shape of a template, as a serde model:
//!
//! ```json
//! {
//!   "version": 1,
//!   "size": [3, 2, 3],
//!   "palette": [{ "Name": "stone" }, { "Name": "chest", "Properties": { "facing": "north" } }],
//!   "blocks": [{ "pos": [0, 0, 0], "state": 0 }, { "pos": [1, 1, 1], "state": 1, "nbt": { "Items": [] } }],
//!   "entities": [{ "pos": [1.5, 1.0, 1.5], "blockPos": [1, 1, 1], "nbt": { "id": "pig" } }],
//!   "author": "someone"
//! }
//! ```
//!
//! Templates with several variants store `"palettes"` (a list of state
//! tables) instead of `"palette"`. Every block carries one index that is
//! resolved against each table in turn, which is what keeps the variants
//! index aligned.
//!
//! Blocks are decoded in the order they are stored; the canonical bucket
//! order is a convention of the encoder and is not re-derived on load.
//! Documents from older revisions are read as they are (upgrading them is
//! the caller's job), documents from newer revisions are rejected.

use std::collections::HashMap;

use cgmath::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use super::{
    palette::{BlockRecord, Palette, StateArena},
    template::{EntityRecord, Template},
};
use crate::error::TemplateError;
use crate::voxels::{block::BlockState, grid::TagPayload};

/// Newest document revision this crate reads and the one it writes.
pub const FORMAT_VERSION: u32 = 1;

/// Top level of a persisted template.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TemplateDocument {
    /// Format revision
    pub version: u32,
    /// Extent
    pub size: [i32; 3],
    /// State table of a single-variant template
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub palette: Option<Vec<BlockState>>,
    /// State tables of a multi-variant template
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub palettes: Option<Vec<Vec<BlockState>>>,
    /// Block entries
    #[serde(default)]
    pub blocks: Vec<BlockEntry>,
    /// Entity entries
    #[serde(default)]
    pub entities: Vec<EntityEntry>,
    /// Creator
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub author: String,
}

/// One stored block.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockEntry {
    /// Template-relative position
    pub pos: [i32; 3],
    /// Index into the state table(s)
    pub state: usize,
    /// Extra per-instance data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbt: Option<TagPayload>,
}

/// One stored entity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntityEntry {
    /// Template-relative continuous position
    pub pos: [f64; 3],
    /// Template-relative anchor cell
    #[serde(rename = "blockPos")]
    pub block_pos: [i32; 3],
    /// Serialized entity
    pub nbt: TagPayload,
}

#[derive(Deserialize)]
struct VersionProbe {
    #[serde(default)]
    version: u32,
}

impl TemplateDocument {
    /// Encodes a template.
    ///
    /// A single palette gets its state table from a [`StateArena`] over the
    /// records in canonical order. Variant palettes get one table each,
    /// built from the distinct combinations of per-variant states; block
    /// payloads are taken from the first variant.
    pub fn from_template(template: &Template) -> Self {
        let size = template.size();
        let entities = template
            .entities()
            .iter()
            .map(|entity| EntityEntry {
                pos: [entity.pos.x, entity.pos.y, entity.pos.z],
                block_pos: [entity.block_pos.x, entity.block_pos.y, entity.block_pos.z],
                nbt: entity.payload.clone(),
            })
            .collect();

        let mut document = TemplateDocument {
            version: FORMAT_VERSION,
            size: [size.x, size.y, size.z],
            palette: None,
            palettes: None,
            blocks: Vec::new(),
            entities,
            author: template.author().to_string(),
        };

        match template.palettes() {
            [] => {}
            [palette] => {
                let mut arena = StateArena::new();
                document.blocks = palette
                    .records()
                    .iter()
                    .map(|record| block_entry(record, arena.intern(&record.state)))
                    .collect();
                document.palette = Some(arena.states().to_vec());
            }
            variants => {
                let mut ids: HashMap<Vec<BlockState>, usize> = HashMap::new();
                let mut tables: Vec<Vec<BlockState>> = vec![Vec::new(); variants.len()];
                for (index, record) in variants[0].records().iter().enumerate() {
                    let combination: Vec<BlockState> = variants
                        .iter()
                        .map(|variant| variant.records()[index].state.clone())
                        .collect();
                    let id = *ids.entry(combination.clone()).or_insert_with(|| {
                        for (table, state) in tables.iter_mut().zip(combination) {
                            table.push(state);
                        }
                        tables[0].len() - 1
                    });
                    document.blocks.push(block_entry(record, id));
                }
                document.palettes = Some(tables);
            }
        }
        document
    }

    /// Decodes into a template.
    pub fn into_template(self) -> Result<Template, TemplateError> {
        if self.version > FORMAT_VERSION {
            return Err(TemplateError::UnsupportedVersion {
                found: self.version,
                supported: FORMAT_VERSION,
            });
        }

        let tables = match (self.palettes, self.palette) {
            (Some(tables), _) => tables,
            (None, Some(table)) => vec![table],
            (None, None) => Vec::new(),
        };
        if let Some(first) = tables.first() {
            if let Some(bad) = tables.iter().find(|table| table.len() != first.len()) {
                return Err(TemplateError::MisalignedPalettes {
                    expected: first.len(),
                    found: bad.len(),
                });
            }
        }
        let table_len = tables.first().map_or(0, Vec::len);
        if let Some(bad) = self.blocks.iter().find(|block| block.state >= table_len) {
            return Err(TemplateError::PaletteIndexOutOfRange {
                pos: bad.pos,
                index: bad.state,
                len: table_len,
            });
        }

        let palettes = tables
            .iter()
            .map(|table| {
                Palette::from_records(
                    self.blocks
                        .iter()
                        .map(|block| {
                            BlockRecord::new(
                                Point3::from(block.pos),
                                table[block.state].clone(),
                                block.nbt.clone(),
                            )
                        })
                        .collect(),
                )
            })
            .collect();

        let entities = self
            .entities
            .into_iter()
            .map(|entity| EntityRecord {
                pos: Point3::from(entity.pos),
                block_pos: Point3::from(entity.block_pos),
                payload: entity.nbt,
            })
            .collect();

        Template::from_parts(Vector3::from(self.size), palettes, entities, self.author)
    }
}

fn block_entry(record: &BlockRecord, state: usize) -> BlockEntry {
    BlockEntry {
        pos: [record.pos.x, record.pos.y, record.pos.z],
        state,
        nbt: record.payload.clone(),
    }
}

/// Serializes a template to pretty-printed JSON.
///
/// The document stores one payload per block, shared by every variant.
/// Variant palettes whose payloads differ are written with the first
/// variant's payloads and decode with those payloads in every variant.
pub fn to_json(template: &Template) -> Result<String, TemplateError> {
    Ok(serde_json::to_string_pretty(&TemplateDocument::from_template(template))?)
}

/// Parses a template from JSON, checking the revision before the body.
pub fn from_json(text: &str) -> Result<Template, TemplateError> {
    let probe: VersionProbe = serde_json::from_str(text)?;
    if probe.version > FORMAT_VERSION {
        return Err(TemplateError::UnsupportedVersion {
            found: probe.version,
            supported: FORMAT_VERSION,
        });
    }
    let document: TemplateDocument = serde_json::from_str(text)?;
    document.into_template()
}
