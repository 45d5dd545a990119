//! # Template Module
//!
//! A [`Template`] is a reusable recording of a box of voxels plus the
//! entities inside it, independent of any grid. Templates come from
//! [`Template::scan`] (one palette) or from a decoded
//! [`TemplateDocument`](crate::structure::format::TemplateDocument) (one or
//! more index-aligned palettes) and are read-only during placement, so one
//! template can back any number of concurrent placements.

use cgmath::{EuclideanSpace, Point3, Vector3};
use log::debug;
use web_time::Instant;

use super::{
    palette::{BlockRecord, Palette, PaletteBuilder},
    settings::PlacementSettings,
    transform::{transform_pos, transformed_size},
};
use crate::error::TemplateError;
use crate::voxels::{
    block::{direction::Rotation, BlockState},
    bounding_box::BoundingBox,
    grid::{GridView, TagPayload},
};

/// Entity kind never recorded by a scan.
pub const PLAYER_KIND: &str = "player";

/// Payload keys dropped from scanned block payloads; positions are implied
/// by the record.
const POSITION_KEYS: [&str; 3] = ["x", "y", "z"];

/// One recorded entity, relative to the template origin.
#[derive(Clone, Debug, PartialEq)]
pub struct EntityRecord {
    /// Continuous position
    pub pos: Point3<f64>,
    /// Cell the entity belongs to; usually `floor(pos)`, but hanging
    /// decorations report the block they are attached to
    pub block_pos: Point3<i32>,
    /// Serialized entity
    pub payload: TagPayload,
}

/// A palette-compressed voxel recording.
#[derive(Clone, Debug, PartialEq)]
pub struct Template {
    size: Vector3<i32>,
    palettes: Vec<Palette>,
    entities: Vec<EntityRecord>,
    author: String,
}

impl Default for Template {
    fn default() -> Self {
        Template {
            size: Vector3::new(0, 0, 0),
            palettes: Vec::new(),
            entities: Vec::new(),
            author: String::new(),
        }
    }
}

impl Template {
    /// Creates an empty, unpopulated template. Placing it is a no-op.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assembles a template from already ordered parts.
    ///
    /// Every palette must have the same length as the first.
    pub fn from_parts(
        size: Vector3<i32>,
        palettes: Vec<Palette>,
        entities: Vec<EntityRecord>,
        author: impl Into<String>,
    ) -> Result<Self, TemplateError> {
        if let Some(first) = palettes.first() {
            if let Some(bad) = palettes.iter().find(|p| p.len() != first.len()) {
                return Err(TemplateError::MisalignedPalettes {
                    expected: first.len(),
                    found: bad.len(),
                });
            }
        }
        Ok(Template {
            size,
            palettes,
            entities,
            author: author.into(),
        })
    }

    /// Records the box of `size` cells starting at `origin`.
    ///
    /// Cells whose block name appears in `ignore` are skipped. With
    /// `include_entities`, every non-player entity inside the box is recorded
    /// too.
    ///
    /// # Arguments
    ///
    /// * `grid` - The grid to read from
    /// * `origin` - Lowest corner of the box
    /// * `size` - Extent of the box; every component must be at least one
    /// * `include_entities` - Whether to record entities
    /// * `ignore` - Block names left out of the recording
    ///
    /// # Returns
    ///
    /// A template with exactly one palette in canonical order, or
    /// [`TemplateError::InvalidDimensions`].
    pub fn scan(
        grid: &dyn GridView,
        origin: Point3<i32>,
        size: Vector3<i32>,
        include_entities: bool,
        ignore: &[&str],
    ) -> Result<Self, TemplateError> {
        let start = Instant::now();
        let bounds = BoundingBox::from_origin_and_size(origin, size)
            .ok_or(TemplateError::InvalidDimensions(size))?;

        let mut builder = PaletteBuilder::new();
        for pos in bounds.cells() {
            let state = grid.block_state(pos);
            if ignore.iter().any(|name| *name == state.name()) {
                continue;
            }
            let payload = grid.payload(pos).map(|mut payload| {
                for key in POSITION_KEYS {
                    payload.remove(key);
                }
                payload
            });
            let full_cube = grid.is_full_cube(&state);
            builder.push(BlockRecord::new(pos - origin.to_vec(), state, payload), full_cube);
        }
        let palette = builder.build();

        let entities = if include_entities {
            Self::scan_entities(grid, origin, &bounds)
        } else {
            Vec::new()
        };

        debug!(
            "scanned {:?} at {:?}: {} records, {} entities in {:?}",
            size,
            origin,
            palette.len(),
            entities.len(),
            start.elapsed()
        );
        Ok(Template {
            size,
            palettes: vec![palette],
            entities,
            author: String::new(),
        })
    }

    fn scan_entities(grid: &dyn GridView, origin: Point3<i32>, bounds: &BoundingBox) -> Vec<EntityRecord> {
        let offset = Vector3::new(origin.x as f64, origin.y as f64, origin.z as f64);
        grid.entities_within(bounds)
            .into_iter()
            .filter(|entity| entity.kind() != Some(PLAYER_KIND))
            .map(|entity| {
                let pos = entity.position - offset;
                let block_pos = match entity.attached_to {
                    Some(attached) => attached - origin.to_vec(),
                    None => Point3::new(pos.x.floor() as i32, pos.y.floor() as i32, pos.z.floor() as i32),
                };
                EntityRecord {
                    pos,
                    block_pos,
                    payload: entity.payload,
                }
            })
            .collect()
    }

    /// Recorded extent.
    pub fn size(&self) -> Vector3<i32> {
        self.size
    }

    /// Extent after `rotation`.
    pub fn transformed_size(&self, rotation: Rotation) -> Vector3<i32> {
        transformed_size(self.size, rotation)
    }

    /// Variant palettes, index aligned.
    pub fn palettes(&self) -> &[Palette] {
        &self.palettes
    }

    /// Recorded entities.
    pub fn entities(&self) -> &[EntityRecord] {
        &self.entities
    }

    /// Who made the template.
    pub fn author(&self) -> &str {
        &self.author
    }

    /// Sets the author.
    pub fn set_author(&mut self, author: impl Into<String>) {
        self.author = author.into();
    }

    /// Returns `true` once the template has a palette to place.
    pub fn is_populated(&self) -> bool {
        !self.palettes.is_empty()
    }

    /// Chooses the palette a placement at `origin` uses, uniformly among the
    /// variants.
    pub fn select_palette(&self, settings: &PlacementSettings, origin: Point3<i32>) -> Option<&Palette> {
        match self.palettes.len() {
            0 => None,
            1 => self.palettes.first(),
            len => {
                let index = settings.random_for(origin, |rng| rng.usize(0..len));
                self.palettes.get(index)
            }
        }
    }

    /// The box of grid cells a placement at `origin` with `settings` covers.
    pub fn bounding_box(&self, settings: &PlacementSettings, origin: Point3<i32>) -> BoundingBox {
        let far = Point3::new(self.size.x - 1, self.size.y - 1, self.size.z - 1);
        let a = transform_pos(Point3::new(0, 0, 0), settings.mirror, settings.rotation, settings.pivot);
        let b = transform_pos(far, settings.mirror, settings.rotation, settings.pivot);
        BoundingBox::from_corners(a + origin.to_vec(), b + origin.to_vec())
    }

    /// Offset that makes connector `pos_b` of a template placed with
    /// `settings_b` land on connector `pos_a` of one placed with
    /// `settings_a`.
    pub fn connection_offset(
        settings_a: &PlacementSettings,
        pos_a: Point3<i32>,
        settings_b: &PlacementSettings,
        pos_b: Point3<i32>,
    ) -> Vector3<i32> {
        let a = transform_pos(pos_a, settings_a.mirror, settings_a.rotation, settings_a.pivot);
        let b = transform_pos(pos_b, settings_b.mirror, settings_b.rotation, settings_b.pivot);
        a - b
    }

    /// Records of the selected palette whose block is `name`, mapped into
    /// grid space as a placement at `origin` would map them. Used to find
    /// marker blocks without placing anything.
    pub fn filter_records(
        &self,
        origin: Point3<i32>,
        settings: &PlacementSettings,
        name: &str,
    ) -> Vec<BlockRecord> {
        let Some(palette) = self.select_palette(settings, origin) else {
            return Vec::new();
        };
        palette
            .records_named(name)
            .map(|record| map_record(record, settings, origin))
            .collect()
    }
}

/// Maps a template record into grid space: position through the transform
/// and then the origin offset, state through mirror and rotation.
pub fn map_record(record: &BlockRecord, settings: &PlacementSettings, origin: Point3<i32>) -> BlockRecord {
    let pos = transform_pos(record.pos, settings.mirror, settings.rotation, settings.pivot) + origin.to_vec();
    let state: BlockState = record.state.mirror(settings.mirror).rotate(settings.rotation);
    BlockRecord::new(pos, state, record.payload.clone())
}
