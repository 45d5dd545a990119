//! # Placement Settings Module
//!
//! Everything a single placement call needs besides the template and the
//! grid: the geometric transform, clipping, liquid handling, the random
//! source and the processor chain.
//!
//! Settings are built per call with the `with_*` builder methods, or loaded
//! from JSON as a [`PlacementConfig`] and resolved against a
//! [`ProcessorRegistry`].

use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;

use cgmath::Point3;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::RegistryError;
use crate::structure::processor::{registry::ProcessorRegistry, StructureProcessor};
use crate::voxels::{
    block::direction::{Mirror, Rotation},
    bounding_box::BoundingBox,
    grid::UpdateFlags,
};

/// Whether committed blocks take in the liquid that was at their cell.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiquidMode {
    /// Fluid-capable blocks keep pre-existing liquid and the fluid pass runs
    #[default]
    Apply,
    /// Liquid at the destination is overwritten and never propagated
    Ignore,
}

/// Derives a deterministic seed from a block position.
///
/// Any two placements at the same origin draw the same random sequence,
/// which is what keeps default placements reproducible and safe to run in
/// parallel.
pub fn position_seed(pos: Point3<i32>) -> u64 {
    let mut i = (pos.x as i64).wrapping_mul(3_129_871)
        ^ (pos.z as i64).wrapping_mul(116_129_781)
        ^ pos.y as i64;
    i = i
        .wrapping_mul(i)
        .wrapping_mul(42_317_861)
        .wrapping_add(i.wrapping_mul(11));
    (i >> 16) as u64
}

/// Parameters of one placement call.
///
/// Immutable for the duration of a placement. A caller supplied random
/// source sits behind a `RefCell`, so settings carrying one are not `Sync`
/// and cannot be shared between concurrent placements; settings without one
/// fall back to a generator seeded from the placement origin.
#[derive(Clone)]
pub struct PlacementSettings {
    /// Reflection applied before rotation
    pub mirror: Mirror,
    /// Quarter turn applied about `pivot`
    pub rotation: Rotation,
    /// Template-relative point the rotation turns about
    pub pivot: Point3<i32>,
    /// Skip entity materialization entirely
    pub ignore_entities: bool,
    /// Discard output outside this box
    pub clip_box: Option<BoundingBox>,
    /// Liquid handling at the destination
    pub liquid_mode: LiquidMode,
    /// Caller supplied random source
    pub random: Option<RefCell<fastrand::Rng>>,
    /// The caller vouches that shapes are already consistent
    pub known_shape: bool,
    /// Give finalizable entities their finalize pass
    pub finalize_entities: bool,
    /// Processor chain, in order
    pub processors: Vec<Arc<dyn StructureProcessor>>,
    /// Flags passed with every final state write
    pub update_flags: UpdateFlags,
}

impl Default for PlacementSettings {
    fn default() -> Self {
        PlacementSettings {
            mirror: Mirror::None,
            rotation: Rotation::None,
            pivot: Point3::new(0, 0, 0),
            ignore_entities: false,
            clip_box: None,
            liquid_mode: LiquidMode::Apply,
            random: None,
            known_shape: false,
            finalize_entities: false,
            processors: Vec::new(),
            update_flags: UpdateFlags::SEND_TO_CLIENTS,
        }
    }
}

impl fmt::Debug for PlacementSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let processors: Vec<&str> = self.processors.iter().map(|p| p.name()).collect();
        f.debug_struct("PlacementSettings")
            .field("mirror", &self.mirror)
            .field("rotation", &self.rotation)
            .field("pivot", &self.pivot)
            .field("ignore_entities", &self.ignore_entities)
            .field("clip_box", &self.clip_box)
            .field("liquid_mode", &self.liquid_mode)
            .field("random", &self.random.is_some())
            .field("known_shape", &self.known_shape)
            .field("finalize_entities", &self.finalize_entities)
            .field("processors", &processors)
            .field("update_flags", &self.update_flags)
            .finish()
    }
}

impl PlacementSettings {
    /// Settings with no transform, no processors and default flags.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the reflection.
    pub fn with_mirror(mut self, mirror: Mirror) -> Self {
        self.mirror = mirror;
        self
    }

    /// Sets the rotation.
    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    /// Sets the rotation pivot.
    pub fn with_pivot(mut self, pivot: Point3<i32>) -> Self {
        self.pivot = pivot;
        self
    }

    /// Enables or disables entity materialization.
    pub fn ignore_entities(mut self, ignore: bool) -> Self {
        self.ignore_entities = ignore;
        self
    }

    /// Restricts output to `clip_box`.
    pub fn with_clip_box(mut self, clip_box: BoundingBox) -> Self {
        self.clip_box = Some(clip_box);
        self
    }

    /// Sets the liquid handling.
    pub fn with_liquid_mode(mut self, liquid_mode: LiquidMode) -> Self {
        self.liquid_mode = liquid_mode;
        self
    }

    /// Uses `rng` instead of the origin-seeded default.
    pub fn with_random(mut self, rng: fastrand::Rng) -> Self {
        self.random = Some(RefCell::new(rng));
        self
    }

    /// Skips shape reconciliation when `known` is `true`.
    pub fn known_shape(mut self, known: bool) -> Self {
        self.known_shape = known;
        self
    }

    /// Enables the finalize pass for finalizable entity kinds.
    pub fn finalize_entities(mut self, finalize: bool) -> Self {
        self.finalize_entities = finalize;
        self
    }

    /// Appends a processor to the chain.
    pub fn add_processor(mut self, processor: Arc<dyn StructureProcessor>) -> Self {
        self.processors.push(processor);
        self
    }

    /// Sets the flags used for final state writes.
    pub fn with_update_flags(mut self, flags: UpdateFlags) -> Self {
        self.update_flags = flags;
        self
    }

    /// Runs `f` with the random source for `pos`.
    ///
    /// The caller supplied source is shared across positions and advances
    /// with every use; without one, each call gets a fresh generator seeded
    /// from `pos`.
    pub fn random_for<R>(&self, pos: Point3<i32>, f: impl FnOnce(&mut fastrand::Rng) -> R) -> R {
        match &self.random {
            Some(rng) => f(&mut rng.borrow_mut()),
            None => f(&mut fastrand::Rng::with_seed(position_seed(pos))),
        }
    }
}

/// A processor entry of a [`PlacementConfig`]: the registered type name plus
/// whatever options that type takes, side by side in one JSON object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProcessorConfig {
    /// Registered processor type
    #[serde(rename = "type")]
    pub kind: String,

    /// Options handed to the factory
    #[serde(flatten)]
    pub options: Map<String, Value>,
}

/// JSON-loadable description of a placement.
///
/// # Examples
///
/// ```
/// use voxel_structures::structure::processor::registry::ProcessorRegistry;
/// use voxel_structures::structure::settings::PlacementConfig;
///
/// let config = PlacementConfig::from_json(r#"{
///     "rotation": "clockwise90",
///     "pivot": [1, 0, 1],
///     "processors": [{ "type": "block_ignore", "blocks": ["structure_void"] }]
/// }"#).unwrap();
///
/// let settings = config.resolve(&ProcessorRegistry::with_builtins()).unwrap();
/// assert_eq!(settings.processors.len(), 1);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Reflection
    pub mirror: Mirror,
    /// Rotation
    pub rotation: Rotation,
    /// Rotation pivot
    pub pivot: [i32; 3],
    /// Skip entities
    pub ignore_entities: bool,
    /// Output clip region
    pub clip_box: Option<BoundingBox>,
    /// Liquid handling
    pub liquid_mode: LiquidMode,
    /// Seed for a caller supplied random source
    pub seed: Option<u64>,
    /// Skip shape reconciliation
    pub known_shape: bool,
    /// Finalize finalizable entities
    pub finalize_entities: bool,
    /// Processor chain
    pub processors: Vec<ProcessorConfig>,
    /// Raw update flags for final writes
    pub update_flags: Option<u32>,
}

impl PlacementConfig {
    /// Parses a configuration from JSON text.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Builds settings, instantiating every processor through `registry`.
    pub fn resolve(&self, registry: &ProcessorRegistry) -> Result<PlacementSettings, RegistryError> {
        let mut settings = PlacementSettings::new()
            .with_mirror(self.mirror)
            .with_rotation(self.rotation)
            .with_pivot(Point3::new(self.pivot[0], self.pivot[1], self.pivot[2]))
            .ignore_entities(self.ignore_entities)
            .with_liquid_mode(self.liquid_mode)
            .known_shape(self.known_shape)
            .finalize_entities(self.finalize_entities);

        if let Some(clip_box) = self.clip_box {
            settings = settings.with_clip_box(clip_box);
        }
        if let Some(seed) = self.seed {
            settings = settings.with_random(fastrand::Rng::with_seed(seed));
        }
        if let Some(flags) = self.update_flags {
            settings = settings.with_update_flags(UpdateFlags(flags));
        }
        for processor in &self.processors {
            let options = Value::Object(processor.options.clone());
            settings = settings.add_processor(registry.create(&processor.kind, &options)?);
        }
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_seed_is_deterministic() {
        let pos = Point3::new(12, 64, -340);
        assert_eq!(position_seed(pos), position_seed(pos));
        assert_ne!(position_seed(pos), position_seed(Point3::new(13, 64, -340)));
    }

    #[test]
    fn test_default_random_depends_only_on_position() {
        let settings = PlacementSettings::new();
        let pos = Point3::new(5, 0, 9);
        let a = settings.random_for(pos, |rng| rng.u64(..));
        let b = settings.random_for(pos, |rng| rng.u64(..));
        assert_eq!(a, b);
    }

    #[test]
    fn test_supplied_random_advances() {
        let settings = PlacementSettings::new().with_random(fastrand::Rng::with_seed(7));
        let pos = Point3::new(0, 0, 0);
        let a = settings.random_for(pos, |rng| rng.u64(..));
        let b = settings.random_for(pos, |rng| rng.u64(..));
        assert_ne!(a, b);
    }

    #[test]
    fn test_config_resolves_fields() {
        let config = PlacementConfig::from_json(
            r#"{
                "mirror": "left_right",
                "rotation": "clockwise180",
                "pivot": [2, 0, 3],
                "ignore_entities": true,
                "clip_box": { "min": [0, 0, 0], "max": [4, 4, 4] },
                "liquid_mode": "ignore",
                "seed": 99,
                "update_flags": 3
            }"#,
        )
        .unwrap();
        let settings = config.resolve(&ProcessorRegistry::with_builtins()).unwrap();

        assert_eq!(settings.mirror, Mirror::LeftRight);
        assert_eq!(settings.rotation, Rotation::Clockwise180);
        assert_eq!(settings.pivot, Point3::new(2, 0, 3));
        assert!(settings.ignore_entities);
        assert_eq!(settings.liquid_mode, LiquidMode::Ignore);
        assert!(settings.random.is_some());
        assert_eq!(settings.update_flags, UpdateFlags(3));
        assert!(settings.clip_box.is_some());
    }

    #[test]
    fn test_config_rejects_unknown_processor() {
        let config = PlacementConfig::from_json(r#"{ "processors": [{ "type": "teleport" }] }"#).unwrap();
        let result = config.resolve(&ProcessorRegistry::with_builtins());
        assert!(matches!(result, Err(RegistryError::UnknownProcessor(name)) if name == "teleport"));
    }
}
