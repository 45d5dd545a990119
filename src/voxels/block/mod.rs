//! # Block Module
//!
//! This module provides the block-level vocabulary shared by the grid and the
//! structure engine: the immutable [`BlockState`] value, the six cell faces
//! and orientation operators in [`direction`], and per-cell [`fluid`] content.
//!
//! A block state is a block name plus a sorted set of string properties, e.g.
//! `oak_stairs[facing=north,half=bottom]`. States are compared and hashed by
//! value, and cloning one only bumps a reference count, so records can carry
//! them freely.

use std::{collections::BTreeMap, fmt, str::FromStr, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::error::StateParseError;

use direction::{Direction, Mirror, Rotation};
use fluid::{FluidKind, FluidState};

pub mod direction;
pub mod fluid;

/// Property holding a six-way facing.
pub const FACING_PROPERTY: &str = "facing";
/// Property holding an `x`/`y`/`z` axis.
pub const AXIS_PROPERTY: &str = "axis";
/// Property holding a 16-step heading.
pub const HEADING_PROPERTY: &str = "rotation";
/// Property marking a block as able to hold a water source.
pub const WATERLOGGED_PROPERTY: &str = "waterlogged";
/// Property holding a liquid level; `0` is a source.
pub const LEVEL_PROPERTY: &str = "level";
/// Property holding a stair-like corner shape.
pub const SHAPE_PROPERTY: &str = "shape";

/// Block names treated as empty space.
const AIR_NAMES: [&str; 3] = ["air", "cave_air", "void_air"];

#[derive(PartialEq, Eq, Hash, Debug)]
struct StateData {
    name: String,
    properties: BTreeMap<String, String>,
}

/// An immutable block configuration.
///
/// Equality and hashing are by value. Cloning is cheap because the data is
/// shared behind an [`Arc`].
///
/// # Examples
///
/// ```
/// use voxel_structures::voxels::block::BlockState;
/// use voxel_structures::voxels::block::direction::Rotation;
///
/// let stairs: BlockState = "oak_stairs[facing=north]".parse().unwrap();
/// let rotated = stairs.rotate(Rotation::Clockwise90);
/// assert_eq!(rotated.property("facing"), Some("east"));
/// ```
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "StateDescriptor", into = "StateDescriptor")]
pub struct BlockState {
    inner: Arc<StateData>,
}

/// Serialized form of a [`BlockState`]: a name and an optional property map.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateDescriptor {
    /// Block name
    #[serde(rename = "Name")]
    pub name: String,

    /// Block properties, omitted when empty
    #[serde(
        rename = "Properties",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub properties: BTreeMap<String, String>,
}

impl From<StateDescriptor> for BlockState {
    fn from(descriptor: StateDescriptor) -> Self {
        BlockState::from_parts(descriptor.name, descriptor.properties)
    }
}

impl From<BlockState> for StateDescriptor {
    fn from(state: BlockState) -> Self {
        StateDescriptor {
            name: state.inner.name.clone(),
            properties: state.inner.properties.clone(),
        }
    }
}

impl BlockState {
    /// Creates a property-less state for the named block.
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_parts(name.into(), BTreeMap::new())
    }

    /// Creates a state from a name and a complete property map.
    pub fn from_parts(name: String, properties: BTreeMap<String, String>) -> Self {
        BlockState {
            inner: Arc::new(StateData { name, properties }),
        }
    }

    /// The default empty-space state.
    pub fn air() -> Self {
        Self::new("air")
    }

    /// Returns a copy of this state with one property set.
    pub fn with_property(&self, key: &str, value: impl Into<String>) -> Self {
        let mut properties = self.inner.properties.clone();
        properties.insert(key.to_string(), value.into());
        Self::from_parts(self.inner.name.clone(), properties)
    }

    /// The block name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Looks up a property value.
    pub fn property(&self, key: &str) -> Option<&str> {
        self.inner.properties.get(key).map(String::as_str)
    }

    /// All properties in key order.
    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.inner.properties
    }

    /// Returns `true` for the empty-space blocks.
    pub fn is_air(&self) -> bool {
        AIR_NAMES.contains(&self.name())
    }

    /// Returns `true` if this block can hold a liquid source of its own.
    pub fn is_fluid_container(&self) -> bool {
        self.inner.properties.contains_key(WATERLOGGED_PROPERTY)
    }

    /// The fluid this state carries by itself.
    ///
    /// Liquid blocks report their own fluid (a `level` of `0` or no level is
    /// a source); waterlogged containers report a water source; everything
    /// else is dry.
    pub fn intrinsic_fluid(&self) -> FluidState {
        let kind = match self.name() {
            "water" => FluidKind::Water,
            "lava" => FluidKind::Lava,
            _ => {
                return if self.property(WATERLOGGED_PROPERTY) == Some("true") {
                    FluidState::source(FluidKind::Water)
                } else {
                    FluidState::EMPTY
                };
            }
        };
        match self.property(LEVEL_PROPERTY) {
            None | Some("0") => FluidState::source(kind),
            Some(_) => FluidState::flowing(kind),
        }
    }

    /// Returns this state turned by `rotation`.
    ///
    /// Rewrites `facing`, `axis`, the 16-step `rotation` heading and the
    /// horizontal connection flags (`north`, `east`, `south`, `west`). Other
    /// properties are copied as they are.
    pub fn rotate(&self, rotation: Rotation) -> BlockState {
        if rotation == Rotation::None {
            return self.clone();
        }
        let mut properties = self.inner.properties.clone();

        if let Some(dir) = self.property(FACING_PROPERTY).and_then(Direction::from_name) {
            properties.insert(FACING_PROPERTY.into(), dir.rotate(rotation).name().into());
        }
        if rotation.swaps_axes() {
            match self.property(AXIS_PROPERTY) {
                Some("x") => {
                    properties.insert(AXIS_PROPERTY.into(), "z".into());
                }
                Some("z") => {
                    properties.insert(AXIS_PROPERTY.into(), "x".into());
                }
                _ => {}
            }
        }
        if let Some(heading) = self.property(HEADING_PROPERTY).and_then(|h| h.parse::<u8>().ok()) {
            properties.insert(
                HEADING_PROPERTY.into(),
                rotation.rotate_heading16(heading).to_string(),
            );
        }
        Self::permute_connections(&mut properties, |dir| dir.rotate(rotation));

        Self::from_parts(self.inner.name.clone(), properties)
    }

    /// Returns this state reflected by `mirror`.
    ///
    /// Besides the properties handled by [`BlockState::rotate`], a reflection
    /// swaps handedness, so `left`/`right` in a stair-like `shape` trade places.
    pub fn mirror(&self, mirror: Mirror) -> BlockState {
        if !mirror.flips() {
            return self.clone();
        }
        let mut properties = self.inner.properties.clone();

        if let Some(dir) = self.property(FACING_PROPERTY).and_then(Direction::from_name) {
            properties.insert(FACING_PROPERTY.into(), dir.mirror(mirror).name().into());
        }
        if let Some(heading) = self.property(HEADING_PROPERTY).and_then(|h| h.parse::<u8>().ok()) {
            properties.insert(
                HEADING_PROPERTY.into(),
                mirror.mirror_heading16(heading).to_string(),
            );
        }
        if let Some(shape) = self.property(SHAPE_PROPERTY) {
            let swapped = if shape.ends_with("_left") {
                shape.replace("_left", "_right")
            } else if shape.ends_with("_right") {
                shape.replace("_right", "_left")
            } else {
                shape.to_string()
            };
            properties.insert(SHAPE_PROPERTY.into(), swapped);
        }
        Self::permute_connections(&mut properties, |dir| dir.mirror(mirror));

        Self::from_parts(self.inner.name.clone(), properties)
    }

    /// Moves the values stored under horizontal direction keys to the keys of
    /// their transformed directions.
    fn permute_connections(
        properties: &mut BTreeMap<String, String>,
        transform: impl Fn(Direction) -> Direction,
    ) {
        let connections: Vec<(Direction, String)> = Direction::horizontal()
            .into_iter()
            .filter_map(|dir| properties.remove(dir.name()).map(|value| (dir, value)))
            .collect();
        for (dir, value) in connections {
            properties.insert(transform(dir).name().into(), value);
        }
    }
}

impl fmt::Display for BlockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner.name)?;
        if !self.inner.properties.is_empty() {
            let joined: Vec<String> = self
                .inner
                .properties
                .iter()
                .map(|(key, value)| format!("{key}={value}"))
                .collect();
            write!(f, "[{}]", joined.join(","))?;
        }
        Ok(())
    }
}

impl fmt::Debug for BlockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockState({self})")
    }
}

/// Parses the `name[key=value,...]` notation produced by [`fmt::Display`].
impl FromStr for BlockState {
    type Err = StateParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let input = input.trim();
        let (name, rest) = match input.find('[') {
            Some(open) => (&input[..open], Some(&input[open + 1..])),
            None => (input, None),
        };
        if name.is_empty() {
            return Err(StateParseError::MissingName(input.to_string()));
        }

        let mut properties = BTreeMap::new();
        if let Some(rest) = rest {
            let body = rest
                .strip_suffix(']')
                .ok_or_else(|| StateParseError::UnclosedProperties(input.to_string()))?;
            for pair in body.split(',').filter(|pair| !pair.trim().is_empty()) {
                let (key, value) = pair
                    .split_once('=')
                    .ok_or_else(|| StateParseError::MalformedProperty(pair.to_string()))?;
                properties.insert(key.trim().to_string(), value.trim().to_string());
            }
        }

        Ok(BlockState::from_parts(name.to_string(), properties))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(text: &str) -> BlockState {
        text.parse().unwrap()
    }

    #[test]
    fn test_parse_and_display_agree() {
        let stairs = state("oak_stairs[half=bottom,facing=north]");
        assert_eq!(stairs.name(), "oak_stairs");
        assert_eq!(stairs.property("facing"), Some("north"));
        assert_eq!(stairs.to_string(), "oak_stairs[facing=north,half=bottom]");
        assert_eq!(state("stone").to_string(), "stone");
    }

    #[test]
    fn test_parse_errors() {
        assert!("[facing=north]".parse::<BlockState>().is_err());
        assert!("oak_stairs[facing=north".parse::<BlockState>().is_err());
        assert!("oak_stairs[facing]".parse::<BlockState>().is_err());
    }

    #[test]
    fn test_equality_is_by_value() {
        assert_eq!(state("stone"), BlockState::new("stone"));
        assert_eq!(
            state("lever[face=wall,facing=east]"),
            BlockState::new("lever")
                .with_property("facing", "east")
                .with_property("face", "wall")
        );
        assert_ne!(state("stone"), state("granite"));
    }

    #[test]
    fn test_rotate_facing_axis_and_heading() {
        let rotated = state("chest[facing=north]").rotate(Rotation::Clockwise90);
        assert_eq!(rotated.property("facing"), Some("east"));

        let log = state("oak_log[axis=x]");
        assert_eq!(log.rotate(Rotation::Counterclockwise90).property("axis"), Some("z"));
        assert_eq!(log.rotate(Rotation::Clockwise180).property("axis"), Some("x"));

        let sign = state("oak_sign[rotation=15]");
        assert_eq!(sign.rotate(Rotation::Clockwise90).property("rotation"), Some("3"));
    }

    #[test]
    fn test_rotate_permutes_connections() {
        let fence = state("oak_fence[east=false,north=true,south=false,west=false]");
        let rotated = fence.rotate(Rotation::Clockwise90);
        assert_eq!(rotated.property("east"), Some("true"));
        assert_eq!(rotated.property("north"), Some("false"));
    }

    #[test]
    fn test_mirror_swaps_handedness() {
        let stairs = state("oak_stairs[facing=east,shape=inner_left]");
        let mirrored = stairs.mirror(Mirror::FrontBack);
        assert_eq!(mirrored.property("facing"), Some("west"));
        assert_eq!(mirrored.property("shape"), Some("inner_right"));
        assert_eq!(mirrored.mirror(Mirror::FrontBack), stairs);
    }

    #[test]
    fn test_intrinsic_fluid() {
        assert!(state("water").intrinsic_fluid().is_source());
        assert!(state("water[level=0]").intrinsic_fluid().is_source());
        let flowing = state("water[level=3]").intrinsic_fluid();
        assert!(!flowing.is_source() && !flowing.is_empty());
        assert!(state("oak_slab[waterlogged=true]").intrinsic_fluid().is_source());
        assert!(state("oak_slab[waterlogged=false]").intrinsic_fluid().is_empty());
        assert!(state("stone").intrinsic_fluid().is_empty());
    }

    #[test]
    fn test_serde_descriptor_shape() {
        let json = serde_json::to_value(state("oak_log[axis=y]")).unwrap();
        assert_eq!(json["Name"], "oak_log");
        assert_eq!(json["Properties"]["axis"], "y");
        let plain = serde_json::to_value(state("stone")).unwrap();
        assert!(plain.get("Properties").is_none());
        let back: BlockState = serde_json::from_value(json).unwrap();
        assert_eq!(back, state("oak_log[axis=y]"));
    }
}
