//! # Weathering Processor
//!
//! Replaces blocks with "aged" variants at random. Either driven by explicit
//! rules, or, when none are given, by the built-in aging table:
//!
//! | Category           | Chance           | Result                          |
//! |--------------------|------------------|---------------------------------|
//! | full stone blocks  | 0.5              | mossy or cracked stone bricks   |
//! | stone-like stairs  | 0.5              | mossy stairs, same orientation  |
//! | stone-like walls   | `mossiness`      | mossy wall, same connections    |
//! | obsidian           | 0.15             | crying obsidian                 |
//!
//! Randomness comes from the placement's random source at the record's grid
//! position, so a default placement ages the same cells the same way every
//! time.

use phf::phf_map;
use serde::Deserialize;
use serde_json::Value;

use super::{ProcessorContext, StructureProcessor};
use crate::error::ProcessorError;
use crate::structure::palette::BlockRecord;
use crate::voxels::block::BlockState;

/// Chance a full stone block ages.
const FULL_BLOCK_CHANCE: f32 = 0.5;
/// Chance stone stairs age.
const STAIRS_CHANCE: f32 = 0.5;
/// Chance obsidian starts crying.
const OBSIDIAN_CHANCE: f32 = 0.15;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum AgingCategory {
    FullBlock,
    Stairs,
    Wall,
    Obsidian,
}

static AGING_CATEGORIES: phf::Map<&'static str, AgingCategory> = phf_map! {
    "stone" => AgingCategory::FullBlock,
    "stone_bricks" => AgingCategory::FullBlock,
    "chiseled_stone_bricks" => AgingCategory::FullBlock,
    "stone_brick_stairs" => AgingCategory::Stairs,
    "cobblestone_stairs" => AgingCategory::Stairs,
    "stone_brick_wall" => AgingCategory::Wall,
    "cobblestone_wall" => AgingCategory::Wall,
    "obsidian" => AgingCategory::Obsidian,
};

/// One explicit substitution.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct WeatheringRule {
    /// Block name the rule applies to
    pub from: String,
    /// Candidate replacements, picked uniformly
    pub to: Vec<String>,
    /// Chance the substitution happens, in `[0, 1]`
    pub probability: f32,
}

impl WeatheringRule {
    /// Creates a rule.
    pub fn new<S: Into<String>>(
        from: impl Into<String>,
        to: impl IntoIterator<Item = S>,
        probability: f32,
    ) -> Self {
        WeatheringRule {
            from: from.into(),
            to: to.into_iter().map(Into::into).collect(),
            probability,
        }
    }
}

#[derive(Deserialize)]
#[serde(default)]
struct WeatheringConfig {
    rules: Vec<WeatheringRule>,
    mossiness: f32,
}

impl Default for WeatheringConfig {
    fn default() -> Self {
        WeatheringConfig {
            rules: Vec::new(),
            mossiness: 0.5,
        }
    }
}

/// Probabilistic aging substitution.
#[derive(Clone, Debug)]
pub struct WeatheringProcessor {
    rules: Vec<WeatheringRule>,
    mossiness: f32,
}

impl WeatheringProcessor {
    /// Registered type name.
    pub const TYPE_NAME: &'static str = "weathering";

    /// Uses the built-in aging table.
    pub fn aging(mossiness: f32) -> Self {
        WeatheringProcessor {
            rules: Vec::new(),
            mossiness,
        }
    }

    /// Uses explicit rules only.
    pub fn with_rules(rules: Vec<WeatheringRule>) -> Self {
        WeatheringProcessor {
            rules,
            mossiness: 0.0,
        }
    }

    /// Builds the processor from `{ "rules": [...], "mossiness": f }`.
    pub fn from_config(config: &Value) -> Result<Self, serde_json::Error> {
        let config = WeatheringConfig::deserialize(config)?;
        Ok(WeatheringProcessor {
            rules: config.rules,
            mossiness: config.mossiness,
        })
    }

    fn apply_rules(&self, state: &BlockState, rng: &mut fastrand::Rng) -> Option<BlockState> {
        let rule = self.rules.iter().find(|rule| rule.from == state.name())?;
        if rule.to.is_empty() || rng.f32() >= rule.probability {
            return None;
        }
        let target = &rule.to[rng.usize(0..rule.to.len())];
        Some(BlockState::from_parts(target.clone(), state.properties().clone()))
    }

    fn age(&self, state: &BlockState, rng: &mut fastrand::Rng) -> Option<BlockState> {
        let mossy = || BlockState::from_parts(format!("mossy_{}", state.name()), state.properties().clone());
        match AGING_CATEGORIES.get(state.name())? {
            AgingCategory::FullBlock => {
                if rng.f32() >= FULL_BLOCK_CHANCE {
                    return None;
                }
                if rng.f32() < self.mossiness {
                    Some(BlockState::new("mossy_stone_bricks"))
                } else {
                    Some(BlockState::new("cracked_stone_bricks"))
                }
            }
            AgingCategory::Stairs => (rng.f32() < STAIRS_CHANCE).then(mossy),
            AgingCategory::Wall => (rng.f32() < self.mossiness).then(mossy),
            AgingCategory::Obsidian => {
                (rng.f32() < OBSIDIAN_CHANCE).then(|| BlockState::new("crying_obsidian"))
            }
        }
    }
}

impl StructureProcessor for WeatheringProcessor {
    fn name(&self) -> &str {
        Self::TYPE_NAME
    }

    fn process_block(
        &self,
        ctx: &ProcessorContext<'_>,
        _original: &BlockRecord,
        current: BlockRecord,
    ) -> Result<Option<BlockRecord>, ProcessorError> {
        let replacement = ctx.settings.random_for(current.pos, |rng| {
            if self.rules.is_empty() {
                self.age(&current.state, rng)
            } else {
                self.apply_rules(&current.state, rng)
            }
        });
        Ok(Some(match replacement {
            Some(state) => current.with_state(state),
            None => current,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::settings::PlacementSettings;
    use crate::voxels::world::World;
    use cgmath::Point3;

    fn run(processor: &WeatheringProcessor, record: BlockRecord) -> BlockRecord {
        let world = World::new();
        let settings = PlacementSettings::new();
        let ctx = ProcessorContext {
            grid: &world,
            origin: Point3::new(0, 0, 0),
            pivot: Point3::new(0, 0, 0),
            settings: &settings,
        };
        processor
            .process_block(&ctx, &record, record.clone())
            .unwrap()
            .expect("weathering never drops")
    }

    #[test]
    fn test_certain_rule_always_applies_and_keeps_properties() {
        let processor =
            WeatheringProcessor::with_rules(vec![WeatheringRule::new("oak_stairs", ["spruce_stairs"], 1.0)]);
        let record = BlockRecord::new(
            Point3::new(3, 1, 4),
            "oak_stairs[facing=west]".parse().unwrap(),
            None,
        );
        let aged = run(&processor, record);
        assert_eq!(aged.state.to_string(), "spruce_stairs[facing=west]");
    }

    #[test]
    fn test_impossible_rule_never_applies() {
        let processor = WeatheringProcessor::with_rules(vec![WeatheringRule::new("stone", ["gravel"], 0.0)]);
        for x in 0..32 {
            let record = BlockRecord::new(Point3::new(x, 0, 0), BlockState::new("stone"), None);
            assert_eq!(run(&processor, record).state.name(), "stone");
        }
    }

    #[test]
    fn test_default_aging_is_deterministic_per_position() {
        let processor = WeatheringProcessor::aging(0.5);
        let mut aged = 0;
        for x in 0..64 {
            let record = BlockRecord::new(Point3::new(x, 0, 0), BlockState::new("stone_bricks"), None);
            let first = run(&processor, record.clone());
            let second = run(&processor, record);
            assert_eq!(first, second);
            if first.state.name() != "stone_bricks" {
                assert!(matches!(
                    first.state.name(),
                    "mossy_stone_bricks" | "cracked_stone_bricks"
                ));
                aged += 1;
            }
        }
        assert!(aged > 0 && aged < 64, "expected some but not all bricks to age, got {aged}");
    }

    #[test]
    fn test_unlisted_blocks_untouched() {
        let processor = WeatheringProcessor::aging(1.0);
        let record = BlockRecord::new(Point3::new(0, 0, 0), BlockState::new("oak_planks"), None);
        assert_eq!(run(&processor, record.clone()), record);
    }

    #[test]
    fn test_config_defaults() {
        let processor = WeatheringProcessor::from_config(&serde_json::json!({})).unwrap();
        assert!(processor.rules.is_empty());
        assert_eq!(processor.mossiness, 0.5);
    }
}
