//! # Capped Processor
//!
//! Bounds how many records a wrapped processor may change in one placement.
//!
//! The per-record phase lets every record through untouched. In the finalize
//! phase the survivor indices are shuffled with a generator seeded from the
//! placement origin, and the delegate is run on them in that order until it
//! has changed `limit` records. Records the delegate leaves alone, or tries
//! to drop, do not count toward the limit and keep their current value: a
//! finalize step cannot shorten the list.

use std::sync::Arc;

use log::warn;
use serde::Deserialize;
use serde_json::Value;

use super::{registry::ProcessorRegistry, ProcessorContext, StructureProcessor};
use crate::error::{ProcessorError, RegistryError};
use crate::structure::{palette::BlockRecord, settings::position_seed};

/// Applies `delegate` to at most `limit` randomly chosen records.
#[derive(Clone)]
pub struct CappedProcessor {
    delegate: Arc<dyn StructureProcessor>,
    limit: usize,
    seed: u64,
}

#[derive(Deserialize)]
struct CappedConfig {
    delegate: Value,
    limit: usize,
    #[serde(default)]
    seed: u64,
}

impl CappedProcessor {
    /// Registered type name.
    pub const TYPE_NAME: &'static str = "capped";

    /// Wraps `delegate`.
    pub fn new(delegate: Arc<dyn StructureProcessor>, limit: usize) -> Self {
        CappedProcessor {
            delegate,
            limit,
            seed: 0,
        }
    }

    /// Mixes `seed` into the origin-derived shuffle seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Builds the processor from `{ "delegate": {"type": ...}, "limit": n, "seed": s }`,
    /// resolving the delegate through `registry`.
    pub fn from_config(registry: &ProcessorRegistry, config: &Value) -> Result<Self, RegistryError> {
        let config = CappedConfig::deserialize(config).map_err(|source| RegistryError::InvalidConfig {
            name: Self::TYPE_NAME.to_string(),
            source,
        })?;
        let delegate = registry.create_from_value(&config.delegate)?;
        Ok(CappedProcessor::new(delegate, config.limit).with_seed(config.seed))
    }
}

impl StructureProcessor for CappedProcessor {
    fn name(&self) -> &str {
        Self::TYPE_NAME
    }

    fn process_block(
        &self,
        _ctx: &ProcessorContext<'_>,
        _original: &BlockRecord,
        current: BlockRecord,
    ) -> Result<Option<BlockRecord>, ProcessorError> {
        Ok(Some(current))
    }

    fn finalize(
        &self,
        ctx: &ProcessorContext<'_>,
        originals: &[BlockRecord],
        processed: &[BlockRecord],
    ) -> Result<Option<Vec<BlockRecord>>, ProcessorError> {
        if originals.len() != processed.len() {
            warn!(
                "{} given {} originals for {} records, leaving them unchanged",
                Self::TYPE_NAME,
                originals.len(),
                processed.len()
            );
            return Ok(None);
        }
        if self.limit == 0 || processed.is_empty() {
            return Ok(None);
        }

        let mut rng = fastrand::Rng::with_seed(position_seed(ctx.origin) ^ self.seed);
        let mut order: Vec<usize> = (0..processed.len()).collect();
        rng.shuffle(&mut order);

        let mut result = processed.to_vec();
        let mut changed = 0;
        for index in order {
            if changed >= self.limit {
                break;
            }
            let current = &processed[index];
            let Some(rewritten) = self
                .delegate
                .process_block(ctx, &originals[index], current.clone())?
            else {
                continue;
            };
            if &rewritten != current {
                result[index] = rewritten;
                changed += 1;
            }
        }
        Ok(Some(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::{
        processor::weathering::{WeatheringProcessor, WeatheringRule},
        settings::PlacementSettings,
    };
    use crate::voxels::{block::BlockState, world::World};
    use cgmath::Point3;

    fn bricks(count: i32) -> Vec<BlockRecord> {
        (0..count)
            .map(|x| BlockRecord::new(Point3::new(x, 0, 0), BlockState::new("stone_bricks"), None))
            .collect()
    }

    fn finalize_at(processor: &CappedProcessor, origin: Point3<i32>, records: &[BlockRecord]) -> Vec<BlockRecord> {
        let world = World::new();
        let settings = PlacementSettings::new();
        let ctx = ProcessorContext {
            grid: &world,
            origin,
            pivot: Point3::new(0, 0, 0),
            settings: &settings,
        };
        processor
            .finalize(&ctx, records, records)
            .unwrap()
            .expect("capped processor returns a list when it has work")
    }

    fn always_crack() -> Arc<dyn StructureProcessor> {
        Arc::new(WeatheringProcessor::with_rules(vec![WeatheringRule::new(
            "stone_bricks",
            ["cracked_stone_bricks"],
            1.0,
        )]))
    }

    #[test]
    fn test_changes_exactly_limit_records() {
        let records = bricks(20);
        let processor = CappedProcessor::new(always_crack(), 5);
        let result = finalize_at(&processor, Point3::new(0, 0, 0), &records);

        assert_eq!(result.len(), records.len());
        let cracked = result
            .iter()
            .filter(|r| r.state.name() == "cracked_stone_bricks")
            .count();
        assert_eq!(cracked, 5);
        for (before, after) in records.iter().zip(&result) {
            assert_eq!(before.pos, after.pos);
        }
    }

    #[test]
    fn test_selection_depends_on_origin_only() {
        let records = bricks(20);
        let processor = CappedProcessor::new(always_crack(), 3);
        let a = finalize_at(&processor, Point3::new(8, 0, 8), &records);
        let b = finalize_at(&processor, Point3::new(8, 0, 8), &records);
        assert_eq!(a, b);
    }

    #[test]
    fn test_limit_above_len_changes_everything() {
        let records = bricks(4);
        let processor = CappedProcessor::new(always_crack(), 10);
        let result = finalize_at(&processor, Point3::new(0, 0, 0), &records);
        assert!(result.iter().all(|r| r.state.name() == "cracked_stone_bricks"));
    }

    #[test]
    fn test_config_resolves_delegate() {
        let registry = ProcessorRegistry::with_builtins();
        let config = serde_json::json!({
            "delegate": { "type": "weathering", "mossiness": 0.2 },
            "limit": 4,
            "seed": 11
        });
        let processor = CappedProcessor::from_config(&registry, &config).unwrap();
        assert_eq!(processor.limit, 4);
        assert_eq!(processor.seed, 11);
        assert_eq!(processor.delegate.name(), "weathering");
    }

    #[test]
    fn test_misaligned_lists_are_left_alone() {
        let processor = CappedProcessor::new(always_crack(), 3);
        let world = World::new();
        let settings = PlacementSettings::new();
        let ctx = ProcessorContext {
            grid: &world,
            origin: Point3::new(0, 0, 0),
            pivot: Point3::new(0, 0, 0),
            settings: &settings,
        };
        assert_eq!(processor.finalize(&ctx, &bricks(2), &bricks(5)).unwrap(), None);
    }

    /// Drops records in even columns and cracks the rest.
    struct DropEvenColumns;

    impl StructureProcessor for DropEvenColumns {
        fn name(&self) -> &str {
            "drop_even_columns"
        }

        fn process_block(
            &self,
            _ctx: &ProcessorContext<'_>,
            _original: &BlockRecord,
            current: BlockRecord,
        ) -> Result<Option<BlockRecord>, ProcessorError> {
            if current.pos.x % 2 == 0 {
                Ok(None)
            } else {
                Ok(Some(current.with_state(BlockState::new("cracked_stone_bricks"))))
            }
        }
    }

    #[test]
    fn test_delegate_drops_are_ignored_and_not_counted() {
        let records = bricks(10);
        let processor = CappedProcessor::new(Arc::new(DropEvenColumns), 3);
        let result = finalize_at(&processor, Point3::new(4, 0, 4), &records);

        assert_eq!(result.len(), records.len());
        let cracked: Vec<i32> = result
            .iter()
            .filter(|r| r.state.name() == "cracked_stone_bricks")
            .map(|r| r.pos.x)
            .collect();
        assert_eq!(cracked.len(), 3);
        assert!(cracked.iter().all(|x| x % 2 == 1));
        for record in result.iter().filter(|r| r.pos.x % 2 == 0) {
            assert_eq!(record.state.name(), "stone_bricks");
        }
    }
}
