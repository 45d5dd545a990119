//! # Processor Registry
//!
//! An explicit table from processor type names to factories. Registries are
//! built by the caller and passed where configuration is resolved; there is
//! no global registry.
//!
//! ```
//! use std::sync::Arc;
//! use voxel_structures::structure::processor::{gravity::GravityProcessor, registry::ProcessorRegistry};
//!
//! let mut registry = ProcessorRegistry::with_builtins();
//! registry.register("sink", |_registry, _config| Ok(Arc::new(GravityProcessor::new(-3))));
//!
//! let processor = registry.create("sink", &serde_json::Value::Null).unwrap();
//! assert_eq!(processor.name(), "gravity");
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use super::{
    block_ignore::BlockIgnoreProcessor, capped::CappedProcessor, gravity::GravityProcessor,
    weathering::WeatheringProcessor, StructureProcessor,
};
use crate::error::RegistryError;

/// Builds a processor from its JSON options. Receives the registry so that
/// wrapping processors can resolve their delegates.
pub type ProcessorFactory = Arc<
    dyn Fn(&ProcessorRegistry, &Value) -> Result<Arc<dyn StructureProcessor>, RegistryError>
        + Send
        + Sync,
>;

/// Type name to factory table.
#[derive(Clone, Default)]
pub struct ProcessorRegistry {
    factories: HashMap<String, ProcessorFactory>,
}

fn invalid(name: &str) -> impl FnOnce(serde_json::Error) -> RegistryError + '_ {
    move |source| RegistryError::InvalidConfig {
        name: name.to_string(),
        source,
    }
}

impl ProcessorRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the four built-in processors.
    pub fn with_builtins() -> Self {
        let mut registry = ProcessorRegistry::new();
        registry.register(BlockIgnoreProcessor::TYPE_NAME, |_, config| {
            let processor = BlockIgnoreProcessor::from_config(config)
                .map_err(invalid(BlockIgnoreProcessor::TYPE_NAME))?;
            Ok(Arc::new(processor))
        });
        registry.register(WeatheringProcessor::TYPE_NAME, |_, config| {
            let processor = WeatheringProcessor::from_config(config)
                .map_err(invalid(WeatheringProcessor::TYPE_NAME))?;
            Ok(Arc::new(processor))
        });
        registry.register(GravityProcessor::TYPE_NAME, |_, config| {
            let processor =
                GravityProcessor::from_config(config).map_err(invalid(GravityProcessor::TYPE_NAME))?;
            Ok(Arc::new(processor))
        });
        registry.register(CappedProcessor::TYPE_NAME, |registry, config| {
            Ok(Arc::new(CappedProcessor::from_config(registry, config)?))
        });
        registry
    }

    /// Registers `factory` under `name`, replacing any previous entry.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&ProcessorRegistry, &Value) -> Result<Arc<dyn StructureProcessor>, RegistryError>
            + Send
            + Sync
            + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
    }

    /// Returns `true` if a factory is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Instantiates the processor registered under `name`.
    pub fn create(&self, name: &str, config: &Value) -> Result<Arc<dyn StructureProcessor>, RegistryError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| RegistryError::UnknownProcessor(name.to_string()))?;
        factory(self, config)
    }

    /// Instantiates a processor from an object carrying its name under `"type"`
    /// next to its options.
    pub fn create_from_value(&self, value: &Value) -> Result<Arc<dyn StructureProcessor>, RegistryError> {
        let name = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| RegistryError::UnknownProcessor(value.to_string()))?;
        self.create(name, value)
    }
}
