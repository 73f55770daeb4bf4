// src/registry.rs
//
// Name → constructor map. Factories group related indicators and register
// them in one call; the orchestrator builds only what the config names.

use crate::indicator::Indicator;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

pub type IndicatorCtor = Box<dyn Fn() -> Box<dyn Indicator> + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("indicator '{0}' is already registered")]
    Duplicate(String),
    #[error("no indicator registered under '{0}'")]
    NotFound(String),
}

/// A bundle of related indicators.
pub trait IndicatorFactory {
    fn name(&self) -> &'static str;

    /// Register every indicator this factory provides. Returns the
    /// registrations that were refused.
    fn register_all(&self, registry: &mut IndicatorRegistry) -> Vec<RegistryError>;
}

#[derive(Default)]
pub struct IndicatorRegistry {
    ctors: BTreeMap<String, IndicatorCtor>,
}

impl fmt::Debug for IndicatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndicatorRegistry")
            .field("names", &self.ctors.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl IndicatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// First registration of a name wins; later ones are refused.
    pub fn register<F>(&mut self, name: &str, ctor: F) -> Result<(), RegistryError>
    where
        F: Fn() -> Box<dyn Indicator> + Send + Sync + 'static,
    {
        if self.ctors.contains_key(name) {
            return Err(RegistryError::Duplicate(name.to_string()));
        }
        debug!("Registered indicator {}", name);
        self.ctors.insert(name.to_string(), Box::new(ctor));
        Ok(())
    }

    pub fn register_factory(&mut self, factory: &dyn IndicatorFactory) -> Vec<RegistryError> {
        let errors = factory.register_all(self);
        for e in &errors {
            warn!("⚠️  {}: {}", factory.name(), e);
        }
        errors
    }

    /// Fresh instance per call.
    pub fn build(&self, name: &str) -> Result<Box<dyn Indicator>, RegistryError> {
        self.ctors
            .get(name)
            .map(|ctor| ctor())
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.ctors.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.ctors.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ctors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ctors.is_empty()
    }
}
