//! Driver registry.
//!
//! Built once at startup with [`DriverRegistryBuilder`], then frozen; the
//! frozen registry is cheap to clone and only ever read.

use std::collections::HashMap;
use std::sync::Arc;

use crate::driver::{Driver, DriverDeps};
use crate::error::{DriveError, Result};

pub type DriverFactory = fn(DriverDeps) -> Arc<dyn Driver>;

#[derive(Default)]
pub struct DriverRegistryBuilder {
    factories: HashMap<&'static str, DriverFactory>,
}

impl DriverRegistryBuilder {
    /// Registers a provider type; a later registration under the same name
    /// replaces the earlier one.
    pub fn register(mut self, name: &'static str, factory: DriverFactory) -> Self {
        self.factories.insert(name, factory);
        self
    }

    pub fn build(self) -> DriverRegistry {
        DriverRegistry {
            factories: Arc::new(self.factories),
        }
    }
}

#[derive(Clone, Default)]
pub struct DriverRegistry {
    factories: Arc<HashMap<&'static str, DriverFactory>>,
}

impl DriverRegistry {
    pub fn builder() -> DriverRegistryBuilder {
        DriverRegistryBuilder::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered provider types, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn create(&self, name: &str, deps: DriverDeps) -> Result<Arc<dyn Driver>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| DriveError::UnknownDriver(name.to_string()))?;
        Ok(factory(deps))
    }
}

impl std::fmt::Debug for DriverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverRegistry")
            .field("drivers", &self.names())
            .finish()
    }
}
