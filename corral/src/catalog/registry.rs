//! Global catalog registry for looking up device catalogs.

use std::sync::RwLock;

use indexmap::IndexMap;
use once_cell::sync::Lazy;

use super::vendors;
use super::DeviceCatalog;
use crate::error::{CatalogError, Result};

/// Global catalog registry.
static REGISTRY: Lazy<RwLock<CatalogRegistry>> = Lazy::new(|| {
    let mut registry = CatalogRegistry::new();
    registry.register_builtin_catalogs();
    RwLock::new(registry)
});

/// Registry for device catalogs.
///
/// Catalogs are kept in registration order. Identification scans them in
/// that order and breaks score ties in favor of the earlier entry, so
/// built-ins stay predictable and custom catalogs slot in after them.
#[derive(Debug, Default)]
pub struct CatalogRegistry {
    catalogs: IndexMap<String, DeviceCatalog>,
}

impl CatalogRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            catalogs: IndexMap::new(),
        }
    }

    /// Get the global registry.
    pub fn global() -> &'static RwLock<CatalogRegistry> {
        &REGISTRY
    }

    /// Register built-in catalogs.
    fn register_builtin_catalogs(&mut self) {
        for catalog in [
            vendors::cisco_ios::catalog(),
            vendors::cisco_nxos::catalog(),
            vendors::cisco_asa::catalog(),
            vendors::arista_eos::catalog(),
        ] {
            self.catalogs.insert(catalog.name.clone(), catalog);
        }
    }

    /// Register a device catalog.
    pub fn register(&mut self, catalog: DeviceCatalog) -> Result<()> {
        if self.catalogs.contains_key(&catalog.name) {
            return Err(CatalogError::AlreadyRegistered {
                name: catalog.name.clone(),
            }
            .into());
        }
        self.catalogs.insert(catalog.name.clone(), catalog);
        Ok(())
    }

    /// Get a catalog by name.
    pub fn get(&self, name: &str) -> Option<&DeviceCatalog> {
        self.catalogs.get(name)
    }

    /// Check if a catalog is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.catalogs.contains_key(name)
    }

    /// List all registered catalog names.
    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.catalogs.keys()
    }

    /// Iterate over catalogs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &DeviceCatalog> {
        self.catalogs.values()
    }
}
