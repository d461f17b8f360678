//! The resolved identity of a connected device.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use super::DeviceCatalog;
use crate::error::{CatalogError, Result};

/// What identification pinned to a session.
///
/// Built once when the session connects and immutable for its lifetime.
/// The catalog name and the identifiers serialize, so callers can persist
/// identification results across runs; the resolved catalog itself is
/// runtime state and is re-attached with [`DeviceProfile::resolve`] after
/// deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceProfile {
    /// Name of the selected catalog, `None` when identification fell back
    /// to generic prompt matching.
    pub catalog: Option<String>,

    /// Identification tokens, in pattern declaration order.
    pub identifiers: IndexSet<String>,

    /// The selected catalog, resolved at identification time.
    #[serde(skip)]
    active: Option<DeviceCatalog>,
}

impl DeviceProfile {
    /// The fallback profile: no identity, generic prompt matching only,
    /// no pagination handling, no error detection.
    pub fn generic() -> Self {
        Self::default()
    }

    /// A profile pinned to a catalog, with the tokens that matched.
    pub fn identified(catalog: DeviceCatalog, identifiers: IndexSet<String>) -> Self {
        Self {
            catalog: Some(catalog.name.clone()),
            identifiers,
            active: Some(catalog),
        }
    }

    /// Whether identification selected a catalog.
    pub fn is_identified(&self) -> bool {
        self.active.is_some()
    }

    /// The active catalog, when identification selected one.
    pub fn active(&self) -> Option<&DeviceCatalog> {
        self.active.as_ref()
    }

    /// Re-attach the named catalog from a registry.
    ///
    /// Deserialized profiles carry the catalog name but not the catalog;
    /// this looks it up again. A profile with no catalog name resolves to
    /// itself unchanged.
    pub fn resolve(&mut self, registry: &super::CatalogRegistry) -> Result<()> {
        if let Some(name) = &self.catalog {
            let catalog = registry.get(name).cloned().ok_or(CatalogError::Unknown {
                name: name.clone(),
            })?;
            self.active = Some(catalog);
        }
        Ok(())
    }
}
