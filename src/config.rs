//! Engine configuration.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::catalog::{Catalog, Localizer};
use crate::error::CapaError;

/// Policy switches and catalog source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Recompute module enablement for privileged accounts when they log in.
    /// Off by default: those accounts are not tenant members and their storage may
    /// not be configured yet.
    pub recompute_privileged_on_login: bool,
    /// Drop capability names unknown to the catalog when a group is saved.
    /// Off by default; unknown names are kept and ignored during resolution.
    pub prune_unknown_capabilities_on_save: bool,
    /// JSON catalog file. The standard catalog is used when unset.
    pub catalog_path: Option<PathBuf>,
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self, CapaError> {
        serde_json::from_str(json).map_err(|e| CapaError::CatalogConfig(format!("engine config: {}", e)))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CapaError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| CapaError::CatalogConfig(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }

    /// Loads the catalog this configuration points at.
    pub fn load_catalog(&self, localizer: &dyn Localizer) -> Result<Catalog, CapaError> {
        match &self.catalog_path {
            Some(path) => Catalog::from_path(path, localizer),
            None => Catalog::standard(localizer),
        }
    }
}
