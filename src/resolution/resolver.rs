//! Capability resolution: a user's groups to the module patch to apply.

use std::collections::{BTreeMap, BTreeSet};

use crate::catalog::Catalog;
use crate::error::CapaError;
use crate::resolution::cache::GroupCapabilityCache;
use crate::types::{CapabilityName, GroupId, ModuleName};

/// Desired enablement for every module the catalog knows about.
///
/// A patch always covers exactly [`Catalog::all_modules`]; modules outside the
/// catalog are never part of it and are left alone when the patch is applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ModulePatch(BTreeMap<ModuleName, bool>);

impl ModulePatch {
    pub fn get(&self, module: &str) -> Option<bool> {
        self.0.get(module).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.0.iter().map(|(m, on)| (m.as_str(), *on))
    }

    /// Modules the patch switches on.
    pub fn enabled(&self) -> impl Iterator<Item = &str> {
        self.iter().filter(|(_, on)| *on).map(|(m, _)| m)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Union of the capability names held by `group_ids`, read through `cache`.
///
/// `loader` is only called for groups the cache has not seen in this batch.
pub fn resolve_capability_names<F>(
    group_ids: &[GroupId],
    cache: &mut GroupCapabilityCache,
    mut loader: F,
) -> Result<BTreeSet<CapabilityName>, CapaError>
where
    F: FnMut(GroupId) -> Result<Option<String>, CapaError>,
{
    let mut names = BTreeSet::new();
    for group in group_ids {
        let held = cache.get(*group, &mut loader)?;
        names.extend(held.iter().cloned());
    }
    Ok(names)
}

/// Expands capability names into a patch over every catalog module.
pub fn build_patch(catalog: &Catalog, capability_names: &BTreeSet<CapabilityName>) -> ModulePatch {
    let allowed = catalog.modules_for(capability_names.iter().map(String::as_str));
    ModulePatch(
        catalog
            .all_modules()
            .iter()
            .map(|module| (module.clone(), allowed.contains(module)))
            .collect(),
    )
}

/// Groups → capability names → module patch.
pub fn resolve_patch<F>(
    catalog: &Catalog,
    group_ids: &[GroupId],
    cache: &mut GroupCapabilityCache,
    loader: F,
) -> Result<ModulePatch, CapaError>
where
    F: FnMut(GroupId) -> Result<Option<String>, CapaError>,
{
    let names = resolve_capability_names(group_ids, cache, loader)?;
    Ok(build_patch(catalog, &names))
}
