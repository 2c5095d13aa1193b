//!
//! Capability catalog: the immutable mapping from capability name to the set of
//! product modules it grants.
//!
//! The catalog is built once per process from configuration and is read-only
//! afterwards. Display strings are resolved through a [`Localizer`] at load time and
//! are opaque to the resolution logic.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::CapaError;
use crate::types::{CapabilityName, ModuleName};

/// Resolves localization keys into display strings.
pub trait Localizer {
    fn translate(&self, key: &str) -> String;
}

/// Localizer that echoes the key back, used when no string table is wired in.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeyLocalizer;

impl Localizer for KeyLocalizer {
    fn translate(&self, key: &str) -> String {
        key.to_string()
    }
}

impl<F> Localizer for F
where
    F: Fn(&str) -> String,
{
    fn translate(&self, key: &str) -> String {
        self(key)
    }
}

/// One catalog entry as it appears in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CapabilityConfig {
    pub name: CapabilityName,
    pub display_name_lang_const: String,
    pub description_lang_const: String,
    #[serde(default)]
    pub modules: Vec<ModuleName>,
}

impl CapabilityConfig {
    pub fn new(name: &str, display_key: &str, description_key: &str, modules: &[&str]) -> Self {
        CapabilityConfig {
            name: name.to_string(),
            display_name_lang_const: display_key.to_string(),
            description_lang_const: description_key.to_string(),
            modules: modules.iter().map(|m| m.to_string()).collect(),
        }
    }
}

/// A loaded catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capability {
    pub name: CapabilityName,
    pub display_name: String,
    pub description: String,
    pub modules: BTreeSet<ModuleName>,
}

/// The capability catalog.
#[derive(Debug, Clone)]
pub struct Catalog {
    /// Entries in configuration order.
    capabilities: Vec<Capability>,
    /// Name → position in `capabilities`.
    index: HashMap<CapabilityName, usize>,
    /// Union of every entry's modules, computed once at load.
    all_modules: BTreeSet<ModuleName>,
}

/// Entries of the catalog shipped with the product.
pub fn standard_entries() -> Vec<CapabilityConfig> {
    vec![
        CapabilityConfig::new(
            "Mail",
            "LABEL_MAIL_CAPABILITY_NAME",
            "LABEL_MAIL_CAPABILITY_DESC",
            &["Mail", "MailDomains", "MailNotesPlugin"],
        ),
        CapabilityConfig::new(
            "Files",
            "LABEL_FILES_CAPABILITY_NAME",
            "LABEL_FILES_CAPABILITY_DESC",
            &["Files", "FilesZipFolder"],
        ),
        CapabilityConfig::new(
            "Contacts",
            "LABEL_CONTACTS_CAPABILITY_NAME",
            "LABEL_CONTACTS_CAPABILITY_DESC",
            &["Contacts"],
        ),
    ]
}

impl Catalog {
    /// Builds a catalog from an ordered list of configuration entries.
    ///
    /// # Errors
    /// * [`CapaError::DuplicateCapability`] if two entries share a name.
    /// * [`CapaError::CatalogConfig`] if an entry has an empty name.
    pub fn load(entries: Vec<CapabilityConfig>, localizer: &dyn Localizer) -> Result<Self, CapaError> {
        let mut capabilities = Vec::with_capacity(entries.len());
        let mut index = HashMap::with_capacity(entries.len());
        let mut all_modules = BTreeSet::new();

        for entry in entries {
            if entry.name.trim().is_empty() {
                return Err(CapaError::CatalogConfig("capability name must not be empty".into()));
            }
            if index.contains_key(&entry.name) {
                return Err(CapaError::DuplicateCapability(entry.name));
            }

            let modules: BTreeSet<ModuleName> = entry.modules.into_iter().collect();
            all_modules.extend(modules.iter().cloned());

            index.insert(entry.name.clone(), capabilities.len());
            capabilities.push(Capability {
                display_name: localizer.translate(&entry.display_name_lang_const),
                description: localizer.translate(&entry.description_lang_const),
                name: entry.name,
                modules,
            });
        }

        tracing::debug!(
            capabilities = capabilities.len(),
            modules = all_modules.len(),
            "capability catalog loaded"
        );

        Ok(Catalog { capabilities, index, all_modules })
    }

    /// The catalog shipped with the product (Mail, Files, Contacts).
    pub fn standard(localizer: &dyn Localizer) -> Result<Self, CapaError> {
        Self::load(standard_entries(), localizer)
    }

    /// Parses a JSON array of `{Name, DisplayNameLangConst, DescriptionLangConst, Modules}`.
    pub fn from_json_str(json: &str, localizer: &dyn Localizer) -> Result<Self, CapaError> {
        let entries: Vec<CapabilityConfig> =
            serde_json::from_str(json).map_err(|e| CapaError::CatalogConfig(e.to_string()))?;
        Self::load(entries, localizer)
    }

    /// Reads and parses a catalog file.
    pub fn from_path(path: impl AsRef<Path>, localizer: &dyn Localizer) -> Result<Self, CapaError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| CapaError::CatalogConfig(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&json, localizer)
    }

    pub fn get(&self, name: &str) -> Option<&Capability> {
        self.index.get(name).map(|&i| &self.capabilities[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Entries in configuration order.
    pub fn capabilities(&self) -> impl Iterator<Item = &Capability> {
        self.capabilities.iter()
    }

    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }

    /// Every module referenced by at least one capability.
    pub fn all_modules(&self) -> &BTreeSet<ModuleName> {
        &self.all_modules
    }

    /// Union of the modules granted by `names`. Unknown names contribute nothing.
    pub fn modules_for<'a, I>(&self, names: I) -> BTreeSet<ModuleName>
    where
        I: IntoIterator<Item = &'a str>,
    {
        names
            .into_iter()
            .filter_map(|name| self.get(name))
            .flat_map(|capa| capa.modules.iter().cloned())
            .collect()
    }

    /// Keeps only names present in the catalog, preserving order.
    pub fn retain_known(&self, names: Vec<CapabilityName>) -> Vec<CapabilityName> {
        names.into_iter().filter(|n| self.contains(n)).collect()
    }

    /// Catalog metadata as exposed to administrators.
    pub fn settings(&self) -> CatalogSettings<'_> {
        CatalogSettings { catalog: self }
    }
}

/// Serializable view of the catalog:
/// `{"Capabilities": {"<Name>": {"Name", "Description", "Modules"}}}` in catalog order.
#[derive(Debug, Clone, Copy)]
pub struct CatalogSettings<'a> {
    catalog: &'a Catalog,
}

struct CapabilityView<'a>(&'a Capability);

impl Serialize for CapabilityView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Capability", 3)?;
        s.serialize_field("Name", &self.0.display_name)?;
        s.serialize_field("Description", &self.0.description)?;
        s.serialize_field("Modules", &self.0.modules)?;
        s.end()
    }
}

struct CapabilityMap<'a>(&'a Catalog);

impl Serialize for CapabilityMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for capa in self.0.capabilities() {
            map.serialize_entry(&capa.name, &CapabilityView(capa))?;
        }
        map.end()
    }
}

impl Serialize for CatalogSettings<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("CatalogSettings", 1)?;
        s.serialize_field("Capabilities", &CapabilityMap(self.catalog))?;
        s.end()
    }
}
