#![no_main]

// Harness: catalog_load – arbitrary configuration text either loads or errors.
// A loaded catalog must satisfy: all_modules == union of every entry's modules.

use libfuzzer_sys::fuzz_target;
use std::collections::BTreeSet;

use capa_core::{Catalog, KeyLocalizer};

fuzz_target!(|json: String| {
    if let Ok(catalog) = Catalog::from_json_str(&json, &KeyLocalizer) {
        let union: BTreeSet<String> = catalog
            .capabilities()
            .flat_map(|c| c.modules.iter().cloned())
            .collect();
        assert_eq!(&union, catalog.all_modules());

        let names: Vec<&str> = catalog.capabilities().map(|c| c.name.as_str()).collect();
        assert_eq!(catalog.modules_for(names), union);
    }
});
