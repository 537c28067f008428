//! Interface to the bulk remapping engine.
//!
//! The engine rewrites every reference to a renamed symbol inside the class
//! bytecode: declarations, call sites, field accesses, descriptors and signatures.
//! This crate hands it a [`RemapTable`] built from the finalized store and takes
//! back the first-pass archive, which is then reconciled.

use std::{collections::BTreeMap, path::PathBuf};

use crate::{
    descriptor::remap_descriptor,
    mapping::{split_field_key, split_method_key, MappingStore},
    rewrite::archive::Archive,
    Result,
};

/// The complete mapping table in the shape a remapping engine consumes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemapTable {
    classes: BTreeMap<String, String>,
    fields: BTreeMap<(String, String), String>,
    methods: BTreeMap<(String, String, String), String>,
}

impl RemapTable {
    /// Builds the table from a finalized store.
    #[must_use]
    pub fn from_store(store: &MappingStore) -> Self {
        let classes = store.class_mappings();

        let fields = store
            .field_mappings()
            .into_iter()
            .filter_map(|(key, obfuscated)| {
                let (owner, name) = split_field_key(&key)?;
                Some(((owner.to_string(), name.to_string()), obfuscated))
            })
            .collect();

        let methods = store
            .method_mappings()
            .into_iter()
            .filter_map(|(key, obfuscated)| {
                let (owner, name, descriptor) = split_method_key(&key)?;
                Some((
                    (owner.to_string(), name.to_string(), descriptor.to_string()),
                    obfuscated,
                ))
            })
            .collect();

        RemapTable {
            classes,
            fields,
            methods,
        }
    }

    /// New internal name of a class, if it was renamed.
    #[must_use]
    pub fn map_class(&self, class: &str) -> Option<&str> {
        self.classes.get(class).map(String::as_str)
    }

    /// New name of a field, if it was renamed.
    #[must_use]
    pub fn map_field(&self, owner: &str, name: &str) -> Option<&str> {
        self.fields
            .get(&(owner.to_string(), name.to_string()))
            .map(String::as_str)
    }

    /// New name of a method, if it was renamed. `descriptor` is in the original
    /// namespace.
    #[must_use]
    pub fn map_method(&self, owner: &str, name: &str, descriptor: &str) -> Option<&str> {
        self.methods
            .get(&(owner.to_string(), name.to_string(), descriptor.to_string()))
            .map(String::as_str)
    }

    /// Rewrites the class references of a descriptor into the obfuscated namespace.
    #[must_use]
    pub fn map_descriptor(&self, descriptor: &str) -> String {
        remap_descriptor(descriptor, |class| self.classes.get(class).cloned())
    }

    /// Class renames as `(original, obfuscated)` pairs, sorted by original name.
    pub fn classes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.classes
            .iter()
            .map(|(o, n)| (o.as_str(), n.as_str()))
    }

    /// Total number of renamed symbols.
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len() + self.fields.len() + self.methods.len()
    }

    /// Returns true if nothing is renamed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// First-pass result of a bulk remapping run.
#[derive(Debug, Clone, Default)]
pub struct RemapOutput {
    /// The remapped archive, before reconciliation
    pub archive: Archive,
    /// Supertypes without available bytecode, treated as external leaves
    pub unresolved: Vec<String>,
}

/// The external bulk remapping engine.
pub trait BulkRemapper: Send + Sync {
    /// Remaps every class of `archive` through `table`.
    ///
    /// # Arguments
    ///
    /// * `archive` - The original archive
    /// * `table` - The complete mapping table
    /// * `classpath` - Library archives that resolve types outside `archive`
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::RemapFailed`] when a referenced type is present
    /// neither in `archive` nor on `classpath`. This aborts the rewrite.
    fn remap(&self, archive: &Archive, table: &RemapTable, classpath: &[PathBuf]) -> Result<RemapOutput>;
}
