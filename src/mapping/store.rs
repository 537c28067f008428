//! Finalized, bidirectional mapping tables.
//!
//! The forward tables are lock-free skip lists, so snapshots come out sorted by
//! original key without an extra sort. Reverse lookups go through `DashMap`s that
//! are filled in the same call as the forward entry.

use std::collections::{BTreeMap, BTreeSet};

use crossbeam_skiplist::{SkipMap, SkipSet};
use dashmap::DashMap;

use crate::mapping::{field_key, method_key, split_field_key, split_method_key, MappingTables};

/// A map of original key to obfuscated name.
pub type NameMap = SkipMap<String, String>;

/// Thread-safe holder of the finalized mappings of one run.
///
/// Every insert is first-write-wins: mapping a key a second time is ignored and
/// reported through the return value. Snapshot accessors return owned copies.
#[derive(Default)]
pub struct MappingStore {
    classes: NameMap,
    fields: NameMap,
    field_descriptors: NameMap,
    methods: NameMap,
    /// obfuscated class -> original class
    reverse_classes: DashMap<String, String>,
    /// `originalOwner.obfuscatedMember` -> original member keys
    reverse_members: DashMap<String, BTreeSet<String>>,
    kept_classes: SkipSet<String>,
    kept_fields: SkipSet<String>,
    kept_methods: SkipSet<String>,
    /// family root method key -> member method keys renamed with it
    groups: DashMap<String, BTreeSet<String>>,
}

impl MappingStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a store from a plain snapshot, for instance one re-read from a JSON
    /// mapping file. Field descriptors are not part of a snapshot.
    #[must_use]
    pub fn from_tables(tables: &MappingTables) -> Self {
        let store = Self::new();
        for (original, obfuscated) in &tables.classes {
            store.map_class(original, obfuscated);
        }
        for (key, obfuscated) in &tables.fields {
            if let Some((owner, name)) = split_field_key(key) {
                store.map_field(owner, name, "", obfuscated);
            }
        }
        for (key, obfuscated) in &tables.methods {
            if let Some((owner, name, descriptor)) = split_method_key(key) {
                store.map_method(owner, name, descriptor, obfuscated);
            }
        }
        store
    }

    /// Records a class mapping.
    ///
    /// Returns false if the class is already mapped to a different name. Recording
    /// the existing mapping again is accepted and returns true.
    pub fn map_class(&self, original: &str, obfuscated: &str) -> bool {
        let entry = self
            .classes
            .get_or_insert(original.to_string(), obfuscated.to_string());
        if entry.value() != obfuscated {
            return false;
        }
        self.reverse_classes
            .entry(obfuscated.to_string())
            .or_insert_with(|| original.to_string());
        true
    }

    /// Records a field mapping. An empty `descriptor` records no field type.
    /// Returns false if the field is already mapped to a different name.
    pub fn map_field(&self, owner: &str, name: &str, descriptor: &str, obfuscated: &str) -> bool {
        let key = field_key(owner, name);
        let entry = self.fields.get_or_insert(key.clone(), obfuscated.to_string());
        if entry.value() != obfuscated {
            return false;
        }
        if !descriptor.is_empty() {
            self.field_descriptors
                .get_or_insert(key.clone(), descriptor.to_string());
        }
        self.reverse_members
            .entry(field_key(owner, obfuscated))
            .or_default()
            .insert(key);
        true
    }

    /// Records a method mapping. Returns false if the method is already mapped to
    /// a different name.
    pub fn map_method(&self, owner: &str, name: &str, descriptor: &str, obfuscated: &str) -> bool {
        let key = method_key(owner, name, descriptor);
        let entry = self.methods.get_or_insert(key.clone(), obfuscated.to_string());
        if entry.value() != obfuscated {
            return false;
        }
        self.reverse_members
            .entry(field_key(owner, obfuscated))
            .or_default()
            .insert(key);
        true
    }

    /// Obfuscated internal name of a class.
    #[must_use]
    pub fn get_obfuscated_class(&self, original: &str) -> Option<String> {
        self.classes.get(original).map(|e| e.value().clone())
    }

    /// Obfuscated name of a field.
    #[must_use]
    pub fn get_obfuscated_field(&self, owner: &str, name: &str) -> Option<String> {
        self.fields
            .get(&field_key(owner, name))
            .map(|e| e.value().clone())
    }

    /// Obfuscated name of a method.
    #[must_use]
    pub fn get_obfuscated_method(&self, owner: &str, name: &str, descriptor: &str) -> Option<String> {
        self.methods
            .get(&method_key(owner, name, descriptor))
            .map(|e| e.value().clone())
    }

    /// Recorded descriptor of a mapped field.
    #[must_use]
    pub fn field_descriptor(&self, owner: &str, name: &str) -> Option<String> {
        self.field_descriptors
            .get(&field_key(owner, name))
            .map(|e| e.value().clone())
    }

    /// Resolves an obfuscated name back to its original.
    ///
    /// Accepts either an obfuscated class name (`a1`) or an obfuscated member
    /// qualified by its obfuscated owner (`a1.m1`). When a member name is shared by
    /// a field and a method of the same owner, the lexicographically first original
    /// key is returned; see [`MappingStore::get_original_names`].
    #[must_use]
    pub fn get_original_name(&self, obfuscated: &str) -> Option<String> {
        self.get_original_names(obfuscated).into_iter().next()
    }

    /// Every original symbol that was renamed to `obfuscated`, sorted.
    #[must_use]
    pub fn get_original_names(&self, obfuscated: &str) -> Vec<String> {
        if let Some(original) = self.reverse_classes.get(obfuscated) {
            return vec![original.value().clone()];
        }

        let Some((owner, member)) = obfuscated.rsplit_once('.') else {
            return Vec::new();
        };
        let owner = self
            .reverse_classes
            .get(owner)
            .map_or_else(|| owner.to_string(), |o| o.value().clone());

        self.reverse_members
            .get(&field_key(&owner, member))
            .map(|keys| keys.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Adds a class to the keep set.
    pub fn keep_class(&self, class: &str) {
        self.kept_classes.insert(class.to_string());
    }

    /// Adds a field to the keep set.
    pub fn keep_field(&self, owner: &str, name: &str) {
        self.kept_fields.insert(field_key(owner, name));
    }

    /// Adds a method to the keep set.
    pub fn keep_method(&self, owner: &str, name: &str, descriptor: &str) {
        self.kept_methods
            .insert(method_key(owner, name, descriptor));
    }

    /// Returns true if the class is in the keep set.
    #[must_use]
    pub fn is_class_kept(&self, class: &str) -> bool {
        self.kept_classes.contains(class)
    }

    /// Returns true if the field is in the keep set.
    #[must_use]
    pub fn is_field_kept(&self, owner: &str, name: &str) -> bool {
        self.kept_fields.contains(&field_key(owner, name))
    }

    /// Returns true if the method is in the keep set.
    #[must_use]
    pub fn is_method_kept(&self, owner: &str, name: &str, descriptor: &str) -> bool {
        self.kept_methods
            .contains(&method_key(owner, name, descriptor))
    }

    /// Records that `member` was renamed together with the family rooted at `root`.
    pub fn record_group(&self, root: &str, member: &str) {
        self.groups
            .entry(root.to_string())
            .or_default()
            .insert(member.to_string());
    }

    /// Override families that moved together, keyed by root method key.
    #[must_use]
    pub fn hierarchy_groups(&self) -> BTreeMap<String, Vec<String>> {
        self.groups
            .iter()
            .map(|g| (g.key().clone(), g.value().iter().cloned().collect()))
            .collect()
    }

    /// Sorted copy of the class table.
    #[must_use]
    pub fn class_mappings(&self) -> BTreeMap<String, String> {
        snapshot(&self.classes)
    }

    /// Sorted copy of the field table, keyed by `owner.name`.
    #[must_use]
    pub fn field_mappings(&self) -> BTreeMap<String, String> {
        snapshot(&self.fields)
    }

    /// Sorted copy of the method table, keyed by `owner.name(desc)ret`.
    #[must_use]
    pub fn method_mappings(&self) -> BTreeMap<String, String> {
        snapshot(&self.methods)
    }

    /// Sorted copy of the kept classes.
    #[must_use]
    pub fn kept_classes(&self) -> Vec<String> {
        self.kept_classes.iter().map(|e| e.value().clone()).collect()
    }

    /// Sorted copy of the kept field keys.
    #[must_use]
    pub fn kept_fields(&self) -> Vec<String> {
        self.kept_fields.iter().map(|e| e.value().clone()).collect()
    }

    /// Sorted copy of the kept method keys.
    #[must_use]
    pub fn kept_methods(&self) -> Vec<String> {
        self.kept_methods.iter().map(|e| e.value().clone()).collect()
    }

    /// Plain snapshot of all three forward tables.
    #[must_use]
    pub fn tables(&self) -> MappingTables {
        MappingTables {
            classes: self.class_mappings(),
            fields: self.field_mappings(),
            methods: self.method_mappings(),
        }
    }

    /// Number of class mappings.
    #[must_use]
    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    /// Number of field mappings.
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Number of method mappings.
    #[must_use]
    pub fn method_count(&self) -> usize {
        self.methods.len()
    }

    /// Total number of mappings.
    #[must_use]
    pub fn total(&self) -> usize {
        self.class_count() + self.field_count() + self.method_count()
    }

    /// Returns true if the store holds no mapping.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Drops every table. Called once export and rewrite both succeeded.
    pub fn clear(&self) {
        self.classes.clear();
        self.fields.clear();
        self.field_descriptors.clear();
        self.methods.clear();
        self.reverse_classes.clear();
        self.reverse_members.clear();
        self.kept_classes.clear();
        self.kept_fields.clear();
        self.kept_methods.clear();
        self.groups.clear();
    }
}

fn snapshot(map: &NameMap) -> BTreeMap<String, String> {
    map.iter()
        .map(|e| (e.key().clone(), e.value().clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MappingStore {
        let store = MappingStore::new();
        store.map_class("p/A", "a1");
        store.map_class("p/B", "a2");
        store.map_field("p/A", "count", "I", "f1");
        store.map_method("p/A", "foo", "()V", "m1");
        store.map_method("p/B", "foo", "()V", "m1");
        store
    }

    #[test]
    fn forward_and_reverse() {
        let store = sample();
        assert_eq!(store.get_obfuscated_class("p/A").as_deref(), Some("a1"));
        assert_eq!(store.get_obfuscated_field("p/A", "count").as_deref(), Some("f1"));
        assert_eq!(store.get_obfuscated_method("p/B", "foo", "()V").as_deref(), Some("m1"));
        assert_eq!(store.field_descriptor("p/A", "count").as_deref(), Some("I"));

        assert_eq!(store.get_original_name("a2").as_deref(), Some("p/B"));
        assert_eq!(store.get_original_name("a1.f1").as_deref(), Some("p/A.count"));
        assert_eq!(store.get_original_name("a2.m1").as_deref(), Some("p/B.foo()V"));
        assert_eq!(store.get_original_name("zz"), None);
        assert_eq!(store.get_original_name("a1.nope"), None);
    }

    #[test]
    fn first_write_wins() {
        let store = sample();
        assert!(!store.map_class("p/A", "other"));
        assert!(!store.map_method("p/A", "foo", "()V", "m9"));
        assert_eq!(store.get_obfuscated_class("p/A").as_deref(), Some("a1"));
        assert_eq!(store.get_original_name("other"), None);
        assert!(store.map_method("p/A", "foo", "()V", "m1"));
        assert!(store.map_class("p/A", "a1"));
        assert!(store.map_field("p/A", "count", "I", "f1"));
        assert_eq!(store.class_count(), 2);
        assert_eq!(store.get_original_names("a1"), vec!["p/A".to_string()]);
    }

    #[test]
    fn snapshots_are_copies() {
        let store = sample();
        let before = store.tables();
        store.map_class("p/C", "a3");
        assert_eq!(before.classes.len(), 2);
        assert_eq!(store.tables().classes.len(), 3);
        assert_eq!(
            before.classes.keys().collect::<Vec<_>>(),
            vec!["p/A", "p/B"]
        );
    }

    #[test]
    fn tables_roundtrip() {
        let store = sample();
        let rebuilt = MappingStore::from_tables(&store.tables());
        assert_eq!(rebuilt.tables(), store.tables());
        assert_eq!(rebuilt.get_original_name("a1.m1").as_deref(), Some("p/A.foo()V"));
    }

    #[test]
    fn keep_sets_and_groups() {
        let store = sample();
        store.keep_class("p/Main");
        store.keep_method("p/B", "bar", "()V");
        store.record_group("p/A.foo()V", "p/B.foo()V");
        store.record_group("p/A.foo()V", "p/A.foo()V");

        assert!(store.is_class_kept("p/Main"));
        assert!(store.is_method_kept("p/B", "bar", "()V"));
        assert!(!store.is_field_kept("p/A", "count"));
        assert_eq!(
            store.hierarchy_groups()["p/A.foo()V"],
            vec!["p/A.foo()V".to_string(), "p/B.foo()V".to_string()]
        );

        store.clear();
        assert!(store.is_empty());
        assert!(store.kept_classes().is_empty());
    }
}
