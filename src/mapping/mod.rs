//! Mapping assignment and storage.
//!
//! This module owns the two halves of the renaming pipeline's state:
//!
//! - [`MappingManager`] decides eligibility, draws fresh names from the per-kind
//!   generators and propagates method names across override families. Its tables
//!   are concurrent maps with compute-if-absent inserts, so the member pass may run
//!   on several worker threads.
//! - [`MappingStore`] is the finalized, bidirectional result consumed by the
//!   exporters and the rewrite layer.
//!
//! # Keys
//!
//! Field mappings are keyed by `owner.name`; the descriptor is deliberately not part
//! of the key, since one class cannot declare two fields of the same name. Method
//! mappings are keyed by `owner.name(descriptor)return` because methods overload.
//!
//! ```rust
//! use classcloak::mapping::{field_key, method_key, split_method_key};
//!
//! assert_eq!(field_key("p/A", "count"), "p/A.count");
//! assert_eq!(method_key("p/A", "foo", "(I)V"), "p/A.foo(I)V");
//! assert_eq!(split_method_key("p/A.foo(I)V"), Some(("p/A", "foo", "(I)V")));
//! ```

mod manager;
mod store;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use manager::{is_forwarding_method, is_special_method, MappingManager};
pub use store::MappingStore;

/// Builds the mapping key of a field.
#[must_use]
pub fn field_key(owner: &str, name: &str) -> String {
    format!("{owner}.{name}")
}

/// Builds the mapping key of a method.
#[must_use]
pub fn method_key(owner: &str, name: &str, descriptor: &str) -> String {
    format!("{owner}.{name}{descriptor}")
}

/// Splits a field key into `(owner, name)`.
#[must_use]
pub fn split_field_key(key: &str) -> Option<(&str, &str)> {
    key.rsplit_once('.')
        .filter(|(owner, name)| !owner.is_empty() && !name.is_empty())
}

/// Splits a method key into `(owner, name, descriptor)`.
#[must_use]
pub fn split_method_key(key: &str) -> Option<(&str, &str, &str)> {
    let paren = key.find('(')?;
    let (head, descriptor) = key.split_at(paren);
    let (owner, name) = split_field_key(head)?;
    Some((owner, name, descriptor))
}

/// Plain snapshot of the three forward mapping tables.
///
/// Keys are original names (`p/A`, `p/A.count`, `p/A.foo(I)V`), values are the
/// obfuscated simple names (or internal names, for classes). The maps are sorted, so
/// serializing a snapshot is reproducible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingTables {
    /// Class mappings
    #[serde(default)]
    pub classes: BTreeMap<String, String>,
    /// Field mappings
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
    /// Method mappings
    #[serde(default)]
    pub methods: BTreeMap<String, String>,
}

impl MappingTables {
    /// Total number of mappings across all kinds.
    #[must_use]
    pub fn total(&self) -> usize {
        self.classes.len() + self.fields.len() + self.methods.len()
    }

    /// Returns true if no mapping of any kind is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}
