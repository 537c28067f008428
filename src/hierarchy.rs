//! Class hierarchy model built from a single discovery pass.
//!
//! The [`HierarchyModel`] records `(subtype, supertype)` and `(implementor, interface)`
//! edges together with the members every class declares. It answers the
//! transitive closure queries the mapping manager needs for override propagation.
//!
//! # Architecture
//!
//! - **Forward edges**: superclass and direct interfaces per class
//! - **Reverse edges**: direct subclasses and direct implementors per type
//! - **Classification**: interface and library sets, filled from access flags
//!
//! All closures are computed with an iterative, visited-set-bounded work list, so a
//! self-referential or cyclic input terminates instead of looping. A supertype that
//! was referenced but never discovered is an opaque external leaf: it appears in the
//! results, but has no further ancestors and is never an error.
//!
//! # Thread Safety
//!
//! All collections are `DashMap`/`DashSet`, so discovery may populate the model from
//! several worker threads at once. Queries are meant to run after discovery finished.

use std::collections::{BTreeSet, HashSet, VecDeque};

use dashmap::{DashMap, DashSet};

use crate::model::{ClassAccess, ClassInfo};

/// Directed graph of class and interface relationships.
#[derive(Debug, Default)]
pub struct HierarchyModel {
    /// Classes whose structure was discovered (bytecode available)
    known: DashSet<String>,
    /// class -> direct superclass
    supers: DashMap<String, String>,
    /// class -> direct interfaces
    interfaces: DashMap<String, Vec<String>>,
    /// type -> direct subclasses
    subclasses: DashMap<String, Vec<String>>,
    /// interface -> direct implementors and sub-interfaces
    implementors: DashMap<String, Vec<String>>,
    /// Types classified as interfaces by their access flags
    interface_types: DashSet<String>,
    /// Classpath-only types
    library_types: DashSet<String>,
    /// class -> declared `(name, descriptor)` method signatures
    methods: DashMap<String, HashSet<(String, String)>>,
    /// class -> declared field names
    fields: DashMap<String, HashSet<String>>,
}

impl HierarchyModel {
    /// Creates an empty model.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a model from a complete discovery pass.
    #[must_use]
    pub fn from_classes(classes: &[ClassInfo]) -> Self {
        let model = Self::new();
        for class in classes {
            model.add_class(class);
        }
        model
    }

    /// Records the edges of one class and classifies it from its access flags.
    ///
    /// # Arguments
    ///
    /// * `class` - Internal name of the discovered class
    /// * `super_name` - Its direct superclass, if any
    /// * `interfaces` - Its directly implemented (or extended) interfaces
    /// * `access` - Class access flags, used to classify interfaces
    pub fn add_relation(
        &self,
        class: &str,
        super_name: Option<&str>,
        interfaces: &[String],
        access: ClassAccess,
    ) {
        self.known.insert(class.to_string());
        if access.contains(ClassAccess::INTERFACE) {
            self.interface_types.insert(class.to_string());
        }

        if let Some(super_name) = super_name {
            self.supers
                .insert(class.to_string(), super_name.to_string());
            self.subclasses
                .entry(super_name.to_string())
                .or_default()
                .push(class.to_string());
        }

        if !interfaces.is_empty() {
            self.interfaces
                .insert(class.to_string(), interfaces.to_vec());
            for interface in interfaces {
                self.implementors
                    .entry(interface.clone())
                    .or_default()
                    .push(class.to_string());
            }
        }
    }

    /// Records a discovered class: its edges, its declared members and its library flag.
    pub fn add_class(&self, class: &ClassInfo) {
        self.add_relation(
            &class.name,
            class.super_name.as_deref(),
            &class.interfaces,
            class.access,
        );

        if class.library {
            self.library_types.insert(class.name.clone());
        }

        let mut declared = self.methods.entry(class.name.clone()).or_default();
        for method in &class.methods {
            declared.insert((method.name.clone(), method.descriptor.clone()));
        }

        self.fields
            .entry(class.name.clone())
            .or_default()
            .extend(class.fields.iter().map(|f| f.name.clone()));
    }

    /// Returns true if the class was discovered, as opposed to only referenced.
    #[must_use]
    pub fn contains(&self, class: &str) -> bool {
        self.known.contains(class)
    }

    /// Number of discovered classes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.known.len()
    }

    /// Returns true if nothing was discovered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }

    /// Returns true if the type was classified as an interface.
    #[must_use]
    pub fn is_interface(&self, class: &str) -> bool {
        self.interface_types.contains(class)
    }

    /// Returns true if the type is a classpath library type.
    #[must_use]
    pub fn is_library(&self, class: &str) -> bool {
        self.library_types.contains(class)
    }

    /// Returns true if the type was referenced as a supertype but never discovered.
    #[must_use]
    pub fn is_external(&self, class: &str) -> bool {
        !self.known.contains(class)
    }

    /// Direct superclass of a type.
    #[must_use]
    pub fn super_class(&self, class: &str) -> Option<String> {
        self.supers.get(class).map(|s| s.value().clone())
    }

    /// Directly implemented interfaces of a type.
    #[must_use]
    pub fn direct_interfaces(&self, class: &str) -> Vec<String> {
        self.interfaces
            .get(class)
            .map(|i| i.value().clone())
            .unwrap_or_default()
    }

    /// Returns true if the type itself declares the method signature.
    #[must_use]
    pub fn declares_method(&self, class: &str, name: &str, descriptor: &str) -> bool {
        self.methods.get(class).is_some_and(|declared| {
            declared.contains(&(name.to_string(), descriptor.to_string()))
        })
    }

    /// Returns true if the type itself declares a field of that name.
    #[must_use]
    pub fn declares_field(&self, class: &str, name: &str) -> bool {
        self.fields
            .get(class)
            .is_some_and(|declared| declared.contains(name))
    }

    /// Work-list closure over `next`, excluding `start` itself.
    fn closure<F>(&self, start: &str, next: F) -> Vec<String>
    where
        F: Fn(&str) -> Vec<String>,
    {
        let mut visited = HashSet::new();
        visited.insert(start.to_string());

        let mut result = Vec::new();
        let mut queue = VecDeque::from([start.to_string()]);

        while let Some(current) = queue.pop_front() {
            for neighbour in next(&current) {
                if visited.insert(neighbour.clone()) {
                    result.push(neighbour.clone());
                    queue.push_back(neighbour);
                }
            }
        }

        result
    }

    fn direct_subclasses(&self, class: &str) -> Vec<String> {
        self.subclasses
            .get(class)
            .map(|s| s.value().clone())
            .unwrap_or_default()
    }

    fn direct_implementors(&self, class: &str) -> Vec<String> {
        self.implementors
            .get(class)
            .map(|s| s.value().clone())
            .unwrap_or_default()
    }

    fn direct_supertypes(&self, class: &str) -> Vec<String> {
        let mut supertypes: Vec<String> = self.super_class(class).into_iter().collect();
        supertypes.extend(self.direct_interfaces(class));
        supertypes
    }

    /// All transitive subclasses of a type, following `extends` edges only.
    ///
    /// The result is sorted for reproducibility.
    #[must_use]
    pub fn all_subclasses(&self, class: &str) -> Vec<String> {
        sorted(self.closure(class, |c| self.direct_subclasses(c)))
    }

    /// The superclass chain of a type, nearest first.
    ///
    /// An undiscovered superclass ends the chain: it is reported, but has no
    /// ancestors of its own.
    #[must_use]
    pub fn all_superclasses(&self, class: &str) -> Vec<String> {
        self.closure(class, |c| self.super_class(c).into_iter().collect())
    }

    /// Every interface a type implements: directly, through its superclasses and
    /// through super-interfaces. Sorted.
    #[must_use]
    pub fn all_interfaces(&self, class: &str) -> Vec<String> {
        let supertypes = self.closure(class, |c| self.direct_supertypes(c));
        sorted(
            supertypes
                .into_iter()
                .filter(|t| self.is_interface(t) || self.is_referenced_as_interface(t))
                .collect(),
        )
    }

    /// Every type a type is assignable to: superclasses and all interfaces. Sorted.
    #[must_use]
    pub fn all_supertypes(&self, class: &str) -> Vec<String> {
        sorted(self.closure(class, |c| self.direct_supertypes(c)))
    }

    /// Every subtype of a type: subclasses, implementors, sub-interfaces and their
    /// subclasses, transitively. Sorted.
    #[must_use]
    pub fn all_subtypes(&self, class: &str) -> Vec<String> {
        sorted(self.closure(class, |c| {
            let mut next = self.direct_subclasses(c);
            next.extend(self.direct_implementors(c));
            next
        }))
    }

    /// Every concrete (non-interface) class implementing `interface`, directly, via a
    /// sub-interface or via a superclass. Sorted.
    #[must_use]
    pub fn implementors_of(&self, interface: &str) -> Vec<String> {
        self.all_subtypes(interface)
            .into_iter()
            .filter(|t| !self.is_interface(t))
            .collect()
    }

    /// Types referenced as supertypes that were never discovered. Sorted.
    #[must_use]
    pub fn external_types(&self) -> Vec<String> {
        let mut external = BTreeSet::new();
        for entry in &self.supers {
            if self.is_external(entry.value()) {
                external.insert(entry.value().clone());
            }
        }
        for entry in &self.interfaces {
            for interface in entry.value() {
                if self.is_external(interface) {
                    external.insert(interface.clone());
                }
            }
        }
        external.into_iter().collect()
    }

    // Undiscovered types named in an `implements` clause are interfaces too.
    fn is_referenced_as_interface(&self, class: &str) -> bool {
        self.is_external(class) && self.implementors.contains_key(class)
    }
}

fn sorted(mut values: Vec<String>) -> Vec<String> {
    values.sort();
    values
}
