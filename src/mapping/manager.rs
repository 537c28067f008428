//! Rename eligibility, name assignment and override propagation.
//!
//! The [`MappingManager`] is created once per run and shared by reference with every
//! worker of the member pass. Its tables are `DashMap`s and every insert goes through
//! the entry API, so each key is decided exactly once even when two threads observe
//! the same symbol, and a propagated name never replaces an explicit one.
//!
//! # Passes
//!
//! 1. [`MappingManager::generate_class_mappings`] runs over all discovered classes in
//!    discovery order and must finish before any member is looked at: member
//!    eligibility is defined by the eligibility of the owning class.
//! 2. [`MappingManager::generate_member_mappings`] runs once per class, in any order
//!    and on any thread.
//!
//! # Override families
//!
//! A method name must be shared by every declaration it overrides or is overridden
//! by. Before drawing a fresh name the manager collects the family of the method:
//! all connected types declaring the same `(name, descriptor)`. An existing mapping
//! anywhere in the family is reused, otherwise one fresh name is assigned to every
//! declaring member and then copied down to their subclasses (or, for interfaces,
//! to all subtypes). Families touching a type that cannot be renamed, such as a
//! library class, keep their original name.
//!
//! A fresh field or method name is never one that the owner (or, for a method,
//! any family member) or a related supertype or subtype already declares, so a
//! renamed member cannot collide with or override a member that keeps its name.

use std::{
    collections::{BTreeSet, HashSet, VecDeque},
    fmt,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use dashmap::{mapref::entry::Entry, DashMap, DashSet};

use crate::{
    config::{NamingConfig, ObfuscationConfig, RenamePolicy},
    hierarchy::HierarchyModel,
    mapping::{method_key, MappingStore},
    model::{package_of, ClassAccess, ClassInfo, MemberAccess, MemberInfo, SymbolId, SymbolKind},
    naming::NameGenerators,
    Result,
};

type FieldKey = (String, String);
type MethodKey = (String, String, String);

/// Overridable methods of `java/lang/Object`; their names are fixed by the platform.
const OBJECT_METHODS: &[(&str, &str)] = &[
    ("equals", "(Ljava/lang/Object;)Z"),
    ("hashCode", "()I"),
    ("toString", "()Ljava/lang/String;"),
    ("clone", "()Ljava/lang/Object;"),
    ("finalize", "()V"),
];

/// Returns true for the constructor and static initializer names.
#[must_use]
pub fn is_special_method(name: &str) -> bool {
    name == "<init>" || name == "<clinit>"
}

/// Returns true if the name marks a compiler-generated forwarding method.
#[must_use]
pub fn is_forwarding_method(name: &str) -> bool {
    name.starts_with("access$") || name == "$deserializeLambda$"
}

fn is_object_method(name: &str, descriptor: &str) -> bool {
    OBJECT_METHODS
        .iter()
        .any(|(n, d)| *n == name && *d == descriptor)
}

// Methods the JVM or the enum machinery looks up by name.
fn is_entry_point(class: &ClassInfo, method: &MemberInfo) -> bool {
    let is_main = method.name == "main"
        && method.descriptor == "([Ljava/lang/String;)V"
        && method
            .access
            .contains(MemberAccess::PUBLIC | MemberAccess::STATIC);

    let is_enum_accessor = class.access.contains(ClassAccess::ENUM)
        && ((method.name == "values" && method.descriptor == format!("()[L{};", class.name))
            || (method.name == "valueOf"
                && method.descriptor == format!("(Ljava/lang/String;)L{};", class.name)));

    is_main || is_enum_accessor
}

/// Decides and records the mappings of one run.
pub struct MappingManager {
    policy: Arc<dyn RenamePolicy>,
    hierarchy: Arc<HierarchyModel>,
    generators: NameGenerators,
    flatten_packages: bool,
    /// Classes whose members may be renamed
    eligible: DashSet<String>,
    classes: DashMap<String, String>,
    fields: DashMap<FieldKey, String>,
    field_descriptors: DashMap<FieldKey, String>,
    methods: DashMap<MethodKey, String>,
    kept: DashSet<SymbolId>,
    /// family root method key -> member method keys
    groups: DashMap<String, BTreeSet<String>>,
    propagated: AtomicUsize,
}

impl MappingManager {
    /// Creates a manager over a finished hierarchy model.
    ///
    /// # Arguments
    ///
    /// * `policy` - Rename toggles, scope and keep rules
    /// * `hierarchy` - The complete hierarchy of the run
    /// * `naming` - Settings for the per-kind name generators
    #[must_use]
    pub fn new(
        policy: Arc<dyn RenamePolicy>,
        hierarchy: Arc<HierarchyModel>,
        naming: &NamingConfig,
    ) -> Self {
        MappingManager {
            policy,
            hierarchy,
            generators: NameGenerators::new(naming),
            flatten_packages: true,
            eligible: DashSet::new(),
            classes: DashMap::new(),
            fields: DashMap::new(),
            field_descriptors: DashMap::new(),
            methods: DashMap::new(),
            kept: DashSet::new(),
            groups: DashMap::new(),
            propagated: AtomicUsize::new(0),
        }
    }

    /// Creates a manager driven by an [`ObfuscationConfig`].
    #[must_use]
    pub fn from_config(config: &ObfuscationConfig, hierarchy: Arc<HierarchyModel>) -> Self {
        Self::new(Arc::new(config.clone()), hierarchy, &config.naming)
            .with_flatten_packages(config.flatten_packages)
    }

    /// Moves renamed classes into the default package (`true`) or keeps their
    /// package path (`false`).
    #[must_use]
    pub fn with_flatten_packages(mut self, flatten: bool) -> Self {
        self.flatten_packages = flatten;
        self
    }

    /// The hierarchy model the manager resolves families against.
    #[must_use]
    pub fn hierarchy(&self) -> &HierarchyModel {
        &self.hierarchy
    }

    fn decision(&self, args: fmt::Arguments<'_>) {
        if self.policy.verbose() {
            log::info!("{args}");
        } else {
            log::debug!("{args}");
        }
    }

    fn keep(&self, symbol: SymbolId) {
        self.decision(format_args!("keep {} {}", symbol.kind, symbol));
        self.kept.insert(symbol);
    }

    /// Assigns class names and fixes member eligibility for every class.
    ///
    /// Runs sequentially in the given order, so the sequential naming modes number
    /// classes in discovery order. Library classes are skipped, out-of-scope
    /// classes and kept classes become ineligible. Must complete before the member
    /// pass starts.
    ///
    /// Returns the number of classes that received a new name.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::NamespaceExhausted`] if the class generator runs dry.
    pub fn generate_class_mappings(&self, classes: &[String]) -> Result<usize> {
        let mut assigned = 0;

        for class in classes {
            if self.hierarchy.is_library(class) {
                continue;
            }
            if !self.policy.in_scope(class) {
                self.decision(format_args!("skip class {class}: outside package scope"));
                continue;
            }
            if self.policy.should_keep_class(class) {
                self.keep(SymbolId::class(class));
                continue;
            }

            self.eligible.insert(class.clone());
            if !self.policy.rename_classes() {
                continue;
            }

            if let Entry::Vacant(slot) = self.classes.entry(class.clone()) {
                let name = self.fresh_class_name(class)?;
                self.decision(format_args!("class {class} -> {name}"));
                slot.insert(name);
                assigned += 1;
            }
        }

        log::debug!(
            "Class pass finished: {} eligible, {} renamed",
            self.eligible.len(),
            assigned
        );
        Ok(assigned)
    }

    // A fresh name never shadows a discovered class.
    fn fresh_class_name(&self, class: &str) -> Result<String> {
        let symbol = SymbolId::class(class);
        loop {
            let simple = self.generators.class.generate_name(&symbol)?;
            let candidate = if self.flatten_packages {
                simple
            } else {
                format!("{}{}", package_of(class), simple)
            };
            if !self.hierarchy.contains(&candidate) {
                return Ok(candidate);
            }
        }
    }

    /// Returns true if members of the class may be renamed.
    #[must_use]
    pub fn is_eligible(&self, class: &str) -> bool {
        self.eligible.contains(class)
    }

    /// Assigns the field and method mappings of one class.
    ///
    /// Bridge methods, constructors and runtime entry points (`main`, enum
    /// `values`/`valueOf`) keep their names.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::NamespaceExhausted`] if a generator runs dry.
    pub fn generate_member_mappings(&self, class: &ClassInfo) -> Result<()> {
        if !self.is_eligible(&class.name) {
            return Ok(());
        }

        for field in &class.fields {
            self.generate_field_mapping(&class.name, &field.name, &field.descriptor)?;
        }

        for method in &class.methods {
            if method.access.contains(MemberAccess::BRIDGE) {
                self.decision(format_args!(
                    "skip bridge method {}.{}{}",
                    class.name, method.name, method.descriptor
                ));
                continue;
            }
            if self.policy.rename_methods() && is_entry_point(class, method) {
                self.keep(SymbolId::method(&class.name, &method.name, &method.descriptor));
                continue;
            }
            self.generate_method_mapping(&class.name, &method.name, &method.descriptor)?;
        }

        Ok(())
    }

    /// Assigns a field mapping, keyed by `(owner, name)`.
    ///
    /// Returns the obfuscated name, or `None` if the field keeps its name.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::NamespaceExhausted`] if the field generator runs dry.
    pub fn generate_field_mapping(
        &self,
        owner: &str,
        name: &str,
        descriptor: &str,
    ) -> Result<Option<String>> {
        if !self.policy.rename_fields() || !self.is_eligible(owner) {
            return Ok(None);
        }
        if self.policy.should_keep_field(owner, name, descriptor) {
            self.keep(SymbolId::field(owner, name, descriptor));
            return Ok(None);
        }

        let key = (owner.to_string(), name.to_string());
        let obfuscated = match self.fields.entry(key.clone()) {
            Entry::Occupied(existing) => existing.get().clone(),
            Entry::Vacant(slot) => {
                let fresh = self.fresh_field_name(owner, name, descriptor)?;
                self.decision(format_args!("field {owner}.{name} -> {fresh}"));
                slot.insert(fresh.clone());
                self.field_descriptors
                    .entry(key)
                    .or_insert_with(|| descriptor.to_string());
                fresh
            }
        };

        Ok(Some(obfuscated))
    }

    /// Assigns a method mapping, keyed by `(owner, name, descriptor)`, and
    /// propagates it across the method's override family.
    ///
    /// Returns the obfuscated name, or `None` if the method keeps its name.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::NamespaceExhausted`] if the method generator runs dry.
    pub fn generate_method_mapping(
        &self,
        owner: &str,
        name: &str,
        descriptor: &str,
    ) -> Result<Option<String>> {
        if !self.policy.rename_methods() || !self.is_eligible(owner) {
            return Ok(None);
        }
        if is_special_method(name) || is_forwarding_method(name) {
            return Ok(None);
        }
        if self.policy.should_keep_method(owner, name, descriptor) {
            self.keep(SymbolId::method(owner, name, descriptor));
            return Ok(None);
        }

        let key = (owner.to_string(), name.to_string(), descriptor.to_string());
        if let Some(existing) = self.methods.get(&key) {
            return Ok(Some(existing.value().clone()));
        }

        if is_object_method(name, descriptor) {
            self.keep(SymbolId::method(owner, name, descriptor));
            return Ok(None);
        }

        let family = self.override_family(owner, name, descriptor);
        if let Some(fixed) = family.iter().find(|t| !self.is_eligible(t)) {
            self.decision(format_args!(
                "pin {owner}.{name}{descriptor}: overrides {fixed}.{name}{descriptor}"
            ));
            self.keep(SymbolId::method(owner, name, descriptor));
            return Ok(None);
        }

        let existing = family.iter().find_map(|t| {
            self.methods
                .get(&(t.clone(), name.to_string(), descriptor.to_string()))
                .map(|e| e.value().clone())
        });
        let candidate = match existing {
            Some(name) => name,
            None => self.fresh_method_name(owner, name, descriptor, &family)?,
        };

        let root = self.family_root(&family);
        let root_key = method_key(&root, name, descriptor);

        let mut assigned: Option<String> = None;
        for member in &family {
            if self.policy.should_keep_method(member, name, descriptor) {
                self.keep(SymbolId::method(member, name, descriptor));
                continue;
            }
            let value = self
                .methods
                .entry((member.clone(), name.to_string(), descriptor.to_string()))
                .or_insert_with(|| assigned.clone().unwrap_or_else(|| candidate.clone()))
                .value()
                .clone();
            self.record_group(&root_key, member, name, descriptor);
            assigned.get_or_insert(value);
        }

        let obfuscated = assigned.unwrap_or(candidate);
        self.decision(format_args!(
            "method {owner}.{name}{descriptor} -> {obfuscated} ({} declaring)",
            family.len()
        ));

        for member in &family {
            self.propagate(member, name, descriptor, &obfuscated, &root_key);
        }

        Ok(self.methods.get(&key).map(|e| e.value().clone()))
    }

    /// `types` together with all of their supertypes and subtypes.
    fn related_types<'a>(&self, types: impl IntoIterator<Item = &'a str>) -> BTreeSet<String> {
        let mut related = BTreeSet::new();
        for ty in types {
            related.extend(self.hierarchy.all_supertypes(ty));
            related.extend(self.hierarchy.all_subtypes(ty));
            related.insert(ty.to_string());
        }
        related
    }

    // A fresh field name is never declared by the owner or a related type, so it
    // cannot clash with or shadow a field that keeps its name.
    fn fresh_field_name(&self, owner: &str, name: &str, descriptor: &str) -> Result<String> {
        let symbol = SymbolId::field(owner, name, descriptor);
        let related = self.related_types([owner]);
        loop {
            let candidate = self.generators.field.generate_name(&symbol)?;
            if !related
                .iter()
                .any(|ty| self.hierarchy.declares_field(ty, &candidate))
            {
                return Ok(candidate);
            }
            self.decision(format_args!(
                "skip field name {candidate} for {owner}.{name}: already declared"
            ));
        }
    }

    // Same for methods: the new signature must not exist anywhere a family member
    // could inherit it from or pass it down to.
    fn fresh_method_name(
        &self,
        owner: &str,
        name: &str,
        descriptor: &str,
        family: &BTreeSet<String>,
    ) -> Result<String> {
        let symbol = SymbolId::method(owner, name, descriptor);
        let related = self.related_types(family.iter().map(String::as_str));
        loop {
            let candidate = self.generators.method.generate_name(&symbol)?;
            if !related
                .iter()
                .any(|ty| self.hierarchy.declares_method(ty, &candidate, descriptor))
            {
                return Ok(candidate);
            }
            self.decision(format_args!(
                "skip method name {candidate} for {owner}.{name}{descriptor}: already declared"
            ));
        }
    }

    /// Every type connected to `owner` that declares `name` + `descriptor`:
    /// declaring ancestors, declaring subtypes and the declaring ancestors of
    /// those subtypes. Always contains `owner`. Sorted.
    fn override_family(&self, owner: &str, name: &str, descriptor: &str) -> BTreeSet<String> {
        let mut family = BTreeSet::from([owner.to_string()]);
        let mut expanded = HashSet::new();
        let mut queue = VecDeque::from([owner.to_string()]);

        while let Some(current) = queue.pop_front() {
            if !expanded.insert(current.clone()) {
                continue;
            }

            let mut related = self.hierarchy.all_supertypes(&current);
            for subtype in self.hierarchy.all_subtypes(&current) {
                related.extend(self.hierarchy.all_supertypes(&subtype));
                related.push(subtype);
            }

            for candidate in related {
                if self.hierarchy.declares_method(&candidate, name, descriptor)
                    && family.insert(candidate.clone())
                {
                    queue.push_back(candidate);
                }
            }
        }

        family
    }

    // First family member without a declaring ancestor.
    fn family_root(&self, family: &BTreeSet<String>) -> String {
        family
            .iter()
            .find(|member| {
                !self
                    .hierarchy
                    .all_supertypes(member)
                    .iter()
                    .any(|s| family.contains(s))
            })
            .or_else(|| family.first())
            .cloned()
            .unwrap_or_default()
    }

    fn record_group(&self, root_key: &str, member: &str, name: &str, descriptor: &str) {
        self.groups
            .entry(root_key.to_string())
            .or_default()
            .insert(method_key(member, name, descriptor));
    }

    /// Copies `obfuscated` to every subclass of `from` (every subtype, if `from` is
    /// an interface) that has no mapping for the same signature yet.
    fn propagate(&self, from: &str, name: &str, descriptor: &str, obfuscated: &str, root_key: &str) {
        let targets = if self.hierarchy.is_interface(from) {
            self.hierarchy.all_subtypes(from)
        } else {
            self.hierarchy.all_subclasses(from)
        };

        for target in targets {
            if !self.is_eligible(&target) {
                continue;
            }
            if self.policy.should_keep_method(&target, name, descriptor) {
                self.keep(SymbolId::method(&target, name, descriptor));
                continue;
            }

            let key = (target.clone(), name.to_string(), descriptor.to_string());
            if let Entry::Vacant(slot) = self.methods.entry(key) {
                slot.insert(obfuscated.to_string());
                self.propagated.fetch_add(1, Ordering::Relaxed);
                self.record_group(root_key, &target, name, descriptor);
                self.decision(format_args!(
                    "propagate {from}.{name}{descriptor} -> {target} as {obfuscated}"
                ));
            }
        }
    }

    /// Obfuscated class name, or `class` itself if it has none.
    #[must_use]
    pub fn get_class_mapping(&self, class: &str) -> String {
        self.classes
            .get(class)
            .map_or_else(|| class.to_string(), |e| e.value().clone())
    }

    /// Obfuscated field name, or `name` itself if it has none.
    #[must_use]
    pub fn get_field_mapping(&self, owner: &str, name: &str) -> String {
        self.fields
            .get(&(owner.to_string(), name.to_string()))
            .map_or_else(|| name.to_string(), |e| e.value().clone())
    }

    /// Obfuscated method name, or `name` itself if it has none.
    #[must_use]
    pub fn get_method_mapping(&self, owner: &str, name: &str, descriptor: &str) -> String {
        self.methods
            .get(&(owner.to_string(), name.to_string(), descriptor.to_string()))
            .map_or_else(|| name.to_string(), |e| e.value().clone())
    }

    /// Returns true if the symbol was recorded in the keep set.
    #[must_use]
    pub fn is_kept(&self, symbol: &SymbolId) -> bool {
        self.kept.contains(symbol)
    }

    /// Number of symbols in the keep set.
    #[must_use]
    pub fn kept_count(&self) -> usize {
        self.kept.len()
    }

    /// Number of method mappings created by propagation.
    #[must_use]
    pub fn propagated_count(&self) -> usize {
        self.propagated.load(Ordering::Relaxed)
    }

    /// Copies the finished tables into a [`MappingStore`].
    ///
    /// Must only be called once no worker of the member pass is active.
    #[must_use]
    pub fn build_store(&self) -> MappingStore {
        let store = MappingStore::new();

        for entry in &self.classes {
            store.map_class(entry.key(), entry.value());
        }
        for entry in &self.fields {
            let (owner, name) = entry.key();
            let descriptor = self
                .field_descriptors
                .get(entry.key())
                .map(|d| d.value().clone())
                .unwrap_or_default();
            store.map_field(owner, name, &descriptor, entry.value());
        }
        for entry in &self.methods {
            let (owner, name, descriptor) = entry.key();
            store.map_method(owner, name, descriptor, entry.value());
        }

        for symbol in self.kept.iter() {
            match symbol.kind {
                SymbolKind::Class => store.keep_class(&symbol.owner),
                SymbolKind::Field => store.keep_field(&symbol.owner, &symbol.name),
                SymbolKind::Method => {
                    store.keep_method(&symbol.owner, &symbol.name, &symbol.descriptor);
                }
                SymbolKind::Local => {}
            }
        }

        for group in &self.groups {
            for member in group.value() {
                store.record_group(group.key(), member);
            }
        }

        store
    }
}
