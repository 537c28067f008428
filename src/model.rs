//! Class model consumed by the renaming engine.
//!
//! The low-level class-file grammar is not part of this crate. Instead, a
//! [`ClassModelProvider`] yields one [`ClassInfo`] per class in a single read-only
//! discovery traversal: internal name, super name, interfaces, access flags and
//! the declared fields and methods as `(name, descriptor)` pairs.
//!
//! # Key Components
//!
//! - [`SymbolId`] / [`SymbolKind`] - Immutable identity of a class, field or method
//! - [`ClassInfo`] / [`MemberInfo`] - Discovered structure of one class
//! - [`ClassAccess`] / [`MemberAccess`] - JVM access flag sets
//! - [`ClassModelProvider`] - Discovery capability, implemented for `Vec<ClassInfo>`
//!   and for the JSON dump format read by [`JsonClassModel`]

use std::{fmt, path::Path};

use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum::{Display, EnumIter};

use crate::Result;

/// The kind of a symbol. Every kind owns an independent naming namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter)]
#[derive(Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    /// A class or interface
    Class,
    /// A field declared by a class
    Field,
    /// A method declared by a class
    Method,
    /// A local variable; named by the external local renamer
    Local,
}

/// Immutable identity of a discovered symbol.
///
/// Classes carry their own internal name as `owner` and an empty `name`; fields and
/// methods carry the declaring class as `owner`. A field's descriptor is recorded
/// for display only, it never takes part in field mapping keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId {
    /// Internal name of the owning (or, for classes, the identified) class
    pub owner: String,
    /// What kind of symbol this is
    pub kind: SymbolKind,
    /// Member name; empty for classes
    pub name: String,
    /// Member descriptor; empty for classes
    pub descriptor: String,
}

impl SymbolId {
    /// Identifies a class by its internal name.
    #[must_use]
    pub fn class(name: &str) -> Self {
        Self {
            owner: name.to_string(),
            kind: SymbolKind::Class,
            name: String::new(),
            descriptor: String::new(),
        }
    }

    /// Identifies a field of `owner`.
    #[must_use]
    pub fn field(owner: &str, name: &str, descriptor: &str) -> Self {
        Self {
            owner: owner.to_string(),
            kind: SymbolKind::Field,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
        }
    }

    /// Identifies a method of `owner`.
    #[must_use]
    pub fn method(owner: &str, name: &str, descriptor: &str) -> Self {
        Self {
            owner: owner.to_string(),
            kind: SymbolKind::Method,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
        }
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            SymbolKind::Class => write!(f, "{}", self.owner),
            SymbolKind::Field | SymbolKind::Local => write!(f, "{}.{}", self.owner, self.name),
            SymbolKind::Method => write!(f, "{}.{}{}", self.owner, self.name, self.descriptor),
        }
    }
}

bitflags! {
    /// Access flags of a class file (JVMS §4.1).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ClassAccess: u16 {
        /// Declared public
        const PUBLIC = 0x0001;
        /// Declared final
        const FINAL = 0x0010;
        /// Treat superclass methods specially for invokespecial
        const SUPER = 0x0020;
        /// Is an interface, not a class
        const INTERFACE = 0x0200;
        /// Declared abstract
        const ABSTRACT = 0x0400;
        /// Not present in source code
        const SYNTHETIC = 0x1000;
        /// Declared as an annotation interface
        const ANNOTATION = 0x2000;
        /// Declared as an enum class
        const ENUM = 0x4000;
        /// Is a module, not a class
        const MODULE = 0x8000;
    }
}

bitflags! {
    /// Access flags of a field or method (JVMS §4.5, §4.6).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MemberAccess: u16 {
        /// Declared public
        const PUBLIC = 0x0001;
        /// Declared private
        const PRIVATE = 0x0002;
        /// Declared protected
        const PROTECTED = 0x0004;
        /// Declared static
        const STATIC = 0x0008;
        /// Declared final
        const FINAL = 0x0010;
        /// Method: declared synchronized
        const SYNCHRONIZED = 0x0020;
        /// Method: compiler-generated bridge method (shares its bit with field `volatile`)
        const BRIDGE = 0x0040;
        /// Method: variable arity (shares its bit with field `transient`)
        const VARARGS = 0x0080;
        /// Method: declared native
        const NATIVE = 0x0100;
        /// Method: declared abstract
        const ABSTRACT = 0x0400;
        /// Not present in source code
        const SYNTHETIC = 0x1000;
        /// Field: element of an enum class
        const ENUM = 0x4000;
    }
}

// Access flags travel as the raw `u16` of the class file.
macro_rules! impl_raw_serde {
    ($flags:ty) => {
        impl Serialize for $flags {
            fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
                serializer.serialize_u16(self.bits())
            }
        }

        impl<'de> Deserialize<'de> for $flags {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
                Ok(Self::from_bits_retain(u16::deserialize(deserializer)?))
            }
        }
    };
}

impl_raw_serde!(ClassAccess);
impl_raw_serde!(MemberAccess);

/// A field or method declared by a class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberInfo {
    /// Simple member name
    pub name: String,
    /// JVM field or method descriptor
    pub descriptor: String,
    /// Access flags
    #[serde(default)]
    pub access: MemberAccess,
}

impl MemberInfo {
    /// Creates a member with empty access flags.
    #[must_use]
    pub fn new(name: &str, descriptor: &str) -> Self {
        Self {
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            access: MemberAccess::empty(),
        }
    }

    /// Replaces the access flags.
    #[must_use]
    pub fn with_access(mut self, access: MemberAccess) -> Self {
        self.access = access;
        self
    }
}

/// Structure of one class, as yielded by the discovery traversal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassInfo {
    /// Internal name (`com/example/Foo`)
    pub name: String,
    /// Internal name of the superclass; `None` for `java/lang/Object` and modules
    #[serde(default)]
    pub super_name: Option<String>,
    /// Internal names of the directly implemented (or, for interfaces, extended) interfaces
    #[serde(default)]
    pub interfaces: Vec<String>,
    /// Class access flags
    #[serde(default)]
    pub access: ClassAccess,
    /// Declared fields
    #[serde(default)]
    pub fields: Vec<MemberInfo>,
    /// Declared methods
    #[serde(default)]
    pub methods: Vec<MemberInfo>,
    /// Classpath-only class: part of the hierarchy, never renamed or written
    #[serde(default)]
    pub library: bool,
}

impl ClassInfo {
    /// Creates a class extending `super_name`.
    #[must_use]
    pub fn new(name: &str, super_name: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            super_name: super_name.map(str::to_string),
            interfaces: Vec::new(),
            access: ClassAccess::PUBLIC | ClassAccess::SUPER,
            fields: Vec::new(),
            methods: Vec::new(),
            library: false,
        }
    }

    /// Creates an interface extending `interfaces`.
    #[must_use]
    pub fn interface(name: &str, interfaces: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            super_name: Some("java/lang/Object".to_string()),
            interfaces: interfaces.iter().map(|i| (*i).to_string()).collect(),
            access: ClassAccess::PUBLIC | ClassAccess::INTERFACE | ClassAccess::ABSTRACT,
            fields: Vec::new(),
            methods: Vec::new(),
            library: false,
        }
    }

    /// Adds directly implemented interfaces.
    #[must_use]
    pub fn implementing(mut self, interfaces: &[&str]) -> Self {
        self.interfaces
            .extend(interfaces.iter().map(|i| (*i).to_string()));
        self
    }

    /// Adds a field.
    #[must_use]
    pub fn with_field(mut self, name: &str, descriptor: &str) -> Self {
        self.fields.push(MemberInfo::new(name, descriptor));
        self
    }

    /// Adds a method.
    #[must_use]
    pub fn with_method(mut self, name: &str, descriptor: &str) -> Self {
        self.methods.push(MemberInfo::new(name, descriptor));
        self
    }

    /// Adds a method with explicit access flags.
    #[must_use]
    pub fn with_method_access(mut self, name: &str, descriptor: &str, access: MemberAccess) -> Self {
        self.methods
            .push(MemberInfo::new(name, descriptor).with_access(access));
        self
    }

    /// Marks the class as a classpath library class.
    #[must_use]
    pub fn as_library(mut self) -> Self {
        self.library = true;
        self
    }

    /// Returns true if the access flags classify this class as an interface.
    #[must_use]
    pub fn is_interface(&self) -> bool {
        self.access.contains(ClassAccess::INTERFACE)
    }
}

/// Discovery capability: yields every class of the input in one read-only pass.
///
/// Discovery must complete before any mapping decision is taken, since method
/// propagation needs full knowledge of the hierarchy.
pub trait ClassModelProvider: Send + Sync {
    /// Returns all classes of the input, in discovery order.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying class data cannot be read.
    fn discover(&self) -> Result<Vec<ClassInfo>>;
}

impl ClassModelProvider for Vec<ClassInfo> {
    fn discover(&self) -> Result<Vec<ClassInfo>> {
        Ok(self.clone())
    }
}

/// A class model loaded from a JSON dump (`{"classes": [ ... ]}`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JsonClassModel {
    /// All dumped classes, in discovery order
    pub classes: Vec<ClassInfo>,
}

impl JsonClassModel {
    /// Parses a JSON class dump.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Json`] if the text is not a valid class dump.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Reads a JSON class dump from disk.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::FileError`] or [`crate::Error::Json`] on failure.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}

impl ClassModelProvider for JsonClassModel {
    fn discover(&self) -> Result<Vec<ClassInfo>> {
        Ok(self.classes.clone())
    }
}

/// Converts a dotted class name (`com.example.Foo`) to its internal form (`com/example/Foo`).
#[must_use]
pub fn internal_name(name: &str) -> String {
    name.replace('.', "/")
}

/// Converts an internal class name (`com/example/Foo`) to its dotted form (`com.example.Foo`).
#[must_use]
pub fn dotted_name(name: &str) -> String {
    name.replace('/', ".")
}

/// Returns the package prefix of an internal name including the trailing `/`,
/// or an empty string for the default package.
#[must_use]
pub fn package_of(name: &str) -> &str {
    name.rfind('/').map_or("", |idx| &name[..=idx])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_conversions() {
        assert_eq!(internal_name("com.example.Foo"), "com/example/Foo");
        assert_eq!(dotted_name("com/example/Foo$Inner"), "com.example.Foo$Inner");
        assert_eq!(package_of("com/example/Foo"), "com/example/");
        assert_eq!(package_of("Foo"), "");
    }

    #[test]
    fn symbol_display() {
        assert_eq!(SymbolId::class("p/A").to_string(), "p/A");
        assert_eq!(SymbolId::field("p/A", "x", "I").to_string(), "p/A.x");
        assert_eq!(SymbolId::method("p/A", "foo", "()V").to_string(), "p/A.foo()V");
    }

    #[test]
    fn json_model() {
        let model = JsonClassModel::from_json(
            r#"{"classes": [
                {"name": "p/I", "access": 1537, "methods": [{"name": "bar", "descriptor": "()V"}]},
                {"name": "p/X", "super_name": "java/lang/Object", "interfaces": ["p/I"]}
            ]}"#,
        )
        .unwrap();

        let classes = model.discover().unwrap();
        assert_eq!(classes.len(), 2);
        assert!(classes[0].is_interface());
        assert!(!classes[1].is_interface());
        assert_eq!(classes[1].interfaces, vec!["p/I".to_string()]);
        assert_eq!(classes[0].methods[0].access, MemberAccess::empty());
    }
}
