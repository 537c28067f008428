//! # classcloak Prelude
//!
//! The most commonly used types of the library, for glob import.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all classcloak operations
pub use crate::Error;

/// The result type used throughout classcloak
pub use crate::Result;

// ================================================================================================
// Pipeline
// ================================================================================================

pub use crate::engine::{
    AbortHandle, ObfuscationEngine, ObfuscationResult, ObfuscationStats, RewriteJob, WriteOutcome,
};

pub use crate::config::{
    KeepRules, MemberRule, NamePattern, NamingConfig, NamingMode, ObfuscationConfig, RenamePolicy,
};

// ================================================================================================
// Class Model
// ================================================================================================

pub use crate::model::{
    ClassAccess, ClassInfo, ClassModelProvider, JsonClassModel, MemberAccess, MemberInfo, SymbolId,
    SymbolKind,
};

pub use crate::hierarchy::HierarchyModel;

pub use crate::descriptor::{parse_field_descriptor, parse_method_descriptor, JavaType, MethodDescriptor};

// ================================================================================================
// Mappings
// ================================================================================================

pub use crate::mapping::{MappingManager, MappingStore, MappingTables};

pub use crate::naming::{NameGenerator, NameGenerators};

pub use crate::export::{MappingExporter, MappingFormat};

// ================================================================================================
// Rewriting
// ================================================================================================

pub use crate::rewrite::{
    Archive, ArchiveCodec, ArchiveEntry, BulkRemapper, Manifest, RemapOutput, RemapTable,
    RewriteOptions, RewriteReport, Rewriter,
};
