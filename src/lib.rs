// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![deny(unsafe_code)]

//! # classcloak
//!
//! Symbol renaming for JVM class archives. `classcloak` assigns short, meaningless
//! names to the classes, fields and methods of an application, keeps the renaming
//! consistent across the inheritance hierarchy so that overriding still works,
//! exports the result in the common mapping file formats, and applies it back to
//! the archive through a pluggable bulk remapper.
//!
//! ## Features
//!
//! - **Hierarchy-aware method renaming** - Overrides and interface implementations
//!   share one name, independent of discovery order
//! - **Five naming modes** - Prefixed counters, alphabetic counters, random short and
//!   long names, single characters
//! - **Keep rules** - Exempt classes, fields and methods by exact name or wildcard
//! - **Seven mapping formats** - ProGuard, SRG, Tiny v2, JSON, CSV, a plain-text
//!   report and a retrace-friendly variant
//! - **Atomic outputs** - Mapping files and archives are written through staging
//!   files, so a failed run never leaves a partial output behind
//! - **Parallel member pass** - Member mappings are computed on the rayon pool
//!
//! ## Quick Start
//!
//! ```rust
//! use classcloak::prelude::*;
//!
//! let classes = vec![
//!     ClassInfo::new("com/example/Shape", Some("java/lang/Object"))
//!         .with_method("area", "()D"),
//!     ClassInfo::new("com/example/Circle", Some("com/example/Shape"))
//!         .with_field("radius", "D")
//!         .with_method("area", "()D"),
//! ];
//!
//! let engine = ObfuscationEngine::new(ObfuscationConfig::default())?;
//! let result = engine.run(&classes)?;
//!
//! // the override shares the name of the overridden method
//! assert_eq!(
//!     result.store.get_obfuscated_method("com/example/Shape", "area", "()D"),
//!     result.store.get_obfuscated_method("com/example/Circle", "area", "()D"),
//! );
//!
//! let proguard = MappingExporter::new().render(&result.store, MappingFormat::ProGuard)?;
//! assert!(proguard.contains("com.example.Circle -> c2:"));
//! # Ok::<(), classcloak::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`model`] and [`hierarchy`] - What discovery found, and the type graph built from it
//! - [`naming`] - Fresh name generation per symbol kind
//! - [`mapping`] - The mapping manager (decisions) and the mapping store (finalized result)
//! - [`export`] - Mapping file writers and the JSON reader
//! - [`rewrite`] - Applying a mapping back to an archive
//! - [`engine`] - The pipeline tying the phases together

#[macro_use]
pub(crate) mod macros;

#[macro_use]
pub(crate) mod error;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use classcloak::prelude::*;
///
/// let store = MappingStore::new();
/// store.map_class("com/example/Foo", "c1");
/// assert_eq!(store.get_original_name("c1").as_deref(), Some("com/example/Foo"));
/// ```
pub mod prelude;

/// Run configuration: toggles, naming, package scope and keep rules.
pub mod config;

/// JVM type descriptors: parsing, Java-source rendering and class remapping.
pub mod descriptor;

/// The renaming pipeline: discovery, class pass, member pass, outputs.
pub mod engine;

/// Mapping file formats.
///
/// [`export::MappingExporter`] renders a [`mapping::MappingStore`] in one of the
/// [`export::MappingFormat`]s and writes it atomically. JSON files can be read
/// back with [`export::json::read`].
pub mod export;

/// The class hierarchy over all discovered and referenced types.
pub mod hierarchy;

/// Mapping decisions and the finalized mapping tables.
pub mod mapping;

/// Discovered classes, members and symbol identities.
pub mod model;

/// Fresh name generators.
pub mod naming;

/// Archive rewriting through a bulk remapper, with reconciliation.
pub mod rewrite;

/// `classcloak` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `classcloak` Error type
///
/// # Examples
///
/// ```rust
/// use classcloak::{export::json, Error};
///
/// match json::parse("not json") {
///     Ok(_) => unreachable!(),
///     Err(Error::Json(e)) => println!("invalid mapping file: {e}"),
///     Err(e) => println!("Error: {e}"),
/// }
/// ```
pub use error::Error;
