//! JSON mapping documents.
//!
//! ```json
//! {
//!   "metadata": { "format_version": "1.0", "generated_at": "...", "generator": "classcloak 0.1.0" },
//!   "mappings": {
//!     "classes": { "p/A": "a1" },
//!     "fields": { "p/A.count": "f1" },
//!     "methods": { "p/A.foo()V": "m1" }
//!   },
//!   "statistics": { "classes": 1, "fields": 1, "methods": 1, "total": 3 }
//! }
//! ```
//!
//! This is the one format with a reader: [`parse`] and [`read`] recover the exact
//! [`MappingTables`] a document was written from.

use std::{io::Write, path::Path};

use serde::{Deserialize, Serialize};

use crate::{export::ExportView, mapping::MappingTables, Result};

/// Version of the document layout.
pub const FORMAT_VERSION: &str = "1.0";

/// Header block of a JSON mapping document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metadata {
    /// Document layout version
    pub format_version: String,
    /// RFC 3339 generation time
    pub generated_at: String,
    /// Name and version of the producing tool
    pub generator: String,
}

/// Per-kind mapping counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Statistics {
    /// Class mappings
    pub classes: usize,
    /// Field mappings
    pub fields: usize,
    /// Method mappings
    pub methods: usize,
    /// Sum of all kinds
    pub total: usize,
}

impl Statistics {
    /// Counts the mappings of a snapshot.
    #[must_use]
    pub fn of(tables: &MappingTables) -> Self {
        Statistics {
            classes: tables.classes.len(),
            fields: tables.fields.len(),
            methods: tables.methods.len(),
            total: tables.total(),
        }
    }
}

/// A complete JSON mapping document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingDocument {
    /// Header block
    #[serde(default)]
    pub metadata: Metadata,
    /// The three mapping tables
    pub mappings: MappingTables,
    /// Counts, as written; not validated on read
    #[serde(default)]
    pub statistics: Statistics,
}

pub(crate) fn write<W: Write>(view: &ExportView, out: &mut W) -> Result<()> {
    let document = MappingDocument {
        metadata: Metadata {
            format_version: FORMAT_VERSION.to_string(),
            generated_at: view.generated_at.clone(),
            generator: view.generator.clone(),
        },
        statistics: Statistics::of(&view.tables),
        mappings: view.tables.clone(),
    };

    serde_json::to_writer_pretty(&mut *out, &document)?;
    writeln!(out)?;
    Ok(())
}

/// Parses a JSON mapping document.
///
/// # Errors
///
/// Returns [`crate::Error::Json`] if the text is not a mapping document.
pub fn parse_document(text: &str) -> Result<MappingDocument> {
    Ok(serde_json::from_str(text)?)
}

/// Parses a JSON mapping document and returns its mapping tables.
///
/// # Errors
///
/// Returns [`crate::Error::Json`] if the text is not a mapping document.
pub fn parse(text: &str) -> Result<MappingTables> {
    Ok(parse_document(text)?.mappings)
}

/// Reads the mapping tables of a JSON mapping file.
///
/// # Errors
///
/// Returns [`crate::Error::FileError`] if the file cannot be read, or
/// [`crate::Error::Json`] if it is not a mapping document.
pub fn read(path: &Path) -> Result<MappingTables> {
    let text = std::fs::read_to_string(path)?;
    parse(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        export::{MappingExporter, MappingFormat},
        mapping::MappingStore,
    };

    #[test]
    fn document_layout() {
        let store = MappingStore::new();
        store.map_class("p/A", "a1");
        store.map_field("p/A", "count", "I", "f1");
        store.map_method("p/A", "foo", "()V", "m1");

        let text = MappingExporter::new()
            .with_generator("test")
            .render(&store, MappingFormat::Json)
            .unwrap();
        let document = parse_document(&text).unwrap();

        assert_eq!(document.metadata.format_version, FORMAT_VERSION);
        assert_eq!(document.metadata.generator, "test");
        assert!(chrono::DateTime::parse_from_rfc3339(&document.metadata.generated_at).is_ok());
        assert_eq!(document.statistics.total, 3);
        assert_eq!(document.mappings, store.tables());

        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["mappings"]["methods"]["p/A.foo()V"], "m1");
        assert_eq!(value["statistics"]["fields"], 1);
    }

    #[test]
    fn bare_mappings_are_accepted() {
        let tables = parse(r#"{"mappings": {"classes": {"p/A": "a1"}}}"#).unwrap();
        assert_eq!(tables.classes["p/A"], "a1");
        assert!(tables.methods.is_empty());
        assert!(parse("[]").is_err());
    }
}
