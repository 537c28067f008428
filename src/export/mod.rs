//! Mapping file exporters.
//!
//! A finalized [`MappingStore`] is serialized into exactly one of seven formats.
//! Every format has a fixed shape and sorts by original name throughout, so two runs
//! with the same mappings produce byte-identical files (apart from timestamps in the
//! JSON and report formats).
//!
//! | Format | Typical file name | Content |
//! |--------|-------------------|---------|
//! | [`MappingFormat::ProGuard`] | `mapping.txt` | class headers with Java-typed members |
//! | [`MappingFormat::Srg`] | `mapping.srg` | `CL:` / `FD:` / `MD:` lines |
//! | [`MappingFormat::Tiny`] | `mapping.tiny` | tab-separated Tiny v2 |
//! | [`MappingFormat::Json`] | `mapping.json` | metadata, mappings and statistics |
//! | [`MappingFormat::Csv`] | `mapping.csv` | one row per symbol |
//! | [`MappingFormat::Report`] | `report.txt` | human-readable listing |
//! | [`MappingFormat::Retrace`] | `mapping.retrace` | method lines with placeholder line ranges |
//!
//! # Format Selection
//!
//! [`MappingFormat::resolve`] prefers an explicit format name. Without one, or when
//! the name is not recognized (which is logged as a warning), the format is detected
//! from the destination file name: first by extension, then by substring, falling
//! back to ProGuard.
//!
//! # Examples
//!
//! ```rust
//! use classcloak::export::{MappingExporter, MappingFormat};
//! use classcloak::mapping::MappingStore;
//!
//! let store = MappingStore::new();
//! store.map_class("p/A", "a1");
//! store.map_method("p/A", "foo", "()V", "m1");
//!
//! let text = MappingExporter::new().render(&store, MappingFormat::Srg)?;
//! assert!(text.starts_with("CL: p/A a1\n"));
//! assert!(text.contains("MD: p/A/foo ()V a1/m1 ()V"));
//! # Ok::<(), classcloak::Error>(())
//! ```

mod csv;
pub mod json;
mod proguard;
mod report;
mod retrace;
mod srg;
mod tiny;

use std::{
    collections::{BTreeMap, BTreeSet},
    io::Write,
    path::Path,
};

use strum::{Display, EnumIter, EnumString};
use tempfile::NamedTempFile;

use crate::{
    mapping::{split_field_key, split_method_key, MappingStore, MappingTables},
    Error, Result,
};

/// Placeholder type for fields whose descriptor is unknown.
const UNKNOWN_TYPE: &str = "?";

/// The supported mapping file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum MappingFormat {
    /// ProGuard `mapping.txt`
    #[default]
    #[strum(to_string = "proguard", serialize = "pg")]
    ProGuard,
    /// Searge (`CL:`/`FD:`/`MD:`)
    #[strum(to_string = "srg", serialize = "searge")]
    Srg,
    /// Tiny v2
    #[strum(to_string = "tiny", serialize = "tiny2", serialize = "tinyv2")]
    Tiny,
    /// JSON document
    Json,
    /// Comma-separated values
    Csv,
    /// Human-readable report
    #[strum(to_string = "report", serialize = "text", serialize = "txt")]
    Report,
    /// Retrace-compatible ProGuard dialect
    Retrace,
}

impl MappingFormat {
    /// Detects the format from a destination file name.
    ///
    /// The extension is checked first (`.srg`, `.tiny`, `.json`, `.csv`,
    /// `.retrace`, `.report`), then the lowercase file stem is searched for a
    /// format name. Anything else, `.tsrg` included, is ProGuard.
    #[must_use]
    pub fn detect(path: &Path) -> MappingFormat {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("srg") => return MappingFormat::Srg,
            Some("tiny") => return MappingFormat::Tiny,
            Some("json") => return MappingFormat::Json,
            Some("csv") => return MappingFormat::Csv,
            Some("retrace") => return MappingFormat::Retrace,
            Some("report") => return MappingFormat::Report,
            Some("pro" | "proguard") => return MappingFormat::ProGuard,
            _ => {}
        }

        let file_name = path
            .file_stem()
            .and_then(|n| n.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        [
            ("retrace", MappingFormat::Retrace),
            ("tiny", MappingFormat::Tiny),
            ("srg", MappingFormat::Srg),
            ("json", MappingFormat::Json),
            ("csv", MappingFormat::Csv),
            ("report", MappingFormat::Report),
        ]
        .into_iter()
        .find(|(needle, _)| file_name.contains(needle))
        .map_or(MappingFormat::ProGuard, |(_, format)| format)
    }

    /// Picks the format for a destination: the explicit name if it is known,
    /// otherwise the detected one.
    #[must_use]
    pub fn resolve(explicit: Option<&str>, path: &Path) -> MappingFormat {
        match explicit {
            Some(name) => name.trim().parse().unwrap_or_else(|_| {
                let detected = MappingFormat::detect(path);
                log::warn!(
                    "Unknown mapping format '{}', using {} detected from {}",
                    name,
                    detected,
                    path.display()
                );
                detected
            }),
            None => MappingFormat::detect(path),
        }
    }
}

/// A field row of the export view.
pub(crate) struct FieldRow {
    pub name: String,
    pub descriptor: Option<String>,
    pub obfuscated: String,
}

/// A method row of the export view.
pub(crate) struct MethodRow {
    pub name: String,
    pub descriptor: String,
    pub obfuscated: String,
}

/// The store's tables regrouped by owner class, as most formats need them.
pub(crate) struct ExportView {
    pub tables: MappingTables,
    /// Every class with a mapping or with a mapped member
    pub classes: BTreeSet<String>,
    pub fields: BTreeMap<String, Vec<FieldRow>>,
    pub methods: BTreeMap<String, Vec<MethodRow>>,
    pub kept_classes: Vec<String>,
    pub kept_fields: Vec<String>,
    pub kept_methods: Vec<String>,
    /// family root method key -> member method keys
    pub groups: BTreeMap<String, Vec<String>>,
    pub generator: String,
    pub generated_at: String,
}

impl ExportView {
    fn new(store: &MappingStore, generator: &str) -> Self {
        let tables = store.tables();
        let mut classes: BTreeSet<String> = tables.classes.keys().cloned().collect();
        let mut fields: BTreeMap<String, Vec<FieldRow>> = BTreeMap::new();
        let mut methods: BTreeMap<String, Vec<MethodRow>> = BTreeMap::new();

        for (key, obfuscated) in &tables.fields {
            let Some((owner, name)) = split_field_key(key) else {
                continue;
            };
            classes.insert(owner.to_string());
            fields.entry(owner.to_string()).or_default().push(FieldRow {
                name: name.to_string(),
                descriptor: store.field_descriptor(owner, name),
                obfuscated: obfuscated.clone(),
            });
        }

        for (key, obfuscated) in &tables.methods {
            let Some((owner, name, descriptor)) = split_method_key(key) else {
                continue;
            };
            classes.insert(owner.to_string());
            methods.entry(owner.to_string()).or_default().push(MethodRow {
                name: name.to_string(),
                descriptor: descriptor.to_string(),
                obfuscated: obfuscated.clone(),
            });
        }

        ExportView {
            tables,
            classes,
            fields,
            methods,
            kept_classes: store.kept_classes(),
            kept_fields: store.kept_fields(),
            kept_methods: store.kept_methods(),
            groups: store.hierarchy_groups(),
            generator: generator.to_string(),
            generated_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Final internal name of a class.
    pub fn class_name<'a>(&'a self, original: &'a str) -> &'a str {
        self.tables
            .classes
            .get(original)
            .map_or(original, String::as_str)
    }

    pub fn fields_of(&self, class: &str) -> &[FieldRow] {
        self.fields.get(class).map_or(&[], Vec::as_slice)
    }

    pub fn methods_of(&self, class: &str) -> &[MethodRow] {
        self.methods.get(class).map_or(&[], Vec::as_slice)
    }
}

/// Serializes mapping stores to files.
pub struct MappingExporter {
    generator: String,
}

impl Default for MappingExporter {
    fn default() -> Self {
        Self {
            generator: format!("classcloak {}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl MappingExporter {
    /// Creates an exporter that identifies itself with the crate name and version.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the generator string written by the JSON and report formats.
    #[must_use]
    pub fn with_generator(mut self, generator: &str) -> Self {
        self.generator = generator.to_string();
        self
    }

    /// Writes the store in `format` to any writer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileError`] or [`Error::Json`] if writing fails.
    pub fn write_to<W: Write>(&self, store: &MappingStore, format: MappingFormat, out: &mut W) -> Result<()> {
        let view = ExportView::new(store, &self.generator);
        match format {
            MappingFormat::ProGuard => proguard::write(&view, out),
            MappingFormat::Srg => srg::write(&view, out),
            MappingFormat::Tiny => tiny::write(&view, out),
            MappingFormat::Json => json::write(&view, out),
            MappingFormat::Csv => csv::write(&view, out),
            MappingFormat::Report => report::write(&view, out),
            MappingFormat::Retrace => retrace::write(&view, out),
        }
    }

    /// Renders the store in `format` to a string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if JSON serialization fails.
    pub fn render(&self, store: &MappingStore, format: MappingFormat) -> Result<String> {
        let mut buffer = Vec::new();
        self.write_to(store, format, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| Error::Error(format!("non UTF-8 mapping output: {e}")))
    }

    /// Exports the store to `path` and returns the format that was used.
    ///
    /// The file is written to a staging file next to `path` and moved into place
    /// only once it is complete, so a failed export never leaves a partial file.
    ///
    /// # Arguments
    ///
    /// * `store` - The finalized mappings
    /// * `path` - Destination file
    /// * `format` - Explicit format name; `None` (or an unknown name) detects the
    ///   format from `path`
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileError`] if the staging file cannot be created, written
    /// or moved into place.
    pub fn export(&self, store: &MappingStore, path: &Path, format: Option<&str>) -> Result<MappingFormat> {
        let format = MappingFormat::resolve(format, path);

        let directory = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut staging = NamedTempFile::new_in(directory)?;
        self.write_to(store, format, staging.as_file_mut())?;
        staging.as_file_mut().flush()?;
        staging.persist(path).map_err(|e| Error::FileError(e.error))?;

        log::info!(
            "Exported {} mappings as {} to {}",
            store.total(),
            format,
            path.display()
        );
        Ok(format)
    }
}
