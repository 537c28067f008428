//! Applying a finalized mapping back to a class archive.
//!
//! The rewrite runs strictly after the mapping phase and is single-threaded per
//! archive. It follows a fixed protocol:
//!
//! 1. The [`BulkRemapper`] renames classes and rewrites every internal reference.
//! 2. Reconciliation removes entries still named after a renamed original class
//!    and collapses any remaining duplicate entries.
//! 3. Manifest overrides are applied and entry-point attributes are mapped through
//!    the class table.
//! 4. Auxiliary resources are merged; a path collision is skipped and reported.
//!
//! [`Rewriter::rewrite`] writes the result to a staging file in the destination
//! directory and moves it into place only after every step succeeded, so a failed
//! run never leaves a partial archive at the destination.

pub mod archive;
pub mod reconcile;
pub mod remapper;

use std::{
    collections::BTreeMap,
    io::Write,
    path::{Path, PathBuf},
};

use serde::Serialize;
use tempfile::NamedTempFile;

use crate::{mapping::MappingStore, Error, Result};

pub use archive::{class_entry_name, Archive, ArchiveCodec, ArchiveEntry, Manifest, MANIFEST_PATH};
pub use remapper::{BulkRemapper, RemapOutput, RemapTable};

/// Inputs of a rewrite besides the archive and the mappings.
#[derive(Debug, Clone, Default)]
pub struct RewriteOptions {
    /// Manifest attributes to set before entry points are mapped, in the original
    /// namespace (for example `Main-Class`)
    pub manifest_overrides: BTreeMap<String, String>,
    /// Non-class resources to add to the output
    pub resources: Vec<ArchiveEntry>,
    /// Library archives for the remapper
    pub classpath: Vec<PathBuf>,
}

impl RewriteOptions {
    /// Creates empty options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a manifest override.
    #[must_use]
    pub fn with_manifest_attribute(mut self, name: &str, value: &str) -> Self {
        self.manifest_overrides
            .insert(name.to_string(), value.to_string());
        self
    }

    /// Adds a resource.
    #[must_use]
    pub fn with_resource(mut self, entry: ArchiveEntry) -> Self {
        self.resources.push(entry);
        self
    }

    /// Adds a classpath archive.
    #[must_use]
    pub fn with_classpath(mut self, path: &Path) -> Self {
        self.classpath.push(path.to_path_buf());
        self
    }
}

/// What a rewrite changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RewriteReport {
    /// Entries removed because they still carried an original class name
    pub removed_stale: Vec<String>,
    /// Entry names that appeared more than once
    pub collapsed_duplicates: Vec<String>,
    /// Manifest attributes whose value changed
    pub manifest_attributes: Vec<String>,
    /// Resources added to the output
    pub merged_resources: Vec<String>,
    /// Resources skipped because their path was taken
    pub skipped_resources: Vec<String>,
    /// External supertypes reported by the remapper
    pub unresolved_types: Vec<String>,
    /// Entry count of the output archive
    pub entries: usize,
}

/// Drives the rewrite protocol over an archive codec and a bulk remapper.
pub struct Rewriter<'a> {
    codec: &'a dyn ArchiveCodec,
    remapper: &'a dyn BulkRemapper,
}

impl<'a> Rewriter<'a> {
    /// Creates a rewriter.
    #[must_use]
    pub fn new(codec: &'a dyn ArchiveCodec, remapper: &'a dyn BulkRemapper) -> Self {
        Rewriter { codec, remapper }
    }

    /// Runs the rewrite protocol in memory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RemapFailed`] if the remapper fails, or [`Error::Archive`]
    /// if reconciliation finds a class the remapper did not rename.
    pub fn rewrite_archive(
        &self,
        archive: &Archive,
        store: &MappingStore,
        options: &RewriteOptions,
    ) -> Result<(Archive, RewriteReport)> {
        let table = RemapTable::from_store(store);
        let RemapOutput {
            archive: mut output,
            unresolved,
        } = self.remapper.remap(archive, &table, &options.classpath)?;

        for external in &unresolved {
            log::warn!("No bytecode for {external}, treated as an external type");
        }

        let mut report = RewriteReport {
            unresolved_types: unresolved,
            ..RewriteReport::default()
        };

        report.removed_stale = reconcile::remove_stale_entries(&mut output, &table)?;
        report.collapsed_duplicates = reconcile::collapse_duplicates(&mut output);

        if output.manifest.is_none() && !options.manifest_overrides.is_empty() {
            output.manifest = Some(Manifest::new());
        }
        if let Some(manifest) = output.manifest.as_mut() {
            report.manifest_attributes =
                reconcile::update_manifest(manifest, &table, &options.manifest_overrides);
        }

        let (merged, skipped) = reconcile::merge_resources(&mut output, &options.resources);
        report.merged_resources = merged;
        report.skipped_resources = skipped;
        report.entries = output.entries.len();

        Ok((output, report))
    }

    /// Rewrites the archive at `input` into `output`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileError`] for I/O failures, and every error of
    /// [`Rewriter::rewrite_archive`] and of the codec. On error, `output` is left
    /// untouched.
    pub fn rewrite(
        &self,
        input: &Path,
        output: &Path,
        store: &MappingStore,
        options: &RewriteOptions,
    ) -> Result<RewriteReport> {
        let bytes = std::fs::read(input)?;
        let archive = self.codec.decode(&bytes)?;

        let (rewritten, report) = self.rewrite_archive(&archive, store, options)?;
        let encoded = self.codec.encode(&rewritten)?;

        let directory = output
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut staging = NamedTempFile::new_in(directory)?;
        staging.write_all(&encoded)?;
        staging.as_file_mut().sync_all()?;
        staging
            .persist(output)
            .map_err(|e| Error::FileError(e.error))?;

        log::info!(
            "Wrote {} ({} entries, {} stale removed)",
            output.display(),
            report.entries,
            report.removed_stale.len()
        );
        Ok(report)
    }
}
