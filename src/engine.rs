//! The renaming pipeline for one archive.
//!
//! [`ObfuscationEngine::run`] executes discovery, the class pass and the member
//! pass and returns the finalized [`MappingStore`]. [`ObfuscationEngine::write`]
//! then exports the mapping file and, optionally, rewrites the archive.
//!
//! # Phases
//!
//! 1. **Discovery**: the [`ClassModelProvider`] yields every class once; the
//!    [`HierarchyModel`] is filled from it, on the rayon pool when `parallel` is set.
//! 2. **Class pass**: sequential, in discovery order. This is a barrier: no member
//!    is looked at before every class mapping exists.
//! 3. **Member pass**: one task per class, on the rayon pool when `parallel` is set
//!    and no seed is configured. A seeded run names members in discovery order so the
//!    same seed always yields the same mapping.
//! 4. **Store**: the manager's tables are frozen into a [`MappingStore`].
//!
//! # Write Ordering
//!
//! The mapping file is exported before the archive is rewritten. If the export
//! fails, the archive is never touched. If the rewrite fails, the mapping file
//! exists but the destination archive does not, since the rewrite goes through a
//! staging file.
//!
//! # Aborting
//!
//! An [`AbortHandle`] may be triggered from any thread. Phases that have not
//! started yet fail with [`Error::Aborted`]; inserts already in flight finish.

use std::{
    path::Path,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use rayon::prelude::*;
use serde::Serialize;

use crate::{
    config::ObfuscationConfig,
    export::{MappingExporter, MappingFormat},
    hierarchy::HierarchyModel,
    mapping::{MappingManager, MappingStore},
    model::{ClassInfo, ClassModelProvider},
    rewrite::{RewriteOptions, RewriteReport, Rewriter},
    Error, Result,
};

/// Shared flag that stops a run between phases.
#[derive(Debug, Clone, Default)]
pub struct AbortHandle(Arc<AtomicBool>);

impl AbortHandle {
    /// Creates an untriggered handle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests the run to stop.
    pub fn abort(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Returns true once [`AbortHandle::abort`] was called.
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<()> {
        if self.is_aborted() {
            Err(Error::Aborted)
        } else {
            Ok(())
        }
    }
}

/// Counters of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ObfuscationStats {
    /// Classes yielded by discovery, library classes included
    pub classes_discovered: usize,
    /// Class mappings
    pub classes_renamed: usize,
    /// Field mappings
    pub fields_renamed: usize,
    /// Method mappings, propagated ones included
    pub methods_renamed: usize,
    /// Method mappings created by propagation
    pub methods_propagated: usize,
    /// Symbols in the keep set
    pub symbols_kept: usize,
    /// Referenced supertypes without bytecode
    pub external_types: usize,
    /// Wall time of the mapping phases
    pub elapsed: Duration,
}

/// The outcome of [`ObfuscationEngine::run`].
pub struct ObfuscationResult {
    /// The finalized mappings
    pub store: MappingStore,
    /// Run counters
    pub stats: ObfuscationStats,
}

/// The archive rewrite half of [`ObfuscationEngine::write`].
pub struct RewriteJob<'a> {
    /// Codec and remapper to use
    pub rewriter: Rewriter<'a>,
    /// Original archive
    pub input: &'a Path,
    /// Destination archive
    pub output: &'a Path,
    /// Overrides, resources and classpath
    pub options: &'a RewriteOptions,
}

/// What [`ObfuscationEngine::write`] produced.
#[derive(Debug, Clone, Serialize)]
pub struct WriteOutcome {
    /// Format of the mapping file
    pub format: String,
    /// Report of the archive rewrite, if one ran
    pub rewrite: Option<RewriteReport>,
}

/// Runs the renaming pipeline with one configuration.
pub struct ObfuscationEngine {
    config: ObfuscationConfig,
    abort: AbortHandle,
}

impl ObfuscationEngine {
    /// Creates an engine after validating the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the configuration is unusable.
    pub fn new(config: ObfuscationConfig) -> Result<Self> {
        config.validate()?;
        Ok(ObfuscationEngine {
            config,
            abort: AbortHandle::new(),
        })
    }

    /// The configuration of this engine.
    #[must_use]
    pub fn config(&self) -> &ObfuscationConfig {
        &self.config
    }

    /// A handle that aborts this engine's runs.
    #[must_use]
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    /// Discovers all classes and computes their mappings.
    ///
    /// # Errors
    ///
    /// Returns discovery errors of the provider, [`Error::NamespaceExhausted`] from
    /// the random naming modes and [`Error::Aborted`] if the run was aborted.
    pub fn run(&self, provider: &dyn ClassModelProvider) -> Result<ObfuscationResult> {
        let started = Instant::now();

        self.abort.check()?;
        let classes = provider.discover()?;
        let hierarchy = Arc::new(self.build_hierarchy(&classes));
        let external = hierarchy.external_types();
        for name in &external {
            log::debug!("External supertype {name}");
        }
        log::info!(
            "Discovered {} classes ({} external supertypes)",
            classes.len(),
            external.len()
        );

        self.abort.check()?;
        let manager = MappingManager::from_config(&self.config, Arc::clone(&hierarchy));
        let names: Vec<String> = classes.iter().map(|c| c.name.clone()).collect();
        let renamed = manager.generate_class_mappings(&names)?;
        log::info!("Class pass: {renamed} classes renamed");

        self.abort.check()?;
        self.member_pass(&manager, &classes)?;

        let store = manager.build_store();
        let stats = ObfuscationStats {
            classes_discovered: classes.len(),
            classes_renamed: store.class_count(),
            fields_renamed: store.field_count(),
            methods_renamed: store.method_count(),
            methods_propagated: manager.propagated_count(),
            symbols_kept: manager.kept_count(),
            external_types: external.len(),
            elapsed: started.elapsed(),
        };
        log::info!(
            "Member pass: {} fields, {} methods ({} propagated), {} kept",
            stats.fields_renamed,
            stats.methods_renamed,
            stats.methods_propagated,
            stats.symbols_kept
        );

        Ok(ObfuscationResult { store, stats })
    }

    fn build_hierarchy(&self, classes: &[ClassInfo]) -> HierarchyModel {
        if self.config.parallel {
            let hierarchy = HierarchyModel::new();
            classes.par_iter().for_each(|class| hierarchy.add_class(class));
            hierarchy
        } else {
            HierarchyModel::from_classes(classes)
        }
    }

    fn member_pass(&self, manager: &MappingManager, classes: &[ClassInfo]) -> Result<()> {
        let visit = |class: &ClassInfo| {
            self.abort.check()?;
            manager.generate_member_mappings(class)
        };

        if self.config.parallel && self.config.naming.seed.is_none() {
            classes.par_iter().try_for_each(visit)
        } else {
            if self.config.parallel {
                log::debug!("Seeded naming: running the member pass in discovery order");
            }
            classes.iter().try_for_each(visit)
        }
    }

    /// Exports the mapping file, then rewrites the archive if a job is given.
    ///
    /// Consumes the result: the store is dropped once both outputs exist.
    ///
    /// # Arguments
    ///
    /// * `result` - The outcome of [`ObfuscationEngine::run`]
    /// * `mapping_path` - Destination of the mapping file
    /// * `format` - Explicit mapping format name, or `None` to detect it from `mapping_path`
    /// * `rewrite` - Optional archive rewrite
    ///
    /// # Errors
    ///
    /// Returns [`Error::Aborted`] if the run was aborted, any export error, and any
    /// rewrite error. A rewrite error leaves the exported mapping file in place.
    pub fn write(
        &self,
        result: ObfuscationResult,
        mapping_path: &Path,
        format: Option<&str>,
        rewrite: Option<RewriteJob<'_>>,
    ) -> Result<WriteOutcome> {
        self.abort.check()?;
        let format: MappingFormat = MappingExporter::new().export(&result.store, mapping_path, format)?;

        let report = match rewrite {
            Some(job) => {
                self.abort.check()?;
                Some(job.rewriter.rewrite(job.input, job.output, &result.store, job.options)?)
            }
            None => None,
        };

        drop(result);
        Ok(WriteOutcome {
            format: format.to_string(),
            rewrite: report,
        })
    }
}
