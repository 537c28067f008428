use std::path::Path;

use anyhow::Context;
use classcloak::{config::ObfuscationConfig, engine::ObfuscationEngine};
use serde::Serialize;

use crate::{
    app::GlobalOptions,
    commands::common::{file_display_name, load_config, load_model, parse_mode},
    output::{print_output, Align, TabWriter},
};

/// Command-line overrides of the `map` subcommand.
pub struct MapOptions<'a> {
    pub output: &'a Path,
    pub format: Option<&'a str>,
    pub config: Option<&'a Path>,
    pub mode: Option<&'a str>,
    pub seed: Option<u64>,
    pub package: Option<&'a str>,
    pub keep: &'a [String],
    pub sequential: bool,
    pub global: &'a GlobalOptions,
}

#[derive(Debug, Serialize)]
pub struct MapSummary {
    pub model: String,
    pub mapping: String,
    pub format: String,
    pub mode: String,
    pub classes_discovered: usize,
    pub classes_renamed: usize,
    pub fields_renamed: usize,
    pub methods_renamed: usize,
    pub methods_propagated: usize,
    pub symbols_kept: usize,
    pub external_types: usize,
    pub elapsed_ms: u128,
}

/// The configuration file (or the defaults) with the command-line overrides applied.
fn build_config(opts: &MapOptions<'_>) -> anyhow::Result<ObfuscationConfig> {
    let mut config = load_config(opts.config)?;
    if let Some(mode) = opts.mode {
        config = config.with_mode(parse_mode(mode)?);
    }
    if let Some(seed) = opts.seed {
        config = config.with_seed(seed);
    }
    if let Some(package) = opts.package {
        config = config.with_package_scope(package);
    }
    for pattern in opts.keep {
        config = config.keep_class(pattern);
    }
    if opts.sequential {
        config = config.with_parallel(false);
    }
    if opts.global.verbose {
        config = config.with_verbose(true);
    }
    Ok(config)
}

pub fn run(model: &Path, opts: &MapOptions<'_>) -> anyhow::Result<()> {
    let config = build_config(opts)?;
    let mode = config.naming.mode.to_string();

    let engine = ObfuscationEngine::new(config).context("invalid configuration")?;
    let classes = load_model(model)?;

    let result = engine
        .run(&classes)
        .with_context(|| format!("failed to map {}", model.display()))?;
    let stats = result.stats.clone();

    let outcome = engine
        .write(result, opts.output, opts.format, None)
        .with_context(|| format!("failed to write mapping: {}", opts.output.display()))?;

    let summary = MapSummary {
        model: file_display_name(model),
        mapping: opts.output.display().to_string(),
        format: outcome.format,
        mode,
        classes_discovered: stats.classes_discovered,
        classes_renamed: stats.classes_renamed,
        fields_renamed: stats.fields_renamed,
        methods_renamed: stats.methods_renamed,
        methods_propagated: stats.methods_propagated,
        symbols_kept: stats.symbols_kept,
        external_types: stats.external_types,
        elapsed_ms: stats.elapsed.as_millis(),
    };

    print_output(&summary, opts.global, |s| {
        println!("Model:     {}", s.model);
        println!("Mapping:   {} ({})", s.mapping, s.format);
        println!("Mode:      {}", s.mode);
        println!("Elapsed:   {} ms", s.elapsed_ms);
        println!();

        let mut tw = TabWriter::new(&[("Symbols", Align::Left), ("Count", Align::Right)]).indent("  ");
        tw.row(vec!["Classes discovered".into(), s.classes_discovered.to_string()]);
        tw.row(vec!["Classes renamed".into(), s.classes_renamed.to_string()]);
        tw.row(vec!["Fields renamed".into(), s.fields_renamed.to_string()]);
        tw.row(vec!["Methods renamed".into(), s.methods_renamed.to_string()]);
        tw.row(vec!["  via propagation".into(), s.methods_propagated.to_string()]);
        tw.row(vec!["Kept".into(), s.symbols_kept.to_string()]);
        tw.row(vec!["External supertypes".into(), s.external_types.to_string()]);
        tw.print();
    })
}
