use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// classcloak - hierarchy-aware symbol renaming for JVM class archives
#[derive(Debug, Parser)]
#[command(name = "classcloak", version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOptions,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared across all subcommands.
#[derive(Debug, Parser)]
pub struct GlobalOptions {
    /// Emit output as JSON instead of human-readable text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Log debug output and every individual mapping decision.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build the mapping for a JSON class model and export it.
    Map {
        /// Path to the JSON class model ({"classes": [...]}).
        #[arg(value_name = "MODEL")]
        model: PathBuf,

        /// Mapping file to write.
        #[arg(short, long, value_name = "MAPPING")]
        output: PathBuf,

        /// Mapping format: proguard, srg, tiny, json, csv, report, retrace.
        /// Detected from the output path when omitted.
        #[arg(short, long)]
        format: Option<String>,

        /// JSON file with an obfuscation configuration.
        #[arg(short, long, value_name = "CONFIG")]
        config: Option<PathBuf>,

        /// Naming mode: sequential-prefixed, sequential-alphabetic, random-short,
        /// random-long, single-char.
        #[arg(short, long)]
        mode: Option<String>,

        /// Seed for the random naming modes.
        #[arg(long)]
        seed: Option<u64>,

        /// Only rename classes inside this package.
        #[arg(long, value_name = "PACKAGE")]
        package: Option<String>,

        /// Keep classes matching this pattern (repeatable).
        #[arg(long, value_name = "PATTERN")]
        keep: Vec<String>,

        /// Run all phases on the current thread.
        #[arg(long)]
        sequential: bool,
    },

    /// Resolve an obfuscated name back to its original name.
    Lookup {
        /// Path to a JSON mapping file.
        #[arg(value_name = "MAPPING")]
        mapping: PathBuf,

        /// Obfuscated class name, or `owner.member` with an obfuscated owner.
        #[arg(value_name = "NAME")]
        name: String,
    },
}
