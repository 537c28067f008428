mod app;
mod commands;
mod output;

use std::io::Write;

use clap::Parser;

use crate::app::{Cli, Command, GlobalOptions};

/// Phase summaries at info, per-symbol decisions with `--verbose`. JSON output
/// keeps stderr quiet unless `RUST_LOG` asks otherwise.
fn init_logging(global: &GlobalOptions) {
    let level = match (global.json, global.verbose) {
        (true, _) => log::LevelFilter::Off,
        (false, true) => log::LevelFilter::Debug,
        (false, false) => log::LevelFilter::Info,
    };

    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Warn)
        .filter_module("classcloak", level)
        .parse_default_env()
        .format(|buf, record| writeln!(buf, "[{:<5}] {}", record.level(), record.args()))
        .init();
}

fn main() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        eprintln!("\nCancelled.");
        std::process::exit(130);
    })
    .expect("failed to set Ctrl+C handler");

    let cli = Cli::parse();

    init_logging(&cli.global);

    match &cli.command {
        Command::Map {
            model,
            output,
            format,
            config,
            mode,
            seed,
            package,
            keep,
            sequential,
        } => commands::map::run(
            model,
            &commands::map::MapOptions {
                output,
                format: format.as_deref(),
                config: config.as_deref(),
                mode: mode.as_deref(),
                seed: *seed,
                package: package.as_deref(),
                keep,
                sequential: *sequential,
                global: &cli.global,
            },
        ),
        Command::Lookup { mapping, name } => commands::lookup::run(mapping, name, &cli.global),
    }
}
