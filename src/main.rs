//! respipe - versioned, minified and bundled css/js URLs.

mod cli;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use respipe::PipelineConfig;
use respipe::logger::set_verbose;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    set_verbose(cli.verbose);

    let config = PipelineConfig::load(cli.config.as_deref())?;

    match &cli.command {
        Commands::Resolve { args } => cli::resolve::run_resolve(args, config),
        Commands::Worker { watch } => cli::worker::run_worker(&config, *watch),
        Commands::Source { artifact } => cli::source::run_source(artifact, config),
    }
}
