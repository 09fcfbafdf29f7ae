//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// respipe web asset pipeline CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: respipe.toml, searched upward)
    #[arg(short = 'C', long, global = true, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Enable verbose output for debugging
    #[arg(short = 'V', long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Resolve resources to a versioned URL
    #[command(visible_alias = "r")]
    Resolve {
        #[command(flatten)]
        args: ResolveArgs,
    },

    /// Run staged compiler jobs
    #[command(visible_alias = "w")]
    Worker {
        /// Keep running and pick up new jobs as they are staged
        #[arg(short, long)]
        watch: bool,
    },

    /// Print the source files an artifact was built from
    #[command(visible_alias = "s")]
    Source {
        /// Artifact file name (e.g. `imageFill-1f0c….js`) or web path
        artifact: String,
    },
}

/// Resolve command arguments.
#[derive(clap::Args, Debug, Clone)]
pub struct ResolveArgs {
    /// Registry names or `/path[@version]`; two or more form a bundle
    #[arg(value_name = "REF", required = true)]
    pub refs: Vec<String>,

    /// Serve scripts unminified
    #[arg(long)]
    pub no_minify: bool,

    /// Only crush stylesheets marked `crush = true`
    #[arg(long, conflicts_with = "inline")]
    pub no_crush: bool,

    /// Leave `site.host` off the URL
    #[arg(long)]
    pub no_host: bool,

    /// Print crushed styles as a `<style>` block instead of a URL
    #[arg(long)]
    pub inline: bool,
}
