//! CLI definitions using clap.

use clap::{Args, Parser, Subcommand};

/// Quay - resolve and export libraries for managed projects
#[derive(Parser)]
#[command(name = "quay")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command.
#[derive(Args)]
pub struct GlobalArgs {
    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Target framework (e.g. dnx451, dnxcore50, net45)
    #[arg(long, global = true, env = "QUAY_FRAMEWORK")]
    pub framework: Option<String>,

    /// Build configuration (defaults to Debug)
    #[arg(long, global = true, env = "QUAY_CONFIGURATION")]
    pub configuration: Option<String>,

    /// Print machine-readable JSON
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve a library and its dependencies
    Resolve(ResolveArgs),

    /// Show the references a library contributes to a compilation
    Exports(ExportsArgs),

    /// List the locations searched for libraries
    Paths(PathsArgs),
}

#[derive(Args)]
pub struct ResolveArgs {
    /// Library name
    pub name: String,

    /// Print a flat list instead of a tree
    #[arg(long)]
    pub flat: bool,

    /// Maximum depth to display
    #[arg(short, long)]
    pub depth: Option<usize>,
}

#[derive(Args)]
pub struct ExportsArgs {
    /// Library name
    pub name: String,

    /// Include the transitive dependency closure
    #[arg(long)]
    pub all: bool,

    /// Export projects as sources instead of compiled output
    #[arg(long)]
    pub include_projects: bool,

    /// Build variant of the root project
    #[arg(long)]
    pub aspect: Option<String>,
}

#[derive(Args)]
pub struct PathsArgs {
    /// Library to check; every search location is listed either way
    pub name: Option<String>,
}
