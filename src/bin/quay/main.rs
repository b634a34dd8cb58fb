//! Quay CLI - library resolution and export for managed projects

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("quay=debug")
    } else {
        EnvFilter::new("quay=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let color = !cli.global.no_color;
    // A second hook only fails if one is installed already
    let _ = miette::set_hook(Box::new(move |_| {
        Box::new(miette::MietteHandlerOpts::new().color(color).build())
    }));

    match cli.command {
        Commands::Resolve(args) => commands::resolve::execute(args, &cli.global),
        Commands::Exports(args) => commands::exports::execute(args, &cli.global),
        Commands::Paths(args) => commands::paths::execute(args, &cli.global),
    }
}
