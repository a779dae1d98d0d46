mod commands;

use anticipate_runtime::EngineConfig;
use clap::{ArgAction, Parser, Subcommand};
use colored::Colorize;
use commands::{
    diff, place, render, simulate, watch, DiffArgs, PlaceArgs, RenderArgs, SimulateArgs,
    WatchArgs,
};
use std::path::PathBuf;

/// Anticipate - predictive reconciliation for template-driven UIs
#[derive(Parser, Debug)]
#[command(name = "anticipate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory containing anticipate.config.json
    #[arg(long, global = true, default_value = ".")]
    config: PathBuf,

    /// Increase logging (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Diff two trees and print the patches
    Diff(DiffArgs),

    /// Render a template artifact against a state snapshot
    Render(RenderArgs),

    /// Print the path variant tables of an artifact
    Simulate(SimulateArgs),

    /// Reload an artifact whenever it changes on disk
    Watch(WatchArgs),

    /// Allocate a path for a new node between two siblings
    Place(PlaceArgs),
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = EngineConfig::load(&cli.config)
        .map_err(anyhow::Error::from)
        .and_then(|config| match cli.command {
            Command::Diff(args) => diff(args, &config),
            Command::Render(args) => render(args, &config),
            Command::Simulate(args) => simulate(args, &config),
            Command::Watch(args) => watch(args, &config),
            Command::Place(args) => place(args, &config),
        });

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
