//! # navette CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use navette_cli::lifecycle::{run_lifecycle, LifecycleArgs};
use navette_cli::reference::{run_ref, RefArgs};
use navette_cli::track::{run_track, TrackArgs};

/// Navette — parcel and mandate tracking toolchain.
#[derive(Parser, Debug)]
#[command(name = "navette", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Normalize and inspect tracking codes.
    #[command(name = "ref")]
    Ref(RefArgs),

    /// Print transition tables and check individual moves.
    Lifecycle(LifecycleArgs),

    /// Local tracking ledger (create, transition, show, list).
    Track(TrackArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity level.
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Ref(args) => run_ref(&args),
        Commands::Lifecycle(args) => run_lifecycle(&args),
        Commands::Track(args) => run_track(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}
