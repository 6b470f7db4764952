//! # klambda CLI entry point
//!
//! Parses command-line arguments, builds the schema registry once, and
//! dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use klambda_cli::inspect::{run_schema, run_types, SchemaArgs, TypesArgs};
use klambda_cli::validate::{run_validate, ValidateArgs};
use klambda_cli::{load_validator, EXIT_ERROR};

/// Knative Lambda CloudEvent schema tool.
///
/// Validates event payloads against the registered JSON Schemas, lists
/// event type bindings, and prints schema documents.
#[derive(Parser, Debug)]
#[command(name = "klambda", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a validator config file (YAML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate a payload file (JSON or YAML) against an event type.
    Validate(ValidateArgs),

    /// List bound event types and their schema documents.
    Types(TypesArgs),

    /// Print the JSON Schema for an event type or document.
    Schema(SchemaArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "klambda starting");

    let result = load_validator(cli.config.as_deref()).and_then(|validator| match &cli.command {
        Commands::Validate(args) => run_validate(args, &validator),
        Commands::Types(args) => run_types(args, &validator),
        Commands::Schema(args) => run_schema(args, &validator),
    });

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}
