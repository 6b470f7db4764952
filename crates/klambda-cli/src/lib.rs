//! # klambda-cli — Schema Registry Command-Line Interface
//!
//! A thin clap front end over `klambda-schema` for checking CloudEvent
//! payloads by hand or in CI before they reach a cluster.
//!
//! ## Subcommands
//!
//! - `validate`: Validate a JSON or YAML payload against an event type
//! - `types`: List every bound event type and its schema document
//! - `schema`: Print the schema for an event type or document name
//!
//! ## Exit Codes
//!
//! - `0`: payload valid (or listing succeeded)
//! - `1`: payload rejected
//! - `2`: operational failure (unreadable file, bad config)
//!
//! ## Crate Policy
//!
//! - Argument parsing lives in `main.rs`; handlers live here and write to
//!   a caller-supplied `Write` so they can be tested without a process.
//! - Handlers delegate to `klambda-schema`. No validation logic here.

use std::path::Path;

use anyhow::{Context, Result};
use klambda_schema::{Validator, ValidatorConfig};

pub mod inspect;
pub mod validate;

/// Exit code for a valid payload or a successful listing.
pub const EXIT_OK: u8 = 0;
/// Exit code for a rejected payload.
pub const EXIT_INVALID: u8 = 1;
/// Exit code for an operational failure.
pub const EXIT_ERROR: u8 = 2;

/// Build the registry, applying the YAML config at `config` when given.
///
/// # Errors
///
/// Fails if the config cannot be loaded or the registry does not build.
pub fn load_validator(config: Option<&Path>) -> Result<Validator> {
    let config = match config {
        Some(path) => ValidatorConfig::from_yaml_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ValidatorConfig::default(),
    };
    Validator::with_config(&config).context("failed to build schema registry")
}
