//! # Registry Inspection
//!
//! `klambda types` lists every bound event type. `klambda schema` prints
//! the JSON Schema behind an event type or a document name.

use std::io::Write;

use anyhow::{bail, Context, Result};
use clap::Args;
use klambda_schema::{catalog, SchemaDocument, Validator, SCHEMA_VERSION};
use serde_json::Value;

use crate::EXIT_OK;

/// Arguments for the types subcommand.
#[derive(Args, Debug)]
pub struct TypesArgs {
    /// Print the bindings as a JSON object.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the schema subcommand.
#[derive(Args, Debug)]
pub struct SchemaArgs {
    /// Event type (`io.knative.lambda.invoke.sync`), document name
    /// (`invoke`, `invoke.schema.json`), or document `$id` URI.
    pub target: String,
}

/// Run `klambda types` against stdout.
///
/// # Errors
///
/// Fails only if stdout cannot be written.
pub fn run_types(args: &TypesArgs, validator: &Validator) -> Result<u8> {
    let stdout = std::io::stdout();
    run_types_to(args, validator, &mut stdout.lock())
}

/// Run `klambda types` against `out`.
///
/// # Errors
///
/// As [`run_types`].
pub fn run_types_to(args: &TypesArgs, validator: &Validator, out: &mut impl Write) -> Result<u8> {
    let bindings = validator.bindings();
    if args.json {
        let map: serde_json::Map<String, Value> = bindings
            .into_iter()
            .map(|(t, d)| (t, Value::String(d.to_string())))
            .collect();
        serde_json::to_writer_pretty(&mut *out, &map)?;
        writeln!(out)?;
        return Ok(EXIT_OK);
    }

    let width = bindings.iter().map(|(t, _)| t.len()).max().unwrap_or(0);
    writeln!(out, "Schema catalog v{SCHEMA_VERSION}")?;
    writeln!(out)?;
    for (event_type, document) in &bindings {
        writeln!(out, "  {event_type:<width$}  {document}")?;
    }
    writeln!(out)?;
    writeln!(out, "Total: {} event types", bindings.len())?;
    Ok(EXIT_OK)
}

/// Run `klambda schema` against stdout.
///
/// # Errors
///
/// Fails if `target` names neither a bound event type nor a document.
pub fn run_schema(args: &SchemaArgs, validator: &Validator) -> Result<u8> {
    let stdout = std::io::stdout();
    run_schema_to(args, validator, &mut stdout.lock())
}

/// Run `klambda schema` against `out`.
///
/// # Errors
///
/// As [`run_schema`].
pub fn run_schema_to(args: &SchemaArgs, validator: &Validator, out: &mut impl Write) -> Result<u8> {
    let document = resolve_target(validator, &args.target)?;
    let value: Value = serde_json::from_str(document.text)
        .with_context(|| format!("schema document {} is not valid JSON", document.name))?;
    serde_json::to_writer_pretty(&mut *out, &value)?;
    writeln!(out)?;
    Ok(EXIT_OK)
}

/// Event types win over document names; lookup follows wildcard fallback.
fn resolve_target(validator: &Validator, target: &str) -> Result<&'static SchemaDocument> {
    if let Some(document) = validator.document_for(target) {
        return Ok(document);
    }
    match catalog::document(target).or_else(|| catalog::document_by_uri(target)) {
        Some(document) => Ok(document),
        None => bail!("unknown event type or schema document: {target}"),
    }
}
