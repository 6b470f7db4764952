//! # Validate Subcommand
//!
//! Validates one payload against an event type.
//!
//! ```bash
//! klambda validate --type io.knative.lambda.command.function.deploy hello.yaml
//! cat event.json | klambda validate --type io.knative.lambda.invoke.sync --json
//! ```
//!
//! Files ending in `.yaml`/`.yml` are read as YAML and converted to JSON.
//! Everything else, stdin included, goes through the raw-bytes path so a
//! syntax error is reported as `invalid JSON: ...`.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use klambda_core::EventPayload;
use klambda_schema::{ValidationError, Validator};
use serde::Serialize;
use serde_json::Value;

use crate::{EXIT_INVALID, EXIT_OK};

/// Arguments for the validate subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// CloudEvent type to validate as.
    #[arg(short = 't', long = "type")]
    pub event_type: String,

    /// Payload file. Reads stdin when omitted or `-`.
    pub path: Option<PathBuf>,

    /// Print the result as JSON.
    #[arg(long)]
    pub json: bool,

    /// Also decode into the typed payload model.
    #[arg(long)]
    pub decode: bool,
}

/// Machine-readable result of a successful validation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Accepted<'a> {
    valid: bool,
    event_type: &'a str,
    document: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
}

/// Run `klambda validate`, writing the report to stdout.
///
/// # Errors
///
/// Fails only on operational problems such as an unreadable file.
pub fn run_validate(args: &ValidateArgs, validator: &Validator) -> Result<u8> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run_validate_to(args, validator, &mut out)
}

/// Run `klambda validate`, writing the report to `out`.
///
/// # Errors
///
/// As [`run_validate`].
pub fn run_validate_to(args: &ValidateArgs, validator: &Validator, out: &mut impl Write) -> Result<u8> {
    let raw = read_payload(args.path.as_deref())?;
    tracing::debug!(event_type = %args.event_type, bytes = raw.len(), "validating payload");

    let outcome = if args.decode {
        validator
            .decode_event(&args.event_type, &raw)
            .map(|payload| decode_warnings(&payload))
    } else {
        validator.validate_json(&args.event_type, &raw).map(|()| Vec::new())
    };

    match outcome {
        Ok(warnings) => {
            let document = validator.document_for(&args.event_type).map(|d| d.name);
            write_accepted(out, args, document, warnings)?;
            Ok(EXIT_OK)
        }
        Err(err) => {
            write_rejected(out, args, &err)?;
            Ok(EXIT_INVALID)
        }
    }
}

/// Read the payload and return JSON bytes.
fn read_payload(path: Option<&Path>) -> Result<Vec<u8>> {
    let path = match path {
        Some(p) if p != Path::new("-") => p,
        _ => {
            let mut buf = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buf)
                .context("failed to read payload from stdin")?;
            return Ok(buf);
        }
    };

    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read payload: {}", path.display()))?;
    if is_yaml(path) {
        yaml_to_json_bytes(&bytes)
            .with_context(|| format!("failed to parse YAML payload: {}", path.display()))
    } else {
        Ok(bytes)
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

/// Convert a YAML document to JSON bytes.
pub fn yaml_to_json_bytes(yaml: &[u8]) -> Result<Vec<u8>> {
    let value: Value = serde_yaml::from_slice(yaml)?;
    Ok(serde_json::to_vec(&value)?)
}

/// Non-fatal findings about a decoded payload.
fn decode_warnings(payload: &EventPayload) -> Vec<String> {
    match payload {
        EventPayload::FunctionDeploy(deploy) => deploy
            .spec
            .env
            .iter()
            .filter(|e| e.is_ambiguous())
            .map(|e| format!("env var '{}' sets both value and valueFrom", e.name))
            .collect(),
        _ => Vec::new(),
    }
}

fn write_accepted(
    out: &mut impl Write,
    args: &ValidateArgs,
    document: Option<&str>,
    warnings: Vec<String>,
) -> Result<()> {
    for warning in &warnings {
        tracing::warn!("{warning}");
    }
    if args.json {
        let report = Accepted {
            valid: true,
            event_type: &args.event_type,
            document,
            warnings,
        };
        serde_json::to_writer_pretty(&mut *out, &report)?;
        writeln!(out)?;
    } else {
        writeln!(
            out,
            "OK  {} ({})",
            args.event_type,
            document.unwrap_or("unbound")
        )?;
        for warning in &warnings {
            writeln!(out, "  warning: {warning}")?;
        }
    }
    Ok(())
}

fn write_rejected(out: &mut impl Write, args: &ValidateArgs, err: &ValidationError) -> Result<()> {
    if args.json {
        serde_json::to_writer_pretty(&mut *out, err)?;
        writeln!(out)?;
    } else {
        writeln!(out, "INVALID  {}", err.event_type)?;
        for e in &err.errors {
            writeln!(out, "  - {e}")?;
        }
    }
    Ok(())
}
