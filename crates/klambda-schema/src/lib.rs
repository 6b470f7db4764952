//! # klambda-schema — CloudEvent Schema Registry & Validator
//!
//! The gatekeeper between the CloudEvents transport and the reconciler.
//! Every incoming payload is checked against the JSON Schema bound to its
//! event type before any controller logic acts on it.
//!
//! ## Schema Catalog (`catalog`)
//!
//! Seven embedded Draft 2020-12 documents: one per payload family
//! (function-deploy, service-delete, build-command, invoke,
//! lifecycle-build, response) plus `common`, which holds shared `$defs`.
//! [`catalog::BUILTIN_BINDINGS`] maps event types to documents.
//!
//! ## Registry & Validator (`validate`)
//!
//! [`Validator`] compiles each document once and resolves event types
//! exact-match first, then through a `<first four segments>.*` fallback.
//! Failures come back as a [`ValidationError`] listing every violation as
//! `path: message`.
//!
//! - [`Validator::validate`]: any `Serialize` value.
//! - [`Validator::validate_json`]: raw bytes; syntax errors first.
//! - [`Validator::decode_event`]: validate, then decode into the typed
//!   payload model from `klambda-core`.
//!
//! ## Crate Policy
//!
//! - Depends only on `klambda-core` internally.
//! - Schema `$id` URIs must never change without bumping
//!   [`SCHEMA_VERSION`].
//! - Construction failures are fatal. A `Validator` that failed to build
//!   is never handed to a request path.
//! - Validation failures are returned, never logged above `debug`.

pub mod catalog;
pub mod config;
pub mod validate;
pub mod violation;

pub use catalog::{SchemaDocument, SCHEMA_VERSION};
pub use config::{ConfigError, ValidatorConfig};
pub use validate::{RegistryError, ValidationError, ValidationErrorKind, Validator};
pub use violation::ViolationNode;
