//! # klambda-core — Foundational Types for the Knative Lambda Control Plane
//!
//! Types shared by every crate that touches CloudEvent payloads: the event
//! type identifier, the canonical JSON normalization applied before schema
//! evaluation, and the typed payload model a reconciler works with once a
//! payload has passed validation.
//!
//! ## Key Design Principles
//!
//! 1. **Event types are a newtype.** `EventType` is validated at
//!    construction; wildcard derivation (`<first four segments>.*`) is
//!    defined once, here.
//!
//! 2. **One normalization path.** Caller data is turned into a JSON tree
//!    only through [`canonical::normalize`], which serializes with RFC 8785
//!    canonical JSON and folds integral floats into integers.
//!
//! 3. **Sum types over flags.** The six function source kinds are the
//!    [`SourceSpec`] enum. A payload whose tag has no matching object does
//!    not decode.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `klambda-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod error;
pub mod event_type;
pub mod function;
pub mod payload;

// Re-export primary types for ergonomic imports.
pub use error::{CanonicalizationError, EventTypeError, SourceError};
pub use event_type::{category_wildcard, types, EventType, EVENT_TYPE_PREFIX};
pub use function::{
    BuildSpec, EnvVar, FunctionDeploy, FunctionMetadata, FunctionSpec, Language, RegistryType,
    ScalingSpec, SourceKind, SourceSpec,
};
pub use payload::{
    BuildCommand, EventPayload, Invoke, LifecycleBuild, PayloadFamily, Response, ServiceDelete,
};
