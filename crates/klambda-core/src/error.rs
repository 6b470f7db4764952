//! # Error Types — Core Error Hierarchy
//!
//! Errors raised by the foundational types in this crate. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Event-type errors carry the offending string verbatim so the caller
//!   can echo it back to the producer.
//! - Canonicalization errors wrap the underlying `serde_json` failure.
//! - Source errors name the discriminator that could not be satisfied.

use thiserror::Error;

use crate::function::SourceKind;

/// A CloudEvent type string that is not a well-formed dotted identifier.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EventTypeError {
    /// The type string was empty.
    #[error("event type must not be empty")]
    Empty,

    /// The type string contained whitespace.
    #[error("event type '{0}' must not contain whitespace")]
    Whitespace(String),

    /// The type string had an empty segment (leading, trailing or double dot).
    #[error("event type '{0}' has an empty segment")]
    EmptySegment(String),

    /// A `*` appeared anywhere other than as the whole final segment.
    #[error("event type '{0}' may only use '*' as its final segment")]
    MisplacedWildcard(String),
}

/// Error while round-tripping caller data through canonical JSON.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Serializing the caller value failed.
    #[error("failed to marshal data: {0}")]
    Marshal(#[source] serde_json::Error),

    /// Parsing the canonical bytes back into a tree failed.
    #[error("failed to unmarshal data: {0}")]
    Unmarshal(#[source] serde_json::Error),
}

/// Error decoding a tagged source specification.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// `type` named a kind whose sub-object was absent.
    #[error("source type '{0}' requires a '{0}' object")]
    MissingVariant(SourceKind),
}
