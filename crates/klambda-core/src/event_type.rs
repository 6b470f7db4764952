//! # CloudEvent Type Identifiers
//!
//! Event types are dot-separated hierarchical strings of the form
//! `io.<domain>.<resource>.<category>.<action>`, for example
//! `io.knative.lambda.command.function.deploy`. They are the primary key
//! into the schema registry.
//!
//! ## Wildcards
//!
//! A category-level fallback is spelled `<first four segments>.*`. The
//! derivation lives here so every consumer forms the same key: the
//! registry, the CLI, and any transport layer that wants to pre-route.
//!
//! Lookups are case-sensitive. Nothing in this module lowercases input.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EventTypeError;

/// Common prefix for every event type emitted or consumed by the operator.
pub const EVENT_TYPE_PREFIX: &str = "io.knative.lambda";

/// Number of leading segments kept when deriving a category wildcard.
pub const WILDCARD_SEGMENTS: usize = 4;

/// Well-known event types.
pub mod types {
    /// Deploy (create or update) a function.
    pub const COMMAND_FUNCTION_DEPLOY: &str = "io.knative.lambda.command.function.deploy";
    /// Roll a function back to a previous revision. Not bound by default.
    pub const COMMAND_FUNCTION_ROLLBACK: &str = "io.knative.lambda.command.function.rollback";
    /// Alias of function deploy.
    pub const COMMAND_SERVICE_CREATE: &str = "io.knative.lambda.command.service.create";
    /// Alias of function deploy.
    pub const COMMAND_SERVICE_UPDATE: &str = "io.knative.lambda.command.service.update";
    /// Delete a function's service.
    pub const COMMAND_SERVICE_DELETE: &str = "io.knative.lambda.command.service.delete";
    /// Start an image build.
    pub const COMMAND_BUILD_START: &str = "io.knative.lambda.command.build.start";
    /// Cancel a running build.
    pub const COMMAND_BUILD_CANCEL: &str = "io.knative.lambda.command.build.cancel";
    /// Retry a failed build.
    pub const COMMAND_BUILD_RETRY: &str = "io.knative.lambda.command.build.retry";

    /// Synchronous invocation.
    pub const INVOKE_SYNC: &str = "io.knative.lambda.invoke.sync";
    /// Asynchronous invocation.
    pub const INVOKE_ASYNC: &str = "io.knative.lambda.invoke.async";
    /// Scheduled invocation.
    pub const INVOKE_SCHEDULED: &str = "io.knative.lambda.invoke.scheduled";
    /// Redelivered invocation. Resolved through the invoke wildcard.
    pub const INVOKE_RETRY: &str = "io.knative.lambda.invoke.retry";

    /// Build job started.
    pub const LIFECYCLE_BUILD_STARTED: &str = "io.knative.lambda.lifecycle.build.started";
    /// Build job completed.
    pub const LIFECYCLE_BUILD_COMPLETED: &str = "io.knative.lambda.lifecycle.build.completed";
    /// Build job failed.
    pub const LIFECYCLE_BUILD_FAILED: &str = "io.knative.lambda.lifecycle.build.failed";
    /// Build job timed out.
    pub const LIFECYCLE_BUILD_TIMEOUT: &str = "io.knative.lambda.lifecycle.build.timeout";
    /// Build job cancelled.
    pub const LIFECYCLE_BUILD_CANCELLED: &str = "io.knative.lambda.lifecycle.build.cancelled";

    /// Function returned successfully.
    pub const RESPONSE_SUCCESS: &str = "io.knative.lambda.response.success";
    /// Function raised an error.
    pub const RESPONSE_ERROR: &str = "io.knative.lambda.response.error";
    /// Function exceeded its timeout.
    pub const RESPONSE_TIMEOUT: &str = "io.knative.lambda.response.timeout";

    /// Category fallback for invocation actions.
    pub const INVOKE_WILDCARD: &str = "io.knative.lambda.invoke.*";
    /// Category fallback for response actions.
    pub const RESPONSE_WILDCARD: &str = "io.knative.lambda.response.*";
}

/// Derive the category wildcard key for a raw event type string.
///
/// Returns `<first four segments>.*` when `event_type` has at least four
/// dot-separated segments, and `None` otherwise. No validation is applied:
/// lookups must work for arbitrary caller input, including strings that
/// [`EventType::parse`] would reject.
pub fn category_wildcard(event_type: &str) -> Option<String> {
    let parts: Vec<&str> = event_type.split('.').collect();
    if parts.len() < WILDCARD_SEGMENTS {
        return None;
    }
    Some(format!("{}.*", parts[..WILDCARD_SEGMENTS].join(".")))
}

/// A validated CloudEvent type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EventType(String);

impl EventType {
    /// Parse and validate an event type.
    ///
    /// # Errors
    ///
    /// Rejects empty strings, whitespace, empty segments, and a `*` used
    /// anywhere other than as the complete final segment.
    pub fn parse(raw: &str) -> Result<Self, EventTypeError> {
        if raw.is_empty() {
            return Err(EventTypeError::Empty);
        }
        if raw.chars().any(char::is_whitespace) {
            return Err(EventTypeError::Whitespace(raw.to_string()));
        }
        let segments: Vec<&str> = raw.split('.').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(EventTypeError::EmptySegment(raw.to_string()));
        }
        let last = segments.len() - 1;
        for (i, segment) in segments.iter().enumerate() {
            if segment.contains('*') && (i != last || *segment != "*") {
                return Err(EventTypeError::MisplacedWildcard(raw.to_string()));
            }
        }
        Ok(Self(raw.to_string()))
    }

    /// The type as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterate the dot-separated segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }

    /// True if this is a category fallback key (`....*`).
    pub fn is_wildcard(&self) -> bool {
        self.0.ends_with(".*")
    }

    /// True if the type lives under [`EVENT_TYPE_PREFIX`].
    pub fn is_lambda_event(&self) -> bool {
        self.0
            .strip_prefix(EVENT_TYPE_PREFIX)
            .is_some_and(|rest| rest.starts_with('.'))
    }

    /// The category fallback this type resolves to when no exact entry exists.
    pub fn category_wildcard(&self) -> Option<String> {
        if self.is_wildcard() {
            return None;
        }
        category_wildcard(&self.0)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for EventType {
    type Err = EventTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for EventType {
    type Error = EventTypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<EventType> for String {
    fn from(value: EventType) -> Self {
        value.0
    }
}

impl AsRef<str> for EventType {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
