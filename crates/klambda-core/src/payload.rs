//! # Command, Invoke, Lifecycle, and Response Payloads
//!
//! Typed forms of the smaller CloudEvent payload families. The deploy
//! payload lives in [`crate::function`]. [`EventPayload`] unions all six
//! so a receiver can dispatch on one value after validation.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::function::FunctionDeploy;

/// `command.service.delete`. Every field is optional because the name may
/// travel in a transport header instead of the body.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ServiceDelete {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

/// `command.build.start`, `command.build.cancel`, `command.build.retry`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildCommand {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub force_rebuild: Option<bool>,
}

/// `invoke.*`. An empty object is a valid invocation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoke {
    /// Arbitrary JSON handed to the function.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_id: Option<String>,
    /// `<digits><s|m|h>`, e.g. `30s`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
}

impl Invoke {
    /// Parsed execution timeout, if one was given and is well-formed.
    pub fn timeout_duration(&self) -> Option<Duration> {
        self.timeout.as_deref().and_then(parse_timeout)
    }
}

/// Parse a `^[0-9]+(s|m|h)$` timeout string.
pub fn parse_timeout(raw: &str) -> Option<Duration> {
    let unit = raw.chars().last()?;
    let digits = &raw[..raw.len() - unit.len_utf8()];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let n: u64 = digits.parse().ok()?;
    let secs = match unit {
        's' => n,
        'm' => n.checked_mul(60)?,
        'h' => n.checked_mul(3600)?,
        _ => return None,
    };
    Some(Duration::from_secs(secs))
}

/// `lifecycle.build.*`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleBuild {
    pub name: String,
    pub namespace: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_name: Option<String>,
    #[serde(default, rename = "imageURI", skip_serializing_if = "Option::is_none")]
    pub image_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// 1-based attempt counter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempt: Option<u32>,
}

impl LifecycleBuild {
    /// Wall-clock build time, when both timestamps are present and ordered.
    pub fn elapsed(&self) -> Option<chrono::Duration> {
        let started = self.started_at?;
        let completed = self.completed_at?;
        (completed >= started).then(|| completed - started)
    }
}

/// `response.*`. An empty object is a valid response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stack_trace: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

impl Response {
    /// True when the response reports an error, by status or by message.
    pub fn is_error(&self) -> bool {
        self.error.is_some() || self.status_code.is_some_and(|c| c >= 400)
    }
}

/// Which payload family an event type carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PayloadFamily {
    FunctionDeploy,
    ServiceDelete,
    BuildCommand,
    Invoke,
    LifecycleBuild,
    Response,
}

/// Any decoded payload.
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    FunctionDeploy(Box<FunctionDeploy>),
    ServiceDelete(ServiceDelete),
    BuildCommand(BuildCommand),
    Invoke(Invoke),
    LifecycleBuild(LifecycleBuild),
    Response(Response),
}

impl EventPayload {
    /// Decode a JSON tree as the given family.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error when the tree does not fit the typed
    /// model.
    pub fn from_value(family: PayloadFamily, value: Value) -> Result<Self, serde_json::Error> {
        Ok(match family {
            PayloadFamily::FunctionDeploy => {
                EventPayload::FunctionDeploy(Box::new(serde_json::from_value(value)?))
            }
            PayloadFamily::ServiceDelete => EventPayload::ServiceDelete(serde_json::from_value(value)?),
            PayloadFamily::BuildCommand => EventPayload::BuildCommand(serde_json::from_value(value)?),
            PayloadFamily::Invoke => EventPayload::Invoke(serde_json::from_value(value)?),
            PayloadFamily::LifecycleBuild => {
                EventPayload::LifecycleBuild(serde_json::from_value(value)?)
            }
            PayloadFamily::Response => EventPayload::Response(serde_json::from_value(value)?),
        })
    }

    /// The family of this payload.
    pub fn family(&self) -> PayloadFamily {
        match self {
            EventPayload::FunctionDeploy(_) => PayloadFamily::FunctionDeploy,
            EventPayload::ServiceDelete(_) => PayloadFamily::ServiceDelete,
            EventPayload::BuildCommand(_) => PayloadFamily::BuildCommand,
            EventPayload::Invoke(_) => PayloadFamily::Invoke,
            EventPayload::LifecycleBuild(_) => PayloadFamily::LifecycleBuild,
            EventPayload::Response(_) => PayloadFamily::Response,
        }
    }

    /// Name of the function this payload targets, when the payload names one.
    pub fn function_name(&self) -> Option<&str> {
        match self {
            EventPayload::FunctionDeploy(d) => Some(&d.metadata.name),
            EventPayload::ServiceDelete(d) => d.name.as_deref(),
            EventPayload::BuildCommand(c) => Some(&c.name),
            EventPayload::LifecycleBuild(l) => Some(&l.name),
            EventPayload::Invoke(_) | EventPayload::Response(_) => None,
        }
    }
}
