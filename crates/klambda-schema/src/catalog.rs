//! # Schema Catalog
//!
//! The fixed set of JSON Schema documents (Draft 2020-12) that describe
//! every CloudEvent payload family, plus the built-in table that binds
//! event types to documents.
//!
//! ## Documents
//!
//! Each document lives in `schemas/<name>.schema.json` and is embedded at
//! build time, so the registry never touches the filesystem or network.
//! All `$id` URIs share the prefix [`SCHEMA_BASE_URI`]. Cross-document
//! `$ref`s are written relative to that base (`common.schema.json#/$defs/...`).
//!
//! `common` is a definitions-only document. It is compiled as a `$ref`
//! target but cannot be bound to an event type.
//!
//! ## Bindings
//!
//! Several event types share one document (`command.service.create` and
//! `command.service.update` alias `function-deploy`). Two category
//! fallbacks, `invoke.*` and `response.*`, cover actions that have no
//! exact entry.

use klambda_core::event_type::types;
use klambda_core::PayloadFamily;

/// Version of the schema catalog as a whole.
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Base URI for every document `$id`.
pub const SCHEMA_BASE_URI: &str = "https://schemas.knative-lambda.io/v1/";

/// Name of the shared definitions document.
pub const COMMON_DOCUMENT: &str = "common";

const SCHEMA_FILE_SUFFIX: &str = ".schema.json";

/// One embedded schema document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaDocument {
    /// Short name, e.g. `function-deploy`.
    pub name: &'static str,
    /// Payload family validated by this document. `None` for
    /// definitions-only documents.
    pub family: Option<PayloadFamily>,
    /// Raw JSON text.
    pub text: &'static str,
}

impl SchemaDocument {
    /// File name under `schemas/`.
    pub fn file_name(&self) -> String {
        format!("{}{SCHEMA_FILE_SUFFIX}", self.name)
    }

    /// Canonical `$id` of the document.
    pub fn uri(&self) -> String {
        format!("{SCHEMA_BASE_URI}{}", self.file_name())
    }

    /// True if event types may be bound to this document.
    pub fn is_bindable(&self) -> bool {
        self.family.is_some()
    }
}

/// Every document in the catalog. `common` comes first since the others
/// reference it.
pub static DOCUMENTS: [SchemaDocument; 7] = [
    SchemaDocument {
        name: COMMON_DOCUMENT,
        family: None,
        text: include_str!("../schemas/common.schema.json"),
    },
    SchemaDocument {
        name: "function-deploy",
        family: Some(PayloadFamily::FunctionDeploy),
        text: include_str!("../schemas/function-deploy.schema.json"),
    },
    SchemaDocument {
        name: "service-delete",
        family: Some(PayloadFamily::ServiceDelete),
        text: include_str!("../schemas/service-delete.schema.json"),
    },
    SchemaDocument {
        name: "build-command",
        family: Some(PayloadFamily::BuildCommand),
        text: include_str!("../schemas/build-command.schema.json"),
    },
    SchemaDocument {
        name: "invoke",
        family: Some(PayloadFamily::Invoke),
        text: include_str!("../schemas/invoke.schema.json"),
    },
    SchemaDocument {
        name: "lifecycle-build",
        family: Some(PayloadFamily::LifecycleBuild),
        text: include_str!("../schemas/lifecycle-build.schema.json"),
    },
    SchemaDocument {
        name: "response",
        family: Some(PayloadFamily::Response),
        text: include_str!("../schemas/response.schema.json"),
    },
];

/// Built-in event type to document bindings.
pub const BUILTIN_BINDINGS: [(&str, &str); 20] = [
    (types::COMMAND_FUNCTION_DEPLOY, "function-deploy"),
    (types::COMMAND_SERVICE_CREATE, "function-deploy"),
    (types::COMMAND_SERVICE_UPDATE, "function-deploy"),
    (types::COMMAND_SERVICE_DELETE, "service-delete"),
    (types::COMMAND_BUILD_START, "build-command"),
    (types::COMMAND_BUILD_CANCEL, "build-command"),
    (types::COMMAND_BUILD_RETRY, "build-command"),
    (types::INVOKE_SYNC, "invoke"),
    (types::INVOKE_ASYNC, "invoke"),
    (types::INVOKE_SCHEDULED, "invoke"),
    (types::LIFECYCLE_BUILD_STARTED, "lifecycle-build"),
    (types::LIFECYCLE_BUILD_COMPLETED, "lifecycle-build"),
    (types::LIFECYCLE_BUILD_FAILED, "lifecycle-build"),
    (types::LIFECYCLE_BUILD_TIMEOUT, "lifecycle-build"),
    (types::LIFECYCLE_BUILD_CANCELLED, "lifecycle-build"),
    (types::RESPONSE_SUCCESS, "response"),
    (types::RESPONSE_ERROR, "response"),
    (types::RESPONSE_TIMEOUT, "response"),
    (types::INVOKE_WILDCARD, "invoke"),
    (types::RESPONSE_WILDCARD, "response"),
];

/// Look up a document by short name (`invoke`) or file name
/// (`invoke.schema.json`).
pub fn document(name: &str) -> Option<&'static SchemaDocument> {
    let name = name.strip_suffix(SCHEMA_FILE_SUFFIX).unwrap_or(name);
    DOCUMENTS.iter().find(|d| d.name == name)
}

/// Look up a document by its `$id` URI. A trailing fragment is ignored.
pub fn document_by_uri(uri: &str) -> Option<&'static SchemaDocument> {
    let uri = uri.split('#').next().unwrap_or(uri);
    let file = uri.strip_prefix(SCHEMA_BASE_URI)?;
    document(file)
}
