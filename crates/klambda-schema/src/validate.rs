//! # Registry & Validator
//!
//! Compiles every catalog document once, binds event types to the compiled
//! schemas, and validates CloudEvent payloads against them.
//!
//! ## Trust Boundary
//!
//! Validation runs before any controller logic sees a payload. A payload
//! that fails is rejected with every violation collected, each rendered as
//! `<json-pointer>: <message>` (bare `<message>` at the document root).
//!
//! ## Resolution
//!
//! Lookup is exact-match first. On a miss, the first four dot-separated
//! segments plus `.*` are tried, so `io.knative.lambda.invoke.retry` falls
//! back to `io.knative.lambda.invoke.*`. An exact entry always wins over
//! the category fallback.
//!
//! ## Schema References
//!
//! Cross-document `$ref`s are served from memory by `CatalogRetriever`.
//! A reference to any URI outside the catalog fails compilation, except
//! the JSON Schema meta-schema host, which resolves to a permissive `{}`.
//! No network requests are ever made.
//!
//! ## Thread Safety
//!
//! The binding map is built inside the constructor and never mutated
//! afterwards. Aliased event types share one compiled schema through an
//! `Arc`. `Validator` is `Send + Sync`, and every validation call is a
//! pure function of `(event type, payload)`.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use jsonschema::{Retrieve, Uri, ValidationOptions};
use klambda_core::event_type::WILDCARD_SEGMENTS;
use klambda_core::{
    canonical, category_wildcard, EventPayload, EventType, EventTypeError, EVENT_TYPE_PREFIX,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::catalog::{self, SchemaDocument, BUILTIN_BINDINGS, DOCUMENTS, SCHEMA_VERSION};
use crate::config::{ConfigError, ValidatorConfig};
use crate::violation::ViolationNode;

/// Hosts whose URIs resolve to a permissive empty schema.
const META_SCHEMA_PREFIXES: [&str; 2] = ["https://json-schema.org/", "http://json-schema.org/"];

/// In-memory `$ref` resolver over the catalog documents.
#[derive(Clone)]
struct CatalogRetriever {
    /// Map from `$id` URI to parsed document.
    documents_by_uri: Arc<HashMap<String, Value>>,
}

impl Retrieve for CatalogRetriever {
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        let uri_str = uri.as_str();
        let base = uri_str.split('#').next().unwrap_or(uri_str);

        if let Some(value) = self.documents_by_uri.get(base) {
            return Ok(value.clone());
        }
        if META_SCHEMA_PREFIXES.iter().any(|p| base.starts_with(p)) {
            return Ok(serde_json::json!({}));
        }
        Err(format!("unresolvable schema reference: {uri_str}").into())
    }
}

/// Error building the registry. Any of these is fatal at startup.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// A catalog document is not valid JSON.
    #[error("schema document '{document}' is not valid JSON: {source}")]
    SchemaParse {
        /// Document short name.
        document: String,
        /// Parser failure.
        #[source]
        source: serde_json::Error,
    },

    /// The schema engine rejected a document, including unresolvable `$ref`s.
    #[error("schema document '{document}' failed to compile: {reason}")]
    SchemaCompile {
        /// Document short name.
        document: String,
        /// Engine message.
        reason: String,
    },

    /// A binding names a document that is not in the catalog.
    #[error("event type '{event_type}' is bound to unknown schema document '{document}'")]
    UnknownDocument {
        /// Bound event type.
        event_type: String,
        /// Requested document name.
        document: String,
    },

    /// A binding names a definitions-only document.
    #[error("event type '{event_type}' cannot be bound to definitions-only document '{document}'")]
    UnbindableDocument {
        /// Bound event type.
        event_type: String,
        /// Requested document name.
        document: String,
    },

    /// A wildcard binding key that lookup can never derive. Only
    /// `<four segments>.*` is ever tried as a fallback.
    #[error(
        "wildcard binding '{event_type}' can never match: expected {expected} segments before '.*'"
    )]
    UnroutableWildcard {
        /// Bound wildcard key.
        event_type: String,
        /// Segments a routable wildcard carries before `.*`.
        expected: usize,
    },

    /// A binding key is not a well-formed event type.
    #[error("invalid binding: {0}")]
    InvalidEventType(#[from] EventTypeError),

    /// The validator config could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Category of a validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationErrorKind {
    /// No schema is bound to the event type, exactly or by wildcard.
    UnknownEventType,
    /// The payload is not JSON, or caller data could not be serialized.
    MalformedInput,
    /// The payload parsed but violates its schema.
    SchemaViolation,
    /// The payload passed its schema but did not fit the typed model.
    Decode,
}

/// A rejected payload.
///
/// Serializes as `{"eventType", "kind", "errors"}` so a transport layer can
/// echo it verbatim in a `400` body.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[error("schema validation failed for event type {event_type}: {}", .errors.join("; "))]
pub struct ValidationError {
    /// Event type the payload was validated as.
    pub event_type: String,
    /// Failure category.
    pub kind: ValidationErrorKind,
    /// One entry per problem.
    pub errors: Vec<String>,
}

impl ValidationError {
    fn new(event_type: &str, kind: ValidationErrorKind, errors: Vec<String>) -> Self {
        Self {
            event_type: event_type.to_string(),
            kind,
            errors,
        }
    }

    fn unknown_event_type(event_type: &str) -> Self {
        Self::new(
            event_type,
            ValidationErrorKind::UnknownEventType,
            vec![format!("no schema registered for event type: {event_type}")],
        )
    }

    fn malformed(event_type: &str, message: String) -> Self {
        Self::new(event_type, ValidationErrorKind::MalformedInput, vec![message])
    }
}

/// One compiled document.
struct CompiledSchema {
    document: &'static SchemaDocument,
    validator: jsonschema::Validator,
}

/// Event-type keyed registry of compiled schemas.
pub struct Validator {
    /// Event type (exact or `....*`) to compiled schema.
    schemas: HashMap<String, Arc<CompiledSchema>>,
    validate_formats: bool,
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator")
            .field("event_types", &self.schemas.len())
            .field("validate_formats", &self.validate_formats)
            .finish()
    }
}

impl Validator {
    /// Build the registry with the built-in bindings.
    ///
    /// # Errors
    ///
    /// Any malformed document, unresolvable `$ref`, or binding to a missing
    /// document. The registry must not be used if this fails.
    pub fn new() -> Result<Self, RegistryError> {
        Self::with_config(&ValidatorConfig::default())
    }

    /// Build the registry with extra bindings and options.
    ///
    /// # Errors
    ///
    /// As [`Validator::new`], plus malformed or dangling config bindings.
    pub fn with_config(config: &ValidatorConfig) -> Result<Self, RegistryError> {
        let mut parsed = Vec::with_capacity(DOCUMENTS.len());
        let mut documents_by_uri = HashMap::new();
        for doc in &DOCUMENTS {
            let value: Value =
                serde_json::from_str(doc.text).map_err(|source| RegistryError::SchemaParse {
                    document: doc.name.to_string(),
                    source,
                })?;
            documents_by_uri.insert(doc.uri(), value.clone());
            parsed.push((doc, value));
        }
        let retriever = CatalogRetriever {
            documents_by_uri: Arc::new(documents_by_uri),
        };

        let mut compiled: HashMap<&'static str, Arc<CompiledSchema>> = HashMap::new();
        for (doc, value) in &parsed {
            let validator = compile(doc.name, value, &retriever, config.validate_formats)?;
            compiled.insert(
                doc.name,
                Arc::new(CompiledSchema {
                    document: *doc,
                    validator,
                }),
            );
        }

        let mut bindings: BTreeMap<String, String> = BUILTIN_BINDINGS
            .iter()
            .map(|(t, d)| (t.to_string(), d.to_string()))
            .collect();
        bindings.extend(config.bindings.clone());

        let mut schemas = HashMap::with_capacity(bindings.len());
        for (event_type, document) in bindings {
            let parsed = EventType::parse(&event_type)?;
            if parsed.is_wildcard() && parsed.segments().count() != WILDCARD_SEGMENTS + 1 {
                return Err(RegistryError::UnroutableWildcard {
                    event_type,
                    expected: WILDCARD_SEGMENTS,
                });
            }
            if !parsed.is_lambda_event() {
                warn!(event_type = %parsed, "binding outside the {EVENT_TYPE_PREFIX} namespace");
            }
            let schema = catalog::document(&document)
                .and_then(|doc| compiled.get(doc.name))
                .ok_or_else(|| RegistryError::UnknownDocument {
                    event_type: event_type.clone(),
                    document: document.clone(),
                })?;
            if !schema.document.is_bindable() {
                return Err(RegistryError::UnbindableDocument {
                    event_type,
                    document,
                });
            }
            schemas.insert(event_type, Arc::clone(schema));
        }

        info!(
            documents = compiled.len(),
            event_types = schemas.len(),
            schema_version = SCHEMA_VERSION,
            validate_formats = config.validate_formats,
            "schema registry initialized"
        );

        Ok(Self {
            schemas,
            validate_formats: config.validate_formats,
        })
    }

    /// Validate caller data against the schema bound to `event_type`.
    ///
    /// The data is round-tripped through canonical JSON first, so typed
    /// structs, maps, and `serde_json::Value`s are all judged on the same
    /// tree.
    ///
    /// # Errors
    ///
    /// [`ValidationErrorKind::UnknownEventType`] if nothing is bound,
    /// [`ValidationErrorKind::MalformedInput`] if `data` cannot be
    /// serialized, [`ValidationErrorKind::SchemaViolation`] otherwise.
    pub fn validate<T: Serialize + ?Sized>(
        &self,
        event_type: &str,
        data: &T,
    ) -> Result<(), ValidationError> {
        let schema = self.resolve(event_type)?;
        let instance = canonical::normalize(data)
            .map_err(|e| ValidationError::malformed(event_type, e.to_string()))?;
        check(event_type, schema, &instance)
    }

    /// Validate raw JSON bytes. Syntax errors are reported before the event
    /// type is even looked up.
    ///
    /// # Errors
    ///
    /// `invalid JSON: <cause>` as [`ValidationErrorKind::MalformedInput`],
    /// then as [`Validator::validate`].
    pub fn validate_json(&self, event_type: &str, raw: &[u8]) -> Result<(), ValidationError> {
        let value = parse_raw(event_type, raw)?;
        self.validate(event_type, &value)
    }

    /// Validate raw JSON and deserialize it into `T`.
    ///
    /// # Errors
    ///
    /// As [`Validator::validate_json`], plus
    /// [`ValidationErrorKind::Decode`] if the validated tree does not fit `T`.
    pub fn decode<T: DeserializeOwned>(
        &self,
        event_type: &str,
        raw: &[u8],
    ) -> Result<T, ValidationError> {
        let instance = self.validated_instance(event_type, raw)?.1;
        serde_json::from_value(instance).map_err(|e| decode_error(event_type, &e))
    }

    /// Validate raw JSON and decode it into the payload family of the
    /// document bound to `event_type`.
    ///
    /// # Errors
    ///
    /// As [`Validator::decode`].
    pub fn decode_event(&self, event_type: &str, raw: &[u8]) -> Result<EventPayload, ValidationError> {
        let (schema, instance) = self.validated_instance(event_type, raw)?;
        let family = schema
            .document
            .family
            .ok_or_else(|| ValidationError::unknown_event_type(event_type))?;
        EventPayload::from_value(family, instance).map_err(|e| decode_error(event_type, &e))
    }

    /// True if `event_type` resolves, exactly or by wildcard.
    pub fn has_schema(&self, event_type: &str) -> bool {
        self.lookup(event_type).is_some()
    }

    /// Every bound key, wildcards included, sorted.
    pub fn registered_event_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.schemas.keys().cloned().collect();
        types.sort();
        types
    }

    /// Document that `event_type` resolves to.
    pub fn document_for(&self, event_type: &str) -> Option<&'static SchemaDocument> {
        self.lookup(event_type).map(|s| s.document)
    }

    /// Sorted `(event type, document name)` pairs.
    pub fn bindings(&self) -> Vec<(String, &'static str)> {
        let mut out: Vec<(String, &'static str)> = self
            .schemas
            .iter()
            .map(|(t, s)| (t.clone(), s.document.name))
            .collect();
        out.sort();
        out
    }

    /// True if `format` keywords are asserted.
    pub fn validates_formats(&self) -> bool {
        self.validate_formats
    }

    fn lookup(&self, event_type: &str) -> Option<&Arc<CompiledSchema>> {
        if let Some(schema) = self.schemas.get(event_type) {
            return Some(schema);
        }
        let wildcard = category_wildcard(event_type)?;
        let schema = self.schemas.get(&wildcard)?;
        debug!(event_type, wildcard = %wildcard, "resolved through category fallback");
        Some(schema)
    }

    fn resolve(&self, event_type: &str) -> Result<&CompiledSchema, ValidationError> {
        self.lookup(event_type)
            .map(Arc::as_ref)
            .ok_or_else(|| ValidationError::unknown_event_type(event_type))
    }

    fn validated_instance(
        &self,
        event_type: &str,
        raw: &[u8],
    ) -> Result<(&CompiledSchema, Value), ValidationError> {
        let value = parse_raw(event_type, raw)?;
        let schema = self.resolve(event_type)?;
        let instance = canonical::normalize(&value)
            .map_err(|e| ValidationError::malformed(event_type, e.to_string()))?;
        check(event_type, schema, &instance)?;
        Ok((schema, instance))
    }
}

/// Build validation options that resolve `$ref`s through `retriever`.
fn build_options(retriever: &CatalogRetriever, validate_formats: bool) -> ValidationOptions {
    let mut opts = jsonschema::options();
    opts.with_draft(jsonschema::Draft::Draft202012);
    opts.should_validate_formats(validate_formats);
    opts.with_retriever(retriever.clone());
    opts
}

fn compile(
    name: &str,
    value: &Value,
    retriever: &CatalogRetriever,
    validate_formats: bool,
) -> Result<jsonschema::Validator, RegistryError> {
    build_options(retriever, validate_formats)
        .build(value)
        .map_err(|e| RegistryError::SchemaCompile {
            document: name.to_string(),
            reason: e.to_string(),
        })
}

fn parse_raw(event_type: &str, raw: &[u8]) -> Result<Value, ValidationError> {
    serde_json::from_slice(raw)
        .map_err(|e| ValidationError::malformed(event_type, format!("invalid JSON: {e}")))
}

fn decode_error(event_type: &str, err: &serde_json::Error) -> ValidationError {
    ValidationError::new(
        event_type,
        ValidationErrorKind::Decode,
        vec![format!("failed to decode payload: {err}")],
    )
}

fn check(event_type: &str, schema: &CompiledSchema, instance: &Value) -> Result<(), ValidationError> {
    if schema.validator.is_valid(instance) {
        debug!(event_type, document = schema.document.name, "payload accepted");
        return Ok(());
    }
    let errors = violation_tree(&schema.validator, instance).flatten();
    debug!(
        event_type,
        document = schema.document.name,
        violations = errors.len(),
        "payload rejected"
    );
    Err(ValidationError::new(
        event_type,
        ValidationErrorKind::SchemaViolation,
        errors,
    ))
}

/// Collect engine errors under a message-less root.
fn violation_tree(validator: &jsonschema::Validator, instance: &Value) -> ViolationNode {
    ViolationNode::root(
        validator
            .iter_errors(instance)
            .map(|e| ViolationNode::leaf(e.instance_path.to_string(), e.to_string()))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use klambda_core::types;
    use serde_json::json;

    fn retriever() -> CatalogRetriever {
        let documents_by_uri = DOCUMENTS
            .iter()
            .map(|d| (d.uri(), serde_json::from_str(d.text).unwrap()))
            .collect();
        CatalogRetriever {
            documents_by_uri: Arc::new(documents_by_uri),
        }
    }

    #[test]
    fn test_registry_builds() {
        let v = Validator::new().unwrap();
        assert_eq!(v.registered_event_types().len(), BUILTIN_BINDINGS.len());
        assert!(!v.validates_formats());
    }

    #[test]
    fn test_unresolvable_ref_fails_compile() {
        let schema = json!({
            "$schema": "https://json-schema.org/draft/2020-12/schema",
            "$id": "https://schemas.knative-lambda.io/v1/broken.schema.json",
            "properties": {"x": {"$ref": "https://example.com/missing.schema.json"}}
        });
        let err = compile("broken", &schema, &retriever(), false).unwrap_err();
        assert!(matches!(err, RegistryError::SchemaCompile { .. }), "{err}");
    }

    #[test]
    fn test_dangling_local_ref_fails_compile() {
        let schema = json!({
            "$id": "https://schemas.knative-lambda.io/v1/broken.schema.json",
            "properties": {"x": {"$ref": "common.schema.json#/$defs/doesNotExist"}}
        });
        assert!(compile("broken", &schema, &retriever(), false).is_err());
    }

    #[test]
    fn test_cross_document_ref_resolves() {
        let schema = json!({
            "$id": "https://schemas.knative-lambda.io/v1/probe.schema.json",
            "$ref": "common.schema.json#/$defs/dnsLabel"
        });
        let compiled = compile("probe", &schema, &retriever(), false).unwrap();
        assert!(compiled.is_valid(&json!("hello-world")));
        assert!(!compiled.is_valid(&json!("Hello")));
    }

    #[test]
    fn test_config_binding_to_unknown_document() {
        let config = ValidatorConfig::default().bind(types::COMMAND_FUNCTION_ROLLBACK, "rollback");
        let err = Validator::with_config(&config).unwrap_err();
        assert!(matches!(err, RegistryError::UnknownDocument { .. }), "{err}");
    }

    #[test]
    fn test_config_binding_to_common_rejected() {
        let config = ValidatorConfig::default().bind(types::COMMAND_FUNCTION_ROLLBACK, "common");
        let err = Validator::with_config(&config).unwrap_err();
        assert!(matches!(err, RegistryError::UnbindableDocument { .. }), "{err}");
    }

    #[test]
    fn test_config_binding_with_bad_event_type() {
        let config = ValidatorConfig::default().bind("io..knative", "invoke");
        let err = Validator::with_config(&config).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidEventType(_)), "{err}");
    }

    #[test]
    fn test_config_wildcard_with_wrong_depth_fails() {
        for key in ["io.knative.lambda.command.build.*", "io.knative.*"] {
            let config = ValidatorConfig::default().bind(key, "build-command");
            let err = Validator::with_config(&config).unwrap_err();
            assert!(
                matches!(err, RegistryError::UnroutableWildcard { expected: 4, .. }),
                "{key}: {err}"
            );
            assert!(err.to_string().contains(key));
        }
    }

    #[test]
    fn test_config_wildcard_at_category_depth_routes() {
        let config =
            ValidatorConfig::default().bind("io.knative.lambda.lifecycle.*", "lifecycle-build");
        let v = Validator::with_config(&config).unwrap();
        assert!(v.has_schema("io.knative.lambda.lifecycle.build"));
        assert_eq!(
            v.document_for("io.knative.lambda.lifecycle.build").unwrap().name,
            "lifecycle-build"
        );
    }

    #[test]
    fn test_config_binding_added_and_overridden() {
        let config = ValidatorConfig::default()
            .bind(types::COMMAND_FUNCTION_ROLLBACK, "build-command")
            .bind(types::INVOKE_SYNC, "response");
        let v = Validator::with_config(&config).unwrap();
        assert!(v.has_schema(types::COMMAND_FUNCTION_ROLLBACK));
        assert_eq!(v.document_for(types::INVOKE_SYNC).unwrap().name, "response");
        assert!(v
            .validate(types::COMMAND_FUNCTION_ROLLBACK, &json!({"name": "hello"}))
            .is_ok());
        assert!(v
            .validate(types::INVOKE_SYNC, &json!({"statusCode": 600}))
            .is_err());
    }

    #[test]
    fn test_format_assertion_is_opt_in() {
        let doc = json!({"name": "hello", "namespace": "functions", "startedAt": "yesterday"});
        let lenient = Validator::new().unwrap();
        assert!(lenient.validate(types::LIFECYCLE_BUILD_STARTED, &doc).is_ok());

        let strict = Validator::with_config(&ValidatorConfig {
            validate_formats: true,
            ..ValidatorConfig::default()
        })
        .unwrap();
        let err = strict
            .validate(types::LIFECYCLE_BUILD_STARTED, &doc)
            .unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::SchemaViolation);
        assert!(err.errors[0].starts_with("/startedAt: "), "{:?}", err.errors);
    }

    #[test]
    fn test_error_display_joins_entries() {
        let err = ValidationError::new(
            "io.x.y.z",
            ValidationErrorKind::SchemaViolation,
            vec!["/a: one".into(), "two".into()],
        );
        assert_eq!(
            err.to_string(),
            "schema validation failed for event type io.x.y.z: /a: one; two"
        );
    }

    #[test]
    fn test_error_wire_shape() {
        let err = ValidationError::unknown_event_type("io.unknown.thing");
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({
                "eventType": "io.unknown.thing",
                "kind": "unknown_event_type",
                "errors": ["no schema registered for event type: io.unknown.thing"]
            })
        );
    }

    #[test]
    fn test_validator_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Validator>();
        assert_send_sync::<ValidationError>();
    }
}
