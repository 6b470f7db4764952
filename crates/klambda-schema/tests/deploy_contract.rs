//! Integration test: the function-deploy wire contract.
//!
//! Exercises every source variant, the discriminator rule, name and
//! numeric boundaries, and the pattern-constrained fields of the deploy
//! document through the public `Validator` API.

use klambda_core::types::COMMAND_FUNCTION_DEPLOY;
use klambda_schema::{ValidationErrorKind, Validator};
use serde_json::{json, Value};

fn validator() -> Validator {
    Validator::new().expect("registry must build")
}

fn deploy_with_source(source: Value) -> Value {
    json!({
        "metadata": {"name": "hello", "namespace": "functions"},
        "spec": {
            "source": source,
            "runtime": {"language": "python", "version": "3.11", "handler": "main.handler"}
        }
    })
}

fn minimal_deploy() -> Value {
    deploy_with_source(json!({"type": "inline", "inline": {"code": "def handler(e): return e"}}))
}

/// Set `value` at a dotted path, creating intermediate objects.
fn with_field(mut doc: Value, path: &str, value: Value) -> Value {
    let mut parts: Vec<&str> = path.split('.').collect();
    let last = parts.pop().unwrap();
    let mut cursor = &mut doc;
    for part in parts {
        if cursor.get(part).is_none() {
            cursor[part] = json!({});
        }
        cursor = cursor.get_mut(part).unwrap();
    }
    cursor[last] = value;
    doc
}

fn assert_rejected(v: &Validator, doc: &Value, needle: &str) {
    let err = v
        .validate(COMMAND_FUNCTION_DEPLOY, doc)
        .expect_err("document should be rejected");
    assert_eq!(err.kind, ValidationErrorKind::SchemaViolation);
    let joined = err.errors.join("\n");
    assert!(
        joined.contains(needle),
        "expected a violation mentioning {needle:?}, got:\n{joined}"
    );
}

#[test]
fn test_every_source_variant_accepted() {
    let v = validator();
    let sources = [
        json!({"type": "minio", "minio": {"bucket": "lambdas", "key": "hello.zip"}}),
        json!({"type": "minio", "minio": {
            "endpoint": "minio.local:9000", "bucket": "lambdas", "key": "hello.zip",
            "secretRef": {"name": "minio-creds"}
        }}),
        json!({"type": "s3", "s3": {"bucket": "lambdas", "key": "hello.zip", "region": "eu-west-1"}}),
        json!({"type": "gcs", "gcs": {"bucket": "lambdas", "key": "hello.zip", "project": "p1"}}),
        json!({"type": "git", "git": {"url": "https://github.com/org/repo.git", "ref": "v1", "path": "fn"}}),
        json!({"type": "inline", "inline": {"code": "print(1)", "dependencies": "requests"}}),
        json!({"type": "image", "image": {"repository": "ghcr.io/org/hello", "tag": "v1"}}),
    ];
    for source in sources {
        let doc = deploy_with_source(source.clone());
        assert!(
            v.validate(COMMAND_FUNCTION_DEPLOY, &doc).is_ok(),
            "source {source} should validate: {:?}",
            v.validate(COMMAND_FUNCTION_DEPLOY, &doc)
        );
    }
}

#[test]
fn test_source_type_requires_matching_object() {
    let v = validator();
    let doc = deploy_with_source(json!({
        "type": "minio",
        "git": {"url": "https://github.com/org/repo.git"}
    }));
    assert_rejected(&v, &doc, "minio");
    assert_rejected(&v, &doc, "/spec/source");

    for kind in ["s3", "gcs", "git", "inline", "image"] {
        let doc = deploy_with_source(json!({"type": kind}));
        assert_rejected(&v, &doc, kind);
    }
}

#[test]
fn test_source_sub_object_required_fields() {
    let v = validator();
    assert_rejected(
        &v,
        &deploy_with_source(json!({"type": "minio", "minio": {"key": "a.zip"}})),
        "bucket",
    );
    assert_rejected(
        &v,
        &deploy_with_source(json!({"type": "s3", "s3": {"bucket": "b"}})),
        "/spec/source/s3",
    );
    assert_rejected(
        &v,
        &deploy_with_source(json!({"type": "gcs", "gcs": {"key": "a.zip"}})),
        "bucket",
    );
    assert_rejected(&v, &deploy_with_source(json!({"type": "git", "git": {}})), "url");
    assert_rejected(
        &v,
        &deploy_with_source(json!({"type": "inline", "inline": {"code": ""}})),
        "/spec/source/inline/code",
    );
}

#[test]
fn test_unknown_source_type_rejected() {
    let v = validator();
    assert_rejected(
        &v,
        &deploy_with_source(json!({"type": "ftp", "ftp": {}})),
        "/spec/source/type",
    );
}

#[test]
fn test_git_url_schemes() {
    let v = validator();
    for url in [
        "https://github.com/org/repo.git",
        "http://git.local/repo.git",
        "git@github.com:org/repo.git",
        "ssh://git@github.com/org/repo.git",
    ] {
        let doc = deploy_with_source(json!({"type": "git", "git": {"url": url}}));
        assert!(v.validate(COMMAND_FUNCTION_DEPLOY, &doc).is_ok(), "{url}");
    }
    for url in ["github.com/org/repo", "ftp://host/repo"] {
        let doc = deploy_with_source(json!({"type": "git", "git": {"url": url}}));
        assert_rejected(&v, &doc, "/spec/source/git/url");
    }
}

#[test]
fn test_image_constraints() {
    let v = validator();
    let image = |extra: Value| {
        let mut image = json!({"repository": "ghcr.io/org/hello"});
        if let (Some(obj), Some(add)) = (image.as_object_mut(), extra.as_object()) {
            obj.extend(add.clone());
        }
        deploy_with_source(json!({"type": "image", "image": image}))
    };
    for ok in [
        json!({"port": 1}),
        json!({"port": 65535}),
        json!({"pullPolicy": "Always"}),
        json!({"pullPolicy": "IfNotPresent"}),
        json!({"pullPolicy": "Never"}),
        json!({"digest": "sha256:abc"}),
    ] {
        assert!(v.validate(COMMAND_FUNCTION_DEPLOY, &image(ok.clone())).is_ok(), "{ok}");
    }
    assert_rejected(&v, &image(json!({"port": 0})), "/spec/source/image/port");
    assert_rejected(&v, &image(json!({"port": 65536})), "/spec/source/image/port");
    assert_rejected(&v, &image(json!({"pullPolicy": "Sometimes"})), "pullPolicy");
}

#[test]
fn test_missing_required_fields() {
    let v = validator();

    let mut no_source = minimal_deploy();
    no_source["spec"].as_object_mut().unwrap().remove("source");
    assert_rejected(&v, &no_source, "spec");
    assert_rejected(&v, &no_source, "source");

    let mut no_runtime = minimal_deploy();
    no_runtime["spec"].as_object_mut().unwrap().remove("runtime");
    assert_rejected(&v, &no_runtime, "spec");

    let mut no_name = minimal_deploy();
    no_name["metadata"].as_object_mut().unwrap().remove("name");
    assert_rejected(&v, &no_name, "name");

    let mut no_metadata = minimal_deploy();
    no_metadata.as_object_mut().unwrap().remove("metadata");
    assert_rejected(&v, &no_metadata, "metadata");

    let no_version = with_field(minimal_deploy(), "spec.runtime", json!({"language": "go"}));
    assert_rejected(&v, &no_version, "version");
}

#[test]
fn test_root_rejects_unknown_properties() {
    let v = validator();
    let doc = with_field(minimal_deploy(), "status", json!({"ready": true}));
    assert_rejected(&v, &doc, "status");
}

#[test]
fn test_runtime_language_enum() {
    let v = validator();
    for language in ["python", "nodejs", "go"] {
        let doc = with_field(minimal_deploy(), "spec.runtime.language", json!(language));
        assert!(v.validate(COMMAND_FUNCTION_DEPLOY, &doc).is_ok(), "{language}");
    }
    let doc = with_field(minimal_deploy(), "spec.runtime.language", json!("ruby"));
    assert_rejected(&v, &doc, "/spec/runtime/language");
}

#[test]
fn test_name_boundaries() {
    let v = validator();
    let longest = "a".repeat(63);
    let accepted = ["a", "1", "123", "9lives", "hello-world", longest.as_str()];
    for name in accepted {
        let doc = with_field(minimal_deploy(), "metadata.name", json!(name));
        assert!(
            v.validate(COMMAND_FUNCTION_DEPLOY, &doc).is_ok(),
            "{name:?} should be a valid label"
        );
    }
    let too_long = "a".repeat(64);
    let rejected = [
        "",
        "-hello",
        "hello-",
        "hello_world",
        "Hello",
        "hello world",
        too_long.as_str(),
    ];
    for name in rejected {
        let doc = with_field(minimal_deploy(), "metadata.name", json!(name));
        assert_rejected(&v, &doc, "/metadata/name");
    }
}

#[test]
fn test_deploy_namespace_is_dns_label() {
    let v = validator();
    let doc = with_field(minimal_deploy(), "metadata.namespace", json!("My_Namespace"));
    assert_rejected(&v, &doc, "/metadata/namespace");
}

#[test]
fn test_labels_and_annotations_are_string_maps() {
    let v = validator();
    let doc = with_field(minimal_deploy(), "metadata.labels", json!({"app": "hello"}));
    let doc = with_field(doc, "metadata.annotations", json!({"owner": "team-a"}));
    assert!(v.validate(COMMAND_FUNCTION_DEPLOY, &doc).is_ok());

    let doc = with_field(minimal_deploy(), "metadata.labels", json!({"replicas": 3}));
    assert_rejected(&v, &doc, "/metadata/labels/replicas");
}

#[test]
fn test_scaling_bounds() {
    let v = validator();
    let ok = with_field(
        minimal_deploy(),
        "spec.scaling",
        json!({"minReplicas": 0, "maxReplicas": 1, "targetConcurrency": 1, "scaleToZeroGracePeriod": "30s"}),
    );
    assert!(v.validate(COMMAND_FUNCTION_DEPLOY, &ok).is_ok());

    for (field, bad) in [("minReplicas", -1), ("maxReplicas", 0), ("targetConcurrency", 0)] {
        let doc = with_field(minimal_deploy(), &format!("spec.scaling.{field}"), json!(bad));
        assert_rejected(&v, &doc, &format!("/spec/scaling/{field}"));
    }
}

#[test]
fn test_integral_floats_count_as_integers() {
    let v = validator();
    let doc = with_field(minimal_deploy(), "spec.scaling.minReplicas", json!(2.0));
    assert!(v.validate(COMMAND_FUNCTION_DEPLOY, &doc).is_ok());
    let doc = with_field(minimal_deploy(), "spec.scaling.minReplicas", json!(2.5));
    assert_rejected(&v, &doc, "/spec/scaling/minReplicas");
}

#[test]
fn test_resource_quantity_patterns() {
    let v = validator();
    for cpu in ["100m", "1", "2000m"] {
        let doc = with_field(minimal_deploy(), "spec.resources.requests.cpu", json!(cpu));
        assert!(v.validate(COMMAND_FUNCTION_DEPLOY, &doc).is_ok(), "cpu {cpu}");
    }
    for memory in ["128Mi", "1Gi", "512Ki", "64M"] {
        let doc = with_field(minimal_deploy(), "spec.resources.limits.memory", json!(memory));
        assert!(v.validate(COMMAND_FUNCTION_DEPLOY, &doc).is_ok(), "memory {memory}");
    }
    let doc = with_field(minimal_deploy(), "spec.resources.requests.cpu", json!("abc"));
    assert_rejected(&v, &doc, "/spec/resources/requests/cpu");
    let doc = with_field(minimal_deploy(), "spec.resources.limits.memory", json!("lots"));
    assert_rejected(&v, &doc, "/spec/resources/limits/memory");
}

#[test]
fn test_env_entries() {
    let v = validator();
    let env = json!([
        {"name": "LOG_LEVEL", "value": "debug"},
        {"name": "API_KEY", "valueFrom": {"secretKeyRef": {"name": "s", "key": "k"}}},
        {"name": "BOTH", "value": "x", "valueFrom": {"configMapKeyRef": {"name": "c", "key": "k"}}}
    ]);
    let doc = with_field(minimal_deploy(), "spec.env", env);
    assert!(v.validate(COMMAND_FUNCTION_DEPLOY, &doc).is_ok());

    let doc = with_field(minimal_deploy(), "spec.env", json!([{"value": "orphan"}]));
    assert_rejected(&v, &doc, "/spec/env/0");
    let doc = with_field(minimal_deploy(), "spec.env", json!([{"name": ""}]));
    assert_rejected(&v, &doc, "/spec/env/0/name");
}

#[test]
fn test_build_registry_type_enum() {
    let v = validator();
    for registry_type in ["local", "ecr", "gcr", "ghcr", "dockerhub", "generic"] {
        let doc = with_field(
            minimal_deploy(),
            "spec.build",
            json!({"registryType": registry_type, "insecure": true, "timeout": "30m"}),
        );
        assert!(v.validate(COMMAND_FUNCTION_DEPLOY, &doc).is_ok(), "{registry_type}");
    }
    let doc = with_field(minimal_deploy(), "spec.build.registryType", json!("quay"));
    assert_rejected(&v, &doc, "/spec/build/registryType");
}

#[test]
fn test_eventing_spec() {
    let v = validator();
    for eventing in [json!({}), json!({"enabled": true}), json!({"enabled": false})] {
        let doc = with_field(minimal_deploy(), "spec.eventing", eventing);
        assert!(v.validate(COMMAND_FUNCTION_DEPLOY, &doc).is_ok());
    }
    let doc = with_field(minimal_deploy(), "spec.eventing.enabled", json!("yes"));
    assert_rejected(&v, &doc, "/spec/eventing/enabled");
}

#[test]
fn test_all_violations_reported_together() {
    let v = validator();
    let doc = with_field(minimal_deploy(), "metadata.name", json!("Bad_Name"));
    let doc = with_field(doc, "spec.runtime.language", json!("cobol"));
    let doc = with_field(doc, "spec.scaling.minReplicas", json!(-5));
    let err = v.validate(COMMAND_FUNCTION_DEPLOY, &doc).unwrap_err();
    let joined = err.errors.join("\n");
    for path in ["/metadata/name", "/spec/runtime/language", "/spec/scaling/minReplicas"] {
        assert!(joined.contains(path), "{path} missing from:\n{joined}");
    }
    assert!(err.to_string().starts_with(
        "schema validation failed for event type io.knative.lambda.command.function.deploy: "
    ));
}
