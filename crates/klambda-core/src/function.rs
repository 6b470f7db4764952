//! # Function Deploy Model
//!
//! Typed form of the `command.function.deploy` payload (and its
//! `command.service.create` / `command.service.update` aliases).
//!
//! ## Source Union
//!
//! On the wire the function source is a tagged object:
//!
//! ```json
//! { "type": "git", "git": { "url": "https://github.com/acme/fn", "ref": "v2" } }
//! ```
//!
//! The schema enforces that the object named by `type` is present. In Rust
//! the same shape is the [`SourceSpec`] enum, so a consumer can never read
//! a `minio` bucket out of a `git` source. Decoding ignores sub-objects for
//! kinds other than the tagged one; encoding writes only the tagged one.
//!
//! ## Defaults
//!
//! The schema leaves optional numeric and string fields unset. Consumers
//! apply defaults through the `*_or_default` / `resolved` helpers here, so
//! every reconciler agrees on the same values.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SourceError;

/// Default MinIO endpoint when a `minio` source omits one.
pub const DEFAULT_MINIO_ENDPOINT: &str = "minio.minio.svc.cluster.local:9000";
/// Default S3 region.
pub const DEFAULT_S3_REGION: &str = "us-east-1";
/// Default git ref.
pub const DEFAULT_GIT_REF: &str = "main";
/// Default image tag.
pub const DEFAULT_IMAGE_TAG: &str = "latest";
/// Default container port for prebuilt images.
pub const DEFAULT_IMAGE_PORT: u16 = 8080;
/// Default minimum replica count.
pub const DEFAULT_MIN_REPLICAS: u32 = 0;
/// Default maximum replica count.
pub const DEFAULT_MAX_REPLICAS: u32 = 50;
/// Default autoscaling concurrency target.
pub const DEFAULT_TARGET_CONCURRENCY: u32 = 5;
/// Default memory request/limit.
pub const DEFAULT_MEMORY: &str = "64Mi";
/// Default CPU request/limit.
pub const DEFAULT_CPU: &str = "50m";

/// A complete deploy command payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDeploy {
    /// Identity of the function.
    pub metadata: FunctionMetadata,
    /// Desired state.
    pub spec: FunctionSpec,
}

/// Kubernetes-style object metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionMetadata {
    /// RFC-1123 DNS label.
    pub name: String,
    /// Target namespace; the receiver's default applies when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

/// Desired state of a function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionSpec {
    pub source: SourceSpec,
    pub runtime: RuntimeSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaling: Option<ScalingSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build: Option<BuildSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eventing: Option<EventingSpec>,
}

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

/// Discriminator values for [`SourceSpec`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Minio,
    S3,
    Gcs,
    Git,
    Inline,
    Image,
}

impl SourceKind {
    /// All kinds, in wire-enum order.
    pub const ALL: [SourceKind; 6] = [
        SourceKind::Minio,
        SourceKind::S3,
        SourceKind::Gcs,
        SourceKind::Git,
        SourceKind::Inline,
        SourceKind::Image,
    ];

    /// The wire tag, which is also the name of the sub-object.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Minio => "minio",
            SourceKind::S3 => "s3",
            SourceKind::Gcs => "gcs",
            SourceKind::Git => "git",
            SourceKind::Inline => "inline",
            SourceKind::Image => "image",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the function's code comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSourceSpec", into = "RawSourceSpec")]
pub enum SourceSpec {
    Minio(MinioSource),
    S3(S3Source),
    Gcs(GcsSource),
    Git(GitSource),
    Inline(InlineSource),
    Image(ImageSource),
}

impl SourceSpec {
    /// The discriminator of this source.
    pub fn kind(&self) -> SourceKind {
        match self {
            SourceSpec::Minio(_) => SourceKind::Minio,
            SourceSpec::S3(_) => SourceKind::S3,
            SourceSpec::Gcs(_) => SourceKind::Gcs,
            SourceSpec::Git(_) => SourceKind::Git,
            SourceSpec::Inline(_) => SourceKind::Inline,
            SourceSpec::Image(_) => SourceKind::Image,
        }
    }

    /// Credentials reference, for the kinds that accept one.
    pub fn secret_ref(&self) -> Option<&SecretRef> {
        match self {
            SourceSpec::Minio(s) => s.secret_ref.as_ref(),
            SourceSpec::S3(s) => s.secret_ref.as_ref(),
            SourceSpec::Gcs(s) => s.secret_ref.as_ref(),
            SourceSpec::Git(s) => s.secret_ref.as_ref(),
            SourceSpec::Inline(_) | SourceSpec::Image(_) => None,
        }
    }

    /// True if the function must be built before it can run.
    pub fn requires_build(&self) -> bool {
        !matches!(self, SourceSpec::Image(_))
    }
}

/// Wire shape of a source: tag plus one optional object per kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawSourceSpec {
    #[serde(rename = "type")]
    kind: SourceKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    minio: Option<MinioSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    s3: Option<S3Source>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    gcs: Option<GcsSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    git: Option<GitSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline: Option<InlineSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image: Option<ImageSource>,
}

impl TryFrom<RawSourceSpec> for SourceSpec {
    type Error = SourceError;

    fn try_from(raw: RawSourceSpec) -> Result<Self, Self::Error> {
        let kind = raw.kind;
        let missing = move || SourceError::MissingVariant(kind);
        match kind {
            SourceKind::Minio => raw.minio.map(SourceSpec::Minio).ok_or_else(missing),
            SourceKind::S3 => raw.s3.map(SourceSpec::S3).ok_or_else(missing),
            SourceKind::Gcs => raw.gcs.map(SourceSpec::Gcs).ok_or_else(missing),
            SourceKind::Git => raw.git.map(SourceSpec::Git).ok_or_else(missing),
            SourceKind::Inline => raw.inline.map(SourceSpec::Inline).ok_or_else(missing),
            SourceKind::Image => raw.image.map(SourceSpec::Image).ok_or_else(missing),
        }
    }
}

impl From<SourceSpec> for RawSourceSpec {
    fn from(source: SourceSpec) -> Self {
        let mut raw = RawSourceSpec {
            kind: source.kind(),
            minio: None,
            s3: None,
            gcs: None,
            git: None,
            inline: None,
            image: None,
        };
        match source {
            SourceSpec::Minio(s) => raw.minio = Some(s),
            SourceSpec::S3(s) => raw.s3 = Some(s),
            SourceSpec::Gcs(s) => raw.gcs = Some(s),
            SourceSpec::Git(s) => raw.git = Some(s),
            SourceSpec::Inline(s) => raw.inline = Some(s),
            SourceSpec::Image(s) => raw.image = Some(s),
        }
        raw
    }
}

/// Reference to a Kubernetes Secret holding source credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Archive in a MinIO bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MinioSource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    pub bucket: String,
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_ref: Option<SecretRef>,
}

impl MinioSource {
    pub fn endpoint_or_default(&self) -> &str {
        self.endpoint.as_deref().unwrap_or(DEFAULT_MINIO_ENDPOINT)
    }
}

/// Archive in an S3 bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct S3Source {
    pub bucket: String,
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_ref: Option<SecretRef>,
}

impl S3Source {
    pub fn region_or_default(&self) -> &str {
        self.region.as_deref().unwrap_or(DEFAULT_S3_REGION)
    }
}

/// Archive in a Google Cloud Storage bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GcsSource {
    pub bucket: String,
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_ref: Option<SecretRef>,
}

/// Git repository checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitSource {
    pub url: String,
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub git_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_ref: Option<SecretRef>,
}

impl GitSource {
    pub fn ref_or_default(&self) -> &str {
        self.git_ref.as_deref().unwrap_or(DEFAULT_GIT_REF)
    }
}

/// Code carried inline in the event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineSource {
    pub code: String,
    /// Dependency manifest contents (requirements.txt, package.json, go.mod).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<String>,
}

/// Image pull policy for prebuilt images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PullPolicy {
    Always,
    #[default]
    IfNotPresent,
    Never,
}

/// A prebuilt container image; no build step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSource {
    pub repository: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull_policy: Option<PullPolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

impl ImageSource {
    /// Full image reference. A digest pins the image and wins over the tag.
    pub fn reference(&self) -> String {
        match &self.digest {
            Some(digest) => format!("{}@{}", self.repository, digest),
            None => format!(
                "{}:{}",
                self.repository,
                self.tag.as_deref().unwrap_or(DEFAULT_IMAGE_TAG)
            ),
        }
    }

    pub fn pull_policy_or_default(&self) -> PullPolicy {
        self.pull_policy.unwrap_or_default()
    }

    pub fn port_or_default(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_IMAGE_PORT)
    }
}

// ---------------------------------------------------------------------------
// Runtime, scaling, resources
// ---------------------------------------------------------------------------

/// Supported function languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    Nodejs,
    Go,
}

/// Language runtime selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeSpec {
    pub language: Language,
    /// Language version, e.g. `3.11`, `20`, `1.21`.
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handler: Option<String>,
}

/// Autoscaling knobs. Every field is optional; see [`ScalingSpec::resolved`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScalingSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_replicas: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_replicas: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_concurrency: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_to_zero_grace_period: Option<String>,
}

/// Scaling with consumer defaults applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedScaling {
    pub min_replicas: u32,
    pub max_replicas: u32,
    pub target_concurrency: u32,
}

impl ScalingSpec {
    /// Apply defaults to each unset field independently.
    pub fn resolved(&self) -> ResolvedScaling {
        ResolvedScaling {
            min_replicas: self.min_replicas.unwrap_or(DEFAULT_MIN_REPLICAS),
            max_replicas: self.max_replicas.unwrap_or(DEFAULT_MAX_REPLICAS),
            target_concurrency: self
                .target_concurrency
                .unwrap_or(DEFAULT_TARGET_CONCURRENCY),
        }
    }
}

/// CPU and memory requests/limits.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResourceSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requests: Option<ResourceRequirements>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limits: Option<ResourceRequirements>,
}

/// Quantities as Kubernetes strings (`128Mi`, `100m`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResourceRequirements {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<String>,
}

impl ResourceRequirements {
    pub fn memory_or_default(&self) -> &str {
        self.memory.as_deref().unwrap_or(DEFAULT_MEMORY)
    }

    pub fn cpu_or_default(&self) -> &str {
        self.cpu.as_deref().unwrap_or(DEFAULT_CPU)
    }
}

// ---------------------------------------------------------------------------
// Env, build, eventing
// ---------------------------------------------------------------------------

/// A container environment variable.
///
/// `value` and `value_from` may both be set; the wire contract does not
/// forbid it. [`EnvVar::is_ambiguous`] lets a consumer flag such entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvVar {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_from: Option<EnvVarSource>,
}

impl EnvVar {
    /// True when both a literal value and a reference are present.
    pub fn is_ambiguous(&self) -> bool {
        self.value.is_some() && self.value_from.is_some()
    }
}

/// Reference-valued environment source.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvVarSource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_key_ref: Option<KeySelector>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_map_key_ref: Option<KeySelector>,
}

/// Selects a key of a Secret or ConfigMap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySelector {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

/// Container registry flavours understood by the build pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistryType {
    Local,
    Ecr,
    Gcr,
    Ghcr,
    Dockerhub,
    Generic,
}

/// Image build settings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry_type: Option<RegistryType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insecure: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub force_rebuild: Option<bool>,
}

/// Broker/trigger wiring toggle.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EventingSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}
