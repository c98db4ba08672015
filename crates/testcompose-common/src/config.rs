//! User-facing configuration models.
//!
//! These are the declarative shapes a test author writes, either in code
//! or in a YAML/JSON specification file. They are loosely typed on
//! purpose: port strings and volume source kinds are validated during
//! normalization, not during deserialization.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use crate::constants::{
    DEFAULT_CLIENT_TIMEOUT_SECS, DEFAULT_POLL_INTERVAL_MS, DEFAULT_WAIT_TIMEOUT_MS,
};
use crate::error::{Result, TestcomposeError};
use crate::types::{EnvValue, VolumeMode};

/// Declarative description of a single test container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerSpecification {
    /// Container name. A unique name is generated when absent.
    pub name: Option<String>,
    /// Image reference, e.g. `postgres:16-alpine`.
    pub image: String,
    /// Command override for the container entrypoint.
    pub command: Vec<String>,
    /// Port declarations: `containerPort` or `hostPort:containerPort`.
    #[serde(deserialize_with = "port_declarations")]
    pub exposed_ports: Vec<String>,
    /// Volumes to mount into the container.
    pub volumes: Vec<VolumeMapping>,
    /// Environment variables passed to the container process.
    pub environment: BTreeMap<String, EnvValue>,
    /// Credentials for a private registry.
    pub registry_login: Option<RegistryCredentials>,
    /// Log-based readiness check run after the container starts.
    pub log_wait_parameter: Option<LogWaitParameter>,
    /// When to pull the image.
    pub image_pull_policy: ImagePullPolicy,
}

impl ContainerSpecification {
    /// Creates a specification for the given image with everything else empty.
    #[must_use]
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            ..Self::default()
        }
    }
}

/// A single volume mapping as declared by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeMapping {
    /// Host path or runtime volume name.
    pub host: String,
    /// Mount point inside the container.
    pub container: String,
    /// Access mode, `rw` unless stated.
    #[serde(default)]
    pub mode: VolumeMode,
    /// Source kind: `local` or `docker`.
    #[serde(default)]
    pub source: Option<String>,
}

/// Registry credentials used to log in before pulling.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryCredentials {
    /// Registry user.
    #[serde(default)]
    pub username: String,
    /// Registry password or token.
    #[serde(default)]
    pub password: String,
    /// Registry address; the runtime default registry when absent.
    #[serde(default)]
    pub registry: Option<String>,
}

impl RegistryCredentials {
    /// Returns whether these credentials should trigger a login.
    #[must_use]
    pub const fn is_present(&self) -> bool {
        !self.username.is_empty()
    }
}

// Password stays out of logs.
impl std::fmt::Debug for RegistryCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryCredentials")
            .field("username", &self.username)
            .field("password", &"***")
            .field("registry", &self.registry)
            .finish()
    }
}

/// Parameters of a log-based readiness check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogWaitParameter {
    /// Regular expression matched against the full log text in multi-line mode.
    pub log_line_regex: String,
    /// Maximum time to wait, in milliseconds.
    #[serde(default = "default_wait_timeout_ms")]
    pub wait_timeout_ms: u64,
    /// Delay between polls, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl LogWaitParameter {
    /// Creates a parameter with default timing for the given pattern.
    #[must_use]
    pub fn new(log_line_regex: impl Into<String>) -> Self {
        Self {
            log_line_regex: log_line_regex.into(),
            wait_timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }

    /// Sets the wait timeout.
    #[must_use]
    pub const fn with_timeout_ms(mut self, ms: u64) -> Self {
        self.wait_timeout_ms = ms;
        self
    }

    /// Sets the poll interval.
    #[must_use]
    pub const fn with_poll_interval_ms(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }
}

const fn default_wait_timeout_ms() -> u64 {
    DEFAULT_WAIT_TIMEOUT_MS
}

const fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

/// When the image should be pulled before the container is created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImagePullPolicy {
    /// Pull only if the image is not present locally.
    #[default]
    IfNotPresent,
    /// Always pull, refreshing a local copy.
    Always,
    /// Never pull; a missing image is an error.
    Never,
}

/// Connection settings for a runtime client built from the environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Engine API version: `auto` to negotiate, `MAJOR.MINOR` to pin, or
    /// `None` for the client library default.
    pub api_version: Option<String>,
    /// Daemon address overriding `DOCKER_HOST`.
    pub docker_host: Option<String>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_CLIENT_TIMEOUT_SECS,
            api_version: None,
            docker_host: None,
        }
    }
}

/// Accepts port declarations written either as strings or bare integers.
fn port_declarations<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Declaration {
        Number(u64),
        Text(String),
    }

    let raw = Vec::<Declaration>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|d| match d {
            Declaration::Number(n) => n.to_string(),
            Declaration::Text(s) => s,
        })
        .collect())
}

/// Loads a container specification from a YAML or JSON file.
///
/// Files ending in `.json` are parsed as JSON, everything else as YAML.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if it does
/// not name an image.
pub fn load_specification(path: &Path) -> Result<ContainerSpecification> {
    tracing::debug!(path = %path.display(), "loading container specification");
    let content = std::fs::read_to_string(path).map_err(|e| TestcomposeError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let spec: ContainerSpecification =
        if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json")) {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };

    if spec.image.trim().is_empty() {
        return Err(TestcomposeError::config(format!(
            "{}: image is required",
            path.display()
        )));
    }
    Ok(spec)
}
