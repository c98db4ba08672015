//! Domain primitive types used across the testcompose workspace.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TestcomposeError;

/// Unique identifier for a container instance, as assigned by the runtime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainerId(String);

impl ContainerId {
    /// Creates a new container ID from a string value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the inner string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the 12-character abbreviated form used in runtime output.
    #[must_use]
    pub fn short(&self) -> &str {
        self.0.get(..12).unwrap_or(&self.0)
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a container as reported by the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContainerState {
    /// Container has been created but not yet started.
    Created,
    /// Container is actively running.
    Running,
    /// Container is paused.
    Paused,
    /// Container is restarting.
    Restarting,
    /// Container process has exited.
    Exited,
    /// Container is dead and cannot be restarted.
    Dead,
    /// The runtime reported a state this crate does not model.
    Unknown,
}

impl ContainerState {
    /// Maps a runtime status string (`running`, `exited`, ...) to a state.
    #[must_use]
    pub fn from_status(status: &str) -> Self {
        match status {
            "created" => Self::Created,
            "running" => Self::Running,
            "paused" => Self::Paused,
            "restarting" => Self::Restarting,
            "exited" => Self::Exited,
            "dead" => Self::Dead,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for ContainerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Running => write!(f, "running"),
            Self::Paused => write!(f, "paused"),
            Self::Restarting => write!(f, "restarting"),
            Self::Exited => write!(f, "exited"),
            Self::Dead => write!(f, "dead"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Host side of a published container port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HostPort {
    /// Publish on this exact host port.
    Fixed(u16),
    /// Let the runtime allocate a random host port.
    Unassigned,
}

impl fmt::Display for HostPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(port) => write!(f, "{port}"),
            Self::Unassigned => write!(f, "random"),
        }
    }
}

/// Access mode of a volume mount.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VolumeMode {
    /// Mounted read-only.
    #[serde(rename = "ro")]
    ReadOnly,
    /// Mounted read-write.
    #[default]
    #[serde(rename = "rw")]
    ReadWrite,
}

impl VolumeMode {
    /// Returns the runtime's textual form (`ro` or `rw`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ReadOnly => "ro",
            Self::ReadWrite => "rw",
        }
    }
}

impl fmt::Display for VolumeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the host side of a volume mapping comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolumeSourceKind {
    /// A file or directory on the local filesystem.
    Local,
    /// A named runtime volume, existing or to be created.
    Docker,
}

impl FromStr for VolumeSourceKind {
    type Err = TestcomposeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(Self::Local),
            "docker" => Ok(Self::Docker),
            _ => Err(TestcomposeError::config(
                "volume source must be local or docker",
            )),
        }
    }
}

/// A normalized volume bind, keyed elsewhere by its resolved host reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeBind {
    /// Mount point inside the container.
    pub bind: String,
    /// Access mode.
    pub mode: VolumeMode,
}

/// An environment variable value as written in a specification file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnvValue {
    /// Boolean, rendered as `true`/`false`.
    Bool(bool),
    /// Integer value.
    Integer(i64),
    /// Floating-point value, always rendered with a fractional part.
    Float(f64),
    /// Plain string.
    Text(String),
}

impl fmt::Display for EnvValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x:?}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for EnvValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for EnvValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for EnvValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for EnvValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}
