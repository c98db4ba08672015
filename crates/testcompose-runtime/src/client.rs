//! Runtime client abstraction.
//!
//! The readiness waiter, the liveness probe, and the SDK only ever talk to
//! a container runtime through [`RuntimeClient`]. The caller owns the
//! client and passes it to each operation that needs it.

use std::collections::BTreeMap;

use testcompose_common::config::RegistryCredentials;
use testcompose_common::error::Result;
use testcompose_common::types::{ContainerId, ContainerState, HostPort, VolumeBind};

/// Normalized parameters of a container create call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerConfig {
    /// Container name.
    pub name: String,
    /// Image reference.
    pub image: String,
    /// Command override; the image default when empty.
    pub command: Vec<String>,
    /// Environment variables.
    pub env: BTreeMap<String, String>,
    /// Container port to host port bindings.
    pub ports: BTreeMap<u16, HostPort>,
    /// Resolved host reference to bind mount.
    pub volumes: BTreeMap<String, VolumeBind>,
}

/// Snapshot of a container as reported by the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerHandle {
    /// Full runtime identifier.
    pub id: ContainerId,
    /// Abbreviated identifier.
    pub short_id: String,
    /// Human-readable name.
    pub name: String,
    /// State at the time of the lookup.
    pub state: ContainerState,
}

/// Outcome of a registry login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginResult {
    /// Status text reported by the runtime.
    pub status: String,
}

/// Capability set of a container runtime.
///
/// Implementors translate these calls to a concrete runtime API. Missing
/// images and containers must be reported as
/// [`TestcomposeError::NotFound`](testcompose_common::error::TestcomposeError::NotFound),
/// all other failures as
/// [`TestcomposeError::Transport`](testcompose_common::error::TestcomposeError::Transport).
pub trait RuntimeClient: Send + Sync {
    /// Returns whether the image is present locally.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime cannot be queried.
    fn image_exists(&self, image: &str) -> Result<bool>;

    /// Pulls the image from its registry.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the registry has no such image, or a transport
    /// error otherwise.
    fn pull_image(&self, image: &str) -> Result<()>;

    /// Logs in to a registry.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are rejected.
    fn login(&self, credentials: &RegistryCredentials) -> Result<LoginResult>;

    /// Creates a container, returning its identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the container cannot be created.
    fn create_container(&self, config: &ContainerConfig) -> Result<ContainerId>;

    /// Starts a created container.
    ///
    /// # Errors
    ///
    /// Returns an error if the container cannot be started.
    fn start_container(&self, id: &ContainerId) -> Result<()>;

    /// Stops a running container.
    ///
    /// # Errors
    ///
    /// Returns an error if the container cannot be stopped.
    fn stop_container(&self, id: &ContainerId) -> Result<()>;

    /// Removes a container.
    ///
    /// # Errors
    ///
    /// Returns an error if the container cannot be removed.
    fn remove_container(&self, id: &ContainerId) -> Result<()>;

    /// Looks up a container by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no such container exists.
    fn get_container(&self, id: &ContainerId) -> Result<ContainerHandle>;

    /// Returns the full buffered stdout and stderr of a container.
    ///
    /// # Errors
    ///
    /// Returns an error if the logs cannot be retrieved.
    fn logs(&self, id: &ContainerId) -> Result<String>;
}
