//! Build plans and the runtime directives they carry.
//!
//! A [`BuildPlan`] is the fully validated output of
//! [`SpecBuilder::build`](crate::builder::SpecBuilder::build). The runtime
//! side effects it needs before a container can be created are listed as
//! [`Directive`]s and only happen in [`apply_directives`].

use std::collections::BTreeMap;

use testcompose_common::config::{ImagePullPolicy, LogWaitParameter, RegistryCredentials};
use testcompose_common::error::{Result, TestcomposeError};
use testcompose_common::types::{HostPort, VolumeBind};
use testcompose_runtime::client::{ContainerConfig, RuntimeClient};

/// Normalized, runtime-ready form of a container specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedSpec {
    /// Container name.
    pub name: String,
    /// Image reference.
    pub image: String,
    /// Command override.
    pub command: Vec<String>,
    /// Environment variables.
    pub environment: BTreeMap<String, String>,
    /// Resolved host reference to bind mount.
    pub volumes: BTreeMap<String, VolumeBind>,
    /// Container port to host port.
    pub ports: BTreeMap<u16, HostPort>,
    /// Readiness check to run after start, already validated.
    pub log_wait: Option<LogWaitParameter>,
}

impl NormalizedSpec {
    /// Returns the create-call parameters for this spec.
    #[must_use]
    pub fn container_config(&self) -> ContainerConfig {
        ContainerConfig {
            name: self.name.clone(),
            image: self.image.clone(),
            command: self.command.clone(),
            env: self.environment.clone(),
            ports: self.ports.clone(),
            volumes: self.volumes.clone(),
        }
    }
}

/// A runtime action required before the container can be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Log in to a registry with these credentials.
    Login(RegistryCredentials),
    /// Make sure the image is available locally.
    EnsureImage {
        /// Image reference.
        image: String,
        /// Pull behaviour.
        policy: ImagePullPolicy,
    },
}

/// Validated spec plus the ordered directives to run before creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildPlan {
    /// Normalized container parameters.
    pub spec: NormalizedSpec,
    /// Directives in execution order.
    pub directives: Vec<Directive>,
}

impl BuildPlan {
    /// Returns whether the plan asks for a registry login.
    #[must_use]
    pub fn requires_login(&self) -> bool {
        self.directives
            .iter()
            .any(|d| matches!(d, Directive::Login(_)))
    }
}

/// Executes the plan's directives against the runtime, in order.
///
/// # Errors
///
/// Returns an error if login fails, the image cannot be pulled, or the
/// image is missing under [`ImagePullPolicy::Never`].
pub fn apply_directives(client: &dyn RuntimeClient, plan: &BuildPlan) -> Result<()> {
    for directive in &plan.directives {
        match directive {
            Directive::Login(credentials) => {
                let login = client.login(credentials)?;
                tracing::info!(
                    username = %credentials.username,
                    status = %login.status,
                    "registry login"
                );
            }
            Directive::EnsureImage { image, policy } => ensure_image(client, image, *policy)?,
        }
    }
    Ok(())
}

fn ensure_image(client: &dyn RuntimeClient, image: &str, policy: ImagePullPolicy) -> Result<()> {
    match policy {
        ImagePullPolicy::Always => client.pull_image(image),
        ImagePullPolicy::IfNotPresent => {
            if client.image_exists(image)? {
                tracing::debug!(image, "image present locally");
                Ok(())
            } else {
                tracing::info!(image, "image not present, pulling");
                client.pull_image(image)
            }
        }
        ImagePullPolicy::Never => {
            if client.image_exists(image)? {
                Ok(())
            } else {
                Err(TestcomposeError::NotFound {
                    kind: "image",
                    id: format!("{image} (pull policy is never)"),
                })
            }
        }
    }
}
