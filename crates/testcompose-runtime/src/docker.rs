//! Docker Engine implementation of [`RuntimeClient`] using bollard.
//!
//! bollard is async; this adapter owns a current-thread tokio runtime and
//! drives each call to completion with `block_on`, so it must not be used
//! from inside another tokio runtime.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use bollard::{API_DEFAULT_VERSION, ClientVersion, Docker};
use bollard::auth::DockerCredentials;
use bollard::container::{
    Config, CreateContainerOptions, InspectContainerOptions, LogOutput, LogsOptions,
    RemoveContainerOptions, StartContainerOptions, StopContainerOptions,
};
use bollard::errors::Error as BollardError;
use bollard::image::CreateImageOptions;
use bollard::models::{HostConfig, PortBinding};
use futures::StreamExt;
use testcompose_common::config::{ClientSettings, RegistryCredentials};
use testcompose_common::constants::{DEFAULT_DOCKER_HOST, PORT_PROTOCOL, STOP_GRACE_PERIOD_SECS};
use testcompose_common::error::{Result, TestcomposeError};
use testcompose_common::types::{ContainerId, ContainerState, HostPort};
use tokio::runtime::Runtime;

use crate::client::{ContainerConfig, ContainerHandle, LoginResult, RuntimeClient};

/// Blocking Docker client.
pub struct DockerRuntime {
    docker: Docker,
    runtime: Runtime,
    credentials: Mutex<Option<DockerCredentials>>,
}

impl DockerRuntime {
    /// Connects to the Docker daemon described by `settings`.
    ///
    /// The address comes from [`ClientSettings::docker_host`], then
    /// `DOCKER_HOST`, then the platform socket. `unix://` and `npipe://`
    /// addresses use the local transport, `tcp://` and `http://` use plain
    /// HTTP.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an unsupported address scheme or a
    /// malformed API version, and a transport error if the I/O runtime cannot
    /// be started, the daemon is unusable, or version negotiation fails.
    pub fn from_env(settings: &ClientSettings) -> Result<Self> {
        let version = ApiVersion::parse(settings.api_version.as_deref())?;
        let host = resolve_host(settings.docker_host.as_deref());
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| TestcomposeError::Transport {
                message: format!("failed to start I/O runtime: {e}"),
            })?;

        let docker = {
            let _guard = runtime.enter();
            connect(&host, settings.timeout_secs, version.client_version())?
        };
        let docker = if version == ApiVersion::Negotiate {
            runtime
                .block_on(docker.negotiate_version())
                .map_err(|e| TestcomposeError::Transport {
                    message: format!("failed to negotiate Docker API version: {e}"),
                })?
        } else {
            docker
        };

        tracing::debug!(
            host = %host,
            timeout_secs = settings.timeout_secs,
            api_version = %docker.client_version(),
            "docker client initialised"
        );
        Ok(Self {
            docker,
            runtime,
            credentials: Mutex::new(None),
        })
    }

    fn stored_credentials(&self) -> Option<DockerCredentials> {
        self.credentials
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl RuntimeClient for DockerRuntime {
    fn image_exists(&self, image: &str) -> Result<bool> {
        self.runtime.block_on(async {
            match self.docker.inspect_image(image).await {
                Ok(_) => Ok(true),
                Err(BollardError::DockerResponseServerError {
                    status_code: 404, ..
                }) => Ok(false),
                Err(e) => Err(runtime_error("image", image, e)),
            }
        })
    }

    fn pull_image(&self, image: &str) -> Result<()> {
        let reference = with_default_tag(image);
        let credentials = self.stored_credentials();
        tracing::info!(image = %reference, "pulling image");

        self.runtime.block_on(async {
            let options = CreateImageOptions {
                from_image: reference.as_str(),
                ..Default::default()
            };
            let mut stream = self.docker.create_image(Some(options), None, credentials);
            while let Some(progress) = stream.next().await {
                let _ = progress.map_err(|e| runtime_error("image", &reference, e))?;
            }
            Ok(())
        })
    }

    fn login(&self, credentials: &RegistryCredentials) -> Result<LoginResult> {
        let registry = credentials
            .registry
            .clone()
            .unwrap_or_else(|| "default registry".to_string());
        *self
            .credentials
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(DockerCredentials {
            username: Some(credentials.username.clone()),
            password: Some(credentials.password.clone()),
            serveraddress: credentials.registry.clone(),
            ..Default::default()
        });
        Ok(LoginResult {
            status: format!("credentials for {registry} stored for image pulls"),
        })
    }

    fn create_container(&self, config: &ContainerConfig) -> Result<ContainerId> {
        let options = CreateContainerOptions {
            name: config.name.clone(),
            platform: None,
        };
        let body = Config {
            image: Some(config.image.clone()),
            cmd: if config.command.is_empty() {
                None
            } else {
                Some(config.command.clone())
            },
            env: if config.env.is_empty() {
                None
            } else {
                Some(env_list(config))
            },
            exposed_ports: if config.ports.is_empty() {
                None
            } else {
                Some(exposed_ports(config))
            },
            host_config: Some(host_config(config)),
            ..Default::default()
        };

        let response = self
            .runtime
            .block_on(self.docker.create_container(Some(options), body))
            .map_err(|e| runtime_error("image", &config.image, e))?;
        for warning in &response.warnings {
            tracing::warn!(name = %config.name, warning = %warning, "docker create warning");
        }
        Ok(ContainerId::new(response.id))
    }

    fn start_container(&self, id: &ContainerId) -> Result<()> {
        self.runtime
            .block_on(
                self.docker
                    .start_container(id.as_str(), None::<StartContainerOptions<String>>),
            )
            .map_err(|e| runtime_error("container", id.as_str(), e))
    }

    fn stop_container(&self, id: &ContainerId) -> Result<()> {
        let options = StopContainerOptions {
            t: STOP_GRACE_PERIOD_SECS,
        };
        match self
            .runtime
            .block_on(self.docker.stop_container(id.as_str(), Some(options)))
        {
            // 304: already stopped.
            Ok(()) | Err(BollardError::DockerResponseServerError { status_code: 304, .. }) => {
                Ok(())
            }
            Err(e) => Err(runtime_error("container", id.as_str(), e)),
        }
    }

    fn remove_container(&self, id: &ContainerId) -> Result<()> {
        let options = RemoveContainerOptions {
            force: true,
            v: true,
            ..Default::default()
        };
        self.runtime
            .block_on(self.docker.remove_container(id.as_str(), Some(options)))
            .map_err(|e| runtime_error("container", id.as_str(), e))
    }

    fn get_container(&self, id: &ContainerId) -> Result<ContainerHandle> {
        let info = self
            .runtime
            .block_on(
                self.docker
                    .inspect_container(id.as_str(), None::<InspectContainerOptions>),
            )
            .map_err(|e| runtime_error("container", id.as_str(), e))?;

        let full_id = ContainerId::new(info.id.unwrap_or_else(|| id.to_string()));
        let state = info
            .state
            .and_then(|s| s.status)
            .map_or(ContainerState::Unknown, |status| {
                ContainerState::from_status(&status.to_string())
            });
        Ok(ContainerHandle {
            short_id: full_id.short().to_string(),
            name: info
                .name
                .map(|n| n.trim_start_matches('/').to_string())
                .unwrap_or_default(),
            id: full_id,
            state,
        })
    }

    fn logs(&self, id: &ContainerId) -> Result<String> {
        let options = LogsOptions::<String> {
            stdout: true,
            stderr: true,
            follow: false,
            timestamps: false,
            ..Default::default()
        };

        self.runtime.block_on(async {
            let mut stream = self.docker.logs(id.as_str(), Some(options));
            let mut output = String::new();
            while let Some(chunk) = stream.next().await {
                match chunk {
                    Ok(
                        LogOutput::StdOut { message }
                        | LogOutput::StdErr { message }
                        | LogOutput::Console { message },
                    ) => output.push_str(&String::from_utf8_lossy(&message)),
                    Ok(LogOutput::StdIn { .. }) => {}
                    Err(e) => return Err(runtime_error("container", id.as_str(), e)),
                }
            }
            Ok(output)
        })
    }
}

/// Maps a bollard error to the workspace taxonomy.
fn runtime_error(kind: &'static str, id: &str, error: BollardError) -> TestcomposeError {
    match error {
        BollardError::DockerResponseServerError {
            status_code: 404, ..
        } => TestcomposeError::NotFound {
            kind,
            id: id.to_string(),
        },
        other => TestcomposeError::Transport {
            message: format!("{kind} {id}: {other}"),
        },
    }
}

/// Appends `:latest` when the reference carries neither tag nor digest.
///
/// The pull endpoint otherwise fetches every tag of the repository.
fn with_default_tag(image: &str) -> String {
    let last_segment = image.rsplit('/').next().unwrap_or(image);
    if last_segment.contains(':') || image.contains('@') {
        image.to_string()
    } else {
        format!("{image}:latest")
    }
}

fn port_key(port: u16) -> String {
    format!("{port}/{PORT_PROTOCOL}")
}

fn env_list(config: &ContainerConfig) -> Vec<String> {
    config.env.iter().map(|(k, v)| format!("{k}={v}")).collect()
}

#[allow(clippy::zero_sized_map_values)]
fn exposed_ports(config: &ContainerConfig) -> HashMap<String, HashMap<(), ()>> {
    config
        .ports
        .keys()
        .map(|port| (port_key(*port), HashMap::new()))
        .collect()
}

fn host_config(config: &ContainerConfig) -> HostConfig {
    let port_bindings: HashMap<String, Option<Vec<PortBinding>>> = config
        .ports
        .iter()
        .map(|(container, host)| {
            let binding = PortBinding {
                host_ip: None,
                host_port: match host {
                    HostPort::Fixed(port) => Some(port.to_string()),
                    HostPort::Unassigned => None,
                },
            };
            (port_key(*container), Some(vec![binding]))
        })
        .collect();

    let binds: Vec<String> = config
        .volumes
        .iter()
        .map(|(host, volume)| format!("{host}:{}:{}", volume.bind, volume.mode))
        .collect();

    HostConfig {
        port_bindings: if port_bindings.is_empty() {
            None
        } else {
            Some(port_bindings)
        },
        binds: if binds.is_empty() { None } else { Some(binds) },
        ..Default::default()
    }
}

/// Requested engine API version.
#[derive(Debug, Clone, Copy, PartialEq)]
enum ApiVersion {
    LibraryDefault,
    Negotiate,
    Pinned(ClientVersion),
}

impl ApiVersion {
    fn parse(raw: Option<&str>) -> Result<Self> {
        let Some(raw) = raw.map(str::trim) else {
            return Ok(Self::LibraryDefault);
        };
        if raw.eq_ignore_ascii_case("auto") {
            return Ok(Self::Negotiate);
        }
        let parsed = raw
            .split_once('.')
            .and_then(|(major, minor)| Some((major.parse().ok()?, minor.parse().ok()?)));
        match parsed {
            Some((major_version, minor_version)) => Ok(Self::Pinned(ClientVersion {
                major_version,
                minor_version,
            })),
            None => Err(TestcomposeError::config(format!(
                "invalid Docker API version {raw:?}: expected auto or MAJOR.MINOR"
            ))),
        }
    }

    /// Version the connection starts with; negotiation may replace it.
    const fn client_version(&self) -> &ClientVersion {
        match self {
            Self::Pinned(version) => version,
            Self::LibraryDefault | Self::Negotiate => API_DEFAULT_VERSION,
        }
    }
}

fn resolve_host(explicit: Option<&str>) -> String {
    explicit
        .map(ToString::to_string)
        .or_else(|| std::env::var("DOCKER_HOST").ok())
        .filter(|host| !host.is_empty())
        .unwrap_or_else(|| DEFAULT_DOCKER_HOST.to_string())
}

fn connect(host: &str, timeout_secs: u64, version: &ClientVersion) -> Result<Docker> {
    let connected = if host.starts_with("unix://") || host.starts_with("npipe://") {
        Docker::connect_with_local(host, timeout_secs, version)
    } else if host.starts_with("tcp://") || host.starts_with("http://") {
        Docker::connect_with_http(host, timeout_secs, version)
    } else {
        return Err(TestcomposeError::config(format!(
            "unsupported Docker host {host:?}: expected unix://, npipe://, tcp:// or http://"
        )));
    };
    connected.map_err(|e| TestcomposeError::Transport {
        message: format!("failed to connect to Docker at {host}: {e}"),
    })
}
