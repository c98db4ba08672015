//! Normalization of container specifications.
//!
//! [`SpecBuilder`] turns the loosely typed declarations of a
//! [`ContainerSpecification`] into the strict maps a runtime create call
//! expects. Every declaration is validated before any directive is
//! emitted, so a malformed spec never reaches the runtime.

use std::collections::BTreeMap;
use std::path::PathBuf;

use testcompose_common::config::{ContainerSpecification, VolumeMapping};
use testcompose_common::constants::CONTAINER_NAME_PREFIX;
use testcompose_common::error::{Result, TestcomposeError};
use testcompose_common::types::{EnvValue, HostPort, VolumeBind, VolumeSourceKind};
use testcompose_runtime::waiter::LogCondition;

use crate::plan::{BuildPlan, Directive, NormalizedSpec};

/// Accumulates normalized environment, volume, and port maps.
///
/// Later entries overwrite earlier ones for the same key, both within a
/// single call and across calls.
#[derive(Debug, Default, Clone)]
pub struct SpecBuilder {
    environment: BTreeMap<String, String>,
    volumes: BTreeMap<String, VolumeBind>,
    ports: BTreeMap<u16, HostPort>,
}

impl SpecBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalizes a full specification into a [`BuildPlan`].
    ///
    /// Normalization runs environment, then volumes, then ports. The plan
    /// asks for a login when credentials with a username are present, and
    /// always ends with an image presence directive.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for a missing image, a malformed port
    /// or volume declaration, or an invalid log wait parameter, and an I/O
    /// error if a local volume path cannot be made absolute.
    pub fn build(spec: &ContainerSpecification) -> Result<BuildPlan> {
        if spec.image.trim().is_empty() {
            return Err(TestcomposeError::config("image is required"));
        }

        let mut builder = Self::new();
        let _ = builder.with_environment(&spec.environment);
        let _ = builder.with_volumes(&spec.volumes)?;
        let _ = builder.with_exposed_ports(&spec.exposed_ports)?;
        if let Some(parameter) = &spec.log_wait_parameter {
            let _ = LogCondition::compile(parameter)?;
        }

        let mut directives = Vec::new();
        if let Some(credentials) = spec.registry_login.as_ref().filter(|c| c.is_present()) {
            directives.push(Directive::Login(credentials.clone()));
        }
        directives.push(Directive::EnsureImage {
            image: spec.image.clone(),
            policy: spec.image_pull_policy,
        });

        let name = spec.name.clone().unwrap_or_else(generate_name);
        tracing::debug!(
            name = %name,
            image = %spec.image,
            ports = builder.ports.len(),
            volumes = builder.volumes.len(),
            env = builder.environment.len(),
            "specification normalized"
        );

        Ok(BuildPlan {
            spec: NormalizedSpec {
                name,
                image: spec.image.clone(),
                command: spec.command.clone(),
                environment: builder.environment,
                volumes: builder.volumes,
                ports: builder.ports,
                log_wait: spec.log_wait_parameter.clone(),
            },
            directives,
        })
    }

    /// Merges environment variables.
    pub fn with_environment(&mut self, vars: &BTreeMap<String, EnvValue>) -> &mut Self {
        for (key, value) in vars {
            let _ = self.with_env(key.clone(), value);
        }
        self
    }

    /// Sets a single environment variable.
    pub fn with_env(&mut self, key: impl Into<String>, value: &EnvValue) -> &mut Self {
        let _ = self.environment.insert(key.into(), value.to_string());
        self
    }

    /// Adds volume mappings, resolving each host reference by its source kind.
    ///
    /// # Errors
    ///
    /// Returns an error if any mapping is invalid. Mappings before the
    /// invalid one are kept.
    pub fn with_volumes(&mut self, mappings: &[VolumeMapping]) -> Result<&mut Self> {
        for mapping in mappings {
            let host = resolve_volume_source(mapping)?;
            let _ = self.volumes.insert(
                host,
                VolumeBind {
                    bind: mapping.container.clone(),
                    mode: mapping.mode,
                },
            );
        }
        Ok(self)
    }

    /// Adds port declarations.
    ///
    /// # Errors
    ///
    /// Returns an error if any declaration is neither `N` nor `N:M`.
    pub fn with_exposed_ports(&mut self, declarations: &[String]) -> Result<&mut Self> {
        for declaration in declarations {
            let (container, host) = parse_port_declaration(declaration)?;
            let _ = self.ports.insert(container, host);
        }
        Ok(self)
    }
}

/// Normalizes port declarations into a container port to host port map.
///
/// # Errors
///
/// Returns a configuration error on the first malformed declaration.
pub fn normalize_ports(declarations: &[String]) -> Result<BTreeMap<u16, HostPort>> {
    let mut builder = SpecBuilder::new();
    let _ = builder.with_exposed_ports(declarations)?;
    Ok(builder.ports)
}

/// Normalizes volume mappings into a host reference to bind map.
///
/// # Errors
///
/// Returns an error on the first invalid mapping.
pub fn normalize_volumes(mappings: &[VolumeMapping]) -> Result<BTreeMap<String, VolumeBind>> {
    let mut builder = SpecBuilder::new();
    let _ = builder.with_volumes(mappings)?;
    Ok(builder.volumes)
}

/// Renders environment values to strings.
#[must_use]
pub fn normalize_environment(vars: &BTreeMap<String, EnvValue>) -> BTreeMap<String, String> {
    let mut builder = SpecBuilder::new();
    let _ = builder.with_environment(vars);
    builder.environment
}

/// Parses `containerPort` or `hostPort:containerPort`.
///
/// # Errors
///
/// Returns a configuration error for any other shape or for numbers
/// outside the port range.
pub fn parse_port_declaration(declaration: &str) -> Result<(u16, HostPort)> {
    let parts: Vec<&str> = declaration.split(':').collect();
    match parts.as_slice() {
        [container] => Ok((parse_port(container, declaration)?, HostPort::Unassigned)),
        [host, container] => Ok((
            parse_port(container, declaration)?,
            HostPort::Fixed(parse_port(host, declaration)?),
        )),
        _ => Err(malformed_port(declaration)),
    }
}

fn parse_port(part: &str, declaration: &str) -> Result<u16> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed_port(declaration));
    }
    part.parse::<u16>().map_err(|_| {
        TestcomposeError::config(format!("port {part} in {declaration:?} is out of range"))
    })
}

fn malformed_port(declaration: &str) -> TestcomposeError {
    TestcomposeError::config(format!(
        "malformed port declaration {declaration:?}: expected containerPort or hostPort:containerPort"
    ))
}

/// Resolves the host side of a volume mapping.
///
/// Local sources become absolute paths against the current directory;
/// docker sources are used verbatim as volume names.
///
/// # Errors
///
/// Returns a configuration error if the source kind is missing or not
/// `local`/`docker`, or if the host or container side is empty.
pub fn resolve_volume_source(mapping: &VolumeMapping) -> Result<String> {
    let kind: VolumeSourceKind = mapping
        .source
        .as_deref()
        .ok_or_else(|| TestcomposeError::config("volume source must be local or docker"))?
        .parse()?;

    if mapping.host.is_empty() {
        return Err(TestcomposeError::config("volume host must not be empty"));
    }
    if mapping.container.is_empty() {
        return Err(TestcomposeError::config(format!(
            "volume {:?} has no container path",
            mapping.host
        )));
    }

    match kind {
        VolumeSourceKind::Docker => Ok(mapping.host.clone()),
        VolumeSourceKind::Local => {
            let absolute =
                std::path::absolute(&mapping.host).map_err(|e| TestcomposeError::Io {
                    path: mapping.host.clone().into(),
                    source: e,
                })?;
            // Collapses `.` segments and trailing separators so equivalent
            // spellings of one directory share a single key.
            let normalized: PathBuf = absolute.components().collect();
            Ok(normalized.to_string_lossy().into_owned())
        }
    }
}

fn generate_name() -> String {
    format!("{CONTAINER_NAME_PREFIX}-{}", uuid::Uuid::new_v4().simple())
}
