//! Formatted output helpers for CLI commands.

use std::collections::BTreeMap;

use testcompose_common::types::{HostPort, VolumeBind};
use testcompose_sdk::plan::{BuildPlan, Directive};

/// Renders a port map as `host -> container/tcp` lines.
#[must_use]
pub fn format_ports(ports: &BTreeMap<u16, HostPort>) -> Vec<String> {
    ports
        .iter()
        .map(|(container, host)| format!("{host} -> {container}/tcp"))
        .collect()
}

/// Renders volume binds as `host -> bind (mode)` lines.
#[must_use]
pub fn format_volumes(volumes: &BTreeMap<String, VolumeBind>) -> Vec<String> {
    volumes
        .iter()
        .map(|(host, v)| format!("{host} -> {} ({})", v.bind, v.mode))
        .collect()
}

/// Renders a plan's directives in execution order.
#[must_use]
pub fn format_directives(plan: &BuildPlan) -> Vec<String> {
    plan.directives
        .iter()
        .map(|d| match d {
            Directive::Login(credentials) => format!(
                "login as {} to {}",
                credentials.username,
                credentials.registry.as_deref().unwrap_or("default registry")
            ),
            Directive::EnsureImage { image, policy } => {
                format!("ensure image {image} (pull policy: {policy:?})")
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use testcompose_common::config::{ContainerSpecification, RegistryCredentials};
    use testcompose_common::types::VolumeMode;
    use testcompose_sdk::builder::SpecBuilder;

    use super::*;

    #[test]
    fn format_ports_shows_random_and_fixed() {
        let mut ports = BTreeMap::new();
        let _ = ports.insert(80, HostPort::Fixed(8080));
        let _ = ports.insert(443, HostPort::Unassigned);
        assert_eq!(
            format_ports(&ports),
            vec!["8080 -> 80/tcp", "random -> 443/tcp"]
        );
    }

    #[test]
    fn format_volumes_includes_mode() {
        let mut volumes = BTreeMap::new();
        let _ = volumes.insert(
            "cache".to_string(),
            VolumeBind {
                bind: "/cache".into(),
                mode: VolumeMode::ReadOnly,
            },
        );
        assert_eq!(format_volumes(&volumes), vec!["cache -> /cache (ro)"]);
    }

    #[test]
    fn format_directives_never_shows_password() {
        let mut spec = ContainerSpecification::new("registry.local/app:1");
        spec.registry_login = Some(RegistryCredentials {
            username: "ci".into(),
            password: "hunter2".into(),
            registry: Some("registry.local".into()),
        });
        let plan = SpecBuilder::build(&spec).expect("plan");
        let lines = format_directives(&plan);
        assert_eq!(lines[0], "login as ci to registry.local");
        assert!(lines[1].starts_with("ensure image registry.local/app:1"));
        assert!(lines.iter().all(|l| !l.contains("hunter2")));
    }
}
