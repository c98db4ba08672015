//! Workspace-wide constants and defaults.

/// Default time to wait for a readiness log line, in milliseconds.
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 60_000;

/// Default delay between readiness polls, in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;

/// Default request timeout for the Docker client, in seconds.
pub const DEFAULT_CLIENT_TIMEOUT_SECS: u64 = 120;

/// Daemon address used when neither the settings nor `DOCKER_HOST` name one.
#[cfg(unix)]
pub const DEFAULT_DOCKER_HOST: &str = "unix:///var/run/docker.sock";

/// Daemon address used when neither the settings nor `DOCKER_HOST` name one.
#[cfg(windows)]
pub const DEFAULT_DOCKER_HOST: &str = "npipe:////./pipe/docker_engine";

/// Grace period given to a container on stop before it is killed, in seconds.
pub const STOP_GRACE_PERIOD_SECS: i64 = 10;

/// Prefix for generated container names.
pub const CONTAINER_NAME_PREFIX: &str = "testcompose";

/// Protocol suffix appended to container ports in the runtime wire format.
pub const PORT_PROTOCOL: &str = "tcp";

/// Binary name for the CLI.
pub const BIN_NAME: &str = "tc";
