//! Single-shot container liveness check.

use testcompose_common::types::{ContainerId, ContainerState};

use crate::client::RuntimeClient;

/// Returns whether the container is currently running.
///
/// Any runtime error, including a missing container, counts as not
/// running. This never fails, so a waiter cannot hang on a container that
/// is already gone.
pub fn is_running(client: &dyn RuntimeClient, id: &ContainerId) -> bool {
    match client.get_container(id) {
        Ok(handle) => handle.state == ContainerState::Running && !handle.short_id.is_empty(),
        Err(e) => {
            tracing::debug!(id = %id, error = %e, "container lookup failed, treating as stopped");
            false
        }
    }
}
