//! Container lifecycle on top of the runtime client.

use testcompose_common::config::ContainerSpecification;
use testcompose_common::error::{Result, TestcomposeError};
use testcompose_common::types::ContainerState;
use testcompose_runtime::client::{ContainerHandle, RuntimeClient};
use testcompose_runtime::clock::{Clock, SystemClock};
use testcompose_runtime::waiter::{ReadinessWaiter, WaitOutcome};

use crate::builder::SpecBuilder;
use crate::plan::apply_directives;

/// Start/stop capability shared by every container kind.
pub trait ContainerLifecycle {
    /// Provisions the container and waits until it is ready.
    ///
    /// # Errors
    ///
    /// Returns an error if the specification is invalid, a runtime call
    /// fails, or the readiness wait times out.
    fn start(&mut self, client: &dyn RuntimeClient) -> Result<&ContainerHandle>;

    /// Stops and removes the container. Does nothing if it was never started.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime fails to stop or remove it.
    fn stop(&mut self, client: &dyn RuntimeClient) -> Result<()>;
}

/// A container built directly from a [`ContainerSpecification`].
pub struct GenericContainer {
    specification: ContainerSpecification,
    clock: Box<dyn Clock>,
    handle: Option<ContainerHandle>,
    outcome: Option<WaitOutcome>,
}

impl GenericContainer {
    /// Creates a container that waits on the system clock.
    #[must_use]
    pub fn new(specification: ContainerSpecification) -> Self {
        Self {
            specification,
            clock: Box::new(SystemClock),
            handle: None,
            outcome: None,
        }
    }

    /// Replaces the clock used by the readiness wait.
    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Returns the specification this container was created from.
    #[must_use]
    pub const fn specification(&self) -> &ContainerSpecification {
        &self.specification
    }

    /// Returns the runtime handle once the container has been created.
    #[must_use]
    pub const fn handle(&self) -> Option<&ContainerHandle> {
        self.handle.as_ref()
    }

    /// Returns how the last readiness wait ended.
    #[must_use]
    pub const fn wait_outcome(&self) -> Option<WaitOutcome> {
        self.outcome
    }
}

impl ContainerLifecycle for GenericContainer {
    fn start(&mut self, client: &dyn RuntimeClient) -> Result<&ContainerHandle> {
        if let Some(handle) = &self.handle {
            return Err(TestcomposeError::config(format!(
                "container {} is already started",
                handle.name
            )));
        }

        let plan = SpecBuilder::build(&self.specification)?;
        apply_directives(client, &plan)?;

        let config = plan.spec.container_config();
        let id = client.create_container(&config)?;
        tracing::info!(id = %id, name = %config.name, "container created");
        // Tracked before start so a failed start can still be cleaned up.
        self.handle = Some(ContainerHandle {
            short_id: id.short().to_string(),
            id: id.clone(),
            name: config.name.clone(),
            state: ContainerState::Created,
        });

        client.start_container(&id)?;
        let handle = client.get_container(&id)?;
        tracing::info!(id = %handle.short_id, name = %handle.name, state = %handle.state, "container started");

        let waited = ReadinessWaiter::new(client, self.clock.as_ref())
            .wait(&handle, plan.spec.log_wait.as_ref());
        let outcome = match waited {
            Ok(outcome) => outcome,
            Err(e) => {
                self.handle = Some(handle);
                return Err(e);
            }
        };
        if outcome == WaitOutcome::DiedEarly {
            tracing::warn!(name = %handle.name, "container exited before becoming ready");
        }
        self.outcome = Some(outcome);
        Ok(self.handle.insert(handle))
    }

    fn stop(&mut self, client: &dyn RuntimeClient) -> Result<()> {
        let Some(handle) = &self.handle else {
            return Ok(());
        };
        client.stop_container(&handle.id)?;
        client.remove_container(&handle.id)?;
        tracing::info!(id = %handle.short_id, name = %handle.name, "container removed");
        self.handle = None;
        self.outcome = None;
        Ok(())
    }
}
