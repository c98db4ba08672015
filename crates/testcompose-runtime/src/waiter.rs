//! Log-based readiness waiting.
//!
//! [`ReadinessWaiter::wait`] blocks until a container's logs match a
//! pattern, the container stops, or the deadline passes. Liveness is checked
//! before every log fetch so a crashed fixture is reported as
//! [`WaitOutcome::DiedEarly`] rather than as a slow start.

use std::time::{Duration, Instant};

use regex::{Regex, RegexBuilder};
use testcompose_common::config::LogWaitParameter;
use testcompose_common::error::{Result, TestcomposeError};

use crate::client::{ContainerHandle, RuntimeClient};
use crate::clock::Clock;
use crate::liveness;

/// How a readiness wait ended, when it did not time out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// No log wait parameter was supplied; nothing was checked.
    NotRequested,
    /// The logs matched the pattern.
    Matched,
    /// The container stopped before the pattern appeared.
    DiedEarly,
}

/// A validated log wait parameter.
#[derive(Debug, Clone)]
pub struct LogCondition {
    pattern: Regex,
    timeout: Duration,
    poll_interval: Duration,
}

impl LogCondition {
    /// Compiles the pattern in multi-line mode and checks the timing values.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the pattern is invalid or either
    /// duration is zero.
    pub fn compile(parameter: &LogWaitParameter) -> Result<Self> {
        if parameter.wait_timeout_ms == 0 {
            return Err(TestcomposeError::config("wait_timeout_ms must be greater than 0"));
        }
        if parameter.poll_interval_ms == 0 {
            return Err(TestcomposeError::config("poll_interval_ms must be greater than 0"));
        }
        let pattern = RegexBuilder::new(&parameter.log_line_regex)
            .multi_line(true)
            .build()
            .map_err(|e| {
                TestcomposeError::config(format!(
                    "invalid log_line_regex {:?}: {e}",
                    parameter.log_line_regex
                ))
            })?;
        Ok(Self {
            pattern,
            timeout: Duration::from_millis(parameter.wait_timeout_ms),
            poll_interval: Duration::from_millis(parameter.poll_interval_ms),
        })
    }

    /// Returns whether the log text satisfies the condition.
    #[must_use]
    pub fn is_satisfied_by(&self, logs: &str) -> bool {
        self.pattern.is_match(logs)
    }
}

/// Polls a container until it is ready, dead, or out of time.
pub struct ReadinessWaiter<'a> {
    client: &'a dyn RuntimeClient,
    clock: &'a dyn Clock,
}

impl<'a> ReadinessWaiter<'a> {
    /// Creates a waiter using the given runtime client and clock.
    #[must_use]
    pub fn new(client: &'a dyn RuntimeClient, clock: &'a dyn Clock) -> Self {
        Self { client, clock }
    }

    /// Waits for the container's logs to satisfy `parameter`.
    ///
    /// Returns immediately with [`WaitOutcome::NotRequested`] when no
    /// parameter is given.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an invalid parameter (before any
    /// polling), a timeout error when the deadline passes without a match,
    /// and propagates log fetch failures.
    pub fn wait(
        &self,
        handle: &ContainerHandle,
        parameter: Option<&LogWaitParameter>,
    ) -> Result<WaitOutcome> {
        let Some(parameter) = parameter else {
            return Ok(WaitOutcome::NotRequested);
        };
        let condition = LogCondition::compile(parameter)?;

        let start = self.clock.now();
        let deadline = start + condition.timeout;
        tracing::debug!(
            container = %handle.name,
            pattern = %parameter.log_line_regex,
            timeout_ms = parameter.wait_timeout_ms,
            "waiting for container logs"
        );

        while self.clock.now() < deadline {
            if !liveness::is_running(self.client, &handle.id) {
                tracing::warn!(container = %handle.name, "container stopped before readiness condition was met");
                return Ok(WaitOutcome::DiedEarly);
            }

            let logs = self.client.logs(&handle.id)?;
            if condition.is_satisfied_by(&logs) {
                tracing::info!(
                    container = %handle.name,
                    elapsed_ms = millis(self.clock.now(), start),
                    "readiness condition met"
                );
                return Ok(WaitOutcome::Matched);
            }

            if self.clock.now() > deadline {
                return Err(self.timed_out(handle, parameter, start));
            }
            self.clock.sleep(condition.poll_interval);
        }

        // Deadline reached between polls without a match.
        match self.client.logs(&handle.id) {
            Ok(logs) => tracing::info!(container = %handle.name, logs = %logs, "container output at deadline"),
            Err(e) => tracing::warn!(container = %handle.name, error = %e, "could not fetch logs at deadline"),
        }
        Err(self.timed_out(handle, parameter, start))
    }

    fn timed_out(
        &self,
        handle: &ContainerHandle,
        parameter: &LogWaitParameter,
        start: Instant,
    ) -> TestcomposeError {
        let elapsed_ms = millis(self.clock.now(), start);
        tracing::warn!(container = %handle.name, elapsed_ms, "readiness wait timed out");
        TestcomposeError::Timeout {
            container: handle.name.clone(),
            timeout_ms: parameter.wait_timeout_ms,
            elapsed_ms,
        }
    }
}

fn millis(now: Instant, start: Instant) -> u64 {
    u64::try_from(now.saturating_duration_since(start).as_millis()).unwrap_or(u64::MAX)
}
