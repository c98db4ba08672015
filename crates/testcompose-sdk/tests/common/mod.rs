//! In-memory runtime and clock shared by the SDK integration tests.

#![allow(dead_code, clippy::expect_used, clippy::unwrap_used)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use testcompose_common::config::RegistryCredentials;
use testcompose_common::error::{Result, TestcomposeError};
use testcompose_common::types::{ContainerId, ContainerState};
use testcompose_runtime::client::{ContainerConfig, ContainerHandle, LoginResult, RuntimeClient};
use testcompose_runtime::clock::Clock;

/// Clock that only moves when slept on.
pub struct FakeClock {
    now: Mutex<Instant>,
}

impl FakeClock {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(Instant::now()),
        })
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap()
    }

    fn sleep(&self, duration: Duration) {
        *self.now.lock().unwrap() += duration;
    }
}

/// Runtime that records every call and serves scripted logs.
#[derive(Default)]
pub struct FakeRuntime {
    calls: Mutex<Vec<String>>,
    local_images: Mutex<HashSet<String>>,
    registry_images: HashSet<String>,
    logs: Mutex<Vec<String>>,
    created: Mutex<Option<ContainerConfig>>,
    running: Mutex<bool>,
    pub exits_after_polls: Option<usize>,
    pub fail_start: bool,
    polls: Mutex<usize>,
}

pub const CONTAINER_ID: &str = "5ca1ab1e0000deadbeef";

impl FakeRuntime {
    /// A runtime whose registry can serve `images`.
    pub fn with_registry(images: &[&str]) -> Self {
        Self {
            registry_images: images.iter().map(ToString::to_string).collect(),
            ..Self::default()
        }
    }

    /// Marks an image as already pulled.
    pub fn with_local_image(self, image: &str) -> Self {
        let _ = self.local_images.lock().unwrap().insert(image.to_string());
        self
    }

    /// Serves `logs` one per fetch, repeating the last one.
    pub fn with_logs(self, logs: &[&str]) -> Self {
        *self.logs.lock().unwrap() = logs.iter().rev().map(ToString::to_string).collect();
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn created(&self) -> Option<ContainerConfig> {
        self.created.lock().unwrap().clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }
}

impl RuntimeClient for FakeRuntime {
    fn image_exists(&self, image: &str) -> Result<bool> {
        self.record(format!("image_exists {image}"));
        Ok(self.local_images.lock().unwrap().contains(image))
    }

    fn pull_image(&self, image: &str) -> Result<()> {
        self.record(format!("pull_image {image}"));
        if !self.registry_images.contains(image) {
            return Err(TestcomposeError::NotFound {
                kind: "image",
                id: image.to_string(),
            });
        }
        let _ = self.local_images.lock().unwrap().insert(image.to_string());
        Ok(())
    }

    fn login(&self, credentials: &RegistryCredentials) -> Result<LoginResult> {
        self.record(format!("login {}", credentials.username));
        Ok(LoginResult {
            status: "Login Succeeded".into(),
        })
    }

    fn create_container(&self, config: &ContainerConfig) -> Result<ContainerId> {
        self.record(format!("create {}", config.name));
        *self.created.lock().unwrap() = Some(config.clone());
        Ok(ContainerId::new(CONTAINER_ID))
    }

    fn start_container(&self, id: &ContainerId) -> Result<()> {
        self.record(format!("start {}", id.short()));
        if self.fail_start {
            return Err(TestcomposeError::Transport {
                message: "port is already allocated".into(),
            });
        }
        *self.running.lock().unwrap() = true;
        Ok(())
    }

    fn stop_container(&self, id: &ContainerId) -> Result<()> {
        self.record(format!("stop {}", id.short()));
        *self.running.lock().unwrap() = false;
        Ok(())
    }

    fn remove_container(&self, id: &ContainerId) -> Result<()> {
        self.record(format!("remove {}", id.short()));
        *self.created.lock().unwrap() = None;
        Ok(())
    }

    fn get_container(&self, id: &ContainerId) -> Result<ContainerHandle> {
        let Some(config) = self.created() else {
            return Err(TestcomposeError::NotFound {
                kind: "container",
                id: id.to_string(),
            });
        };
        let exited = self
            .exits_after_polls
            .is_some_and(|limit| *self.polls.lock().unwrap() >= limit);
        let state = if *self.running.lock().unwrap() && !exited {
            ContainerState::Running
        } else if exited {
            ContainerState::Exited
        } else {
            ContainerState::Created
        };
        Ok(ContainerHandle {
            id: id.clone(),
            short_id: id.short().to_string(),
            name: config.name,
            state,
        })
    }

    fn logs(&self, _id: &ContainerId) -> Result<String> {
        *self.polls.lock().unwrap() += 1;
        let mut logs = self.logs.lock().unwrap();
        if logs.len() > 1 {
            Ok(logs.pop().unwrap_or_default())
        } else {
            Ok(logs.last().cloned().unwrap_or_default())
        }
    }
}
