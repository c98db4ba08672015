//! # testcompose-sdk
//!
//! Public SDK for provisioning ephemeral containers in integration tests.
#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]
//!
//! Provides three main entry points:
//! - [`SpecBuilder`](builder::SpecBuilder): Normalizes a
//!   [`ContainerSpecification`](testcompose_common::config::ContainerSpecification)
//!   into a [`BuildPlan`](plan::BuildPlan) without touching the runtime.
//! - [`apply_directives`](plan::apply_directives): Performs the login and
//!   image presence steps a plan asks for.
//! - [`GenericContainer`](container::GenericContainer): Creates, starts,
//!   waits for, and tears down a container through the
//!   [`ContainerLifecycle`](container::ContainerLifecycle) trait.
//!
//! # Example
//!
//! ```rust,no_run
//! use testcompose_common::config::{ClientSettings, ContainerSpecification, LogWaitParameter};
//! use testcompose_runtime::docker::DockerRuntime;
//! use testcompose_sdk::container::{ContainerLifecycle, GenericContainer};
//!
//! # fn main() -> testcompose_common::error::Result<()> {
//! let client = DockerRuntime::from_env(&ClientSettings::default())?;
//! let mut spec = ContainerSpecification::new("redis:7-alpine");
//! spec.exposed_ports.push("6379".into());
//! spec.log_wait_parameter = Some(LogWaitParameter::new("Ready to accept connections"));
//!
//! let mut redis = GenericContainer::new(spec);
//! let handle = redis.start(&client)?;
//! println!("redis is up as {}", handle.name);
//! redis.stop(&client)?;
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod container;
pub mod plan;
