//! Runtime-facing half of testcompose.
//!
//! Defines the [`RuntimeClient`](client::RuntimeClient) capability set the
//! rest of the workspace consumes, the liveness probe and readiness waiter
//! built on top of it, and a Docker Engine implementation backed by bollard.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used, clippy::panic))]

pub mod client;
pub mod clock;
pub mod docker;
pub mod liveness;
pub mod waiter;
