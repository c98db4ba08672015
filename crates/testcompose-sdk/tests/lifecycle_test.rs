//! End-to-end container lifecycle against an in-memory runtime.
//!
//! Covers spec normalization flowing into the create call, readiness
//! waiting with a fake clock, early exit, timeouts, and teardown.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

mod common;

use common::{CONTAINER_ID, FakeClock, FakeRuntime};
use testcompose_common::config::{ContainerSpecification, LogWaitParameter, VolumeMapping};
use testcompose_common::error::TestcomposeError;
use testcompose_common::types::{EnvValue, HostPort, VolumeMode};
use testcompose_runtime::waiter::WaitOutcome;
use testcompose_sdk::container::{ContainerLifecycle, GenericContainer};

fn postgres_spec() -> ContainerSpecification {
    let mut spec = ContainerSpecification::new("postgres:16-alpine");
    spec.name = Some("pg-fixture".into());
    spec.exposed_ports = vec!["5432".into(), "15433:5433".into()];
    spec.volumes = vec![VolumeMapping {
        host: "pgdata".into(),
        container: "/var/lib/postgresql/data".into(),
        mode: VolumeMode::ReadWrite,
        source: Some("docker".into()),
    }];
    let _ = spec
        .environment
        .insert("POSTGRES_PASSWORD".into(), EnvValue::from("secret"));
    spec.log_wait_parameter = Some(
        LogWaitParameter::new("database system is ready to accept connections")
            .with_timeout_ms(5_000)
            .with_poll_interval_ms(250),
    );
    spec
}

#[test]
fn start_creates_normalized_container_and_waits_for_logs() {
    let runtime = FakeRuntime::with_registry(&["postgres:16-alpine"]).with_logs(&[
        "initdb: starting\n",
        "initdb: starting\nLOG:  database system is ready to accept connections\n",
    ]);
    let clock = FakeClock::new();
    let mut container = GenericContainer::new(postgres_spec()).with_clock(clock);

    let handle = container.start(&runtime).expect("start");
    assert_eq!(handle.name, "pg-fixture");
    assert_eq!(container.wait_outcome(), Some(WaitOutcome::Matched));

    let created = runtime.created().expect("create call");
    assert_eq!(created.image, "postgres:16-alpine");
    assert_eq!(created.ports[&5432], HostPort::Unassigned);
    assert_eq!(created.ports[&5433], HostPort::Fixed(15433));
    assert_eq!(created.volumes["pgdata"].bind, "/var/lib/postgresql/data");
    assert_eq!(created.env["POSTGRES_PASSWORD"], "secret");

    assert_eq!(
        runtime.calls(),
        vec![
            "image_exists postgres:16-alpine",
            "pull_image postgres:16-alpine",
            "create pg-fixture",
            "start 5ca1ab1e0000",
        ]
    );
}

#[test]
fn stop_removes_the_container() {
    let runtime = FakeRuntime::with_registry(&[])
        .with_local_image("postgres:16-alpine")
        .with_logs(&["database system is ready to accept connections\n"]);
    let mut container = GenericContainer::new(postgres_spec()).with_clock(FakeClock::new());
    let _ = container.start(&runtime).expect("start");

    container.stop(&runtime).expect("stop");
    assert!(container.handle().is_none());
    let calls = runtime.calls();
    assert_eq!(&calls[calls.len() - 2..], ["stop 5ca1ab1e0000", "remove 5ca1ab1e0000"]);
}

#[test]
fn stop_before_start_is_a_no_op() {
    let runtime = FakeRuntime::default();
    let mut container = GenericContainer::new(postgres_spec());
    container.stop(&runtime).expect("stop");
    assert!(runtime.calls().is_empty());
}

#[test]
fn early_exit_is_not_an_error() {
    let mut runtime = FakeRuntime::with_registry(&[])
        .with_local_image("postgres:16-alpine")
        .with_logs(&["FATAL: data directory has wrong ownership\n"]);
    runtime.exits_after_polls = Some(1);
    let mut container = GenericContainer::new(postgres_spec()).with_clock(FakeClock::new());

    let handle = container.start(&runtime).expect("start");
    assert_eq!(handle.short_id, &CONTAINER_ID[..12]);
    assert_eq!(container.wait_outcome(), Some(WaitOutcome::DiedEarly));
}

#[test]
fn readiness_timeout_keeps_handle_for_cleanup() {
    let runtime = FakeRuntime::with_registry(&[])
        .with_local_image("postgres:16-alpine")
        .with_logs(&["initdb: still working\n"]);
    let mut container = GenericContainer::new(postgres_spec()).with_clock(FakeClock::new());

    let err = container.start(&runtime).unwrap_err();
    match &err {
        TestcomposeError::Timeout {
            container: name,
            timeout_ms,
            ..
        } => {
            assert_eq!(name, "pg-fixture");
            assert_eq!(*timeout_ms, 5_000);
        }
        other => panic!("expected timeout, got {other:?}"),
    }
    assert!(err.to_string().contains("pg-fixture"));
    assert!(container.handle().is_some());

    container.stop(&runtime).expect("cleanup");
    assert!(container.handle().is_none());
}

#[test]
fn failed_start_can_still_be_cleaned_up() {
    let mut runtime = FakeRuntime::with_registry(&[]).with_local_image("postgres:16-alpine");
    runtime.fail_start = true;
    let mut container = GenericContainer::new(postgres_spec()).with_clock(FakeClock::new());

    let err = container.start(&runtime).unwrap_err();
    assert!(matches!(err, TestcomposeError::Transport { .. }));
    container.stop(&runtime).expect("cleanup");
    assert!(runtime.calls().contains(&"remove 5ca1ab1e0000".to_string()));
}

#[test]
fn starting_twice_is_rejected() {
    let runtime = FakeRuntime::with_registry(&[])
        .with_local_image("postgres:16-alpine")
        .with_logs(&["database system is ready to accept connections\n"]);
    let mut container = GenericContainer::new(postgres_spec()).with_clock(FakeClock::new());
    let _ = container.start(&runtime).expect("first start");
    let err = container.start(&runtime).unwrap_err();
    assert!(matches!(err, TestcomposeError::Config { .. }));
}

#[test]
fn spec_without_wait_parameter_skips_log_polling() {
    let runtime = FakeRuntime::with_registry(&[]).with_local_image("alpine:3.20");
    let mut container = GenericContainer::new(ContainerSpecification::new("alpine:3.20"));
    let handle = container.start(&runtime).expect("start");
    assert!(handle.name.starts_with("testcompose-"));
    assert_eq!(container.wait_outcome(), Some(WaitOutcome::NotRequested));
}

#[test]
fn specification_is_retained_through_start_and_stop() {
    let runtime = FakeRuntime::with_registry(&["redis:7"]);
    let mut spec = ContainerSpecification::new("redis:7");
    spec.name = Some("cache".into());
    let mut container = GenericContainer::new(spec.clone());

    let _ = container.start(&runtime).expect("start");
    assert_eq!(container.specification(), &spec);
    container.stop(&runtime).expect("stop");
    assert_eq!(container.specification().image, "redis:7");
}
