//! `tc run` — Start a container and keep it up until Ctrl+C.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use clap::Args;
use testcompose_common::config::{ClientSettings, load_specification};
use testcompose_runtime::docker::DockerRuntime;
use testcompose_runtime::waiter::WaitOutcome;
use testcompose_sdk::container::{ContainerLifecycle, GenericContainer};

/// Arguments for the `run` command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the container specification (YAML or JSON).
    #[arg(default_value = "testcompose.yaml")]
    pub file: String,

    /// Leave the container running and exit once it is ready.
    #[arg(short, long)]
    pub detach: bool,
}

const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RESET: &str = "\x1b[0m";

/// Executes the `run` command.
///
/// # Errors
///
/// Returns an error if the specification is invalid, Docker is
/// unreachable, or the container does not become ready in time.
pub fn execute(args: &RunArgs, settings: &ClientSettings) -> anyhow::Result<()> {
    let total_start = Instant::now();
    let path = Path::new(&args.file);
    if !path.exists() {
        return Err(anyhow::anyhow!(
            "Specification file not found: {}\n\
             Create a testcompose.yaml or specify a path: tc run <file>",
            args.file
        ));
    }

    let spec = load_specification(path).map_err(|e| anyhow::anyhow!("{e}"))?;
    let client = DockerRuntime::from_env(settings).map_err(|e| anyhow::anyhow!("{e}"))?;
    let mut container = GenericContainer::new(spec);

    eprintln!("  Starting container from {}...", args.file);
    let started = container.start(&client).map(|_| ());
    if let Err(e) = started {
        if container.handle().is_some() {
            eprintln!("  {YELLOW}Start failed, removing container...{RESET}");
            if let Err(cleanup) = container.stop(&client) {
                tracing::warn!(error = %cleanup, "cleanup after failed start did not complete");
            }
        }
        return Err(anyhow::anyhow!("{e}"));
    }
    report(&container, total_start);

    if args.detach {
        eprintln!();
        eprintln!("  Running detached. Remove it with {BOLD}docker rm -f{RESET}.");
        return Ok(());
    }

    wait_for_shutdown()?;
    eprintln!("  Stopping container...");
    container.stop(&client).map_err(|e| anyhow::anyhow!("{e}"))?;
    eprintln!("  {GREEN}Container removed.{RESET}");
    Ok(())
}

fn report(container: &GenericContainer, total_start: Instant) {
    let Some(handle) = container.handle() else {
        return;
    };
    let status = match container.wait_outcome() {
        Some(WaitOutcome::Matched) => format!("{GREEN}ready{RESET}"),
        Some(WaitOutcome::DiedEarly) => format!("{YELLOW}exited before ready{RESET}"),
        Some(WaitOutcome::NotRequested) | None => "started".to_string(),
    };
    eprintln!();
    eprintln!(
        "  {GREEN}●{RESET} {BOLD}{}{RESET} {DIM}[{}] {}{RESET} {status} in {:.1}s",
        handle.name,
        handle.short_id,
        container.specification().image,
        total_start.elapsed().as_secs_f64()
    );
}

fn wait_for_shutdown() -> anyhow::Result<()> {
    eprintln!();
    eprintln!("  Press {BOLD}Ctrl+C{RESET} to stop the container...");

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {e}"))?;

    while running.load(Ordering::SeqCst) {
        std::thread::sleep(std::time::Duration::from_millis(250));
    }
    eprintln!();
    Ok(())
}
