//! `tc plan` — Validate a specification and print what would be created.

use std::path::Path;

use clap::Args;
use testcompose_common::config::load_specification;
use testcompose_sdk::builder::SpecBuilder;

use crate::output;

/// Arguments for the `plan` command.
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Path to the container specification (YAML or JSON).
    #[arg(default_value = "testcompose.yaml")]
    pub file: String,
}

const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

/// Executes the `plan` command.
///
/// Normalizes the specification without contacting the runtime.
///
/// # Errors
///
/// Returns an error if the file cannot be loaded or the specification is
/// invalid.
pub fn execute(args: &PlanArgs) -> anyhow::Result<()> {
    let spec = load_specification(Path::new(&args.file)).map_err(|e| anyhow::anyhow!("{e}"))?;
    let plan = SpecBuilder::build(&spec).map_err(|e| anyhow::anyhow!("{e}"))?;
    let normalized = &plan.spec;

    println!("{BOLD}{}{RESET} {DIM}[{}]{RESET}", normalized.name, normalized.image);
    print_section("ports", &output::format_ports(&normalized.ports));
    print_section("volumes", &output::format_volumes(&normalized.volumes));
    let env: Vec<String> = normalized
        .environment
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect();
    print_section("environment", &env);
    if let Some(wait) = &normalized.log_wait {
        print_section(
            "readiness",
            &[format!(
                "/{}/ within {} ms, polling every {} ms",
                wait.log_line_regex, wait.wait_timeout_ms, wait.poll_interval_ms
            )],
        );
    }
    print_section("directives", &output::format_directives(&plan));
    Ok(())
}

fn print_section(title: &str, lines: &[String]) {
    if lines.is_empty() {
        return;
    }
    println!("  {title}:");
    for line in lines {
        println!("    {line}");
    }
}
