//! CLI command definitions and dispatch.

pub mod plan;
pub mod run;

use clap::{Parser, Subcommand};
use testcompose_common::config::ClientSettings;
use testcompose_common::constants::{BIN_NAME, DEFAULT_CLIENT_TIMEOUT_SECS};

/// testcompose — ephemeral containers for integration tests.
#[derive(Parser, Debug)]
#[command(name = BIN_NAME, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Docker request timeout in seconds.
    #[arg(
        long,
        global = true,
        env = "TESTCOMPOSE_DOCKER_TIMEOUT",
        default_value_t = DEFAULT_CLIENT_TIMEOUT_SECS
    )]
    pub docker_timeout: u64,

    /// Docker Engine API version: `auto` to negotiate, or `MAJOR.MINOR`.
    #[arg(long, global = true, env = "TESTCOMPOSE_DOCKER_API_VERSION")]
    pub api_version: Option<String>,

    /// Docker daemon address, overriding `DOCKER_HOST`.
    #[arg(long, global = true, env = "TESTCOMPOSE_DOCKER_HOST")]
    pub docker_host: Option<String>,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub json_logs: bool,
}

impl Cli {
    /// Client settings derived from the global flags.
    #[must_use]
    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            timeout_secs: self.docker_timeout,
            api_version: self.api_version.clone(),
            docker_host: self.docker_host.clone(),
        }
    }
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate a specification and show the normalized container parameters.
    Plan(plan::PlanArgs),
    /// Start a container, wait until it is ready, and stop it on Ctrl+C.
    Run(run::RunArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    let settings = cli.client_settings();
    match cli.command {
        Command::Plan(args) => plan::execute(&args),
        Command::Run(args) => run::execute(&args, &settings),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_flags_flow_into_client_settings() {
        let cli = Cli::try_parse_from([
            BIN_NAME,
            "--api-version",
            "1.43",
            "--docker-host",
            "tcp://127.0.0.1:2375",
            "--docker-timeout",
            "30",
            "plan",
            "fixture.yaml",
        ])
        .unwrap();
        let settings = cli.client_settings();
        assert_eq!(settings.timeout_secs, 30);
        assert_eq!(settings.api_version.as_deref(), Some("1.43"));
        assert_eq!(settings.docker_host.as_deref(), Some("tcp://127.0.0.1:2375"));
    }

    #[test]
    fn json_logs_flag_is_accepted_after_the_subcommand() {
        let cli = Cli::try_parse_from([BIN_NAME, "run", "--json-logs", "--detach"]).unwrap();
        assert!(cli.json_logs);
        assert!(matches!(cli.command, Command::Run(ref args) if args.detach));
    }

    #[test]
    fn command_is_named_after_the_binary() {
        use clap::CommandFactory;
        assert_eq!(Cli::command().get_name(), BIN_NAME);
    }
}
