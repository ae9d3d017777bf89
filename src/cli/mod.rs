//! CLI command handling.
//!
//! Provides subcommands for:
//! - Waiting for a service to become reachable (`wait`)
//! - Running a command under a hard deadline (`run`)
//! - Generating shell completions (`completion`)

mod completion;
mod run;
mod wait;

pub use completion::Completion;
pub use run::{RunArgs, run_run_command};
pub use wait::{WaitArgs, WaitReport, build_probes, run_wait_command, wait_with_container};

use clap::{ColorChoice, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "dockwait")]
#[command(about = "Wait until a freshly started container is ready to serve")]
#[command(
    long_about = "dockwait polls HTTP endpoints and TCP ports until a service is reachable.\nExamples:\n  dockwait wait --url http://localhost:8080/health --time 30\n  dockwait wait --tcp-port 5432 --container db"
)]
#[command(version)]
#[command(color = ColorChoice::Auto)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Poll probes until one is ready
    #[command(
        about = "Wait for a URL or TCP ports",
        long_about = "Polls every 500 ms until the URL answers with an accepted status or all TCP ports accept connections.\nExample: dockwait wait --url http://localhost:8080/ --status 200..204 --time 20"
    )]
    Wait(WaitArgs),

    /// Run a command with a deadline
    #[command(
        about = "Run a command under a deadline",
        long_about = "Runs the command and fails if it has not finished in time. The command is not killed on timeout.\nExample: dockwait run --time 60 -- ./migrate.sh"
    )]
    Run(RunArgs),

    /// Generate shell completion scripts
    #[command(
        about = "Generate shell completions",
        long_about = "Prints a completion script for the given shell.\nExample: dockwait completion --shell zsh > _dockwait"
    )]
    Completion(Completion),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_wait() {
        let cli = Cli::try_parse_from([
            "dockwait",
            "wait",
            "--url",
            "http://localhost:8080/health",
            "--method",
            "get",
            "--status",
            "200..204",
            "--tcp-port",
            "5432,6379",
            "--time",
            "20",
        ])
        .unwrap();

        let Command::Wait(args) = cli.command else {
            panic!("expected wait command");
        };
        assert_eq!(args.url.as_deref(), Some("http://localhost:8080/health"));
        assert_eq!(args.method.as_deref(), Some("get"));
        assert_eq!(args.status.as_deref(), Some("200..204"));
        assert_eq!(args.tcp_ports, vec![5432, 6379]);
        assert_eq!(args.tcp_host, "localhost");
        assert_eq!(args.time, 20);
    }

    #[test]
    fn test_wait_needs_url_or_port() {
        assert!(Cli::try_parse_from(["dockwait", "wait", "--time", "5"]).is_err());
    }

    #[test]
    fn test_parse_run() {
        let cli =
            Cli::try_parse_from(["dockwait", "run", "--time", "3", "--", "sleep", "1"]).unwrap();

        let Command::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.time, 3);
        assert_eq!(args.command, vec!["sleep", "1"]);
    }
}
