//! dockwait - main entry point.

use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use dockwait::cli::{Cli, Command, run_run_command, run_wait_command};
use dockwait::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Shell completions print to stdout and need nothing else.
    if let Command::Completion(completion) = &cli.command {
        return completion.run();
    }

    // Load .env if present
    let _ = dotenvy::dotenv();

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("dockwait=info"));

    if cli.log_json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }

    let config = Config::from_env()?;

    match cli.command {
        Command::Wait(args) => run_wait_command(args, &config).await,
        Command::Run(args) => run_run_command(args).await,
        Command::Completion(_) => Ok(()),
    }
}
