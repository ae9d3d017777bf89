use clap::Args;
use tokio::process::Command;

use crate::wait::run_bounded;

/// Command to run under a deadline.
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Seconds the command may take (0 or less: no limit)
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub time: i64,

    /// Program and arguments
    #[arg(last = true, required = true, num_args = 1..)]
    pub command: Vec<String>,
}

/// Spawn `argv` and fail unless it exits successfully.
async fn run_process(argv: Vec<String>) -> anyhow::Result<()> {
    let (program, rest) = argv
        .split_first()
        .ok_or_else(|| anyhow::anyhow!("no command given"))?;
    let status = Command::new(program).args(rest).status().await?;
    if !status.success() {
        anyhow::bail!("'{}' exited with {}", program, status);
    }
    Ok(())
}

pub async fn run_run_command(args: RunArgs) -> anyhow::Result<()> {
    tracing::debug!("Running {:?} with a {} s limit", args.command, args.time);
    let elapsed = run_bounded(args.time, run_process(args.command)).await?;
    println!("finished after {} ms", elapsed.as_millis());
    Ok(())
}
