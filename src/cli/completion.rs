use std::io::{self, Write};

use clap::{CommandFactory, Parser};
use clap_complete::{Shell, generate};

/// Generate shell completion scripts for dockwait
#[derive(Parser, Debug, Clone)]
pub struct Completion {
    /// The shell to generate completions for
    #[arg(value_enum, long)]
    pub shell: Shell,
}

impl Completion {
    /// Write the script for `self.shell` to `out`.
    pub fn write_to(&self, out: &mut dyn Write) {
        let mut cmd = crate::cli::Cli::command();
        let bin_name = cmd.get_name().to_string();
        generate(self.shell, &mut cmd, bin_name, out);
    }

    pub fn run(&self) -> anyhow::Result<()> {
        self.write_to(&mut io::stdout());
        Ok(())
    }
}
