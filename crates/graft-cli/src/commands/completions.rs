//! Shell completion generation.

use clap::CommandFactory;
use clap_complete::generate;

use crate::cli::{Cli, CompletionsArgs};

pub fn execute(args: CompletionsArgs) -> crate::error::CliResult<()> {
    let mut cmd = Cli::command();
    generate(args.shell, &mut cmd, "graft", &mut std::io::stdout());
    Ok(())
}
