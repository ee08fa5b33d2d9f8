use anyhow::Result;
use clap::Parser;
use std::env;
use std::process::ExitCode;

use llm_shell::cli::{Cli, is_bare_invocation};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    if is_bare_invocation(env::args_os()) {
        return llm_shell::print_first_run_help();
    }

    let cli = Cli::parse();
    llm_shell::run(cli).await
}
