use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<ExitCode> {
    let cli = multiwait::cli::Cli::parse();
    multiwait::app::run(&cli)
}
