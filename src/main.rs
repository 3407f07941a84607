mod cli;
mod config;
mod convert;
mod forecast_cmd;
mod logging;
mod resample_cmd;
mod skill_cmd;
mod staging;

use std::process;

use anyhow::Result;
use clap::Parser;

use crate::cli::{Cli, Command};

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Forecast(args) => forecast_cmd::run(args),
        Command::Resample(args) => resample_cmd::run(args),
        Command::Skill(args) => skill_cmd::run(args),
    }
}
