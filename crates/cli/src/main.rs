mod commands;

use crate::commands::run::{handle_run, RunArgs};
use clap::{Parser, Subcommand};
use common::error::RunnerError;

#[derive(Parser)]
#[command(name = "sqlpipe", about = "directive-driven sql etl runner")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Cmd,
}

#[derive(Subcommand)]
pub enum Cmd {
    /// Run a sql etl script, or print its submit command
    Run(RunArgs),
}

fn run_cmd(result: Result<(), RunnerError>) {
    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn main() {
    logging::init_logger();
    let cli = Cli::parse();

    match cli.command {
        Cmd::Run(args) => run_cmd(handle_run(&args)),
    }
}
