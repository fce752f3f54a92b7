//! Ensaio CLI entry point.

use clap::Parser;
use ensaio_cli::{commands, init_tracing, Cli, Commands};
use std::process::ExitCode;

fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    let use_color = !cli.no_color && console::colors_enabled();

    let result = match cli.command {
        Commands::Check(ref args) => commands::run_check(args, use_color),
        Commands::Run(ref args) => commands::run_run(args, use_color),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
