//! dupescan - duplicate file scanner
//!
//! Entry point for the dupescan CLI application.

use clap::Parser;
use dupescan::{cli::Cli, error::ExitCode};

fn main() {
    let cli = Cli::parse();

    match dupescan::run_app(cli) {
        Ok(code) => std::process::exit(code.as_i32()),
        Err(err) => {
            let exit_code = ExitCode::for_error(&err);
            log::error!("{:#}", err);
            eprintln!("[{}] Error: {:#}", exit_code.code_prefix(), err);
            std::process::exit(exit_code.as_i32());
        }
    }
}
