//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

use waysplit_cli::CliError;

fn main() {
    match waysplit_cli::run() {
        Ok(()) => {}
        Err(CliError::ArgumentParsing(err)) => err.exit(),
        Err(err) => {
            eprintln!("waysplit: {err}");
            std::process::exit(1);
        }
    }
}
