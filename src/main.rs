//! Lineup CLI - Event planning from the terminal

use std::process::ExitCode;

fn main() -> ExitCode {
    lineup_cli::cli::run()
}
