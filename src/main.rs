#![forbid(unsafe_code)]

//! devkit: developer environment console entry point.

use clap::Parser;

mod cli_app;

fn main() {
    let args = cli_app::Cli::parse();
    if let Err(e) = cli_app::run(&args) {
        eprintln!("devkit: {e}");
        std::process::exit(e.exit_code());
    }
}
