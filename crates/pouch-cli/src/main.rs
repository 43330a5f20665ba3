//! build-pouchdb - builds the PouchDB package for node, bundlers and browsers.
//!
//! Parses flags, installs logging, runs the build on a single-threaded
//! runtime and maps the outcome to the exit status.

use std::process::ExitCode;

use clap::Parser;
use pouch_cli::{cli, commands, error, logger, ui};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = cli::Cli::parse();

    logger::init_logger(args.verbose, args.quiet, args.no_color);
    ui::init_colors(args.no_color);

    match commands::execute(args).await {
        Ok(_) => {
            println!("build-pouchdb complete");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("build-pouchdb error");
            eprintln!("{:?}", error::cli_error_to_miette(err));
            ExitCode::FAILURE
        }
    }
}
