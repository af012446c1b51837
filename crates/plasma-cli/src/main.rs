#![forbid(unsafe_code)]

//! `ledplasma`: animated plasma on an LED grid.
//!
//! Loads a palette file, starts the animation thread, and hands the
//! terminal to the operator. See `ledplasma --help` for options and keys.

mod app;
mod cli;
mod keys;
mod logging;
mod status;

use std::process;

use tracing::error;

use crate::cli::Opts;

fn main() {
    let opts = Opts::parse();
    if let Err(err) = logging::init(&opts) {
        eprintln!("ledplasma: {err}");
        process::exit(1);
    }

    match app::run(&opts) {
        Ok(report) => {
            if let Some(err) = &report.scheduler_error {
                eprintln!("ledplasma: {err}");
            }
            for err in &report.cleanup_errors {
                eprintln!("ledplasma: cleanup: {err}");
            }
            process::exit(report.exit_code());
        }
        Err(err) => {
            error!(error = %err, "ledplasma failed");
            eprintln!("ledplasma: {err}");
            process::exit(1);
        }
    }
}
