//! Example image preloader CLI.
//!
//! Loads every image through a simulated fetcher and prints the batch report
//! as JSON.
//!
//! # Usage
//!
//! ```bash
//! preload [--continue-on-error] [--sequential] [--manifest <PATH>] [--log-format <FORMAT>] <SOURCE>...
//! ```
//!
//! # Example
//!
//! ```bash
//! PICLOAD_LOG=picload_batch=debug preload --continue-on-error hero.png missing.gif
//! ```

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use example::{Args, SimulatedFetcher, preload};
use picload_telemetry::TracingConfig;

#[expect(clippy::print_stdout, reason = "the report is the program's output")]
fn print_report(json: &str) {
    println!("{json}");
}

#[expect(clippy::print_stderr, reason = "CLI error reporting")]
fn report_error(message: &str) {
    eprintln!("Error: {message}");
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let mut telemetry = TracingConfig::new().with_format(args.log_format.unwrap_or_default());
    if let Some(filter) = &args.log_filter {
        telemetry = telemetry.with_env_filter(filter.clone());
    }
    telemetry.init();

    let report = match preload(&args, Arc::new(SimulatedFetcher::default())).await {
        Ok(report) => report,
        Err(e) => {
            report_error(&e.to_string());
            return ExitCode::FAILURE;
        }
    };

    match serde_json::to_string_pretty(&report) {
        Ok(json) => print_report(&json),
        Err(e) => {
            report_error(&e.to_string());
            return ExitCode::FAILURE;
        }
    }

    if report.all_loaded() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
