//! Command-line interface for the `preload` binary.

use std::path::PathBuf;

use clap::Parser;
use picload_batch::{BatchOptions, StartMode};
use picload_telemetry::TracingFormat;

/// Preloads images and prints one JSON report for the whole batch.
#[derive(Debug, Clone, Parser)]
#[command(name = "preload")]
#[command(about = "Preload a batch of images and report the outcome")]
pub struct Args {
    /// Report every image instead of stopping at the first failure
    #[arg(long)]
    pub continue_on_error: bool,

    /// Load one image at a time
    #[arg(long)]
    pub sequential: bool,

    /// Read additional sources from a JSON file, loaded after the direct sources
    #[arg(long = "manifest", value_name = "PATH")]
    pub manifests: Vec<PathBuf>,

    /// Log output format: pretty, compact or json
    #[arg(long, value_name = "FORMAT")]
    pub log_format: Option<TracingFormat>,

    /// Log filter directives
    #[arg(long, env = "PICLOAD_LOG", value_name = "FILTER")]
    pub log_filter: Option<String>,

    /// Image sources, in load order
    #[arg(value_name = "SOURCE", required_unless_present = "manifests")]
    pub sources: Vec<String>,
}

impl Args {
    /// Batch options selected by the flags.
    #[must_use]
    pub fn options(&self) -> BatchOptions {
        let options = if self.continue_on_error {
            BatchOptions::new().continue_on_error()
        } else {
            BatchOptions::new()
        };
        if self.sequential {
            options.with_start_mode(StartMode::Sequential)
        } else {
            options
        }
    }
}
