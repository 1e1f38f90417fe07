//! Example image preloader built with picload.
//!
//! Collects sources from the command line and JSON manifests, loads them
//! through a simulated fetcher, and reports one outcome for the whole batch.
//!
//! ```text
//! args ──▶ ResourceManager::add ──▶ batch(options).start() ──▶ BatchReport
//!                                        │
//!                       SimulatedFetcher (tokio tasks)
//! ```

mod args;
mod fetcher;

pub use args::Args;
pub use fetcher::SimulatedFetcher;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use picload_batch::{BatchError, BatchReport, ResourceInput, ResourceManager};
use picload_resource::ImageFetcher;

/// Failures of a preload run.
#[derive(Debug, thiserror::Error)]
pub enum PreloadError {
    /// A manifest could not be read.
    #[error("cannot read manifest {}: {source}", path.display())]
    Read {
        /// Manifest path.
        path: PathBuf,
        /// I/O error.
        source: std::io::Error,
    },
    /// A manifest is not valid input JSON.
    #[error("invalid manifest {}: {source}", path.display())]
    Manifest {
        /// Manifest path.
        path: PathBuf,
        /// Parse error.
        source: serde_json::Error,
    },
    /// Every input was dropped as unsupported.
    #[error("none of the given sources is a supported image")]
    NothingToLoad,
    /// The batch rejected.
    #[error(transparent)]
    Batch(#[from] BatchError),
}

/// Reads a JSON manifest of sources, descriptors, and nested arrays.
///
/// # Errors
///
/// Returns [`PreloadError::Read`] or [`PreloadError::Manifest`].
pub async fn read_manifest(path: &Path) -> Result<ResourceInput, PreloadError> {
    let json = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| PreloadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    ResourceInput::from_json(&json).map_err(|source| PreloadError::Manifest {
        path: path.to_path_buf(),
        source,
    })
}

/// Loads everything `args` names and returns the batch report.
///
/// # Errors
///
/// Manifest errors, an empty resource list, or the batch rejection under
/// fail-fast.
pub async fn preload(
    args: &Args,
    fetcher: Arc<dyn ImageFetcher>,
) -> Result<BatchReport, PreloadError> {
    let mut manager = ResourceManager::new(fetcher);
    manager.add(args.sources.iter().cloned());
    for path in &args.manifests {
        manager.add([read_manifest(path).await?]);
    }

    if manager.is_empty() {
        return Err(PreloadError::NothingToLoad);
    }

    tracing::info!(
        resources = manager.len(),
        policy = ?args.options().error_policy,
        mode = ?args.options().start_mode,
        "preloading"
    );
    let report = manager.batch(args.options()).start().await?;
    Ok(report)
}
