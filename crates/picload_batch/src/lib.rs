//! Batch coordination and resource collections for picload (Layer 2).
//!
//! # Core Concepts
//!
//! - [`BatchCoordinator`] - Starts a snapshot of [`Loadable`] members and
//!   settles one aggregate [`Outcome`]
//! - [`BatchOptions`] - [`ErrorPolicy`] and [`StartMode`] for a batch
//! - [`BatchReport`] - Per-member results of a resolved batch
//! - [`ResourceManager`] - Ordered image collection with `add`, `load`, and
//!   `is_loaded`
//! - [`ResourceInput`] / [`ResourceQuery`] - What `add` accepts and what
//!   `is_loaded` looks up
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use picload_batch::{BatchOptions, ResourceManager};
//! use picload_resource::{FetchCompletion, ImageFetcher, LoadFailure};
//!
//! struct Inline;
//!
//! impl ImageFetcher for Inline {
//!     fn fetch(&self, uri: &str, done: FetchCompletion) {
//!         if uri.starts_with("missing") {
//!             done.fail(LoadFailure::new("not found"));
//!         } else {
//!             done.succeed();
//!         }
//!     }
//! }
//!
//! let mut manager = ResourceManager::new(Arc::new(Inline));
//! manager.add(["hero.png", "missing.gif"]);
//!
//! let report = manager
//!     .batch(BatchOptions::new().continue_on_error())
//!     .start()
//!     .peek()
//!     .unwrap()
//!     .unwrap();
//! assert_eq!(report.loaded_count(), 1);
//! assert!(manager.is_loaded("hero.png"));
//! ```
//!
//! [`Loadable`]: picload_resource::Loadable
//! [`Outcome`]: picload_resource::Outcome

/// The batch aggregation engine.
pub mod coordinator;

/// Batch error types.
pub mod error;

/// Inputs and queries for the resource manager.
pub mod input;

/// The resource collection.
pub mod manager;

/// Batch configuration.
pub mod options;

/// Batch results.
pub mod report;

pub use coordinator::{BatchCoordinator, BatchPhase};
pub use error::BatchError;
pub use input::{ResourceDescriptor, ResourceInput, ResourceQuery};
pub use manager::ResourceManager;
pub use options::{BatchOptions, ErrorPolicy, StartMode};
pub use report::{BatchReport, MemberOutcome, MemberReport};
