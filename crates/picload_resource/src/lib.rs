//! Resource lifecycle primitives for picload (Layer 1).
//!
//! # Core Concepts
//!
//! - [`Resource`] - One image with a forward-only [`LoadState`] machine
//! - [`ImageFetcher`] - Port to the external fetch primitive
//! - [`FetchCompletion`] - Single-shot completion token handed to a fetcher
//! - [`Deferred`] / [`Outcome`] - Single-shot settlement, awaitable
//! - [`Loadable`] - Trait for anything a batch can coordinate
//! - [`supported_format`] - Image extension allow-list
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use picload_resource::{FetchCompletion, ImageFetcher, Resource};
//!
//! struct AlwaysOk;
//!
//! impl ImageFetcher for AlwaysOk {
//!     fn fetch(&self, _uri: &str, done: FetchCompletion) {
//!         done.succeed();
//!     }
//! }
//!
//! let resource = Resource::new("hero", "img/hero.png", Arc::new(AlwaysOk));
//! resource.on("loaded", |_| println!("ready")).unwrap();
//! resource.load();
//! assert!(resource.is_loaded());
//! ```

/// Error types.
pub mod error;

/// Fetch port and completion token.
pub mod fetch;

/// Supported image format predicate.
pub mod format;

/// The `Loadable` member trait.
pub mod loadable;

/// Resource state machine.
pub mod resource;

/// Single-shot settlement.
pub mod settle;

pub use error::{FormatError, LoadFailure};
pub use fetch::{FetchCompletion, FetchResult, ImageFetcher};
pub use format::{SUPPORTED_EXTENSIONS, check_format, supported_format};
pub use loadable::{Loadable, SettleHandler, SettleToken, Settlement};
pub use resource::{LoadState, Resource, ResourceEvent, ResourceId};
pub use settle::{Deferred, Outcome};
