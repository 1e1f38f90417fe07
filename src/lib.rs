//! Batch image preloading for Rust.
//!
//! Add image sources to a [`ResourceManager`](prelude::ResourceManager), call
//! `load()`, and await a single outcome that settles once every image has
//! loaded or failed.

pub use picload_internal::*;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use picload_internal::prelude::*;
}
