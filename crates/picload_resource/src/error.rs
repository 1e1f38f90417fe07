//! Error types for resources and the format predicate.

use serde::{Deserialize, Serialize};

/// Failure reported by the fetcher for a single resource.
///
/// Never returned from [`Resource::load`](crate::Resource::load). It is
/// delivered as the `"error"` event payload and kept on the failed resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{message}")]
pub struct LoadFailure {
    /// Human-readable failure detail.
    pub message: String,
    /// URI of the resource that failed, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

impl LoadFailure {
    /// Creates a failure with the given detail.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            uri: None,
        }
    }

    /// Attaches the URI of the failing resource.
    #[must_use]
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// Failure recorded when a fetch completion is dropped without completing.
    pub fn abandoned(uri: impl Into<String>) -> Self {
        Self::new("fetch abandoned before completion").with_uri(uri)
    }
}

/// Error from the dynamic format check.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    /// The checked value was not a string.
    #[error("supported format check only accepts strings, got {found}")]
    NotAString {
        /// JSON type name of the rejected value.
        found: &'static str,
    },
}
