//! Batch configuration.
//!
//! Options are plain in-memory values. They deserialize with `serde`, so an
//! application may read them from its own configuration file:
//!
//! ```
//! use picload_batch::{BatchOptions, ErrorPolicy, StartMode};
//!
//! let options: BatchOptions =
//!     serde_json::from_str(r#"{ "error_policy": "continue_on_error" }"#).unwrap();
//! assert_eq!(options.error_policy, ErrorPolicy::ContinueOnError);
//! assert_eq!(options.start_mode, StartMode::AllAtOnce);
//! ```

use serde::{Deserialize, Serialize};

/// How a member failure affects the batch outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// The first failure rejects the batch.
    #[default]
    FailFast,
    /// Wait for every member, then resolve with a per-member report.
    ContinueOnError,
}

/// When members are started.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartMode {
    /// Start every member as soon as the batch starts.
    #[default]
    AllAtOnce,
    /// Start the next member only after the previous one settles.
    Sequential,
}

/// Options for a [`BatchCoordinator`](crate::BatchCoordinator).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchOptions {
    /// Failure handling.
    pub error_policy: ErrorPolicy,
    /// Member start scheduling.
    pub start_mode: StartMode,
}

impl BatchOptions {
    /// Creates default options: fail fast, all members at once.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the error policy.
    #[must_use]
    pub fn with_error_policy(mut self, error_policy: ErrorPolicy) -> Self {
        self.error_policy = error_policy;
        self
    }

    /// Sets the start mode.
    #[must_use]
    pub fn with_start_mode(mut self, start_mode: StartMode) -> Self {
        self.start_mode = start_mode;
        self
    }

    /// Shorthand for [`ErrorPolicy::ContinueOnError`].
    #[must_use]
    pub fn continue_on_error(self) -> Self {
        self.with_error_policy(ErrorPolicy::ContinueOnError)
    }
}
