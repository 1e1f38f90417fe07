//! The image fetch port.
//!
//! picload never performs network I/O itself. A [`Resource`](crate::Resource)
//! hands its source URI and a [`FetchCompletion`] to an [`ImageFetcher`]
//! implementation, which reports back by consuming the completion.

use core::fmt;

use crate::error::LoadFailure;

/// Result a fetcher reports for one URI.
pub type FetchResult = Result<(), LoadFailure>;

/// Callback consumed by the first completion.
type CompletionFn = Box<dyn FnOnce(FetchResult) + Send>;

/// External primitive that fetches one image.
///
/// # Contract
///
/// - `fetch` is called at most once per resource
/// - `fetch` must return before completing `done`; completing from a spawned
///   task, a timer, or an I/O callback all satisfy this
/// - `done` is consumed by [`FetchCompletion::succeed`] or
///   [`FetchCompletion::fail`]; dropping it reports a failure
///
/// # Example
///
/// ```ignore
/// struct TokioFetcher(reqwest::Client);
///
/// impl ImageFetcher for TokioFetcher {
///     fn fetch(&self, uri: &str, done: FetchCompletion) {
///         let request = self.0.get(uri).send();
///         tokio::spawn(async move {
///             match request.await.and_then(|r| r.error_for_status()) {
///                 Ok(_) => done.succeed(),
///                 Err(err) => done.fail(LoadFailure::new(err.to_string())),
///             }
///         });
///     }
/// }
/// ```
pub trait ImageFetcher: Send + Sync {
    /// Starts fetching `uri` and arranges for `done` to be completed later.
    fn fetch(&self, uri: &str, done: FetchCompletion);
}

/// Single-shot completion token for one fetch.
///
/// The type system ensures it completes at most once. If it is dropped
/// without completing, it reports [`LoadFailure::abandoned`], so exactly one
/// completion always reaches the resource.
pub struct FetchCompletion {
    uri: String,
    callback: Option<CompletionFn>,
}

impl FetchCompletion {
    /// Creates a completion that forwards the fetch result to `callback`.
    pub fn new<F>(uri: impl Into<String>, callback: F) -> Self
    where
        F: FnOnce(FetchResult) + Send + 'static,
    {
        Self {
            uri: uri.into(),
            callback: Some(Box::new(callback)),
        }
    }

    /// URI this completion belongs to.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Reports a successful fetch.
    pub fn succeed(mut self) {
        self.complete(Ok(()));
    }

    /// Reports a failed fetch.
    pub fn fail(mut self, failure: LoadFailure) {
        self.complete(Err(failure));
    }

    /// Reports `result`.
    pub fn finish(mut self, result: FetchResult) {
        self.complete(result);
    }

    fn complete(&mut self, result: FetchResult) {
        if let Some(callback) = self.callback.take() {
            callback(result);
        }
    }
}

impl Drop for FetchCompletion {
    fn drop(&mut self) {
        if self.callback.is_some() {
            tracing::warn!(uri = %self.uri, "fetch completion dropped without a result");
            let failure = LoadFailure::abandoned(self.uri.clone());
            self.complete(Err(failure));
        }
    }
}

impl fmt::Debug for FetchCompletion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchCompletion")
            .field("uri", &self.uri)
            .field("completed", &self.callback.is_none())
            .finish()
    }
}
