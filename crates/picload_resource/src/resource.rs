//! The [`Resource`] lifecycle state machine.
//!
//! ```text
//! Pending ──load()──▶ Loading ──fetch ok──▶ Loaded
//!                        │
//!                        └────fetch err──▶ Failed
//! ```
//!
//! Transitions only move forward. A resource publishes `"loading"` when it
//! starts, then exactly one of `"loaded"` or `"error"`.

use core::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use picload_events::{ChannelError, EventChannel, Listener, ListenerId};
use serde::{Deserialize, Serialize};

use crate::error::LoadFailure;
use crate::fetch::{FetchCompletion, FetchResult, ImageFetcher};
use crate::loadable::{Loadable, SettleHandler, SettleToken};

// ─────────────────────────────────────────────────────────────────────────────
// ResourceId
// ─────────────────────────────────────────────────────────────────────────────

/// Identifier of a resource within a manager.
///
/// Managers assign [`Number`](Self::Number) ids from their own counter when
/// the caller does not supply one. Callers may supply either variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceId {
    /// Numeric id, auto-assigned or caller-supplied.
    Number(u64),
    /// Caller-supplied name.
    Name(String),
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceId::Number(n) => write!(f, "{n}"),
            ResourceId::Name(name) => f.write_str(name),
        }
    }
}

impl From<u64> for ResourceId {
    fn from(value: u64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for ResourceId {
    fn from(value: &str) -> Self {
        Self::Name(value.to_owned())
    }
}

impl From<String> for ResourceId {
    fn from(value: String) -> Self {
        Self::Name(value)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// LoadState
// ─────────────────────────────────────────────────────────────────────────────

/// Lifecycle state of a loadable item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadState {
    /// Created, not yet asked to load.
    Pending,
    /// Fetch in flight.
    Loading,
    /// Fetch succeeded. Terminal.
    Loaded,
    /// Fetch failed. Terminal.
    Failed,
}

impl LoadState {
    /// Returns `true` for [`Loaded`](Self::Loaded) and [`Failed`](Self::Failed).
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Loaded | Self::Failed)
    }
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LoadState::Pending => "pending",
            LoadState::Loading => "loading",
            LoadState::Loaded => "loaded",
            LoadState::Failed => "failed",
        };
        f.write_str(name)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ResourceEvent
// ─────────────────────────────────────────────────────────────────────────────

/// Payload published on a resource's channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceEvent {
    /// The fetch has started.
    Loading,
    /// The fetch succeeded.
    Loaded,
    /// The fetch failed.
    Error(LoadFailure),
}

impl ResourceEvent {
    /// Event name for [`ResourceEvent::Loading`].
    pub const LOADING: &'static str = "loading";
    /// Event name for [`ResourceEvent::Loaded`].
    pub const LOADED: &'static str = "loaded";
    /// Event name for [`ResourceEvent::Error`].
    pub const ERROR: &'static str = "error";

    /// Every event name a resource declares.
    pub const NAMES: [&'static str; 3] = [Self::LOADING, Self::LOADED, Self::ERROR];

    /// Returns the channel name this event is published under.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            ResourceEvent::Loading => Self::LOADING,
            ResourceEvent::Loaded => Self::LOADED,
            ResourceEvent::Error(_) => Self::ERROR,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Resource
// ─────────────────────────────────────────────────────────────────────────────

struct Lifecycle {
    state: LoadState,
    failure: Option<LoadFailure>,
}

/// One image to load, tracked by id, source URI, and [`LoadState`].
///
/// Resources are always shared through [`Arc`]; a fetch completion holds only
/// a weak reference, so dropping every handle abandons the result silently.
pub struct Resource {
    id: ResourceId,
    source: String,
    lifecycle: Mutex<Lifecycle>,
    events: EventChannel<ResourceEvent>,
    fetcher: Arc<dyn ImageFetcher>,
    this: Weak<Resource>,
}

impl Resource {
    /// Creates a pending resource that will load through `fetcher`.
    pub fn new(
        id: impl Into<ResourceId>,
        source: impl Into<String>,
        fetcher: Arc<dyn ImageFetcher>,
    ) -> Arc<Self> {
        let id = id.into();
        let source = source.into();
        Arc::new_cyclic(|this| Self {
            id,
            source,
            lifecycle: Mutex::new(Lifecycle {
                state: LoadState::Pending,
                failure: None,
            }),
            events: EventChannel::new(ResourceEvent::NAMES),
            fetcher,
            this: this.clone(),
        })
    }

    /// Returns the resource id.
    #[must_use]
    pub fn id(&self) -> &ResourceId {
        &self.id
    }

    /// Returns the source URI.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> LoadState {
        self.lifecycle.lock().state
    }

    /// Returns `true` while the resource has not been asked to load.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.state() == LoadState::Pending
    }

    /// Returns `true` while the fetch is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state() == LoadState::Loading
    }

    /// Returns `true` once the fetch succeeded.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.state() == LoadState::Loaded
    }

    /// Returns `true` once the fetch failed.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.state() == LoadState::Failed
    }

    /// Returns the recorded failure once the resource is [`LoadState::Failed`].
    #[must_use]
    pub fn failure(&self) -> Option<LoadFailure> {
        self.lifecycle.lock().failure.clone()
    }

    /// Starts loading. Does nothing unless the resource is pending.
    pub fn load(&self) {
        {
            let mut lifecycle = self.lifecycle.lock();
            if lifecycle.state != LoadState::Pending {
                tracing::trace!(id = %self.id, state = %lifecycle.state, "load ignored");
                return;
            }
            lifecycle.state = LoadState::Loading;
        }

        tracing::debug!(id = %self.id, source = %self.source, "resource loading");
        self.emit(&ResourceEvent::Loading);

        let this = self.this.clone();
        let done = FetchCompletion::new(self.source.clone(), move |result| {
            if let Some(resource) = this.upgrade() {
                resource.finish(result);
            }
        });
        self.fetcher.fetch(&self.source, done);
    }

    /// Subscribes to one of the declared events (see [`ResourceEvent::NAMES`]).
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::UnknownEvent`] for undeclared names.
    pub fn on<F>(&self, name: &str, handler: F) -> Result<ListenerId, ChannelError>
    where
        F: Fn(&ResourceEvent) + Send + Sync + 'static,
    {
        self.events.subscribe(name, handler)
    }

    /// Removes one listener, or all listeners for `name` when `None`.
    ///
    /// # Errors
    ///
    /// See [`EventChannel::unsubscribe`].
    pub fn off(&self, name: &str, listener: Option<ListenerId>) -> Result<usize, ChannelError> {
        self.events.unsubscribe(name, listener)
    }

    /// Returns the resource's event channel.
    #[must_use]
    pub fn events(&self) -> &EventChannel<ResourceEvent> {
        &self.events
    }

    fn finish(&self, result: FetchResult) {
        let event = {
            let mut lifecycle = self.lifecycle.lock();
            if lifecycle.state != LoadState::Loading {
                tracing::warn!(
                    id = %self.id,
                    state = %lifecycle.state,
                    "fetch completed outside the loading state"
                );
                return;
            }
            match result {
                Ok(()) => {
                    lifecycle.state = LoadState::Loaded;
                    ResourceEvent::Loaded
                }
                Err(failure) => {
                    lifecycle.state = LoadState::Failed;
                    lifecycle.failure = Some(failure.clone());
                    ResourceEvent::Error(failure)
                }
            }
        };

        match &event {
            ResourceEvent::Error(failure) => {
                tracing::warn!(id = %self.id, source = %self.source, %failure, "resource failed");
            }
            _ => tracing::debug!(id = %self.id, source = %self.source, "resource loaded"),
        }
        self.emit(&event);
    }

    fn emit(&self, event: &ResourceEvent) {
        if let Err(err) = self.events.publish(event.name(), event) {
            tracing::error!(id = %self.id, %err, "resource event rejected by its own channel");
        }
    }
}

impl Loadable for Resource {
    fn label(&self) -> String {
        self.id.to_string()
    }

    fn state(&self) -> LoadState {
        Resource::state(self)
    }

    fn failure(&self) -> Option<LoadFailure> {
        Resource::failure(self)
    }

    fn load(&self) {
        Resource::load(self);
    }

    fn on_settle(&self, handler: SettleHandler) -> Result<SettleToken, ChannelError> {
        let listener: Listener<ResourceEvent> = Arc::new(move |event: &ResourceEvent| match event {
            ResourceEvent::Loaded => handler(&Ok(())),
            ResourceEvent::Error(failure) => handler(&Err(failure.clone())),
            ResourceEvent::Loading => {}
        });
        let loaded = self
            .events
            .subscribe_arc(ResourceEvent::LOADED, Arc::clone(&listener))?;
        let error = match self.events.subscribe_arc(ResourceEvent::ERROR, listener) {
            Ok(id) => id,
            Err(err) => {
                let _ = self.events.unsubscribe(ResourceEvent::LOADED, Some(loaded));
                return Err(err);
            }
        };
        Ok(SettleToken::new([
            (ResourceEvent::LOADED, loaded),
            (ResourceEvent::ERROR, error),
        ]))
    }

    fn off_settle(&self, token: &SettleToken) -> usize {
        token
            .listeners()
            .iter()
            .map(|(name, id)| match self.events.unsubscribe(name, Some(*id)) {
                Ok(removed) => removed,
                Err(err) => {
                    tracing::warn!(id = %self.id, %err, "cannot detach settle handler");
                    0
                }
            })
            .sum()
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("id", &self.id)
            .field("source", &self.source)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
