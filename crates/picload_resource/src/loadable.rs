//! The [`Loadable`] member trait.
//!
//! Batches coordinate anything that implements [`Loadable`], not only image
//! [`Resource`](crate::Resource)s.

use std::sync::Arc;

use picload_events::{ChannelError, ListenerId};

use crate::error::LoadFailure;
use crate::resource::LoadState;

/// Terminal result of one member: `Ok` when loaded, `Err` with the failure.
pub type Settlement = Result<(), LoadFailure>;

/// Handler invoked when a member reaches a terminal state.
pub type SettleHandler = Arc<dyn Fn(&Settlement) + Send + Sync>;

/// The subscriptions made by one [`Loadable::on_settle`] call.
///
/// Hand it back to [`Loadable::off_settle`] to detach the handler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettleToken {
    listeners: Vec<(&'static str, ListenerId)>,
}

impl SettleToken {
    /// Wraps the `(event, listener)` pairs a member registered.
    pub fn new(listeners: impl IntoIterator<Item = (&'static str, ListenerId)>) -> Self {
        Self {
            listeners: listeners.into_iter().collect(),
        }
    }

    /// The registered `(event, listener)` pairs.
    #[must_use]
    pub fn listeners(&self) -> &[(&'static str, ListenerId)] {
        &self.listeners
    }
}

/// An item with a forward-only load lifecycle that reports its settlement.
///
/// # Contract
///
/// - `load` is a no-op unless the state is [`LoadState::Pending`]
/// - once a member is terminal its state never changes
/// - each handler passed to `on_settle` is invoked exactly once, when the
///   member becomes terminal; members that are already terminal do not
///   invoke handlers registered afterwards
/// - after `off_settle` the handler is never invoked and no longer
///   referenced by the member
pub trait Loadable: Send + Sync {
    /// Short label used in reports and logs.
    fn label(&self) -> String;

    /// Current lifecycle state.
    fn state(&self) -> LoadState;

    /// Failure detail once the member is [`LoadState::Failed`].
    fn failure(&self) -> Option<LoadFailure>;

    /// Starts loading.
    fn load(&self);

    /// Registers a handler for the member's terminal transition.
    ///
    /// # Errors
    ///
    /// Propagates subscription errors from the member's event channel.
    /// Nothing stays registered when this fails.
    fn on_settle(&self, handler: SettleHandler) -> Result<SettleToken, ChannelError>;

    /// Detaches a handler registered by `on_settle`. Returns the number of
    /// listeners removed; detaching twice removes nothing.
    fn off_settle(&self, token: &SettleToken) -> usize;

    /// Returns the settlement of a terminal member.
    fn settlement(&self) -> Option<Settlement> {
        match self.state() {
            LoadState::Loaded => Some(Ok(())),
            LoadState::Failed => Some(Err(self
                .failure()
                .unwrap_or_else(|| LoadFailure::new("failed without detail")))),
            LoadState::Pending | LoadState::Loading => None,
        }
    }
}
