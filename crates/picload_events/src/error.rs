//! Errors raised by [`EventChannel`](crate::EventChannel) operations.

use crate::channel::ListenerId;

/// Programmer errors from subscribe, unsubscribe, and publish.
///
/// These are never swallowed: the offending call returns the error and the
/// channel's subscriptions are left untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChannelError {
    /// The event name was not declared when the channel was created.
    #[error("no such event: `{name}` supported")]
    UnknownEvent {
        /// The undeclared name.
        name: String,
    },

    /// The listener handle was not issued by this channel.
    #[error("listener {listener} was not issued by this channel")]
    InvalidListener {
        /// The rejected handle.
        listener: ListenerId,
    },
}

impl ChannelError {
    /// Creates an [`UnknownEvent`](Self::UnknownEvent) error.
    pub fn unknown_event(name: impl Into<String>) -> Self {
        Self::UnknownEvent { name: name.into() }
    }

    /// Returns `true` for [`UnknownEvent`](Self::UnknownEvent).
    #[must_use]
    pub const fn is_unknown_event(&self) -> bool {
        matches!(self, Self::UnknownEvent { .. })
    }
}
