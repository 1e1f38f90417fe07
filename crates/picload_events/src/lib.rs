//! Publish/subscribe channels for picload (Layer 0).
//!
//! Every stateful entity in picload owns an [`EventChannel`] rather than
//! inheriting event capability. A channel is created with a fixed set of
//! declared event names; subscribing to or publishing on any other name is a
//! programmer error reported synchronously as [`ChannelError::UnknownEvent`].
//!
//! # Dispatch Semantics
//!
//! - Handlers run synchronously, in registration order
//! - The handler list is snapshotted before dispatch, so a handler that
//!   subscribes or unsubscribes only affects later publishes
//! - No lock is held while handlers run; handlers may re-enter the channel
//!
//! # Example
//!
//! ```
//! use picload_events::EventChannel;
//!
//! let channel: EventChannel<u32> = EventChannel::new(["loaded", "error"]);
//! let listener = channel
//!     .subscribe("loaded", |value: &u32| assert_eq!(*value, 7))
//!     .unwrap();
//!
//! assert_eq!(channel.publish("loaded", &7).unwrap(), 1);
//! assert!(channel.publish("progress", &7).is_err());
//!
//! channel.unsubscribe("loaded", Some(listener)).unwrap();
//! assert_eq!(channel.listener_count("loaded"), 0);
//! ```

/// Event channel and listener handles.
pub mod channel;

/// Channel error types.
pub mod error;

pub use channel::{EventChannel, Listener, ListenerId};
pub use error::ChannelError;
