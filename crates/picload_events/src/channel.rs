//! The [`EventChannel`] registry.
//!
//! A channel maps each declared event name to an ordered list of listeners.
//! Listener handles ([`ListenerId`]) carry the identity of the channel that
//! issued them, so a handle from another channel is rejected instead of being
//! silently ignored.

use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::RwLock;

use crate::error::ChannelError;

/// Source of channel identities, shared by every channel in the process.
static NEXT_CHANNEL: AtomicU64 = AtomicU64::new(1);

// ─────────────────────────────────────────────────────────────────────────────
// Listener
// ─────────────────────────────────────────────────────────────────────────────

/// Type-erased event handler receiving the published payload.
pub type Listener<P> = Arc<dyn Fn(&P) + Send + Sync>;

/// Handle identifying one subscription on one channel.
///
/// Returned by [`EventChannel::subscribe`] and accepted by
/// [`EventChannel::unsubscribe`] to remove exactly that subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId {
    channel: u64,
    seq: u64,
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener_{}@channel_{}", self.seq, self.channel)
    }
}

struct ListenerEntry<P> {
    id: ListenerId,
    handler: Listener<P>,
}

// ─────────────────────────────────────────────────────────────────────────────
// EventChannel
// ─────────────────────────────────────────────────────────────────────────────

/// Publish/subscribe hub bound to a fixed set of event names.
///
/// # Thread Safety
///
/// Listener lists sit behind a [`RwLock`]. The lock is released before any
/// handler runs, which gives snapshot-at-dispatch semantics and lets handlers
/// call back into the channel.
pub struct EventChannel<P> {
    id: u64,
    next_seq: AtomicU64,
    /// Declared names in declaration order.
    declared: Vec<&'static str>,
    listeners: RwLock<HashMap<&'static str, Vec<ListenerEntry<P>>>>,
}

impl<P> EventChannel<P> {
    /// Creates a channel accepting exactly the given event names.
    ///
    /// Duplicate names are collapsed.
    #[must_use]
    pub fn new(names: impl IntoIterator<Item = &'static str>) -> Self {
        let mut declared = Vec::new();
        let mut listeners = HashMap::new();
        for name in names {
            if listeners.insert(name, Vec::new()).is_none() {
                declared.push(name);
            }
        }

        Self {
            id: NEXT_CHANNEL.fetch_add(1, Ordering::Relaxed),
            next_seq: AtomicU64::new(0),
            declared,
            listeners: RwLock::new(listeners),
        }
    }

    /// Registers a handler for a declared event.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::UnknownEvent`] if `name` was not declared.
    pub fn subscribe<F>(&self, name: &str, handler: F) -> Result<ListenerId, ChannelError>
    where
        F: Fn(&P) + Send + Sync + 'static,
    {
        self.subscribe_arc(name, Arc::new(handler))
    }

    /// Registers an already shared handler for a declared event.
    ///
    /// The same `Arc` may be registered on several names or channels.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::UnknownEvent`] if `name` was not declared.
    pub fn subscribe_arc(
        &self,
        name: &str,
        handler: Listener<P>,
    ) -> Result<ListenerId, ChannelError> {
        let mut listeners = self.listeners.write();
        let entries = listeners
            .get_mut(name)
            .ok_or_else(|| ChannelError::unknown_event(name))?;

        let id = ListenerId {
            channel: self.id,
            seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
        };
        entries.push(ListenerEntry { id, handler });
        tracing::trace!(event = name, listener = %id, "listener subscribed");
        Ok(id)
    }

    /// Removes one listener, or every listener for `name` when `listener` is
    /// `None`. Returns the number of listeners removed.
    ///
    /// Removing a handle that was already removed is not an error.
    ///
    /// # Errors
    ///
    /// - [`ChannelError::UnknownEvent`] if `name` was not declared
    /// - [`ChannelError::InvalidListener`] if the handle was never issued by
    ///   this channel
    pub fn unsubscribe(
        &self,
        name: &str,
        listener: Option<ListenerId>,
    ) -> Result<usize, ChannelError> {
        if let Some(id) = listener
            && !self.issued(id)
        {
            // Validate the name first so the error reported matches the
            // first failing check.
            if !self.is_declared(name) {
                return Err(ChannelError::unknown_event(name));
            }
            return Err(ChannelError::InvalidListener { listener: id });
        }

        let mut listeners = self.listeners.write();
        let entries = listeners
            .get_mut(name)
            .ok_or_else(|| ChannelError::unknown_event(name))?;

        let before = entries.len();
        match listener {
            Some(id) => entries.retain(|entry| entry.id != id),
            None => entries.clear(),
        }
        Ok(before - entries.len())
    }

    /// Invokes every listener registered for `name`, in registration order.
    /// Returns the number of listeners invoked.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::UnknownEvent`] if `name` was not declared.
    pub fn publish(&self, name: &str, payload: &P) -> Result<usize, ChannelError> {
        let snapshot: Vec<Listener<P>> = {
            let listeners = self.listeners.read();
            listeners
                .get(name)
                .ok_or_else(|| ChannelError::unknown_event(name))?
                .iter()
                .map(|entry| Arc::clone(&entry.handler))
                .collect()
        };

        tracing::trace!(event = name, listeners = snapshot.len(), "publishing event");
        for handler in &snapshot {
            handler(payload);
        }
        Ok(snapshot.len())
    }

    /// Returns `true` if `name` was declared at construction.
    #[must_use]
    pub fn is_declared(&self, name: &str) -> bool {
        self.declared.iter().any(|declared| *declared == name)
    }

    /// Returns the declared event names in declaration order.
    #[must_use]
    pub fn declared(&self) -> &[&'static str] {
        &self.declared
    }

    /// Returns the number of listeners for `name` (zero for undeclared names).
    #[must_use]
    pub fn listener_count(&self, name: &str) -> usize {
        self.listeners.read().get(name).map_or(0, Vec::len)
    }

    fn issued(&self, id: ListenerId) -> bool {
        id.channel == self.id && id.seq < self.next_seq.load(Ordering::Relaxed)
    }
}

impl<P> fmt::Debug for EventChannel<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listeners = self.listeners.read();
        let counts: Vec<(&str, usize)> = self
            .declared
            .iter()
            .map(|name| (*name, listeners.get(name).map_or(0, Vec::len)))
            .collect();
        f.debug_struct("EventChannel")
            .field("id", &self.id)
            .field("listeners", &counts)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;

    fn channel() -> EventChannel<&'static str> {
        EventChannel::new(["loaded", "error"])
    }

    #[test]
    fn subscribe_increments_count() {
        let channel = channel();
        channel.subscribe("loaded", |_| {}).unwrap();
        channel.subscribe("loaded", |_| {}).unwrap();
        assert_eq!(channel.listener_count("loaded"), 2);
        assert_eq!(channel.listener_count("error"), 0);
    }

    #[test]
    fn publish_calls_listeners_in_registration_order() {
        let channel = channel();
        let order = Arc::new(Mutex::new(Vec::new()));

        for name in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            channel
                .subscribe("loaded", move |_| order.lock().unwrap().push(name))
                .unwrap();
        }

        assert_eq!(channel.publish("loaded", &"payload").unwrap(), 3);
        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn publish_passes_payload() {
        let channel = channel();
        let seen = Arc::new(Mutex::new(None));
        let seen_clone = Arc::clone(&seen);
        channel
            .subscribe("error", move |detail: &&str| {
                *seen_clone.lock().unwrap() = Some(detail.to_string());
            })
            .unwrap();

        channel.publish("error", &"timeout").unwrap();
        assert_eq!(seen.lock().unwrap().as_deref(), Some("timeout"));
    }

    #[test]
    fn publish_without_listeners_is_ok() {
        assert_eq!(channel().publish("loaded", &"x").unwrap(), 0);
    }

    #[test]
    fn unknown_event_is_rejected_everywhere() {
        let channel = channel();
        assert!(matches!(
            channel.subscribe("progress", |_| {}),
            Err(ChannelError::UnknownEvent { .. })
        ));
        assert!(matches!(
            channel.unsubscribe("progress", None),
            Err(ChannelError::UnknownEvent { .. })
        ));
        assert!(matches!(
            channel.publish("progress", &"x"),
            Err(ChannelError::UnknownEvent { .. })
        ));
    }

    #[test]
    fn unsubscribe_exact_listener() {
        let channel = channel();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);

        let keep = channel
            .subscribe("loaded", move |_| {
                calls_clone.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        let drop_me = channel.subscribe("loaded", |_| panic!("removed")).unwrap();

        assert_eq!(channel.unsubscribe("loaded", Some(drop_me)).unwrap(), 1);
        channel.publish("loaded", &"x").unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Second removal of the same handle is a no-op.
        assert_eq!(channel.unsubscribe("loaded", Some(drop_me)).unwrap(), 0);
        assert_eq!(channel.unsubscribe("loaded", Some(keep)).unwrap(), 1);
    }

    #[test]
    fn unsubscribe_all_for_name() {
        let channel = channel();
        channel.subscribe("loaded", |_| {}).unwrap();
        channel.subscribe("loaded", |_| {}).unwrap();
        channel.subscribe("error", |_| {}).unwrap();

        assert_eq!(channel.unsubscribe("loaded", None).unwrap(), 2);
        assert_eq!(channel.listener_count("loaded"), 0);
        assert_eq!(channel.listener_count("error"), 1);
    }

    #[test]
    fn foreign_listener_is_invalid() {
        let ours = channel();
        let theirs = channel();
        ours.subscribe("loaded", |_| {}).unwrap();
        let foreign = theirs.subscribe("loaded", |_| {}).unwrap();

        let result = ours.unsubscribe("loaded", Some(foreign));
        assert_eq!(
            result,
            Err(ChannelError::InvalidListener { listener: foreign })
        );
        assert_eq!(ours.listener_count("loaded"), 1);
    }

    #[test]
    fn duplicate_declarations_collapse() {
        let channel: EventChannel<()> = EventChannel::new(["a", "b", "a"]);
        assert_eq!(channel.declared(), &["a", "b"]);
        assert!(channel.is_declared("b"));
        assert!(!channel.is_declared("c"));
    }
}
