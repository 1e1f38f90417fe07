//! Single-shot settlement: [`Deferred`] and [`Outcome`].
//!
//! A [`Deferred`] is the producing half. It settles at most once: the first
//! call to [`resolve`](Deferred::resolve) or [`reject`](Deferred::reject)
//! wins and every later call returns `false` without effect.
//!
//! An [`Outcome`] is the consuming half. It can be awaited, and it accepts
//! continuations through [`on_settled`](Outcome::on_settled). A continuation
//! registered after settlement runs immediately, so a caller that receives an
//! already-settled outcome never misses the result.
//!
//! ```
//! use picload_resource::Deferred;
//!
//! let deferred: Deferred<u32, String> = Deferred::new();
//! let outcome = deferred.outcome();
//!
//! assert!(deferred.resolve(3));
//! assert!(!deferred.reject("too late".into()));
//! assert_eq!(outcome.peek(), Some(Ok(3)));
//! ```

use core::fmt;
use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll, Waker};
use std::sync::Arc;

use parking_lot::Mutex;

/// Callback run once with the settled result.
type Continuation<T, E> = Box<dyn FnOnce(&Result<T, E>) + Send>;

enum Slot<T, E> {
    Pending {
        continuations: Vec<Continuation<T, E>>,
        wakers: Vec<Waker>,
    },
    Settled(Result<T, E>),
}

struct Shared<T, E> {
    slot: Mutex<Slot<T, E>>,
}

impl<T, E> Shared<T, E> {
    fn pending() -> Arc<Self> {
        Arc::new(Self {
            slot: Mutex::new(Slot::Pending {
                continuations: Vec::new(),
                wakers: Vec::new(),
            }),
        })
    }

    fn settled(result: Result<T, E>) -> Arc<Self> {
        Arc::new(Self {
            slot: Mutex::new(Slot::Settled(result)),
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Deferred
// ─────────────────────────────────────────────────────────────────────────────

/// Producing half of a single-shot settlement.
///
/// Clones share the same slot, so any clone may settle it.
pub struct Deferred<T, E> {
    shared: Arc<Shared<T, E>>,
}

impl<T, E> Clone for Deferred<T, E> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T, E> Default for Deferred<T, E> {
    fn default() -> Self {
        Self {
            shared: Shared::pending(),
        }
    }
}

impl<T: Clone, E: Clone> Deferred<T, E> {
    /// Creates an unsettled deferred.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a consuming handle for this deferred.
    #[must_use]
    pub fn outcome(&self) -> Outcome<T, E> {
        Outcome {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Settles with a success value. Returns `false` if already settled.
    pub fn resolve(&self, value: T) -> bool {
        self.settle(Ok(value))
    }

    /// Settles with a failure value. Returns `false` if already settled.
    pub fn reject(&self, reason: E) -> bool {
        self.settle(Err(reason))
    }

    /// Settles with `result`. Returns `false` if already settled.
    pub fn settle(&self, result: Result<T, E>) -> bool {
        let previous = {
            let mut slot = self.shared.slot.lock();
            if matches!(*slot, Slot::Settled(_)) {
                return false;
            }
            core::mem::replace(&mut *slot, Slot::Settled(result.clone()))
        };
        let Slot::Pending {
            continuations,
            wakers,
        } = previous
        else {
            return false;
        };

        for continuation in continuations {
            continuation(&result);
        }
        for waker in wakers {
            waker.wake();
        }
        true
    }

    /// Returns `true` once settled.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        matches!(*self.shared.slot.lock(), Slot::Settled(_))
    }
}

impl<T, E> fmt::Debug for Deferred<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let settled = matches!(*self.shared.slot.lock(), Slot::Settled(_));
        f.debug_struct("Deferred").field("settled", &settled).finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Outcome
// ─────────────────────────────────────────────────────────────────────────────

/// Consuming half of a single-shot settlement.
///
/// Awaiting an outcome yields a clone of the settled result. Any number of
/// clones may await or register continuations.
pub struct Outcome<T, E> {
    shared: Arc<Shared<T, E>>,
}

impl<T, E> Clone for Outcome<T, E> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Clone, E: Clone> Outcome<T, E> {
    /// Creates an outcome that is already resolved with `value`.
    #[must_use]
    pub fn resolved(value: T) -> Self {
        Self {
            shared: Shared::settled(Ok(value)),
        }
    }

    /// Creates an outcome that is already rejected with `reason`.
    #[must_use]
    pub fn rejected(reason: E) -> Self {
        Self {
            shared: Shared::settled(Err(reason)),
        }
    }

    /// Registers a continuation to run once the outcome settles.
    ///
    /// Runs immediately, on the calling thread, if already settled. Otherwise
    /// it runs on whichever thread settles the outcome.
    pub fn on_settled<F>(&self, continuation: F)
    where
        F: FnOnce(&Result<T, E>) + Send + 'static,
    {
        let result = {
            let mut slot = self.shared.slot.lock();
            match &mut *slot {
                Slot::Pending { continuations, .. } => {
                    continuations.push(Box::new(continuation));
                    return;
                }
                Slot::Settled(result) => result.clone(),
            }
        };
        continuation(&result);
    }

    /// Returns a clone of the result if settled.
    #[must_use]
    pub fn peek(&self) -> Option<Result<T, E>> {
        match &*self.shared.slot.lock() {
            Slot::Pending { .. } => None,
            Slot::Settled(result) => Some(result.clone()),
        }
    }

    /// Returns `true` once settled.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        matches!(*self.shared.slot.lock(), Slot::Settled(_))
    }
}

impl<T: Clone, E: Clone> Future for Outcome<T, E> {
    type Output = Result<T, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut slot = self.shared.slot.lock();
        match &mut *slot {
            Slot::Settled(result) => Poll::Ready(result.clone()),
            Slot::Pending { wakers, .. } => {
                if !wakers.iter().any(|waker| waker.will_wake(cx.waker())) {
                    wakers.push(cx.waker().clone());
                }
                Poll::Pending
            }
        }
    }
}

impl<T, E> fmt::Debug for Outcome<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let settled = matches!(*self.shared.slot.lock(), Slot::Settled(_));
        f.debug_struct("Outcome").field("settled", &settled).finish()
    }
}
