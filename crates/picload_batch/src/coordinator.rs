//! The [`BatchCoordinator`] aggregation engine.
//!
//! A batch captures a snapshot of members at construction, starts them, and
//! settles a single [`Outcome`] according to its [`ErrorPolicy`].
//!
//! # Phases
//!
//! ```text
//! Created ──start()──▶ Running ──terminal condition──▶ Settled
//! ```
//!
//! # Settlement Rules
//!
//! - `FailFast`: the first member failure rejects the batch
//! - `ContinueOnError`: the batch resolves once every member is terminal
//! - either way the outcome settles exactly once; the batch then detaches
//!   from its members, so later member events do not reach it
//!
//! # Re-entrancy
//!
//! Members may settle synchronously inside `load()`, and therefore inside
//! `start()` or `resume()`. No lock is held while a member loads or while the
//! outcome's continuations run, and a single pump loop starts members so that
//! nested settlements never recurse into another pump.
//!
//! # Listeners
//!
//! The batch detaches its handler from a member as soon as that member's
//! result is recorded, and from every remaining member when it settles.

use core::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use picload_resource::{
    Deferred, LoadState, Loadable, Outcome, Resource, SettleToken, Settlement,
};

use crate::error::BatchError;
use crate::options::{BatchOptions, ErrorPolicy, StartMode};
use crate::report::{BatchReport, MemberReport};

/// Lifecycle phase of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BatchPhase {
    /// Members captured, nothing started.
    Created,
    /// Members are being started and observed.
    Running,
    /// The outcome has settled. Terminal.
    Settled,
}

struct BatchState {
    phase: BatchPhase,
    paused: bool,
    /// Set while a pump loop is active.
    pumping: bool,
    /// Members still referenced; cleared on settle so member listeners do
    /// not keep the members alive through the batch.
    members: Vec<Arc<dyn Loadable>>,
    started: Vec<bool>,
    results: Vec<Option<Settlement>>,
    /// Settle handlers still attached to members.
    subscriptions: Vec<Option<SettleToken>>,
    settled_count: usize,
}

impl BatchState {
    /// Index of the next member to start, honoring pause and start mode.
    fn next_to_start(&self, mode: StartMode) -> Option<usize> {
        if self.phase != BatchPhase::Running || self.paused {
            return None;
        }
        if mode == StartMode::Sequential && self.has_in_flight() {
            return None;
        }
        self.started.iter().position(|started| !started)
    }

    /// Takes one member's settle handler registration, if still attached.
    fn take_subscription(&mut self, index: usize) -> Option<(Arc<dyn Loadable>, SettleToken)> {
        let token = self.subscriptions.get_mut(index)?.take()?;
        let member = self.members.get(index)?;
        Some((Arc::clone(member), token))
    }

    fn take_subscriptions(&mut self) -> Vec<(Arc<dyn Loadable>, SettleToken)> {
        (0..self.subscriptions.len())
            .filter_map(|index| self.take_subscription(index))
            .collect()
    }

    fn has_in_flight(&self) -> bool {
        self.started
            .iter()
            .zip(&self.results)
            .any(|(started, result)| *started && result.is_none())
    }
}

struct BatchInner {
    labels: Vec<String>,
    options: BatchOptions,
    state: Mutex<BatchState>,
    deferred: Deferred<BatchReport, BatchError>,
}

/// Starts a set of [`Loadable`] members and settles one aggregate outcome.
///
/// Cloning yields another handle to the same batch.
///
/// # Example
///
/// ```ignore
/// let batch = BatchCoordinator::from_resources(resources, BatchOptions::new().continue_on_error());
/// let report = batch.start().await?;
/// for (member, failure) in report.failures() {
///     tracing::warn!(member, %failure, "image unavailable");
/// }
/// ```
#[derive(Clone)]
pub struct BatchCoordinator {
    inner: Arc<BatchInner>,
}

impl BatchCoordinator {
    /// Captures `members` without starting them.
    #[must_use]
    pub fn new(members: impl IntoIterator<Item = Arc<dyn Loadable>>, options: BatchOptions) -> Self {
        let members: Vec<Arc<dyn Loadable>> = members.into_iter().collect();
        let labels = members.iter().map(|member| member.label()).collect();
        let count = members.len();

        Self {
            inner: Arc::new(BatchInner {
                labels,
                options,
                state: Mutex::new(BatchState {
                    phase: BatchPhase::Created,
                    paused: false,
                    pumping: false,
                    members,
                    started: vec![false; count],
                    results: vec![None; count],
                    subscriptions: vec![None; count],
                    settled_count: 0,
                }),
                deferred: Deferred::new(),
            }),
        }
    }

    /// Captures image resources without starting them.
    #[must_use]
    pub fn from_resources(
        resources: impl IntoIterator<Item = Arc<Resource>>,
        options: BatchOptions,
    ) -> Self {
        Self::new(
            resources
                .into_iter()
                .map(|resource| resource as Arc<dyn Loadable>),
            options,
        )
    }

    /// Starts the batch and returns its outcome.
    ///
    /// Every member is observed before any member is loaded. Members already
    /// terminal count as settled immediately, members already loading are
    /// observed but not loaded again. Calling `start` again returns the same
    /// outcome without further effect.
    pub fn start(&self) -> Outcome<BatchReport, BatchError> {
        let inner = &self.inner;
        let members = {
            let mut state = inner.state.lock();
            if state.phase != BatchPhase::Created {
                return inner.deferred.outcome();
            }
            state.phase = BatchPhase::Running;
            // Held until every member is observed, so settlements recorded
            // meanwhile cannot start anything.
            state.pumping = true;
            state.members.clone()
        };

        tracing::debug!(
            members = members.len(),
            policy = ?inner.options.error_policy,
            mode = ?inner.options.start_mode,
            "batch started"
        );

        if members.is_empty() {
            inner.finish(Ok(BatchReport::default()));
            return inner.deferred.outcome();
        }

        for (index, member) in members.iter().enumerate() {
            if !inner.observe(index, member) {
                break;
            }
        }

        inner.state.lock().pumping = false;
        inner.pump();
        inner.deferred.outcome()
    }

    /// Stops members that have not started yet from starting.
    ///
    /// Members already loading keep going and still count toward the outcome.
    pub fn pause(&self) {
        let mut state = self.inner.state.lock();
        if state.phase != BatchPhase::Settled && !state.paused {
            state.paused = true;
            tracing::debug!("batch paused");
        }
    }

    /// Lifts a pause and starts the members that are still waiting.
    pub fn resume(&self) {
        {
            let mut state = self.inner.state.lock();
            if !state.paused {
                return;
            }
            state.paused = false;
        }
        tracing::debug!("batch resumed");
        self.inner.pump();
    }

    /// Returns the outcome without starting the batch.
    #[must_use]
    pub fn outcome(&self) -> Outcome<BatchReport, BatchError> {
        self.inner.deferred.outcome()
    }

    /// Returns the current phase.
    #[must_use]
    pub fn phase(&self) -> BatchPhase {
        self.inner.state.lock().phase
    }

    /// Returns `true` while paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.inner.state.lock().paused
    }

    /// Number of members that have reached a terminal state.
    #[must_use]
    pub fn settled_count(&self) -> usize {
        self.inner.state.lock().settled_count
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.labels.len()
    }

    /// Returns `true` for a batch without members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.labels.is_empty()
    }

    /// Member labels in member order.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.inner.labels
    }

    /// Returns the options this batch was created with.
    #[must_use]
    pub fn options(&self) -> BatchOptions {
        self.inner.options
    }
}

impl fmt::Debug for BatchCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("BatchCoordinator")
            .field("members", &self.inner.labels)
            .field("options", &self.inner.options)
            .field("phase", &state.phase)
            .field("paused", &state.paused)
            .field("settled_count", &state.settled_count)
            .finish()
    }
}

impl BatchInner {
    /// Attaches the settle handler to one member and records it if it is
    /// already terminal. Returns `false` once the batch has settled.
    fn observe(self: &Arc<Self>, index: usize, member: &Arc<dyn Loadable>) -> bool {
        let observer = Arc::clone(self);
        let subscribed = member.on_settle(Arc::new(move |settlement: &Settlement| {
            observer.record(index, settlement.clone());
        }));
        let token = match subscribed {
            Ok(token) => token,
            Err(err) => {
                tracing::error!(member = %self.labels[index], %err, "cannot observe batch member");
                self.finish(Err(BatchError::from(err)));
                return false;
            }
        };

        let already_started = member.state() != LoadState::Pending;
        let stale = {
            let mut state = self.state.lock();
            if already_started {
                state.started[index] = true;
            }
            if state.phase == BatchPhase::Settled || state.results[index].is_some() {
                Some(token)
            } else {
                state.subscriptions[index] = Some(token);
                None
            }
        };
        if let Some(token) = stale {
            member.off_settle(&token);
        }

        if let Some(settlement) = member.settlement() {
            self.record(index, settlement);
        }
        self.state.lock().phase != BatchPhase::Settled
    }

    /// Records a member's terminal result and settles the batch when the
    /// policy says so. Duplicate reports for one member are ignored.
    fn record(&self, index: usize, settlement: Settlement) {
        let mut state = self.state.lock();
        if state.results[index].is_some() {
            return;
        }
        state.results[index] = Some(settlement.clone());
        state.settled_count += 1;
        let detach = state.take_subscription(index);
        let late = state.phase == BatchPhase::Settled;
        let verdict = match (self.options.error_policy, &settlement) {
            _ if late => None,
            (ErrorPolicy::FailFast, Err(failure)) => Some(Err(BatchError::MemberFailed {
                member: self.labels[index].clone(),
                failure: failure.clone(),
            })),
            _ if state.settled_count == self.labels.len() => Some(Ok(self.report(&state))),
            _ => None,
        };
        drop(state);

        if let Some((member, token)) = detach {
            member.off_settle(&token);
        }
        if late {
            tracing::trace!(
                member = %self.labels[index],
                ok = settlement.is_ok(),
                "member settled after batch"
            );
            return;
        }
        match verdict {
            Some(result) => self.finish(result),
            None => self.pump(),
        }
    }

    /// Transitions to `Settled` and settles the outcome, once.
    fn finish(&self, result: Result<BatchReport, BatchError>) {
        let detach = {
            let mut state = self.state.lock();
            if state.phase == BatchPhase::Settled {
                return;
            }
            state.phase = BatchPhase::Settled;
            let detach = state.take_subscriptions();
            state.members.clear();
            detach
        };
        for (member, token) in detach {
            member.off_settle(&token);
        }

        match &result {
            Ok(report) => tracing::info!(
                members = report.len(),
                loaded = report.loaded_count(),
                failed = report.failed_count(),
                "batch resolved"
            ),
            Err(err) => tracing::info!(%err, "batch rejected"),
        }
        self.deferred.settle(result);
    }

    /// Starts members until none may start. Only one pump loop runs at a time.
    fn pump(&self) {
        {
            let mut state = self.state.lock();
            if state.pumping {
                return;
            }
            state.pumping = true;
        }

        loop {
            let next = {
                let mut state = self.state.lock();
                match state.next_to_start(self.options.start_mode) {
                    Some(index) => {
                        state.started[index] = true;
                        Some((index, Arc::clone(&state.members[index])))
                    }
                    None => {
                        state.pumping = false;
                        None
                    }
                }
            };

            let Some((index, member)) = next else {
                return;
            };
            tracing::trace!(member = %self.labels[index], "starting member");
            member.load();
        }
    }

    fn report(&self, state: &BatchState) -> BatchReport {
        let entries = self
            .labels
            .iter()
            .zip(&state.results)
            .filter_map(|(label, result)| {
                result.clone().map(|settlement| MemberReport {
                    member: label.clone(),
                    outcome: settlement.into(),
                })
            })
            .collect();
        BatchReport { entries }
    }
}
