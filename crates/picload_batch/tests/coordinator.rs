//! Batch coordination over real resources, with fetches completed by hand.


use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use picload_batch::{
    BatchCoordinator, BatchError, BatchOptions, BatchPhase, MemberOutcome, StartMode,
};
use picload_resource::{LoadFailure, Loadable, Resource, ResourceEvent};
use proptest::prelude::*;
use test_utils::{ManualFetcher, assert_pending, labels, loading_count, resources};

/// Settle listeners still registered across `members`.
fn listeners(members: &[Arc<Resource>]) -> usize {
    members
        .iter()
        .map(|m| {
            m.events().listener_count(ResourceEvent::LOADED)
                + m.events().listener_count(ResourceEvent::ERROR)
        })
        .sum()
}

fn batch(members: &[Arc<Resource>], options: BatchOptions) -> BatchCoordinator {
    BatchCoordinator::from_resources(members.iter().cloned(), options)
}

// ─────────────────────────────────────────────────────────────────────────────
// Error policies
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn fail_fast_rejects_on_first_failure() {
    let fetcher = ManualFetcher::new();
    let members = resources(&fetcher, &["a.png", "b.png", "c.png"]);
    let batch = batch(&members, BatchOptions::new());
    let outcome = batch.start();
    assert_pending(&batch);

    fetcher.fail("b.png", "404");
    assert!(members[0].is_loading() && members[2].is_loading());
    assert_eq!(
        outcome.peek(),
        Some(Err(BatchError::MemberFailed {
            member: "1".into(),
            failure: LoadFailure::new("404").with_uri("b.png"),
        }))
    );

    // Later events do not reach the settled batch.
    fetcher.succeed("a.png");
    fetcher.succeed("c.png");
    assert_eq!(batch.settled_count(), 1);
    assert!(matches!(outcome.peek(), Some(Err(_))));
    assert_eq!(batch.phase(), BatchPhase::Settled);
}

#[test]
fn continue_on_error_reports_every_member() {
    let fetcher = ManualFetcher::new();
    let members = resources(&fetcher, &["a.png", "b.png", "c.png"]);
    let batch = batch(&members, BatchOptions::new().continue_on_error());
    let outcome = batch.start();

    fetcher.fail("b.png", "decode error");
    fetcher.succeed("c.png");
    assert_pending(&batch);
    fetcher.succeed("a.png");

    let report = outcome.peek().unwrap().unwrap();
    let reported: Vec<_> = report.entries.iter().map(|e| e.member.clone()).collect();
    assert_eq!(reported, labels(&members));
    assert_eq!(report.entries[0].outcome, MemberOutcome::Loaded);
    assert!(matches!(
        &report.entries[1].outcome,
        MemberOutcome::Failed { failure } if failure.message == "decode error"
    ));
    assert_eq!(report.loaded_count(), 2);
}

#[test]
fn fail_fast_stops_starting_members() {
    let fetcher = ManualFetcher::new();
    let members = resources(&fetcher, &["a.png", "b.png", "c.png"]);
    let batch = batch(
        &members,
        BatchOptions::new().with_start_mode(StartMode::Sequential),
    );
    let outcome = batch.start();

    fetcher.fail("a.png", "gone");
    assert!(matches!(outcome.peek(), Some(Err(_))));
    assert_eq!(fetcher.requested(), ["a.png"]);
    assert!(members[1].is_pending() && members[2].is_pending());
}

#[test]
fn fail_fast_observes_every_member_before_loading() {
    use picload_resource::{FetchCompletion, ImageFetcher};

    struct Refusing;
    impl ImageFetcher for Refusing {
        fn fetch(&self, uri: &str, done: FetchCompletion) {
            let failure = LoadFailure::new("refused").with_uri(uri);
            done.fail(failure);
        }
    }

    let parked = ManualFetcher::new();
    let done = Resource::new(0u64, "a.png", Arc::clone(&parked) as Arc<dyn ImageFetcher>);
    done.load();
    parked.succeed("a.png");
    let refused = Resource::new(1u64, "b.png", Arc::new(Refusing));
    let waiting = Resource::new(2u64, "c.png", Arc::clone(&parked) as Arc<dyn ImageFetcher>);

    let members = [done, refused, waiting];
    let outcome = batch(&members, BatchOptions::new()).start();

    assert!(matches!(
        outcome.peek(),
        Some(Err(BatchError::MemberFailed { member, .. })) if member == "1"
    ));
    assert!(members[2].is_pending());
    assert_eq!(parked.requested(), ["a.png"]);
}

// ─────────────────────────────────────────────────────────────────────────────
// Start, pause, resume
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn start_twice_fetches_once() {
    let fetcher = ManualFetcher::new();
    let members = resources(&fetcher, &["a.png", "b.png"]);
    let batch = batch(&members, BatchOptions::new());

    batch.start();
    batch.start();
    assert_eq!(fetcher.requested(), ["a.png", "b.png"]);
}

#[test]
fn member_loading_elsewhere_is_observed_not_restarted() {
    let fetcher = ManualFetcher::new();
    let members = resources(&fetcher, &["a.png", "b.png"]);
    members[0].load();

    let batch = batch(&members, BatchOptions::new());
    let outcome = batch.start();
    assert_eq!(fetcher.requested(), ["a.png", "b.png"]);

    fetcher.succeed("a.png");
    fetcher.succeed("b.png");
    assert!(outcome.peek().unwrap().unwrap().all_loaded());
}

#[test]
fn already_settled_members_resolve_without_fetching() {
    let fetcher = ManualFetcher::new();
    let members = resources(&fetcher, &["a.png"]);
    members[0].load();
    fetcher.succeed("a.png");

    let batch = batch(&members, BatchOptions::new());
    let outcome = batch.start();
    assert_eq!(fetcher.requested().len(), 1);
    assert!(outcome.peek().unwrap().unwrap().all_loaded());
}

#[test]
fn pause_keeps_in_flight_members_counting() {
    let fetcher = ManualFetcher::new();
    let members = resources(&fetcher, &["a.png", "b.png", "c.png"]);
    let batch = batch(
        &members,
        BatchOptions::new().with_start_mode(StartMode::Sequential),
    );
    let outcome = batch.start();

    batch.pause();
    fetcher.succeed("a.png");
    assert_eq!(batch.settled_count(), 1);
    assert!(fetcher.in_flight().is_empty());
    assert!(members[1].is_pending());

    batch.resume();
    fetcher.succeed("b.png");
    fetcher.succeed("c.png");
    assert!(outcome.peek().unwrap().unwrap().all_loaded());
}

#[test]
fn sequential_never_loads_two_at_once() {
    let fetcher = ManualFetcher::new();
    let sources = ["a.png", "b.png", "c.png", "d.png"];
    let members = resources(&fetcher, &sources);
    let batch = batch(
        &members,
        BatchOptions::new()
            .continue_on_error()
            .with_start_mode(StartMode::Sequential),
    );
    let outcome = batch.start();

    for (i, source) in sources.iter().enumerate() {
        assert_eq!(loading_count(&members), 1);
        if i % 2 == 0 {
            fetcher.succeed(source);
        } else {
            fetcher.fail(source, "flaky");
        }
    }
    assert_eq!(loading_count(&members), 0);
    assert_eq!(outcome.peek().unwrap().unwrap().failed_count(), 2);
}

// ─────────────────────────────────────────────────────────────────────────────
// Settlement
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn continuation_runs_exactly_once() {
    let fetcher = ManualFetcher::new();
    let members = resources(&fetcher, &["a.png", "b.png"]);
    let batch = batch(&members, BatchOptions::new());
    let calls = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&calls);
    batch.start().on_settled(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    fetcher.fail("a.png", "x");
    fetcher.fail("b.png", "y");

    // Registering after settlement still runs, immediately.
    let counter = Arc::clone(&calls);
    batch.outcome().on_settled(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn settled_batch_leaves_no_listeners() {
    let fetcher = ManualFetcher::new();
    let members = resources(&fetcher, &["a.png", "b.png", "c.png"]);
    let batch = batch(&members, BatchOptions::new());
    batch.start();
    assert_eq!(listeners(&members), 6);

    fetcher.succeed("a.png");
    assert_eq!(listeners(&members), 4, "a.png detached once recorded");

    fetcher.fail("c.png", "gone");
    assert_eq!(listeners(&members), 0);
    fetcher.succeed("b.png");
    assert_eq!(batch.settled_count(), 2);
}

#[test]
fn synchronous_members_settle_inside_start() {
    use picload_resource::{FetchCompletion, ImageFetcher};

    struct Inline;
    impl ImageFetcher for Inline {
        fn fetch(&self, _uri: &str, done: FetchCompletion) {
            done.succeed();
        }
    }

    let fetcher: Arc<dyn ImageFetcher> = Arc::new(Inline);
    for mode in [StartMode::AllAtOnce, StartMode::Sequential] {
        let members: Vec<Arc<dyn Loadable>> = (0u64..3)
            .map(|id| {
                Resource::new(id, format!("{id}.png"), Arc::clone(&fetcher)) as Arc<dyn Loadable>
            })
            .collect();
        let batch = BatchCoordinator::new(members, BatchOptions::new().with_start_mode(mode));
        let outcome = batch.start();
        assert_eq!(outcome.peek().unwrap().unwrap().loaded_count(), 3, "{mode:?}");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn completes_from_other_threads() {
    use core::time::Duration;
    use picload_resource::{FetchCompletion, ImageFetcher};

    struct Spawned;
    impl ImageFetcher for Spawned {
        fn fetch(&self, uri: &str, done: FetchCompletion) {
            let fail = uri.starts_with("bad");
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(2)).await;
                if fail {
                    done.fail(LoadFailure::new("bad"));
                } else {
                    done.succeed();
                }
            });
        }
    }

    let fetcher: Arc<dyn ImageFetcher> = Arc::new(Spawned);
    let members = (0u64..32).map(|id| {
        let source = if id % 8 == 0 { format!("bad{id}.png") } else { format!("{id}.png") };
        Resource::new(id, source, Arc::clone(&fetcher))
    });
    let batch = BatchCoordinator::from_resources(members, BatchOptions::new().continue_on_error());

    let report = batch.start().await.unwrap();
    assert_eq!(report.len(), 32);
    assert_eq!(report.failed_count(), 4);
    assert_eq!(batch.settled_count(), 32);
}

proptest! {
    /// Any completion order yields the same per-member report.
    #[test]
    fn report_is_independent_of_completion_order(
        order in Just((0..6usize).collect::<Vec<_>>()).prop_shuffle(),
        failing in proptest::collection::vec(any::<bool>(), 6),
    ) {
        let fetcher = ManualFetcher::new();
        let sources: Vec<String> = (0..6).map(|i| format!("{i}.png")).collect();
        let refs: Vec<&str> = sources.iter().map(String::as_str).collect();
        let members = resources(&fetcher, &refs);
        let batch = batch(&members, BatchOptions::new().continue_on_error());
        let outcome = batch.start();

        for (step, &index) in order.iter().enumerate() {
            prop_assert!(!outcome.is_settled());
            if failing[index] {
                fetcher.fail(&sources[index], "nope");
            } else {
                fetcher.succeed(&sources[index]);
            }
            prop_assert_eq!(batch.settled_count(), step + 1);
        }

        let report = outcome.peek().unwrap().unwrap();
        for (index, entry) in report.entries.iter().enumerate() {
            prop_assert_eq!(&entry.member, &index.to_string());
            prop_assert_eq!(entry.outcome == MemberOutcome::Loaded, !failing[index]);
        }
    }
}
