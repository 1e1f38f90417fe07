//! Resource lifecycle driven by an asynchronous tokio fetcher.

use core::time::Duration;
use std::sync::{Arc, Mutex};

use picload_resource::{
    Deferred, FetchCompletion, ImageFetcher, LoadFailure, LoadState, Loadable, Resource,
    ResourceEvent,
};

/// Completes every fetch from a spawned task after a short delay. Sources
/// containing "broken" fail.
struct DelayedFetcher {
    delay: Duration,
}

impl ImageFetcher for DelayedFetcher {
    fn fetch(&self, uri: &str, done: FetchCompletion) {
        let delay = self.delay;
        let broken = uri.contains("broken");
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if broken {
                done.fail(LoadFailure::new("decode error"));
            } else {
                done.succeed();
            }
        });
    }
}

fn fetcher() -> Arc<dyn ImageFetcher> {
    Arc::new(DelayedFetcher {
        delay: Duration::from_millis(5),
    })
}

/// Records every state observed at each event, in order.
fn observe(resource: &Arc<Resource>) -> Arc<Mutex<Vec<(String, LoadState)>>> {
    let log = Arc::new(Mutex::new(Vec::new()));
    for name in ResourceEvent::NAMES {
        let log = Arc::clone(&log);
        let weak = Arc::downgrade(resource);
        resource
            .on(name, move |event| {
                let state = weak.upgrade().map(|r| r.state());
                if let Some(state) = state {
                    log.lock().unwrap().push((event.name().to_string(), state));
                }
            })
            .unwrap();
    }
    log
}

/// Resolves once the resource emits a terminal event.
fn settled(resource: &Resource) -> Deferred<(), LoadFailure> {
    let deferred = Deferred::new();
    let producer = deferred.clone();
    resource
        .on_settle(Arc::new(move |settlement| {
            producer.settle(settlement.clone());
        }))
        .unwrap();
    deferred
}

#[tokio::test]
async fn load_returns_before_fetch_completes() {
    let resource = Resource::new(1u64, "a.png", fetcher());
    let done = settled(&resource);

    resource.load();
    assert!(resource.is_loading(), "load must not block on the fetch");

    assert_eq!(done.outcome().await, Ok(()));
    assert!(resource.is_loaded());
}

#[tokio::test]
async fn states_move_forward_only() {
    let resource = Resource::new(1u64, "a.png", fetcher());
    let log = observe(&resource);
    let done = settled(&resource);

    assert_eq!(resource.state(), LoadState::Pending);
    resource.load();
    done.outcome().await.unwrap();

    assert_eq!(
        *log.lock().unwrap(),
        vec![
            ("loading".to_string(), LoadState::Loading),
            ("loaded".to_string(), LoadState::Loaded),
        ]
    );
}

#[tokio::test]
async fn failure_is_reported_once_and_not_retried() {
    let resource = Resource::new("bad", "broken.png", fetcher());
    let log = observe(&resource);
    let done = settled(&resource);

    resource.load();
    let result = done.outcome().await;
    assert_eq!(result, Err(LoadFailure::new("decode error")));

    // A second load on a terminal resource does nothing.
    resource.load();
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert!(resource.is_error());
    let log = log.lock().unwrap();
    assert_eq!(log.len(), 2);
    assert_eq!(log[1], ("error".to_string(), LoadState::Failed));
}

#[tokio::test]
async fn many_resources_each_fire_one_terminal_event() {
    let sources = ["a.png", "broken.jpg", "c.gif", "broken.jpeg", "e.png"];
    let resources: Vec<_> = sources
        .iter()
        .enumerate()
        .map(|(index, source)| Resource::new(index as u64, *source, fetcher()))
        .collect();

    let terminal_events = Arc::new(Mutex::new(Vec::new()));
    let mut waits = Vec::new();
    for resource in &resources {
        let events = Arc::clone(&terminal_events);
        let label = resource.label();
        resource
            .on_settle(Arc::new(move |_| events.lock().unwrap().push(label.clone())))
            .unwrap();
        waits.push(settled(resource).outcome());
        resource.load();
    }

    for wait in waits {
        let _ = wait.await;
    }

    let mut events = terminal_events.lock().unwrap().clone();
    events.sort();
    assert_eq!(events, vec!["0", "1", "2", "3", "4"]);
    assert_eq!(
        resources.iter().filter(|r| r.is_error()).count(),
        2,
        "two broken sources"
    );
}
