//! The [`ResourceManager`] collection.

use core::fmt;
use std::sync::Arc;

use picload_resource::{Deferred, ImageFetcher, Outcome, Resource, ResourceId, supported_format};

use crate::coordinator::BatchCoordinator;
use crate::error::BatchError;
use crate::input::{ResourceDescriptor, ResourceInput, ResourceQuery};
use crate::options::BatchOptions;

/// An ordered collection of image resources sharing one fetcher.
///
/// Insertion order is load order. Resources are never deduplicated: adding
/// the same source twice loads it twice.
pub struct ResourceManager {
    fetcher: Arc<dyn ImageFetcher>,
    resources: Vec<Arc<Resource>>,
    next_id: u64,
}

impl ResourceManager {
    /// Creates an empty manager whose resources load through `fetcher`.
    #[must_use]
    pub fn new(fetcher: Arc<dyn ImageFetcher>) -> Self {
        Self {
            fetcher,
            resources: Vec::new(),
            next_id: 0,
        }
    }

    /// Appends resources, flattening groups depth-first.
    ///
    /// Inputs without a source or with an unsupported image extension are
    /// dropped. Inputs without an id receive the next number from this
    /// manager's counter.
    ///
    /// ```
    /// # use std::sync::Arc;
    /// # use picload_batch::{ResourceDescriptor, ResourceInput, ResourceManager};
    /// # use picload_resource::{FetchCompletion, ImageFetcher};
    /// # struct Noop;
    /// # impl ImageFetcher for Noop { fn fetch(&self, _: &str, done: FetchCompletion) { done.succeed() } }
    /// let mut manager = ResourceManager::new(Arc::new(Noop));
    /// manager
    ///     .add(["a.png", "notes.txt"])
    ///     .add([ResourceInput::from(ResourceDescriptor::new("b.jpg").with_id("hero"))]);
    /// assert_eq!(manager.len(), 2);
    /// ```
    pub fn add<I, T>(&mut self, items: I) -> &mut Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ResourceInput>,
    {
        for item in items {
            self.add_input(item.into());
        }
        self
    }

    fn add_input(&mut self, input: ResourceInput) {
        match input {
            ResourceInput::Group(items) => {
                for item in items {
                    self.add_input(item);
                }
            }
            ResourceInput::Source(source) => self.insert(None, source),
            ResourceInput::Descriptor(ResourceDescriptor {
                id,
                source: Some(source),
            }) => self.insert(id, source),
            ResourceInput::Descriptor(ResourceDescriptor { id, source: None }) => {
                tracing::debug!(?id, "dropping resource without a source");
            }
        }
    }

    fn insert(&mut self, id: Option<ResourceId>, source: String) {
        if !supported_format(&source) {
            tracing::debug!(%source, "dropping unsupported image format");
            return;
        }
        let id = id.unwrap_or_else(|| {
            let id = ResourceId::Number(self.next_id);
            self.next_id += 1;
            id
        });
        tracing::trace!(%id, %source, "resource added");
        let resource = Resource::new(id, source, Arc::clone(&self.fetcher));
        self.resources.push(resource);
    }

    /// Loads every resource and resolves once each one is loaded or failed.
    ///
    /// Resolves with the members that were part of this load, in order. An
    /// empty manager resolves immediately without touching the fetcher.
    /// Resources added after this call are not part of it.
    pub fn load(&self) -> Outcome<Vec<Arc<Resource>>, BatchError> {
        if self.resources.is_empty() {
            return Outcome::resolved(Vec::new());
        }

        let members = self.resources.clone();
        let deferred = Deferred::new();
        let outcome = deferred.outcome();

        let batch = BatchCoordinator::from_resources(
            members.iter().cloned(),
            BatchOptions::new().continue_on_error(),
        );
        batch.start().on_settled(move |result| {
            deferred.settle(result.clone().map(|_| members));
        });
        outcome
    }

    /// Returns `true` if the first resource matching `query` has loaded.
    ///
    /// Unmatched queries, including descriptors with neither id nor source,
    /// return `false`.
    #[must_use]
    pub fn is_loaded(&self, query: impl Into<ResourceQuery>) -> bool {
        self.get(query).is_some_and(|resource| resource.is_loaded())
    }

    /// Returns the first resource matching `query`.
    #[must_use]
    pub fn get(&self, query: impl Into<ResourceQuery>) -> Option<&Arc<Resource>> {
        let query = query.into();
        self.resources.iter().find(|resource| query.matches(resource))
    }

    /// All resources in insertion order.
    #[must_use]
    pub fn resources(&self) -> &[Arc<Resource>] {
        &self.resources
    }

    /// Number of resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Returns `true` when no resource has been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Creates an unstarted batch over the current resources.
    #[must_use]
    pub fn batch(&self, options: BatchOptions) -> BatchCoordinator {
        BatchCoordinator::from_resources(self.resources.iter().cloned(), options)
    }
}

impl fmt::Debug for ResourceManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceManager")
            .field("resources", &self.resources)
            .field("next_id", &self.next_id)
            .finish_non_exhaustive()
    }
}
