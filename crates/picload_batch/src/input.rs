//! Inputs accepted by [`ResourceManager::add`](crate::ResourceManager::add)
//! and queries accepted by
//! [`ResourceManager::is_loaded`](crate::ResourceManager::is_loaded).

use picload_resource::{Resource, ResourceId};
use serde::Deserialize;

/// A source with an optional caller-chosen id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ResourceDescriptor {
    /// Id to register the resource under. Assigned automatically when absent.
    #[serde(default)]
    pub id: Option<ResourceId>,
    /// Source URI.
    #[serde(default, alias = "src")]
    pub source: Option<String>,
}

impl ResourceDescriptor {
    /// Creates a descriptor for `source` without an id.
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            id: None,
            source: Some(source.into()),
        }
    }

    /// Sets the id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<ResourceId>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// Anything `add` accepts: a bare source, a descriptor, or a nested group.
///
/// Deserializes from JSON strings, objects with `id`/`src` keys, and arrays:
///
/// ```
/// use picload_batch::ResourceInput;
///
/// let input = ResourceInput::from_json(r#"["a.png", {"id": "b", "src": "b.jpg"}, ["c.gif"]]"#)
///     .unwrap();
/// assert!(matches!(input, ResourceInput::Group(ref items) if items.len() == 3));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ResourceInput {
    /// A source URI.
    Source(String),
    /// Inputs flattened depth-first, in order.
    Group(Vec<ResourceInput>),
    /// A source with an optional id.
    // Tried after `Group`, since a struct also deserializes from a sequence.
    Descriptor(ResourceDescriptor),
}

impl ResourceInput {
    /// Builds a group from any collection of inputs.
    pub fn group<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ResourceInput>,
    {
        Self::Group(items.into_iter().map(Into::into).collect())
    }

    /// Parses an input from JSON.
    ///
    /// # Errors
    ///
    /// Returns the parse error for JSON that is not a string, descriptor
    /// object, or array of those.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl From<&str> for ResourceInput {
    fn from(source: &str) -> Self {
        Self::Source(source.to_string())
    }
}

impl From<String> for ResourceInput {
    fn from(source: String) -> Self {
        Self::Source(source)
    }
}

impl From<ResourceDescriptor> for ResourceInput {
    fn from(descriptor: ResourceDescriptor) -> Self {
        Self::Descriptor(descriptor)
    }
}

impl<T: Into<ResourceInput>> From<Vec<T>> for ResourceInput {
    fn from(items: Vec<T>) -> Self {
        Self::group(items)
    }
}

impl<T: Into<ResourceInput>, const N: usize> From<[T; N]> for ResourceInput {
    fn from(items: [T; N]) -> Self {
        Self::group(items)
    }
}

/// Identifies resources for a loaded check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceQuery {
    /// Match by id.
    Id(ResourceId),
    /// Match by source URI.
    Source(String),
    /// Match by the descriptor's id or by its source, whichever is set and
    /// equal. A descriptor with neither matches nothing.
    Descriptor(ResourceDescriptor),
}

impl ResourceQuery {
    /// Returns `true` if `resource` is one this query names.
    #[must_use]
    pub fn matches(&self, resource: &Resource) -> bool {
        match self {
            Self::Id(id) => resource.id() == id,
            Self::Source(source) => resource.source() == source,
            Self::Descriptor(ResourceDescriptor { id, source }) => {
                id.as_ref().is_some_and(|id| resource.id() == id)
                    || source.as_deref().is_some_and(|source| resource.source() == source)
            }
        }
    }
}

impl From<ResourceId> for ResourceQuery {
    fn from(id: ResourceId) -> Self {
        Self::Id(id)
    }
}

impl From<u64> for ResourceQuery {
    fn from(id: u64) -> Self {
        Self::Id(ResourceId::Number(id))
    }
}

/// Strings query by source.
impl From<&str> for ResourceQuery {
    fn from(source: &str) -> Self {
        Self::Source(source.to_string())
    }
}

impl From<String> for ResourceQuery {
    fn from(source: String) -> Self {
        Self::Source(source)
    }
}

impl From<ResourceDescriptor> for ResourceQuery {
    fn from(descriptor: ResourceDescriptor) -> Self {
        Self::Descriptor(descriptor)
    }
}
