//! Per-member results of a resolved batch.

use picload_resource::{LoadFailure, Settlement};
use serde::{Deserialize, Serialize};

/// Terminal result of one member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MemberOutcome {
    /// The member loaded.
    Loaded,
    /// The member failed.
    Failed {
        /// Failure detail.
        failure: LoadFailure,
    },
}

impl From<Settlement> for MemberOutcome {
    fn from(settlement: Settlement) -> Self {
        match settlement {
            Ok(()) => Self::Loaded,
            Err(failure) => Self::Failed { failure },
        }
    }
}

/// One row of a [`BatchReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberReport {
    /// Member label (a resource's id).
    pub member: String,
    /// How the member ended.
    pub outcome: MemberOutcome,
}

/// Success value of a batch: one entry per member, in member order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    /// Member results.
    pub entries: Vec<MemberReport>,
}

impl BatchReport {
    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` for a batch without members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of members that loaded.
    #[must_use]
    pub fn loaded_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.outcome == MemberOutcome::Loaded)
            .count()
    }

    /// Number of members that failed.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.len() - self.loaded_count()
    }

    /// Iterates over failed members and their failures.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &LoadFailure)> {
        self.entries.iter().filter_map(|entry| match &entry.outcome {
            MemberOutcome::Failed { failure } => Some((entry.member.as_str(), failure)),
            MemberOutcome::Loaded => None,
        })
    }

    /// Returns `true` when every member loaded.
    #[must_use]
    pub fn all_loaded(&self) -> bool {
        self.failed_count() == 0
    }
}
