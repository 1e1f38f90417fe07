//! Aggregate failure values.

use picload_events::ChannelError;
use picload_resource::LoadFailure;

/// Value a batch outcome is rejected with.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BatchError {
    /// A member failed under [`ErrorPolicy::FailFast`](crate::ErrorPolicy::FailFast).
    #[error("member `{member}` failed: {failure}")]
    MemberFailed {
        /// Label of the failing member.
        member: String,
        /// The member's failure.
        failure: LoadFailure,
    },

    /// The batch could not subscribe to a member's settlement.
    #[error("failed to observe batch member: {0}")]
    Subscription(#[from] ChannelError),
}

impl BatchError {
    /// Returns the member failure, if this error carries one.
    #[must_use]
    pub fn failure(&self) -> Option<&LoadFailure> {
        match self {
            Self::MemberFailed { failure, .. } => Some(failure),
            Self::Subscription(_) => None,
        }
    }
}
