//! # picload Internal Library
//!
//! Re-exports the core picload crates for convenience.

/// Layer 0: Publish/subscribe event channels.
pub use picload_events;

/// Layer 1: Resource lifecycle, fetch port and settlement.
pub use picload_resource;

/// Layer 2: Batch coordination and resource collections.
pub use picload_batch;

/// Tracing subscriber setup.
#[cfg(feature = "telemetry")]
pub use picload_telemetry;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use picload_batch::{
        BatchCoordinator, BatchError, BatchOptions, BatchPhase, BatchReport, ErrorPolicy,
        MemberOutcome, ResourceDescriptor, ResourceInput, ResourceManager, ResourceQuery,
        StartMode,
    };
    pub use picload_events::{ChannelError, EventChannel, ListenerId};
    pub use picload_resource::{
        FetchCompletion, ImageFetcher, LoadFailure, LoadState, Loadable, Outcome, Resource,
        ResourceEvent, ResourceId, SettleToken, supported_format,
    };

    #[cfg(feature = "telemetry")]
    pub use picload_telemetry::{TracingConfig, TracingFormat};
}
