//! Shared types for the feed curation pipeline
//!
//! Contains the records and stage artifacts exchanged between the pipeline
//! stages, the artifact store that persists them, and the logging setup used
//! by both the orchestrator and the stage processes.

pub mod artifacts;
pub mod errors;
pub mod logging;
pub mod store;
pub mod types;

pub use errors::*;
pub use store::ArtifactStore;
pub use types::*;

// Re-export stage artifacts
pub use artifacts::{
    // Feed side
    FeedCuration, FeedListing, FeedOutcome,

    // Search side
    KindCounts, QueryResults, ReducedQuery, ReducedSearch, SearchCuration, SearchListing, SearchOutcome,

    // Actions
    ActionList, ActionOutcome, ActionSummary, ExecutionReport, ItemStatus,

    // Persistence contract
    Artifact,
};
