//! Stage artifacts
//!
//! Every stage reads exactly one artifact (its predecessor's) and writes
//! exactly one. The feed-pass outcome is carried forward through the search
//! side so the compile stage can still reach it from its immediate input.

use serde::{de::DeserializeOwned, Serialize};

use crate::types::StageId;

pub mod actions;
pub mod feed;
pub mod search;

pub use actions::{ActionList, ActionOutcome, ActionSummary, ExecutionReport, ItemStatus};
pub use feed::{FeedCuration, FeedListing, FeedOutcome};
pub use search::{KindCounts, QueryResults, ReducedQuery, ReducedSearch, SearchCuration, SearchListing, SearchOutcome};

/// A typed document persisted at a stage boundary
pub trait Artifact: Serialize + DeserializeOwned + Send + Sync {
    /// Stage that writes this artifact
    const STAGE: StageId;
}

impl Artifact for FeedListing {
    const STAGE: StageId = StageId::ExtractFeed;
}

impl Artifact for FeedCuration {
    const STAGE: StageId = StageId::CurateFeed;
}

impl Artifact for SearchListing {
    const STAGE: StageId = StageId::ExtractSearch;
}

impl Artifact for ReducedSearch {
    const STAGE: StageId = StageId::Reduce;
}

impl Artifact for SearchCuration {
    const STAGE: StageId = StageId::CurateSearch;
}

impl Artifact for ActionList {
    const STAGE: StageId = StageId::Compile;
}

impl Artifact for ExecutionReport {
    const STAGE: StageId = StageId::Execute;
}
