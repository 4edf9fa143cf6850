//! Pipeline trait definitions for dependency injection

use async_trait::async_trait;

use shared::{ActionItem, CuratorVerdict, ReactionState, SearchQuery, VideoRecord};
use crate::error::PipelineResult;
use crate::types::{ListingSource, QueryContext, Rubric, SessionHandle, SessionOptions};

/// Browser session lifecycle
#[mockall::automock]
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    /// Open a session with the persistent profile
    async fn open_session(&self, options: &SessionOptions) -> PipelineResult<SessionHandle>;

    /// Release a session; the handle is consumed
    async fn close_session(&self, session: SessionHandle) -> PipelineResult<()>;
}

/// Reads the feed or a search results page
#[mockall::automock]
#[async_trait]
pub trait ListingExtractor: Send + Sync {
    /// Records rendered for `source`, promoted placements already excluded
    async fn extract(&self, session: &SessionHandle, source: &ListingSource) -> PipelineResult<Vec<VideoRecord>>;
}

/// Per-item reaction controls
#[mockall::automock]
#[async_trait]
pub trait ReactionController: Send + Sync {
    async fn navigate(&self, session: &SessionHandle, url: &str) -> PipelineResult<()>;

    /// Reaction currently shown for the page at `url`
    async fn get_reaction_state(&self, session: &SessionHandle, url: &str) -> PipelineResult<ReactionState>;

    /// Click the control for `item.action`
    async fn apply_reaction(&self, session: &SessionHandle, item: &ActionItem) -> PipelineResult<()>;

    /// PNG bytes of the current page
    async fn capture_screenshot(&self, session: &SessionHandle) -> PipelineResult<Vec<u8>>;
}

/// External judge of educational value
#[mockall::automock]
#[async_trait]
pub trait ClassificationService: Send + Sync {
    /// Model identifier recorded in curation artifacts
    fn model(&self) -> String;

    /// One verdict per record of `batch`
    async fn evaluate(&self, batch: &[VideoRecord], rubric: &Rubric) -> PipelineResult<Vec<CuratorVerdict>>;

    /// Candidate search queries; the curator enforces the policy
    async fn propose_queries(&self, context: &QueryContext) -> PipelineResult<Vec<SearchQuery>>;
}
