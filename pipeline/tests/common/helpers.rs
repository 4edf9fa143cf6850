//! Test helpers: an in-memory platform and store setup

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use pipeline::{
    BrowserDriver, ListingExtractor, ListingSource, PipelineError, PipelineResult, ReactionController,
    SessionHandle, SessionOptions,
};
use shared::{ActionItem, ArtifactStore, ReactionState, VideoRecord};
use tempfile::TempDir;

/// In-memory stand-in for the browser sidecar
///
/// Reaction buttons set the state they name, searches return the configured
/// records, and every open and close is counted.
#[derive(Default)]
pub struct FakePlatform {
    pub feed: Vec<VideoRecord>,
    pub searches: HashMap<String, Vec<VideoRecord>>,
    pub failing_queries: HashSet<String>,
    pub fail_feed: bool,
    pub fail_close: bool,
    pub states: Mutex<HashMap<String, ReactionState>>,
    pub opened: AtomicUsize,
    pub closed: AtomicUsize,
    pub clicks: AtomicUsize,
}

impl FakePlatform {
    pub fn with_feed(feed: Vec<VideoRecord>) -> Self {
        Self {
            feed,
            ..Default::default()
        }
    }

    pub fn state_of(&self, url: &str) -> ReactionState {
        self.states
            .lock()
            .unwrap()
            .get(url)
            .copied()
            .unwrap_or(ReactionState::Neutral)
    }

    pub fn sessions_balanced(&self) -> bool {
        self.opened.load(Ordering::SeqCst) == self.closed.load(Ordering::SeqCst)
    }

    pub fn click_count(&self) -> usize {
        self.clicks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BrowserDriver for FakePlatform {
    async fn open_session(&self, options: &SessionOptions) -> PipelineResult<SessionHandle> {
        let n = self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(SessionHandle {
            id: format!("fake-{n}"),
            headless: options.headless,
        })
    }

    async fn close_session(&self, _session: SessionHandle) -> PipelineResult<()> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        if self.fail_close {
            return Err(PipelineError::collaborator("close_session", "browser refused to exit"));
        }
        Ok(())
    }
}

#[async_trait]
impl ListingExtractor for FakePlatform {
    async fn extract(&self, _session: &SessionHandle, source: &ListingSource) -> PipelineResult<Vec<VideoRecord>> {
        match source {
            ListingSource::Feed if self.fail_feed => Err(PipelineError::collaborator("extract", "feed did not render")),
            ListingSource::Feed => Ok(self.feed.clone()),
            ListingSource::Search(query) if self.failing_queries.contains(&query.text) => {
                Err(PipelineError::collaborator("extract", format!("search '{}' timed out", query.text)))
            }
            ListingSource::Search(query) => Ok(self.searches.get(&query.text).cloned().unwrap_or_default()),
        }
    }
}

#[async_trait]
impl ReactionController for FakePlatform {
    async fn navigate(&self, _session: &SessionHandle, _url: &str) -> PipelineResult<()> {
        Ok(())
    }

    async fn get_reaction_state(&self, _session: &SessionHandle, url: &str) -> PipelineResult<ReactionState> {
        Ok(self.state_of(url))
    }

    async fn apply_reaction(&self, _session: &SessionHandle, item: &ActionItem) -> PipelineResult<()> {
        self.clicks.fetch_add(1, Ordering::SeqCst);
        self.states
            .lock()
            .unwrap()
            .insert(item.url.clone(), item.action.desired_state());
        Ok(())
    }

    async fn capture_screenshot(&self, _session: &SessionHandle) -> PipelineResult<Vec<u8>> {
        Ok(b"\x89PNG\r\n".to_vec())
    }
}

pub struct TestHelpers;

impl TestHelpers {
    /// Temporary work directory and a store rooted in it
    pub fn temp_store() -> (TempDir, ArtifactStore) {
        let temp = TempDir::new().unwrap();
        let store = ArtifactStore::new(temp.path());
        (temp, store)
    }

    pub fn session() -> SessionHandle {
        SessionHandle {
            id: "test-session".to_string(),
            headless: true,
        }
    }

    pub fn session_options(temp: &TempDir) -> SessionOptions {
        SessionOptions::new(temp.path().join("profile"), true)
    }
}
