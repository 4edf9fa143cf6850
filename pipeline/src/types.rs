//! Pipeline-specific types

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use shared::SearchQuery;

use crate::core::QueryPolicy;

/// Options used when opening a browser session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionOptions {
    /// Persistent profile directory holding the logged-in session
    pub profile_dir: PathBuf,
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
}

impl SessionOptions {
    pub fn new(profile_dir: impl Into<PathBuf>, headless: bool) -> Self {
        Self {
            profile_dir: profile_dir.into(),
            headless,
            viewport_width: 1920,
            viewport_height: 1080,
        }
    }
}

/// Handle to an open browser session
///
/// Not `Clone`: the session is released by moving the handle back into
/// [`crate::traits::BrowserDriver::close_session`].
#[derive(Debug, PartialEq, Eq)]
pub struct SessionHandle {
    pub id: String,
    pub headless: bool,
}

/// What a listing extraction reads from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingSource {
    Feed,
    Search(SearchQuery),
}

/// Which curation pass a rubric is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurationPass {
    /// First pass over the recommendation feed
    Feed,
    /// Second, stricter pass over search results
    Search,
}

/// Judging criteria handed to the classification service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rubric {
    pub pass: CurationPass,
    /// Who the content is being curated for
    pub audience: String,
    /// Optional subject standards document
    pub standards: Option<String>,
}

/// Input for query generation
#[derive(Debug, Clone, PartialEq)]
pub struct QueryContext {
    /// Titles of the feed items, used as current interest themes
    pub feed_titles: Vec<String>,
    pub rubric: Rubric,
    pub policy: QueryPolicy,
}
