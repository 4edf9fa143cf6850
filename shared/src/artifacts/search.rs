//! Search-side artifacts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::feed::FeedOutcome;
use crate::types::{CuratorVerdict, SearchQuery, VideoRecord};

/// Everything one search query returned
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResults {
    pub query: SearchQuery,
    #[serde(default)]
    pub videos: Vec<VideoRecord>,
    #[serde(default)]
    pub shorts: Vec<VideoRecord>,
    /// Extraction error for this query, if the search failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Output of the search extraction stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchListing {
    pub searched_at: DateTime<Utc>,
    pub searches: Vec<QueryResults>,
    #[serde(default)]
    pub feed: FeedOutcome,
}

/// Per-kind record counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindCounts {
    pub videos: usize,
    pub shorts: usize,
}

impl KindCounts {
    pub fn total(&self) -> usize {
        self.videos + self.shorts
    }
}

/// Sampled subset of one query's results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReducedQuery {
    pub query: SearchQuery,
    pub original_counts: KindCounts,
    #[serde(default)]
    pub videos: Vec<VideoRecord>,
    #[serde(default)]
    pub shorts: Vec<VideoRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReducedQuery {
    pub fn reduced_counts(&self) -> KindCounts {
        KindCounts {
            videos: self.videos.len(),
            shorts: self.shorts.len(),
        }
    }
}

/// Output of the reducer stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReducedSearch {
    pub reduced_at: DateTime<Utc>,
    pub quota_per_kind: usize,
    pub searches: Vec<ReducedQuery>,
    #[serde(default)]
    pub feed: FeedOutcome,
}

impl ReducedSearch {
    /// All kept records, query by query, videos before shorts
    pub fn records(&self) -> Vec<VideoRecord> {
        self.searches
            .iter()
            .flat_map(|s| s.videos.iter().chain(s.shorts.iter()))
            .cloned()
            .collect()
    }
}

/// Search records together with their pass-2 verdicts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    #[serde(default)]
    pub records: Vec<VideoRecord>,
    #[serde(default)]
    pub verdicts: Vec<CuratorVerdict>,
}

/// Output of the search curation pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchCuration {
    pub analyzed_at: DateTime<Utc>,
    pub model: String,
    pub outcome: SearchOutcome,
    #[serde(default)]
    pub feed: FeedOutcome,
}
