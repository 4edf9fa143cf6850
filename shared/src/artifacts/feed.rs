//! Feed-side artifacts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{CuratorVerdict, SearchQuery, VideoKind, VideoRecord};

/// Raw recommendation feed, split by kind
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedListing {
    pub extracted_at: DateTime<Utc>,
    #[serde(default)]
    pub videos: Vec<VideoRecord>,
    #[serde(default)]
    pub shorts: Vec<VideoRecord>,
}

impl FeedListing {
    /// Partition extracted records by kind
    pub fn from_records(records: Vec<VideoRecord>) -> Self {
        let (videos, shorts) = records.into_iter().partition(|r| r.kind == VideoKind::Video);
        Self {
            extracted_at: Utc::now(),
            videos,
            shorts,
        }
    }

    /// Videos followed by shorts
    pub fn records(&self) -> Vec<VideoRecord> {
        self.videos.iter().chain(self.shorts.iter()).cloned().collect()
    }

    pub fn total(&self) -> usize {
        self.videos.len() + self.shorts.len()
    }
}

/// Feed records together with their pass-1 verdicts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedOutcome {
    #[serde(default)]
    pub records: Vec<VideoRecord>,
    #[serde(default)]
    pub verdicts: Vec<CuratorVerdict>,
}

/// Output of the feed curation pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedCuration {
    pub analyzed_at: DateTime<Utc>,
    pub model: String,
    pub outcome: FeedOutcome,
    pub queries: Vec<SearchQuery>,
}
