//! Action list and execution report

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::types::{Action, ActionItem, ReactionState, VideoKind};

/// Counts describing a compiled action list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionSummary {
    pub videos_to_dislike: usize,
    pub shorts_to_dislike: usize,
    pub videos_to_like: usize,
    pub shorts_to_like: usize,
    /// Size of the liked search pools the likes were sampled from
    pub liked_videos_available: usize,
    pub liked_shorts_available: usize,
}

impl ActionSummary {
    pub fn total_to_dislike(&self) -> usize {
        self.videos_to_dislike + self.shorts_to_dislike
    }

    pub fn total_to_like(&self) -> usize {
        self.videos_to_like + self.shorts_to_like
    }
}

/// Output of the compile stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionList {
    pub created_at: DateTime<Utc>,
    pub summary: ActionSummary,
    pub actions: Vec<ActionItem>,
}

impl ActionList {
    pub fn new(actions: Vec<ActionItem>, liked_videos_available: usize, liked_shorts_available: usize) -> Self {
        let count = |action: Action, kind: VideoKind| {
            actions
                .iter()
                .filter(|item| item.action == action && item.kind == kind)
                .count()
        };
        let summary = ActionSummary {
            videos_to_dislike: count(Action::Dislike, VideoKind::Video),
            shorts_to_dislike: count(Action::Dislike, VideoKind::Short),
            videos_to_like: count(Action::Like, VideoKind::Video),
            shorts_to_like: count(Action::Like, VideoKind::Short),
            liked_videos_available,
            liked_shorts_available,
        };
        Self {
            created_at: Utc::now(),
            summary,
            actions,
        }
    }
}

/// Executor state of one action item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Pending,
    StateChecked,
    Skipped,
    Applied,
    Failed,
}

/// Auditable result for one action item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionOutcome {
    /// One-based position in the executed batch
    pub index: usize,
    pub item: ActionItem,
    pub status: ItemStatus,
    pub observed_before: Option<ReactionState>,
    pub observed_after: Option<ReactionState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<PathBuf>,
}

/// Output of the execute stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub executed_at: DateTime<Utc>,
    pub debug: bool,
    pub outcomes: Vec<ActionOutcome>,
}

impl ExecutionReport {
    pub fn count(&self, status: ItemStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }
}
