//! Core types used throughout the pipeline

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

mod records;

pub use records::{video_id_from_url, ActionItem, CuratorVerdict, QueryConstraint, SearchQuery, VideoRecord};

/// Global process ID singleton - set once at startup
static PROCESS_ID: OnceLock<ProcessId> = OnceLock::new();

/// Fallback for code running outside one of the binaries (tests, embedding)
static LIBRARY: ProcessId = ProcessId::Library;

/// Process identifier for any component in the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessId {
    /// Orchestrator process (singleton)
    Orchestrator,
    /// A stage process launched by the orchestrator or by hand
    Stage(StageId),
    /// Not initialised by a binary
    Library,
}

impl ProcessId {
    /// Initialize the global process ID for the orchestrator
    pub fn init_orchestrator() -> &'static ProcessId {
        PROCESS_ID.get_or_init(|| ProcessId::Orchestrator)
    }

    /// Initialize the global process ID for a stage process
    pub fn init_stage(stage: StageId) -> &'static ProcessId {
        PROCESS_ID.get_or_init(|| ProcessId::Stage(stage))
    }

    /// Get the global process ID
    pub fn current() -> &'static ProcessId {
        PROCESS_ID.get().unwrap_or(&LIBRARY)
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessId::Orchestrator => write!(f, "orchestrator"),
            ProcessId::Stage(stage) => write!(f, "stage_{stage}"),
            ProcessId::Library => write!(f, "library"),
        }
    }
}

/// Pipeline stages in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StageId {
    ExtractFeed,
    CurateFeed,
    ExtractSearch,
    Reduce,
    CurateSearch,
    Compile,
    Execute,
}

impl StageId {
    /// Every stage, in the order a run executes them
    pub const ALL: [StageId; 7] = [
        StageId::ExtractFeed,
        StageId::CurateFeed,
        StageId::ExtractSearch,
        StageId::Reduce,
        StageId::CurateSearch,
        StageId::Compile,
        StageId::Execute,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StageId::ExtractFeed => "extract-feed",
            StageId::CurateFeed => "curate-feed",
            StageId::ExtractSearch => "extract-search",
            StageId::Reduce => "reduce",
            StageId::CurateSearch => "curate-search",
            StageId::Compile => "compile",
            StageId::Execute => "execute",
        }
    }

    /// File name of the artifact this stage writes
    pub fn artifact_file(&self) -> &'static str {
        match self {
            StageId::ExtractFeed => "feed_listing.json",
            StageId::CurateFeed => "feed_curation.json",
            StageId::ExtractSearch => "search_listing.json",
            StageId::Reduce => "search_reduced.json",
            StageId::CurateSearch => "search_curation.json",
            StageId::Compile => "action_list.json",
            StageId::Execute => "action_report.json",
        }
    }

    /// Zero-based position in the run order
    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|s| s == self).unwrap_or_default()
    }

    pub fn description(&self) -> &'static str {
        match self {
            StageId::ExtractFeed => "Extract recommendation feed",
            StageId::CurateFeed => "Curate feed and propose search queries",
            StageId::ExtractSearch => "Search for proposed queries",
            StageId::Reduce => "Reduce search results",
            StageId::CurateSearch => "Curate search results",
            StageId::Compile => "Compile action list",
            StageId::Execute => "Execute actions",
        }
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StageId {
    type Err = crate::SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('_', "-");
        Self::ALL
            .iter()
            .copied()
            .find(|stage| stage.as_str() == wanted)
            .ok_or_else(|| crate::SharedError::InvalidStage { input: s.to_string() })
    }
}

/// Listing format of an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoKind {
    Video,
    Short,
}

impl fmt::Display for VideoKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VideoKind::Video => write!(f, "video"),
            VideoKind::Short => write!(f, "short"),
        }
    }
}

/// Where a record was extracted from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Feed,
    Search,
}

/// Category of a generated search query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryCategory {
    Math,
    Curiosity,
}

impl fmt::Display for QueryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryCategory::Math => write!(f, "math"),
            QueryCategory::Curiosity => write!(f, "curiosity"),
        }
    }
}

/// Feedback action on a single item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Like,
    Dislike,
}

impl Action {
    /// Reaction state the platform shows once this action took effect
    pub fn desired_state(&self) -> ReactionState {
        match self {
            Action::Like => ReactionState::Liked,
            Action::Dislike => ReactionState::Disliked,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Like => write!(f, "like"),
            Action::Dislike => write!(f, "dislike"),
        }
    }
}

/// Reaction currently shown by the platform for an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionState {
    Liked,
    Disliked,
    Neutral,
}

impl fmt::Display for ReactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReactionState::Liked => write!(f, "liked"),
            ReactionState::Disliked => write!(f, "disliked"),
            ReactionState::Neutral => write!(f, "neutral"),
        }
    }
}
