//! Records flowing between the pipeline stages

use serde::{Deserialize, Serialize};
use url::Url;

use super::{Action, QueryCategory, Source, VideoKind};

const PLATFORM_ORIGIN: &str = "https://www.youtube.com";

/// Extract the platform video id from a watch or shorts URL.
///
/// Relative links (`/watch?v=...`, `/shorts/...`) are resolved against the
/// platform origin, which is how listing anchors are usually emitted.
pub fn video_id_from_url(raw: &str) -> Option<String> {
    parse_video_url(raw).map(|(id, _)| id)
}

/// Video id plus the canonical absolute URL for it
fn parse_video_url(raw: &str) -> Option<(String, String)> {
    let base = Url::parse(PLATFORM_ORIGIN).ok()?;
    let url = base.join(raw.trim()).ok()?;

    let (id, canonical_path) = if url.path() == "/watch" {
        let id = url.query_pairs().find(|(k, _)| k == "v").map(|(_, v)| v.into_owned())?;
        let path = format!("/watch?v={id}");
        (id, path)
    } else {
        let mut segments = url.path_segments()?;
        match segments.next() {
            Some("shorts") => {
                let id = segments.next()?.to_string();
                let path = format!("/shorts/{id}");
                (id, path)
            }
            _ => return None,
        }
    };

    let valid = !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    valid.then(|| (id, format!("{PLATFORM_ORIGIN}{canonical_path}")))
}

/// A single video or short as seen on a listing page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub id: String,
    pub url: String,
    pub title: String,
    pub kind: VideoKind,
    pub source: Source,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub sponsored: bool,
}

impl VideoRecord {
    /// Build a record from a listing entry; `None` when the URL carries no video id.
    ///
    /// The URL is stored in canonical absolute form, so the same video always
    /// compares equal regardless of extra query parameters.
    pub fn from_listing(
        url: &str,
        title: &str,
        kind: VideoKind,
        source: Source,
        query: Option<&str>,
        sponsored: bool,
    ) -> Option<Self> {
        let (id, url) = parse_video_url(url)?;
        Some(Self {
            id,
            url,
            title: title.trim().to_string(),
            kind,
            source,
            query: query.map(str::to_string),
            sponsored,
        })
    }
}

/// Extra requirement a generated query was selected for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum QueryConstraint {
    ContainsKeyword(String),
}

/// Search query proposed by the feed pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub text: String,
    pub category: QueryCategory,
    #[serde(default)]
    pub constraints: Vec<QueryConstraint>,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>, category: QueryCategory) -> Self {
        Self {
            text: text.into(),
            category,
            constraints: Vec::new(),
        }
    }
}

/// Classification result for one record in one pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CuratorVerdict {
    pub record_id: String,
    pub like: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
}

/// One desired feedback operation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActionItem {
    pub url: String,
    pub kind: VideoKind,
    pub action: Action,
}

impl ActionItem {
    /// Identity used for screenshots and logs
    pub fn video_id(&self) -> String {
        video_id_from_url(&self.url).unwrap_or_else(|| "unknown".to_string())
    }
}
