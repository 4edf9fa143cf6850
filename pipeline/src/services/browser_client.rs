//! HTTP client for the browser-automation sidecar
//!
//! The sidecar owns the real browser and the persistent profile. Routes:
//!
//! - `POST   /sessions` `{profile_dir, headless, viewport}` -> `{session_id}`
//! - `DELETE /sessions/{id}`
//! - `POST   /sessions/{id}/listing` `{source: "feed"}` or `{source: "search", query}` -> `{items: [...]}`
//! - `POST   /sessions/{id}/navigate` `{url}`
//! - `GET    /sessions/{id}/reaction?url=...` -> `{state}`
//! - `POST   /sessions/{id}/reaction` `{url, action}`
//! - `GET    /sessions/{id}/screenshot` -> PNG bytes

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use shared::{process_debug, ActionItem, ProcessId, ReactionState, Source, VideoKind, VideoRecord};

use crate::error::{PipelineError, PipelineResult};
use crate::traits::{BrowserDriver, ListingExtractor, ReactionController};
use crate::types::{ListingSource, SessionHandle, SessionOptions};

#[derive(Debug, Deserialize)]
struct SessionResponse {
    session_id: String,
}

#[derive(Debug, Deserialize)]
struct ListingItem {
    url: String,
    #[serde(default)]
    title: String,
    kind: VideoKind,
    #[serde(default)]
    sponsored: bool,
    #[serde(default)]
    promoted: bool,
}

#[derive(Debug, Deserialize)]
struct ListingResponse {
    #[serde(default)]
    items: Vec<ListingItem>,
}

#[derive(Debug, Deserialize)]
struct ReactionResponse {
    state: ReactionState,
}

/// Browser sidecar client implementing every browser seam
pub struct HttpBrowserClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBrowserClient {
    pub fn new(base_url: &str, timeout: Duration) -> PipelineResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PipelineError::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn session_url(&self, session: &SessionHandle, path: &str) -> String {
        format!("{}/sessions/{}{}", self.base_url, session.id, path)
    }

    async fn send(&self, operation: &str, request: reqwest::RequestBuilder) -> PipelineResult<reqwest::Response> {
        let resp = request
            .send()
            .await
            .map_err(|e| PipelineError::collaborator(operation, e))?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(PipelineError::collaborator(
                operation,
                format!("HTTP {}: {}", status.as_u16(), message),
            ));
        }
        Ok(resp)
    }

    async fn send_json<T: for<'de> Deserialize<'de>>(
        &self,
        operation: &str,
        request: reqwest::RequestBuilder,
    ) -> PipelineResult<T> {
        self.send(operation, request)
            .await?
            .json()
            .await
            .map_err(|e| PipelineError::collaborator(operation, format!("invalid response: {e}")))
    }
}

#[async_trait]
impl BrowserDriver for HttpBrowserClient {
    async fn open_session(&self, options: &SessionOptions) -> PipelineResult<SessionHandle> {
        let body = json!({
            "profile_dir": options.profile_dir,
            "headless": options.headless,
            "viewport": { "width": options.viewport_width, "height": options.viewport_height },
        });
        let request = self.client.post(format!("{}/sessions", self.base_url)).json(&body);
        let resp: SessionResponse = self.send_json("open_session", request).await?;

        process_debug!(ProcessId::current(), "Opened browser session {}", resp.session_id);
        Ok(SessionHandle {
            id: resp.session_id,
            headless: options.headless,
        })
    }

    async fn close_session(&self, session: SessionHandle) -> PipelineResult<()> {
        let request = self.client.delete(self.session_url(&session, ""));
        self.send("close_session", request).await?;
        process_debug!(ProcessId::current(), "Closed browser session {}", session.id);
        Ok(())
    }
}

#[async_trait]
impl ListingExtractor for HttpBrowserClient {
    async fn extract(&self, session: &SessionHandle, source: &ListingSource) -> PipelineResult<Vec<VideoRecord>> {
        let (body, origin, query) = match source {
            ListingSource::Feed => (json!({ "source": "feed" }), Source::Feed, None),
            ListingSource::Search(q) => (
                json!({ "source": "search", "query": q.text }),
                Source::Search,
                Some(q.text.as_str()),
            ),
        };

        let request = self.client.post(self.session_url(session, "/listing")).json(&body);
        let resp: ListingResponse = self.send_json("extract", request).await?;
        let returned = resp.items.len();

        let mut seen = HashSet::new();
        let records: Vec<VideoRecord> = resp
            .items
            .into_iter()
            .filter(|item| !item.promoted)
            .filter_map(|item| VideoRecord::from_listing(&item.url, &item.title, item.kind, origin, query, item.sponsored))
            .filter(|record| seen.insert(record.url.clone()))
            .collect();

        process_debug!(
            ProcessId::current(),
            "Listing returned {} items, kept {}",
            returned,
            records.len()
        );
        Ok(records)
    }
}

#[async_trait]
impl ReactionController for HttpBrowserClient {
    async fn navigate(&self, session: &SessionHandle, url: &str) -> PipelineResult<()> {
        let request = self
            .client
            .post(self.session_url(session, "/navigate"))
            .json(&json!({ "url": url }));
        self.send("navigate", request).await?;
        Ok(())
    }

    async fn get_reaction_state(&self, session: &SessionHandle, url: &str) -> PipelineResult<ReactionState> {
        let request = self
            .client
            .get(self.session_url(session, "/reaction"))
            .query(&[("url", url)]);
        let resp: ReactionResponse = self.send_json("get_reaction_state", request).await?;
        Ok(resp.state)
    }

    async fn apply_reaction(&self, session: &SessionHandle, item: &ActionItem) -> PipelineResult<()> {
        let request = self
            .client
            .post(self.session_url(session, "/reaction"))
            .json(&json!({ "url": item.url, "action": item.action }));
        self.send("apply_reaction", request).await?;
        Ok(())
    }

    async fn capture_screenshot(&self, session: &SessionHandle) -> PipelineResult<Vec<u8>> {
        let request = self.client.get(self.session_url(session, "/screenshot"));
        let bytes = self
            .send("capture_screenshot", request)
            .await?
            .bytes()
            .await
            .map_err(|e| PipelineError::collaborator("capture_screenshot", e))?;
        Ok(bytes.to_vec())
    }
}
