//! OpenAI-compatible classification service

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use shared::{process_debug, CuratorVerdict, ProcessId, QueryCategory, SearchQuery, VideoRecord};

use crate::config::ClassifierConfig;
use crate::core::prompt::{evaluation_prompt, query_prompt, SYSTEM_PROMPT};
use crate::error::{PipelineError, PipelineResult};
use crate::traits::ClassificationService;
use crate::types::{QueryContext, Rubric};

#[derive(Debug, Deserialize)]
struct RawVerdict {
    id: String,
    like: bool,
    #[serde(default)]
    rationale: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EvaluationResponse {
    verdicts: Vec<RawVerdict>,
}

#[derive(Debug, Deserialize)]
struct RawQuery {
    text: String,
    category: QueryCategory,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    queries: Vec<RawQuery>,
}

/// Chat-completions client answering in JSON object mode
pub struct OpenAiClassifier {
    client: reqwest::Client,
    config: ClassifierConfig,
}

impl OpenAiClassifier {
    pub fn new(config: ClassifierConfig) -> PipelineResult<Self> {
        if config.api_key.trim().is_empty() {
            return Err(PipelineError::config("classification API key is empty"));
        }
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PipelineError::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Send one prompt and return the message content
    async fn complete(&self, prompt: String) -> PipelineResult<String> {
        let request_body = serde_json::json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": prompt }
            ],
            "temperature": self.config.temperature,
            "response_format": { "type": "json_object" }
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url.trim_end_matches('/')))
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    PipelineError::classification(format!("request timed out after {:?}", self.config.timeout))
                } else {
                    PipelineError::classification(format!("network error: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                401 => PipelineError::classification("authentication failed"),
                429 => PipelineError::classification("rate limit exceeded"),
                _ => PipelineError::classification(format!("HTTP {}: {}", status.as_u16(), body)),
            });
        }

        let response_json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| PipelineError::classification(format!("failed to parse response: {e}")))?;

        if let Some(tokens) = response_json.pointer("/usage/total_tokens").and_then(|t| t.as_u64()) {
            process_debug!(ProcessId::current(), "Classification used {} tokens", tokens);
        }

        response_json
            .pointer("/choices/0/message/content")
            .and_then(|content| content.as_str())
            .map(str::to_string)
            .ok_or_else(|| PipelineError::classification("no content in response"))
    }

    async fn complete_json<T: DeserializeOwned>(&self, prompt: String) -> PipelineResult<T> {
        let content = self.complete(prompt).await?;
        serde_json::from_str(&content)
            .map_err(|e| PipelineError::classification(format!("unexpected response shape: {e}")))
    }
}

#[async_trait]
impl ClassificationService for OpenAiClassifier {
    fn model(&self) -> String {
        self.config.model.clone()
    }

    async fn evaluate(&self, batch: &[VideoRecord], rubric: &Rubric) -> PipelineResult<Vec<CuratorVerdict>> {
        let response: EvaluationResponse = self.complete_json(evaluation_prompt(batch, rubric)).await?;
        Ok(response
            .verdicts
            .into_iter()
            .map(|v| CuratorVerdict {
                record_id: v.id,
                like: v.like,
                rationale: v.rationale,
            })
            .collect())
    }

    async fn propose_queries(&self, context: &QueryContext) -> PipelineResult<Vec<SearchQuery>> {
        let response: QueryResponse = self.complete_json(query_prompt(context)).await?;
        Ok(response
            .queries
            .into_iter()
            .map(|q| SearchQuery::new(q.text, q.category))
            .collect())
    }
}
