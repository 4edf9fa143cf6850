//! Pipeline configuration
//!
//! Built once from the command line by the `pipeline` binary and handed to the
//! stage functions. The classification API key is read from the environment,
//! after loading a `.env` file from the current directory or its parents when
//! one exists. Environment variables take precedence over `.env` values.

use std::path::PathBuf;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use shared::{process_debug, ProcessId};

use crate::core::QueryPolicy;
use crate::error::{PipelineError, PipelineResult};
use crate::types::{CurationPass, Rubric, SessionOptions};

/// Environment variable holding the classification API key
pub const API_KEY_VAR: &str = "OPENAI_API_KEY";

/// Audience description used when no audience file is configured
pub const DEFAULT_AUDIENCE: &str = "An 11 year old 6th grade student who wants to become strong at math \
and who is naturally curious about science, history, nature and how things work. Content should be \
age-appropriate, educational or genuinely thought-provoking, and free of clickbait, pranks, drama and \
mindless entertainment.";

/// Classification service connection settings
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub timeout: Duration,
}

impl ClassifierConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.7,
            timeout: Duration::from_secs(120),
        }
    }
}

/// Load the classification API key (`.env` first, then the environment)
pub fn load_api_key() -> PipelineResult<String> {
    let _ = dotenv::dotenv();

    match std::env::var(API_KEY_VAR) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(PipelineError::config(format!("{API_KEY_VAR} is not set"))),
    }
}

/// Batching of classification requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CuratorConfig {
    pub batch_size: usize,
    /// Evaluation batches allowed in flight at once
    pub max_in_flight: usize,
}

impl Default for CuratorConfig {
    fn default() -> Self {
        Self {
            batch_size: 40,
            max_in_flight: 1,
        }
    }
}

/// Caps on sampled likes per kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompilerConfig {
    pub like_cap_videos: usize,
    pub like_cap_shorts: usize,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            like_cap_videos: 10,
            like_cap_shorts: 10,
        }
    }
}

/// Pauses between executed actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacingConfig {
    pub delay: Duration,
    /// Longer pause taken after every `long_every` items
    pub long_delay: Duration,
    pub long_every: usize,
}

impl PacingConfig {
    pub fn none() -> Self {
        Self {
            delay: Duration::ZERO,
            long_delay: Duration::ZERO,
            long_every: 0,
        }
    }

    /// Pause after the item at one-based `index`
    pub fn pause_after(&self, index: usize) -> Duration {
        if self.long_every > 0 && index % self.long_every == 0 {
            self.long_delay
        } else {
            self.delay
        }
    }
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(2),
            long_delay: Duration::from_secs(5),
            long_every: 5,
        }
    }
}

/// Where the rubric text comes from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RubricSource {
    pub audience_file: Option<PathBuf>,
    pub standards_file: Option<PathBuf>,
}

impl RubricSource {
    /// Read the configured files; a missing standards file is skipped
    pub async fn load(&self, pass: CurationPass) -> PipelineResult<Rubric> {
        let audience = match &self.audience_file {
            Some(path) => tokio::fs::read_to_string(path)
                .await
                .map_err(|e| PipelineError::config(format!("cannot read audience file {}: {e}", path.display())))?
                .trim()
                .to_string(),
            None => DEFAULT_AUDIENCE.to_string(),
        };

        let standards = match &self.standards_file {
            Some(path) => match tokio::fs::read_to_string(path).await {
                Ok(text) => Some(text.trim().to_string()).filter(|t| !t.is_empty()),
                Err(e) => {
                    process_debug!(ProcessId::current(), "Standards file {} not loaded: {}", path.display(), e);
                    None
                }
            },
            None => None,
        };

        Ok(Rubric {
            pass,
            audience,
            standards,
        })
    }
}

/// Everything a stage process needs
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub work_dir: PathBuf,
    pub debug: bool,
    pub browser_endpoint: String,
    pub session: SessionOptions,
    pub classifier_model: String,
    pub classifier_base_url: String,
    pub classifier_temperature: f32,
    pub classifier_timeout: Duration,
    pub curator: CuratorConfig,
    pub policy: QueryPolicy,
    pub reducer_quota: usize,
    pub compiler: CompilerConfig,
    pub pacing: PacingConfig,
    pub rubric: RubricSource,
    pub seed: Option<u64>,
}

impl PipelineConfig {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        let work_dir = work_dir.into();
        let classifier = ClassifierConfig::new("");
        Self {
            session: SessionOptions::new(work_dir.join("browser_profile"), true),
            work_dir,
            debug: false,
            browser_endpoint: "http://127.0.0.1:9222".to_string(),
            classifier_model: classifier.model,
            classifier_base_url: classifier.base_url,
            classifier_temperature: classifier.temperature,
            classifier_timeout: classifier.timeout,
            curator: CuratorConfig::default(),
            policy: QueryPolicy::default(),
            reducer_quota: 3,
            compiler: CompilerConfig::default(),
            pacing: PacingConfig::default(),
            rubric: RubricSource::default(),
            seed: None,
        }
    }

    /// Classifier settings with the API key resolved
    pub fn classifier(&self) -> PipelineResult<ClassifierConfig> {
        Ok(ClassifierConfig {
            api_key: load_api_key()?,
            base_url: self.classifier_base_url.clone(),
            model: self.classifier_model.clone(),
            temperature: self.classifier_temperature,
            timeout: self.classifier_timeout,
        })
    }

    /// Random source for the sampling stages
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    pub fn validate(&self) -> PipelineResult<()> {
        if self.curator.batch_size == 0 {
            return Err(PipelineError::config("batch size must be at least 1"));
        }
        if self.curator.max_in_flight == 0 {
            return Err(PipelineError::config("max in flight must be at least 1"));
        }
        self.policy.validate()
    }
}
