//! Stage binary entry point
//!
//! Runs exactly one pipeline stage and exits. The orchestrator launches one
//! process per stage; each stage can also be run by hand.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};

use pipeline::{stages, CompilerConfig, CuratorConfig, PipelineConfig, RubricSource, SessionOptions};
use shared::{logging, process_debug, ProcessId, StageId};

/// Feed curation pipeline stages
#[derive(Parser)]
#[command(name = "pipeline")]
#[command(about = "Runs one stage of the feed curation pipeline")]
struct Args {
    #[command(subcommand)]
    stage: StageCommand,

    /// Directory holding the stage artifacts
    #[arg(long, global = true, env = "PIPELINE_WORK_DIR", default_value = "./data")]
    work_dir: PathBuf,

    /// Visible browser session; execute only the first action
    #[arg(long, global = true)]
    debug: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Run identifier passed by the orchestrator, for log correlation
    #[arg(long, global = true)]
    run_id: Option<String>,

    /// Seed for the sampling stages
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Browser automation sidecar endpoint
    #[arg(long, global = true, env = "BROWSER_ENDPOINT", default_value = "http://127.0.0.1:9222")]
    browser_endpoint: String,

    /// Persistent browser profile directory
    #[arg(long, global = true, env = "BROWSER_PROFILE_DIR", default_value = "./browser_profile")]
    profile_dir: PathBuf,

    /// Classification model
    #[arg(long, global = true, env = "OPENAI_MODEL", default_value = "gpt-4o-mini")]
    model: String,

    /// Classification API base URL
    #[arg(long, global = true, env = "OPENAI_BASE_URL", default_value = "https://api.openai.com/v1")]
    openai_base_url: String,

    /// Sampling temperature for classification requests
    #[arg(long, global = true, default_value_t = 0.7)]
    temperature: f32,

    /// Classification request timeout in seconds
    #[arg(long, global = true, default_value_t = 120)]
    classifier_timeout_secs: u64,

    /// Records per classification request
    #[arg(long, global = true, default_value_t = 40)]
    batch_size: usize,

    /// Classification requests in flight at once
    #[arg(long, global = true, default_value_t = 1)]
    max_in_flight: usize,

    /// Results kept per query and kind by the reducer
    #[arg(long, global = true, default_value_t = 3)]
    reducer_quota: usize,

    /// Maximum liked videos per run
    #[arg(long, global = true, default_value_t = 10)]
    like_cap_videos: usize,

    /// Maximum liked shorts per run
    #[arg(long, global = true, default_value_t = 10)]
    like_cap_shorts: usize,

    /// Seconds to pause between actions
    #[arg(long, global = true, default_value_t = 2)]
    action_delay_secs: u64,

    /// Audience description file
    #[arg(long, global = true, env = "CURATOR_AUDIENCE_FILE")]
    audience_file: Option<PathBuf>,

    /// Subject standards file
    #[arg(long, global = true, env = "CURATOR_STANDARDS_FILE")]
    standards_file: Option<PathBuf>,
}

#[derive(Subcommand, Clone, Copy)]
enum StageCommand {
    /// Extract the recommendation feed
    ExtractFeed,
    /// Curate the feed and generate search queries
    CurateFeed,
    /// Run the generated searches
    ExtractSearch,
    /// Sample a fixed quota of search results
    Reduce,
    /// Curate the reduced search results
    CurateSearch,
    /// Compile the action list
    Compile,
    /// Execute the action list
    Execute,
}

impl StageCommand {
    fn stage_id(self) -> StageId {
        match self {
            StageCommand::ExtractFeed => StageId::ExtractFeed,
            StageCommand::CurateFeed => StageId::CurateFeed,
            StageCommand::ExtractSearch => StageId::ExtractSearch,
            StageCommand::Reduce => StageId::Reduce,
            StageCommand::CurateSearch => StageId::CurateSearch,
            StageCommand::Compile => StageId::Compile,
            StageCommand::Execute => StageId::Execute,
        }
    }
}

impl Args {
    fn config(&self) -> PipelineConfig {
        let mut config = PipelineConfig::new(&self.work_dir);
        config.debug = self.debug;
        config.seed = self.seed;
        config.browser_endpoint = self.browser_endpoint.clone();
        config.session = SessionOptions::new(&self.profile_dir, !self.debug);
        config.classifier_model = self.model.clone();
        config.classifier_base_url = self.openai_base_url.clone();
        config.classifier_temperature = self.temperature;
        config.classifier_timeout = Duration::from_secs(self.classifier_timeout_secs);
        config.curator = CuratorConfig {
            batch_size: self.batch_size,
            max_in_flight: self.max_in_flight,
        };
        config.reducer_quota = self.reducer_quota;
        config.compiler = CompilerConfig {
            like_cap_videos: self.like_cap_videos,
            like_cap_shorts: self.like_cap_shorts,
        };
        config.pacing.delay = Duration::from_secs(self.action_delay_secs);
        config.rubric = RubricSource {
            audience_file: self.audience_file.clone(),
            standards_file: self.standards_file.clone(),
        };
        config
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let stage = args.stage.stage_id();

    // Initialize process ID singleton for this stage
    ProcessId::init_stage(stage);
    logging::init_tracing_with_level(Some(&args.log_level));

    logging::log_startup(ProcessId::current(), stage.description());
    if let Some(run_id) = &args.run_id {
        process_debug!(ProcessId::current(), "Run {}, work dir {}", run_id, args.work_dir.display());
    }

    let config = args.config();
    match stages::run_stage(stage, &config).await {
        Ok(()) => {
            logging::log_success(ProcessId::current(), &format!("Stage {stage} completed"));
            ExitCode::SUCCESS
        }
        Err(e) => {
            logging::log_error(ProcessId::current(), &format!("Stage {stage}"), &e);
            ExitCode::from(e.exit_code())
        }
    }
}
