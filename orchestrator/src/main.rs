//! Main entry point for the orchestrator binary

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tokio::signal;

use orchestrator::{services::RealStageRunner, status_line, Orchestrator, OrchestratorError, RetryPolicy};
use shared::{logging, process_debug, process_info, ProcessId, StageId};

/// Orchestrator for the feed curation pipeline
#[derive(Parser)]
#[command(name = "orchestrator")]
#[command(about = "Runs every pipeline stage in order, retrying the whole run on failure")]
pub struct Args {
    /// Directory holding the stage artifacts
    #[arg(long, env = "PIPELINE_WORK_DIR", default_value = "./data")]
    pub work_dir: PathBuf,

    /// Start every attempt at this stage
    #[arg(long)]
    pub from: Option<StageId>,

    /// Maximum number of whole-run attempts
    #[arg(long, default_value_t = 10)]
    pub max_attempts: u32,

    /// Wait after the first failed attempt, doubled for each further failure
    #[arg(long, default_value_t = 5)]
    pub initial_delay_secs: u64,

    /// Upper bound on the wait between attempts
    #[arg(long, default_value_t = 60)]
    pub max_delay_secs: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Visible browser session; execute only the first action
    #[arg(long)]
    pub debug: bool,

    /// Stage binary (defaults to `pipeline` next to this executable)
    #[arg(long, env = "PIPELINE_BIN")]
    pub pipeline_bin: Option<PathBuf>,

    /// Extra arguments passed to every stage
    #[arg(last = true)]
    pub stage_args: Vec<String>,
}

impl Args {
    fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            initial_delay: Duration::from_secs(self.initial_delay_secs),
            max_delay: Duration::from_secs(self.max_delay_secs),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    dotenv::dotenv().ok();
    ProcessId::init_orchestrator();
    logging::init_tracing_with_level(Some(&args.log_level));
    logging::log_startup(ProcessId::current(), "feed curation run");

    let run_id = uuid::Uuid::new_v4().to_string();
    process_debug!(ProcessId::current(), "Run id: {}", run_id);

    let mut runner = RealStageRunner::new(args.work_dir.clone())
        .with_log_level(args.log_level.clone())
        .with_debug(args.debug)
        .with_run_id(run_id)
        .with_extra_args(args.stage_args.clone());
    if let Some(ref program) = args.pipeline_bin {
        runner = runner.with_program(program.clone());
    }
    process_debug!(ProcessId::current(), "Stage binary: {}", runner.program().display());

    let mut orchestrator = Orchestrator::new(runner, args.policy());
    if let Some(stage) = args.from {
        process_info!(ProcessId::current(), "⏩ Starting from stage {}", stage);
        orchestrator = orchestrator.starting_at(stage);
    }

    // Dropping the run future kills the running stage child
    let result = tokio::select! {
        result = orchestrator.run() => result,
        _ = signal::ctrl_c() => {
            logging::log_shutdown(ProcessId::current(), "interrupted");
            Err(OrchestratorError::Interrupted)
        }
    };

    let line = status_line(&result);
    match result {
        Ok(_) => {
            logging::log_success(ProcessId::current(), &line);
            println!("{line}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            logging::log_error(ProcessId::current(), "Run", &e);
            println!("{line}");
            ExitCode::FAILURE
        }
    }
}
