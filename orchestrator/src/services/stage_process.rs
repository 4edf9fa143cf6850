//! Real stage runner
//!
//! Launches each stage as its own `pipeline <stage>` child process and waits
//! for it to exit. Stage output is inherited so the child's logs interleave
//! with the orchestrator's own.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;

use shared::{process_debug, ProcessId, StageId};

use crate::error::{OrchestratorError, OrchestratorResult};
use crate::traits::{StageExit, StageRunner};

const PIPELINE_BIN: &str = "pipeline";

/// Stage runner backed by child processes
pub struct RealStageRunner {
    /// Stage binary to launch
    program: PathBuf,

    /// Work directory passed to every stage
    work_dir: PathBuf,

    /// Log level to pass to spawned stages
    log_level: String,

    /// Headed browser, single action
    debug: bool,

    /// Run identifier for log correlation
    run_id: Option<String>,

    /// Extra arguments appended after the standard ones
    extra_args: Vec<String>,
}

impl RealStageRunner {
    /// Create runner launching the default stage binary
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: default_program(),
            work_dir: work_dir.into(),
            log_level: "info".to_string(),
            debug: false,
            run_id: None,
            extra_args: Vec::new(),
        }
    }

    /// Configure the stage binary (fluent API)
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Configure log level (fluent API)
    pub fn with_log_level(mut self, log_level: String) -> Self {
        self.log_level = log_level;
        self
    }

    /// Configure debug mode (fluent API)
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Configure run identifier (fluent API)
    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }

    /// Configure extra stage arguments (fluent API)
    pub fn with_extra_args(mut self, extra_args: Vec<String>) -> Self {
        self.extra_args = extra_args;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Full argument list for one stage
    pub fn stage_args(&self, stage: StageId) -> Vec<String> {
        let mut args = vec![
            stage.as_str().to_string(),
            "--work-dir".to_string(),
            self.work_dir.display().to_string(),
            "--log-level".to_string(),
            self.log_level.clone(),
        ];
        if let Some(ref run_id) = self.run_id {
            args.push("--run-id".to_string());
            args.push(run_id.clone());
        }
        if self.debug {
            args.push("--debug".to_string());
        }
        args.extend(self.extra_args.iter().cloned());
        args
    }
}

/// The `pipeline` binary next to the running executable, else from `PATH`
fn default_program() -> PathBuf {
    let sibling = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(format!("{PIPELINE_BIN}{}", std::env::consts::EXE_SUFFIX))));

    match sibling {
        Some(path) if path.is_file() => path,
        _ => PathBuf::from(PIPELINE_BIN),
    }
}

#[async_trait]
impl StageRunner for RealStageRunner {
    async fn run_stage(&self, stage: StageId, attempt: u32) -> OrchestratorResult<StageExit> {
        let mut cmd = Command::new(&self.program);
        cmd.args(self.stage_args(stage))
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        let started = Instant::now();
        let mut child = cmd.spawn().map_err(|e| OrchestratorError::StageLaunchError {
            stage,
            message: format!("{}: {e}", self.program.display()),
        })?;

        process_debug!(
            ProcessId::current(),
            "🏭 Spawned {} (PID: {}) for attempt {}",
            stage,
            child.id().unwrap_or(0),
            attempt
        );

        let status = child.wait().await?;
        Ok(StageExit {
            code: status.code(),
            duration: started.elapsed(),
        })
    }
}
