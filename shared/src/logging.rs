//! Shared logging utilities for consistent tracing across all processes

use crate::types::{ProcessId, StageId};
use chrono::{DateTime, Utc};

/// Default filter directives for the current process
fn filter_directives(process_id: &ProcessId, base_level: &str) -> String {
    match process_id {
        ProcessId::Orchestrator => {
            format!("orchestrator={base_level},shared={base_level}")
        }
        ProcessId::Stage(_) | ProcessId::Library => {
            format!("pipeline={base_level},shared={base_level},reqwest=warn,hyper=warn")
        }
    }
}

/// Initialize tracing subscriber with an optional log level
///
/// The process ID must be initialised first so the filter matches the
/// running binary. `RUST_LOG`, when set, takes precedence.
pub fn init_tracing_with_level(log_level: Option<&str>) {
    use tracing_subscriber::{fmt, EnvFilter};

    let process_id = ProcessId::current();
    let base_level = log_level.unwrap_or("info");

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(process_id, base_level)));

    let _ = fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();
}

/// Get formatted timestamp for consistent logging
pub fn format_timestamp() -> String {
    let now: DateTime<Utc> = Utc::now();
    now.format("%H:%M:%S%.3f").to_string()
}

/// Event tagged with the emitting process and a wall-clock timestamp
#[doc(hidden)]
#[macro_export]
macro_rules! process_event {
    ($level:expr, $process_id:expr, $($arg:tt)*) => {
        tracing::event!(
            $level,
            process = %$process_id,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        )
    };
}

#[macro_export]
macro_rules! process_info {
    ($process_id:expr, $($arg:tt)*) => {
        $crate::process_event!(tracing::Level::INFO, $process_id, $($arg)*)
    };
}

#[macro_export]
macro_rules! process_warn {
    ($process_id:expr, $($arg:tt)*) => {
        $crate::process_event!(tracing::Level::WARN, $process_id, $($arg)*)
    };
}

#[macro_export]
macro_rules! process_error {
    ($process_id:expr, $($arg:tt)*) => {
        $crate::process_event!(tracing::Level::ERROR, $process_id, $($arg)*)
    };
}

#[macro_export]
macro_rules! process_debug {
    ($process_id:expr, $($arg:tt)*) => {
        $crate::process_event!(tracing::Level::DEBUG, $process_id, $($arg)*)
    };
}

pub fn log_startup(process_id: &ProcessId, details: &str) {
    crate::process_info!(process_id, "🚀 Starting {}", details);
}

pub fn log_shutdown(process_id: &ProcessId, reason: &str) {
    crate::process_info!(process_id, "🛑 Shutting down: {}", reason);
}

pub fn log_error(process_id: &ProcessId, context: &str, error: &dyn std::fmt::Display) {
    crate::process_error!(process_id, error = %error, "❌ {} failed: {}", context, error);
}

pub fn log_success(process_id: &ProcessId, message: &str) {
    crate::process_info!(process_id, "✅ {}", message);
}

/// Step inside a stage, e.g. one executed action
pub fn log_progress(process_id: &ProcessId, action: &str, details: &str) {
    crate::process_info!(process_id, "📋 {}: {}", action, details);
}

/// Orchestrator launching one stage of a run attempt
pub fn log_stage_launch(process_id: &ProcessId, stage: StageId, attempt: u32) {
    crate::process_info!(
        process_id,
        stage = %stage,
        attempt,
        "{}",
        launch_message(stage, attempt)
    );
}

/// Stage persisted its artifact; `summary` describes the contents
pub fn log_artifact_written(process_id: &ProcessId, stage: StageId, summary: &str) {
    crate::process_info!(
        process_id,
        stage = %stage,
        artifact = stage.artifact_file(),
        "{}",
        artifact_message(stage, summary)
    );
}

fn launch_message(stage: StageId, attempt: u32) -> String {
    format!(
        "▶️  [attempt {attempt}] {}/{} {}: {}",
        stage.index() + 1,
        StageId::ALL.len(),
        stage,
        stage.description()
    )
}

fn artifact_message(stage: StageId, summary: &str) -> String {
    format!("💾 {} written: {}", stage.artifact_file(), summary)
}
