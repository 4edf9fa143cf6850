//! Run orchestrator
//!
//! Runs the ordered stage sequence through an injected `StageRunner` and wraps
//! the whole sequence in a bounded retry loop. A failing stage aborts the rest
//! of its attempt; the next attempt starts again from the first stage.

use shared::{logging, process_debug, process_error, process_info, process_warn, ProcessId, StageId};

use crate::core::{RetryPolicy, RunRecord};
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::traits::StageRunner;

/// Drives one run of the pipeline with whole-run retries
pub struct Orchestrator<S>
where
    S: StageRunner,
{
    runner: S,
    policy: RetryPolicy,
    /// Stages executed by every attempt, in order
    stages: Vec<StageId>,
    /// Bookkeeping for every stage of every attempt
    records: Vec<RunRecord>,
}

impl<S> Orchestrator<S>
where
    S: StageRunner,
{
    /// Create new orchestrator running the full stage sequence
    pub fn new(runner: S, policy: RetryPolicy) -> Self {
        Self {
            runner,
            policy,
            stages: StageId::ALL.to_vec(),
            records: Vec::new(),
        }
    }

    /// Start every attempt at `stage` instead of the first stage (fluent API)
    pub fn starting_at(mut self, stage: StageId) -> Self {
        self.stages = StageId::ALL.into_iter().filter(|s| *s >= stage).collect();
        self
    }

    pub fn runner(&self) -> &S {
        &self.runner
    }

    pub fn stages(&self) -> &[StageId] {
        &self.stages
    }

    pub fn records(&self) -> &[RunRecord] {
        &self.records
    }

    /// Records belonging to one attempt
    pub fn attempt_records(&self, attempt: u32) -> impl Iterator<Item = &RunRecord> {
        self.records.iter().filter(move |r| r.attempt_number == attempt)
    }

    /// Run until one attempt completes every stage or the attempts run out
    ///
    /// Returns the number of attempts used.
    pub async fn run(&mut self) -> OrchestratorResult<u32> {
        if self.policy.max_attempts == 0 {
            return Err(OrchestratorError::config("max_attempts must be at least 1"));
        }

        let mut last_failure = None;
        for attempt in 1..=self.policy.max_attempts {
            process_info!(
                ProcessId::current(),
                "🔁 Attempt {}/{} ({} stages)",
                attempt,
                self.policy.max_attempts,
                self.stages.len()
            );

            match self.run_attempt(attempt).await {
                None => {
                    self.dump_records();
                    return Ok(attempt);
                }
                Some(stage) => last_failure = Some((stage, attempt)),
            }

            if attempt < self.policy.max_attempts {
                let delay = self.policy.delay_after(attempt);
                process_warn!(
                    ProcessId::current(),
                    "⏳ Attempt {} failed, retrying in {}s",
                    attempt,
                    delay.as_secs()
                );
                tokio::time::sleep(delay).await;
            }
        }

        self.dump_records();
        let (stage, attempt) = last_failure.ok_or_else(|| OrchestratorError::config("no attempt was run"))?;
        Err(OrchestratorError::RetriesExhausted {
            attempts: self.policy.max_attempts,
            stage,
            attempt,
        })
    }

    /// One pass over the stage sequence; the failed stage, if any
    async fn run_attempt(&mut self, attempt: u32) -> Option<StageId> {
        let first = self.records.len();
        self.records
            .extend(self.stages.iter().map(|stage| RunRecord::pending(attempt, *stage)));

        for offset in 0..self.stages.len() {
            let stage = self.stages[offset];
            let index = first + offset;
            self.records[index].start();

            logging::log_stage_launch(ProcessId::current(), stage, attempt);
            let succeeded = match self.runner.run_stage(stage, attempt).await {
                Ok(exit) if exit.success() => {
                    process_debug!(
                        ProcessId::current(),
                        "Stage {} finished in {:.1}s",
                        stage,
                        exit.duration.as_secs_f64()
                    );
                    true
                }
                Ok(exit) => {
                    let failure = OrchestratorError::StageFailed {
                        stage,
                        attempt,
                        exit_code: exit.code,
                    };
                    process_error!(ProcessId::current(), "❌ {}", failure);
                    false
                }
                Err(e) => {
                    logging::log_error(ProcessId::current(), &format!("Stage {stage}"), &e);
                    false
                }
            };

            self.records[index].finish(succeeded);
            if !succeeded {
                return Some(stage);
            }
        }
        None
    }

    fn dump_records(&self) {
        match serde_json::to_string(&self.records) {
            Ok(json) => process_debug!(ProcessId::current(), "Run records: {}", json),
            Err(e) => process_debug!(ProcessId::current(), "Run records unavailable: {}", e),
        }
    }
}
