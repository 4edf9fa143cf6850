//! Action executor
//!
//! Reconciles each desired action against the state the platform shows:
//! navigate, read the current reaction, click only when it differs, then read
//! again to confirm. Per-item failures are recorded and never abort the batch.

use std::path::PathBuf;

use shared::logging::log_progress;
use shared::{
    process_info, process_warn, Action, ActionItem, ActionOutcome, ArtifactStore, ExecutionReport, ItemStatus,
    ProcessId,
};

use crate::config::PacingConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::traits::ReactionController;
use crate::types::SessionHandle;

/// Directory under the store root receiving action screenshots
pub const SCREENSHOT_DIR: &str = "screenshots";

pub struct ActionExecutor<'a, R: ReactionController + ?Sized> {
    controller: &'a R,
    store: &'a ArtifactStore,
    pacing: PacingConfig,
    debug: bool,
}

impl<'a, R: ReactionController + ?Sized> ActionExecutor<'a, R> {
    /// Debug mode runs only the first planned item and never pauses
    pub fn new(controller: &'a R, store: &'a ArtifactStore, pacing: PacingConfig, debug: bool) -> Self {
        let pacing = if debug { PacingConfig::none() } else { pacing };
        Self {
            controller,
            store,
            pacing,
            debug,
        }
    }

    /// Likes before dislikes, compiled order kept within each group
    pub fn plan(&self, items: &[ActionItem]) -> Vec<ActionItem> {
        let mut planned: Vec<ActionItem> = items
            .iter()
            .filter(|i| i.action == Action::Like)
            .chain(items.iter().filter(|i| i.action == Action::Dislike))
            .cloned()
            .collect();
        if self.debug {
            planned.truncate(1);
        }
        planned
    }

    pub async fn execute(&self, session: &SessionHandle, items: &[ActionItem]) -> ExecutionReport {
        let planned = self.plan(items);
        let total = planned.len();
        process_info!(
            ProcessId::current(),
            "🎬 Executing {} of {} actions{}",
            total,
            items.len(),
            if self.debug { " (debug)" } else { "" }
        );

        let mut outcomes = Vec::with_capacity(total);
        for (position, item) in planned.iter().enumerate() {
            let index = position + 1;
            let outcome = self.execute_item(session, index, item).await;
            log_progress(
                ProcessId::current(),
                &format!("[{index}/{total}] {} {}", item.action, item.video_id()),
                &format!("{:?}", outcome.status),
            );
            outcomes.push(outcome);

            if index < total {
                let pause = self.pacing.pause_after(index);
                if !pause.is_zero() {
                    tokio::time::sleep(pause).await;
                }
            }
        }

        ExecutionReport {
            executed_at: chrono::Utc::now(),
            debug: self.debug,
            outcomes,
        }
    }

    /// Run the per-item state machine for one item
    pub async fn execute_item(&self, session: &SessionHandle, index: usize, item: &ActionItem) -> ActionOutcome {
        let mut outcome = ActionOutcome {
            index,
            item: item.clone(),
            status: ItemStatus::Pending,
            observed_before: None,
            observed_after: None,
            error: None,
            screenshot: None,
        };

        if let Err(e) = self.reconcile(session, item, &mut outcome).await {
            process_warn!(ProcessId::current(), "⚠️ {} {} failed: {}", item.action, item.url, e);
            outcome.status = ItemStatus::Failed;
            outcome.error = Some(e.to_string());
        }

        if matches!(outcome.status, ItemStatus::Applied | ItemStatus::Failed) {
            outcome.screenshot = self.capture(session, index, item).await;
        }
        outcome
    }

    async fn reconcile(
        &self,
        session: &SessionHandle,
        item: &ActionItem,
        outcome: &mut ActionOutcome,
    ) -> PipelineResult<()> {
        let desired = item.action.desired_state();

        self.controller.navigate(session, &item.url).await?;
        let before = self.controller.get_reaction_state(session, &item.url).await?;
        outcome.observed_before = Some(before);
        outcome.status = ItemStatus::StateChecked;

        if before == desired {
            outcome.status = ItemStatus::Skipped;
            return Ok(());
        }

        self.controller.apply_reaction(session, item).await?;
        let after = self.controller.get_reaction_state(session, &item.url).await?;
        outcome.observed_after = Some(after);

        if after != desired {
            return Err(PipelineError::ActionConfirmationError {
                url: item.url.clone(),
                expected: desired,
                observed: after,
            });
        }
        outcome.status = ItemStatus::Applied;
        Ok(())
    }

    /// Best effort; problems are logged and never change the outcome
    async fn capture(&self, session: &SessionHandle, index: usize, item: &ActionItem) -> Option<PathBuf> {
        let bytes = match self.controller.capture_screenshot(session).await {
            Ok(bytes) => bytes,
            Err(e) => {
                process_warn!(ProcessId::current(), "Screenshot for action {} not captured: {}", index, e);
                return None;
            }
        };

        let relative = format!("{SCREENSHOT_DIR}/action_{index}_{}_{}.png", item.action, item.video_id());
        match self.store.write_blob(&relative, &bytes).await {
            Ok(path) => Some(path),
            Err(e) => {
                process_warn!(ProcessId::current(), "Screenshot for action {} not saved: {}", index, e);
                None
            }
        }
    }
}
