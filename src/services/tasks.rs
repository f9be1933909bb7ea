//! Task lifecycle engine
//!
//! Drives one account through discover, click, readiness check and claim for
//! both task categories. All state is re-derived from the API on every pass.

use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, instrument, warn};

use crate::api::ApiSession;
use crate::config::DelayConfig;
use crate::models::{ClaimOutcome, PassReport, PointsLedger, Task, TaskCategory};

/// What happened to a single task during a pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    AlreadyClaimed,
    ClickFailed,
    /// Clicked, but not claimable yet; re-evaluated next cycle
    NotReady,
    Claimed { points: u64 },
    ClaimRejected,
}

pub struct TaskLifecycleEngine {
    delays: DelayConfig,
}

impl TaskLifecycleEngine {
    pub fn new(delays: DelayConfig) -> Self {
        Self { delays }
    }

    /// Full pass: chest, daily tasks, main tasks, final balance
    #[instrument(skip_all, name = "task_pass")]
    pub async fn run_pass(&self, session: &mut ApiSession<'_>) -> PassReport {
        info!("Starting tasks");

        let chest = session.open_magic_chest().await;

        let daily_tasks = session.tasks(TaskCategory::Daily).await;
        let daily = self
            .process_task_list(session, &daily_tasks, TaskCategory::Daily)
            .await;

        let main_tasks = session.tasks(TaskCategory::Main).await;
        let main = self
            .process_task_list(session, &main_tasks, TaskCategory::Main)
            .await;

        let final_balance = session.points().await;
        if let Some(balance) = &final_balance {
            info!("Final points: {}", balance.points);
        }

        info!("Tasks completed");
        PassReport {
            chest,
            daily,
            main,
            final_balance,
        }
    }

    /// Process every task of one category; the ledger starts at zero
    pub async fn process_task_list(
        &self,
        session: &mut ApiSession<'_>,
        tasks: &[Task],
        category: TaskCategory,
    ) -> PointsLedger {
        let mut ledger = PointsLedger::new();
        if tasks.is_empty() {
            return ledger;
        }

        info!("Processing {} tasks", category);

        for task in tasks {
            if let TaskOutcome::Claimed { points } = self.process_task(session, task, category).await
            {
                ledger.credit(points);
            }
        }

        if ledger.gained > 0 {
            info!(
                "Total points gained from {} tasks: {}",
                category, ledger.gained
            );
        }
        ledger
    }

    /// Walk one task through its lifecycle
    pub async fn process_task(
        &self,
        session: &mut ApiSession<'_>,
        task: &Task,
        category: TaskCategory,
    ) -> TaskOutcome {
        info!("Processing task: {}", task.name());

        if task.is_claimed() {
            info!("Task already claimed");
            return TaskOutcome::AlreadyClaimed;
        }

        pause(self.delays.between_requests).await;

        let Some(click) = session.click_task(task).await else {
            warn!("Could not click task: {}", task.name());
            return TaskOutcome::ClickFailed;
        };

        pause(self.delays.between_requests).await;

        // Daily tasks need a status refresh; main tasks report readiness inline.
        let ready = match category {
            TaskCategory::Daily => session
                .task_status(&task.task_id)
                .await
                .map(|update| update.ready_to_claim)
                .unwrap_or(false),
            TaskCategory::Main => click.ready_flag.unwrap_or_else(|| task.has_ready_flag()),
        };

        let outcome = if ready {
            self.claim(session, task).await
        } else {
            warn!("Task not ready to claim");
            TaskOutcome::NotReady
        };

        pause(self.delays.between_tasks).await;
        outcome
    }

    async fn claim(&self, session: &mut ApiSession<'_>, task: &Task) -> TaskOutcome {
        match session.claim(&task.task_id, task.point).await {
            Some(outcome) if outcome.is_success() => {
                if outcome == ClaimOutcome::AlreadyCredited {
                    info!("Points for {} were already credited", task.name());
                }
                info!("Claimed {} points", task.point);
                TaskOutcome::Claimed { points: task.point }
            }
            Some(ClaimOutcome::Rejected(message)) => {
                warn!(
                    "Claim for {} rejected: {}",
                    task.name(),
                    message.as_deref().unwrap_or("no message")
                );
                TaskOutcome::ClaimRejected
            }
            _ => TaskOutcome::ClaimRejected,
        }
    }
}

async fn pause(duration: Duration) {
    if !duration.is_zero() {
        sleep(duration).await;
    }
}
