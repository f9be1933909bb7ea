use serde::Serialize;

use super::{ChestOutcome, PointBalance, TaskCategory};

/// Points gained during one task-list pass; reported, never stored
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PointsLedger {
    pub gained: u64,
    pub claimed_tasks: u32,
}

impl PointsLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a confirmed claim
    pub fn credit(&mut self, points: u64) {
        self.gained = self.gained.saturating_add(points);
        self.claimed_tasks += 1;
    }
}

/// Summary of one account's full task pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PassReport {
    pub chest: ChestOutcome,
    pub daily: PointsLedger,
    pub main: PointsLedger,
    pub final_balance: Option<PointBalance>,
}

impl PassReport {
    pub fn ledger(&self, category: TaskCategory) -> &PointsLedger {
        match category {
            TaskCategory::Daily => &self.daily,
            TaskCategory::Main => &self.main,
        }
    }

    pub fn total_gained(&self) -> u64 {
        self.daily.gained + self.main.gained
    }
}
