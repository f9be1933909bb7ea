//! Account processing services

pub mod scheduler;
pub mod tasks;

pub use scheduler::{AccountCycleScheduler, AccountOutcome, CycleSummary};
pub use tasks::{TaskLifecycleEngine, TaskOutcome};
