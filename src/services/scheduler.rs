//! Account cycle scheduler
//!
//! Processes every account once, strictly in load order, then sleeps until
//! the next local midnight and starts over. A failing account is skipped;
//! the cycle itself never aborts.

use std::time::Duration;

use chrono::{DateTime, Days, Local, TimeZone};
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

use super::tasks::TaskLifecycleEngine;
use crate::api::{ApiSession, RequestDispatcher};
use crate::config::DelayConfig;
use crate::models::{Account, PassReport};
use crate::proxy::{ProxyHealthManager, RoundRobinSelector};

/// Result of processing one account
#[derive(Debug, Clone, PartialEq)]
pub enum AccountOutcome {
    Completed(PassReport),
    LoginFailed,
    UserInfoMissing,
}

impl AccountOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, AccountOutcome::Completed(_))
    }
}

/// Totals for one full cycle over all accounts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSummary {
    pub processed: usize,
    pub skipped: usize,
    pub points_gained: u64,
}

pub struct AccountCycleScheduler {
    dispatcher: RequestDispatcher,
    health: ProxyHealthManager,
    accounts: Vec<Account>,
    engine: TaskLifecycleEngine,
    delays: DelayConfig,
}

impl AccountCycleScheduler {
    pub fn new(
        dispatcher: RequestDispatcher,
        health: ProxyHealthManager,
        accounts: Vec<Account>,
        delays: DelayConfig,
    ) -> Self {
        Self {
            dispatcher,
            health,
            accounts,
            engine: TaskLifecycleEngine::new(delays.clone()),
            delays,
        }
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    pub fn health(&self) -> &ProxyHealthManager {
        &self.health
    }

    /// Run cycles forever; only returns when the surrounding task is dropped
    pub async fn run_forever(&mut self) {
        info!(
            "Starting scheduler with {} accounts and {} working proxies",
            self.accounts.len(),
            self.health.working_count()
        );

        loop {
            let summary = self.run_cycle().await;
            info!(
                "Cycle finished: {} processed, {} skipped, {} points gained",
                summary.processed, summary.skipped, summary.points_gained
            );

            let now = Local::now();
            let wait = until_next_midnight(now);
            info!("All accounts processed. Next run in {}", format_duration(wait));
            sleep(wait).await;
        }
    }

    /// One pass over every account, in load order
    #[instrument(skip(self), fields(accounts = self.accounts.len()))]
    pub async fn run_cycle(&mut self) -> CycleSummary {
        self.prepare_proxies();

        let mut summary = CycleSummary::default();
        let total = self.accounts.len();

        for i in 0..total {
            let account = &mut self.accounts[i];
            info!("Processing {}", account.label());

            let mut session = ApiSession::new(&mut self.dispatcher, &mut self.health, account);
            match Self::process_account(&self.engine, &mut session).await {
                AccountOutcome::Completed(report) => {
                    summary.processed += 1;
                    summary.points_gained += report.total_gained();
                }
                AccountOutcome::LoginFailed => {
                    error!("Login failed for {}, skipping", self.accounts[i].label());
                    summary.skipped += 1;
                }
                AccountOutcome::UserInfoMissing => {
                    error!(
                        "Could not fetch user info for {}, skipping",
                        self.accounts[i].label()
                    );
                    summary.skipped += 1;
                }
            }

            if i + 1 < total && !self.delays.between_accounts.is_zero() {
                info!(
                    "Waiting {}s before next account...",
                    self.delays.between_accounts.as_secs()
                );
                sleep(self.delays.between_accounts).await;
            }
        }

        summary
    }

    /// Login check, user info, then the full task pass
    #[instrument(skip_all, fields(account = %session.account().label()))]
    pub async fn process_account(
        engine: &TaskLifecycleEngine,
        session: &mut ApiSession<'_>,
    ) -> AccountOutcome {
        if !session.check_login().await {
            return AccountOutcome::LoginFailed;
        }

        let Some(user) = session.fetch_user().await else {
            return AccountOutcome::UserInfoMissing;
        };

        let account = session.account();
        let proxy = account
            .active_proxy()
            .map(|p| p.label())
            .unwrap_or_else(|| "no proxy".to_string());
        info!(
            "{} | {} | {}",
            account.label(),
            user.user_name.as_deref().unwrap_or("unknown"),
            proxy
        );

        AccountOutcome::Completed(engine.run_pass(session).await)
    }

    /// Fresh cycle: earlier proxy disablements are forgiven and accounts
    /// without a proxy get their round-robin slot
    fn prepare_proxies(&mut self) {
        for account in &mut self.accounts {
            account.restore_proxy();
        }

        let selector = RoundRobinSelector::new(self.health.pool());
        if selector.available_count() == 0 {
            warn!("No working proxies, all accounts use direct connections");
            return;
        }
        selector.assign_missing(&mut self.accounts);
    }
}

/// Next local midnight strictly after `now`
pub fn next_midnight<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Tz> {
    let tz = now.timezone();
    let mut date = now.date_naive();
    // A DST gap can swallow midnight; try the following days until one exists.
    loop {
        date = match date.checked_add_days(Days::new(1)) {
            Some(d) => d,
            None => return now.clone(),
        };
        let Some(start) = date.and_hms_opt(0, 0, 0) else {
            return now.clone();
        };
        if let Some(midnight) = tz.from_local_datetime(&start).earliest() {
            return midnight;
        }
    }
}

/// Time left until the next local midnight
pub fn until_next_midnight<Tz: TimeZone>(now: DateTime<Tz>) -> Duration {
    (next_midnight(&now) - now).to_std().unwrap_or(Duration::ZERO)
}

/// `Hh Mm Ss`
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
}
