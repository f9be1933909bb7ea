//! Typed calls for one account
//!
//! Borrows the dispatcher, the proxy health state and the account for the
//! duration of an account's processing, and turns raw responses into the
//! tagged results in `models::api`.

use serde_json::{json, Value};
use tracing::info;

use super::dispatcher::{ApiResponse, RequestDispatcher};
use super::endpoints::Endpoint;
use crate::models::{
    is_logged_in, Account, ChestOutcome, ClaimOutcome, ClickResult, PointBalance, Task,
    TaskCategory, TaskId, TaskStatusUpdate, UserInfo,
};
use crate::proxy::ProxyHealthManager;

/// Page requested from the paged daily task list
const DAILY_PAGE: u32 = 1;
const DAILY_LIMIT: u32 = 10;

pub struct ApiSession<'a> {
    dispatcher: &'a mut RequestDispatcher,
    health: &'a mut ProxyHealthManager,
    account: &'a mut Account,
}

impl<'a> ApiSession<'a> {
    pub fn new(
        dispatcher: &'a mut RequestDispatcher,
        health: &'a mut ProxyHealthManager,
        account: &'a mut Account,
    ) -> Self {
        Self {
            dispatcher,
            health,
            account,
        }
    }

    pub fn account(&self) -> &Account {
        self.account
    }

    async fn call(&mut self, endpoint: Endpoint, payload: Option<Value>) -> Option<ApiResponse> {
        self.dispatcher
            .execute(self.health, self.account, endpoint, payload.as_ref())
            .await
    }

    async fn call_body(&mut self, endpoint: Endpoint, payload: Option<Value>) -> Option<Value> {
        self.call(endpoint, payload).await.map(|r| r.body)
    }

    /// Session-alive check
    pub async fn check_login(&mut self) -> bool {
        let logged_in = self
            .call_body(Endpoint::LoginCheck, None)
            .await
            .map(|body| is_logged_in(&body))
            .unwrap_or(false);

        if logged_in {
            info!("Login successful");
        }
        logged_in
    }

    /// Fetch the profile and remember the account's `fid`
    pub async fn fetch_user(&mut self) -> Option<UserInfo> {
        let user = UserInfo::from_value(self.call_body(Endpoint::UserInfo, None).await?)?;
        self.account.fid = Some(user.fid.clone());
        Some(user)
    }

    pub async fn points(&mut self) -> Option<PointBalance> {
        let payload = json!({ "fid": self.account.fid_or_empty() });
        let balance = PointBalance::from_value(self.call_body(Endpoint::Points, Some(payload)).await?);
        if let Some(balance) = &balance {
            info!("Current points: {}", balance.points);
        }
        balance
    }

    /// Task list for a category; a failed call reads as an empty list
    pub async fn tasks(&mut self, category: TaskCategory) -> Vec<Task> {
        let fid = self.account.fid_or_empty().to_string();
        let (endpoint, payload) = match category {
            TaskCategory::Daily => (
                Endpoint::DailyTasks,
                json!({ "fidId": fid, "page": DAILY_PAGE, "limit": DAILY_LIMIT }),
            ),
            TaskCategory::Main => (Endpoint::MainTasks, json!({ "fidId": fid })),
        };

        let tasks = self
            .call_body(endpoint, Some(payload))
            .await
            .map(Task::list_from_value)
            .unwrap_or_default();

        info!("Found {} {} tasks", tasks.len(), category);
        tasks
    }

    /// Register engagement; `None` when the click did not go through
    pub async fn click_task(&mut self, task: &Task) -> Option<ClickResult> {
        let payload = json!({
            "taskId": task.task_id,
            "fid": self.account.fid_or_empty(),
            "taskName": task.task_name,
            "clickStatus": Value::Null,
        });

        let result = ClickResult::from_value(self.call_body(Endpoint::ClickTask, Some(payload)).await?);
        info!("Successfully clicked task: {}", task.name());
        Some(result)
    }

    /// Re-query a daily task after clicking it
    pub async fn task_status(&mut self, task_id: &TaskId) -> Option<TaskStatusUpdate> {
        let payload = json!({ "fidId": self.account.fid_or_empty(), "taskId": task_id });
        let update = TaskStatusUpdate::from_value(self.call_body(Endpoint::UpdateTask, Some(payload)).await?)?;

        let state = if update.ready_to_claim {
            "Ready to claim"
        } else {
            "In progress"
        };
        info!("Task {} status: {}", task_id, state);
        Some(update)
    }

    /// Submit a claim; `None` when the request itself failed
    pub async fn claim(&mut self, task_id: &TaskId, points: u64) -> Option<ClaimOutcome> {
        let payload = json!({
            "taskId": task_id,
            "fid": self.account.fid_or_empty(),
            "point": points,
        });
        let body = self.call_body(Endpoint::UpdatePoints, Some(payload)).await?;
        Some(ClaimOutcome::from_value(&body))
    }

    /// Best-effort chest opening; cooldown is a normal outcome
    pub async fn open_magic_chest(&mut self) -> ChestOutcome {
        let outcome = match self.call(Endpoint::OpenMagicChest, None).await {
            Some(response) if Endpoint::OpenMagicChest.is_expected_cooldown(response.status) => {
                ChestOutcome::Cooldown
            }
            Some(response) => ChestOutcome::from_body(&response.body),
            None => ChestOutcome::Failed,
        };

        match &outcome {
            ChestOutcome::Opened { bonus } => info!("Opened magic chest! Got {} bonus", bonus),
            ChestOutcome::Cooldown => info!("Magic chest is currently in cooldown"),
            ChestOutcome::Failed => info!("Magic chest in cooldown or unavailable"),
        }
        outcome
    }
}
