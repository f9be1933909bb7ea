use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Task category; decides how claim readiness is determined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskCategory {
    Daily,
    Main,
}

impl TaskCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskCategory::Daily => "daily",
            TaskCategory::Main => "main",
        }
    }
}

impl std::fmt::Display for TaskCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Task identifier, echoed back to the API in whatever shape it arrived
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaskId {
    Number(i64),
    Text(String),
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskId::Number(n) => write!(f, "{}", n),
            TaskId::Text(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClickStatus {
    /// `clickStatus: null`
    #[default]
    Unclicked,
    ClickedPending,
    /// `clickStatus: 1`
    ReadyToClaim,
}

impl ClickStatus {
    pub fn from_flag(flag: Option<i64>) -> Self {
        match flag {
            None => ClickStatus::Unclicked,
            Some(1) => ClickStatus::ReadyToClaim,
            Some(_) => ClickStatus::ClickedPending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    #[default]
    Unclaimed,
    Claimed,
}

impl ClaimStatus {
    pub fn from_flag(flag: Option<i64>) -> Self {
        match flag {
            Some(1) => ClaimStatus::Claimed,
            _ => ClaimStatus::Unclaimed,
        }
    }
}

/// One unit of remote-tracked work, as listed by the task endpoints
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub task_id: TaskId,
    #[serde(default)]
    pub task_name: Option<String>,
    #[serde(default, deserialize_with = "de_points")]
    pub point: u64,
    #[serde(default, deserialize_with = "de_click_status")]
    pub click_status: ClickStatus,
    #[serde(default, deserialize_with = "de_claim_status")]
    pub claim_status: ClaimStatus,
    /// Secondary completion flag some main tasks carry
    #[serde(default, deserialize_with = "de_numeric_flag")]
    pub status: Option<i64>,
}

impl Task {
    pub fn name(&self) -> &str {
        self.task_name.as_deref().unwrap_or("unnamed task")
    }

    pub fn is_claimed(&self) -> bool {
        self.claim_status == ClaimStatus::Claimed
    }

    /// Inline readiness flag carried by the task itself
    pub fn has_ready_flag(&self) -> bool {
        self.click_status == ClickStatus::ReadyToClaim || self.status == Some(1)
    }

    /// Parse a task list response; anything but an array yields no tasks and
    /// unparsable entries are dropped
    pub fn list_from_value(value: Value) -> Vec<Task> {
        match value {
            Value::Array(items) => items
                .into_iter()
                .filter_map(|item| match serde_json::from_value::<Task>(item) {
                    Ok(task) => Some(task),
                    Err(e) => {
                        tracing::debug!(error = %e, "Skipping unparsable task entry");
                        None
                    }
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Integer flag from a value that may be a number, numeric string, bool or null
pub fn flag_from_value(value: &Value) -> Option<i64> {
    match value {
        Value::Bool(b) => Some(i64::from(*b)),
        other => numeric_flag(other),
    }
}

/// Integer from a number or numeric string only; fractions are rounded,
/// booleans and anything else yield `None`
pub fn numeric_flag(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f.round() as i64))
        }
        _ => None,
    }
}

fn de_flag<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(flag_from_value(&value))
}

fn de_numeric_flag<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(numeric_flag(&value))
}

fn de_click_status<'de, D>(deserializer: D) -> Result<ClickStatus, D::Error>
where
    D: Deserializer<'de>,
{
    de_flag(deserializer).map(ClickStatus::from_flag)
}

fn de_claim_status<'de, D>(deserializer: D) -> Result<ClaimStatus, D::Error>
where
    D: Deserializer<'de>,
{
    de_flag(deserializer).map(ClaimStatus::from_flag)
}

fn de_points<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(de_flag(deserializer)?.map(|p| p.max(0) as u64).unwrap_or(0))
}
