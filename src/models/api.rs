//! Typed views over the remote API's loosely shaped JSON responses
//!
//! Responses arrive as arrays, objects or bare values depending on the
//! endpoint. Normalisation happens here, once, so callers work with tagged
//! results instead of probing JSON.

use serde::Serialize;
use serde_json::Value;

use super::task::{flag_from_value, numeric_flag};

/// Confirmation message for a freshly credited claim
pub const CLAIM_CREDITED_MESSAGE: &str = "Update point thành công";
/// Confirmation message for a claim that was credited before
pub const CLAIM_ALREADY_CREDITED_MESSAGE: &str = "Already inserted previously";

/// First element when the value is an array, the value itself when it is an
/// object, nothing otherwise
pub fn first_record(value: Value) -> Option<Value> {
    match value {
        Value::Array(items) => items.into_iter().next().filter(Value::is_object),
        Value::Object(_) => Some(value),
        _ => None,
    }
}

/// Session-alive check result
pub fn is_logged_in(value: &Value) -> bool {
    value.get("status").and_then(Value::as_bool).unwrap_or(false)
}

/// Profile returned by the user-select endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserInfo {
    /// Remote numeric identifier, kept as text
    pub fid: String,
    pub user_name: Option<String>,
}

impl UserInfo {
    /// `None` when the response has no usable `fid`
    pub fn from_value(value: Value) -> Option<Self> {
        let record = first_record(value)?;
        let fid = match record.get("fid")? {
            Value::Number(n) => n.to_string(),
            Value::String(s) if !s.trim().is_empty() => s.trim().to_string(),
            _ => return None,
        };
        let user_name = record
            .get("userName")
            .and_then(Value::as_str)
            .map(str::to_string);

        Some(Self { fid, user_name })
    }
}

/// Balance from the point-select endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointBalance {
    /// Rendered as the API sent it (integer or decimal)
    pub points: String,
}

impl PointBalance {
    pub fn from_value(value: Value) -> Option<Self> {
        let record = first_record(value)?;
        let points = match record.get("Point")? {
            Value::Number(n) => n.to_string(),
            Value::String(s) => s.clone(),
            _ => return None,
        };
        Some(Self { points })
    }
}

/// Click registration result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickResult {
    /// Inline readiness flag (`clickStatus` or `status`) when the response carries one
    pub ready_flag: Option<bool>,
}

impl ClickResult {
    pub fn from_value(value: Value) -> Self {
        let ready_flag = first_record(value).and_then(|record| {
            // `status: true` is a plain acknowledgement, not a readiness flag
            let click = record.get("clickStatus").and_then(numeric_flag);
            let status = record.get("status").and_then(numeric_flag);
            match (click, status) {
                (None, None) => None,
                (click, status) => Some(click == Some(1) || status == Some(1)),
            }
        });
        Self { ready_flag }
    }
}

/// Refreshed daily-task status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskStatusUpdate {
    pub ready_to_claim: bool,
}

impl TaskStatusUpdate {
    /// Only a non-empty array counts as a status report
    pub fn from_value(value: Value) -> Option<Self> {
        let Value::Array(items) = value else {
            return None;
        };
        let first = items.into_iter().next()?;
        let ready = first.get("clickStatus").and_then(flag_from_value) == Some(1);
        Some(Self {
            ready_to_claim: ready,
        })
    }
}

/// Outcome of submitting a claim
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    Credited,
    AlreadyCredited,
    Rejected(Option<String>),
}

impl ClaimOutcome {
    pub fn from_value(value: &Value) -> Self {
        let message = value.get("message").and_then(Value::as_str);
        match message {
            Some(m) if m.contains(CLAIM_CREDITED_MESSAGE) => ClaimOutcome::Credited,
            Some(m) if m.contains(CLAIM_ALREADY_CREDITED_MESSAGE) => ClaimOutcome::AlreadyCredited,
            other => ClaimOutcome::Rejected(other.map(str::to_string)),
        }
    }

    /// Both confirmations count; re-claiming is never an error
    pub fn is_success(&self) -> bool {
        matches!(self, ClaimOutcome::Credited | ClaimOutcome::AlreadyCredited)
    }
}

/// Magic chest result; cooldown is a normal outcome, distinct from failure
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ChestOutcome {
    Opened { bonus: Value },
    Cooldown,
    Failed,
}

impl ChestOutcome {
    pub fn from_body(value: &Value) -> Self {
        match value.get("bonus") {
            Some(bonus) if is_truthy(bonus) => ChestOutcome::Opened {
                bonus: bonus.clone(),
            },
            _ => ChestOutcome::Cooldown,
        }
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_first_record_normalisation() {
        assert_eq!(first_record(json!([{"a": 1}, {"a": 2}])), Some(json!({"a": 1})));
        assert_eq!(first_record(json!({"a": 1})), Some(json!({"a": 1})));
        assert_eq!(first_record(json!([])), None);
        assert_eq!(first_record(json!([1, 2])), None);
        assert_eq!(first_record(json!("text")), None);
    }

    #[test]
    fn test_login_status() {
        assert!(is_logged_in(&json!({"status": true})));
        assert!(!is_logged_in(&json!({"status": false})));
        assert!(!is_logged_in(&json!({"status": "true"})));
        assert!(!is_logged_in(&json!([])));
    }

    #[test]
    fn test_user_info_from_array_and_object() {
        let from_array = UserInfo::from_value(json!([{"fid": 4242, "userName": "dog"}])).unwrap();
        assert_eq!(from_array.fid, "4242");
        assert_eq!(from_array.user_name.as_deref(), Some("dog"));

        let from_object = UserInfo::from_value(json!({"fid": "77"})).unwrap();
        assert_eq!(from_object.fid, "77");
        assert_eq!(from_object.user_name, None);
    }

    #[test]
    fn test_user_info_requires_fid() {
        assert!(UserInfo::from_value(json!({"userName": "dog"})).is_none());
        assert!(UserInfo::from_value(json!({"fid": null})).is_none());
        assert!(UserInfo::from_value(json!([])).is_none());
    }

    #[test]
    fn test_point_balance() {
        let balance = PointBalance::from_value(json!([{"Point": 1500}])).unwrap();
        assert_eq!(balance.points, "1500");
        assert!(PointBalance::from_value(json!([])).is_none());
    }

    #[test]
    fn test_click_result_inline_flag() {
        assert_eq!(
            ClickResult::from_value(json!({"clickStatus": 1})).ready_flag,
            Some(true)
        );
        assert_eq!(
            ClickResult::from_value(json!([{"clickStatus": 0, "status": 1}])).ready_flag,
            Some(true)
        );
        assert_eq!(
            ClickResult::from_value(json!({"clickStatus": 0})).ready_flag,
            Some(false)
        );
        assert_eq!(
            ClickResult::from_value(json!({"message": "ok"})).ready_flag,
            None
        );
        assert_eq!(ClickResult::from_value(json!(true)).ready_flag, None);
    }

    #[test]
    fn test_click_acknowledgement_is_not_readiness() {
        assert_eq!(
            ClickResult::from_value(json!({"status": true, "message": "registered"})).ready_flag,
            None
        );
        assert_eq!(
            ClickResult::from_value(json!({"clickStatus": "1"})).ready_flag,
            Some(true)
        );
    }

    #[test]
    fn test_task_status_update() {
        assert_eq!(
            TaskStatusUpdate::from_value(json!([{"clickStatus": 1}])),
            Some(TaskStatusUpdate {
                ready_to_claim: true
            })
        );
        assert_eq!(
            TaskStatusUpdate::from_value(json!([{"clickStatus": 0}])),
            Some(TaskStatusUpdate {
                ready_to_claim: false
            })
        );
        assert_eq!(TaskStatusUpdate::from_value(json!([])), None);
        assert_eq!(TaskStatusUpdate::from_value(json!({"clickStatus": 1})), None);
    }

    #[test]
    fn test_claim_outcome_messages() {
        let credited = ClaimOutcome::from_value(&json!({"message": "Update point thành công"}));
        assert_eq!(credited, ClaimOutcome::Credited);
        assert!(credited.is_success());

        let again = ClaimOutcome::from_value(&json!({"message": "Already inserted previously"}));
        assert_eq!(again, ClaimOutcome::AlreadyCredited);
        assert!(again.is_success());

        let rejected = ClaimOutcome::from_value(&json!({"message": "Task not done"}));
        assert!(!rejected.is_success());
        assert!(!ClaimOutcome::from_value(&json!({})).is_success());
    }

    #[test]
    fn test_chest_outcome_from_body() {
        assert_eq!(
            ChestOutcome::from_body(&json!({"bonus": 30})),
            ChestOutcome::Opened { bonus: json!(30) }
        );
        assert_eq!(ChestOutcome::from_body(&json!({"bonus": 0})), ChestOutcome::Cooldown);
        assert_eq!(ChestOutcome::from_body(&json!({})), ChestOutcome::Cooldown);
    }
}
