use reqwest::{Method, StatusCode};

/// The remote API's logical endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    LoginCheck,
    UserInfo,
    Points,
    DailyTasks,
    MainTasks,
    ClickTask,
    UpdateTask,
    UpdatePoints,
    OpenMagicChest,
}

impl Endpoint {
    pub const ALL: [Endpoint; 9] = [
        Endpoint::LoginCheck,
        Endpoint::UserInfo,
        Endpoint::Points,
        Endpoint::DailyTasks,
        Endpoint::MainTasks,
        Endpoint::ClickTask,
        Endpoint::UpdateTask,
        Endpoint::UpdatePoints,
        Endpoint::OpenMagicChest,
    ];

    /// Path relative to the API base URL
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::LoginCheck => "/login_farquest_dog/check-status",
            Endpoint::UserInfo => "/user/select",
            Endpoint::Points => "/point/select_point_by_fid",
            Endpoint::DailyTasks => "/user/all_task/task_daily",
            Endpoint::MainTasks => "/user/all_task/task_main",
            Endpoint::ClickTask => "/user/reg_click_status",
            Endpoint::UpdateTask => "/user/task/task_daily/select_updated_task",
            Endpoint::UpdatePoints => "/user/update_point",
            Endpoint::OpenMagicChest => "/farcaster_dog/open_magic_chest",
        }
    }

    pub fn method(&self) -> Method {
        match self {
            Endpoint::LoginCheck | Endpoint::UserInfo => Method::GET,
            _ => Method::POST,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::LoginCheck => "login_check",
            Endpoint::UserInfo => "user_select",
            Endpoint::Points => "point_select",
            Endpoint::DailyTasks => "daily_task_list",
            Endpoint::MainTasks => "main_task_list",
            Endpoint::ClickTask => "task_click",
            Endpoint::UpdateTask => "task_status_update",
            Endpoint::UpdatePoints => "point_update",
            Endpoint::OpenMagicChest => "magic_chest_open",
        }
    }

    /// Only session setup calls announce which route they take
    pub fn announces_connection(&self) -> bool {
        matches!(self, Endpoint::LoginCheck | Endpoint::UserInfo)
    }

    /// Statuses that mean "not available yet" rather than failure
    pub fn is_expected_cooldown(&self, status: StatusCode) -> bool {
        matches!(self, Endpoint::OpenMagicChest) && status == StatusCode::BAD_REQUEST
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_paths_are_unique_and_rooted() {
        let paths: HashSet<_> = Endpoint::ALL.iter().map(|e| e.path()).collect();
        assert_eq!(paths.len(), Endpoint::ALL.len());
        assert!(paths.iter().all(|p| p.starts_with('/')));
    }

    #[test]
    fn test_methods() {
        assert_eq!(Endpoint::LoginCheck.method(), Method::GET);
        assert_eq!(Endpoint::UserInfo.method(), Method::GET);
        assert_eq!(Endpoint::OpenMagicChest.method(), Method::POST);
        assert_eq!(Endpoint::UpdatePoints.method(), Method::POST);
    }

    #[test]
    fn test_cooldown_only_for_magic_chest_400() {
        assert!(Endpoint::OpenMagicChest.is_expected_cooldown(StatusCode::BAD_REQUEST));
        assert!(!Endpoint::OpenMagicChest.is_expected_cooldown(StatusCode::TOO_MANY_REQUESTS));
        assert!(!Endpoint::UpdatePoints.is_expected_cooldown(StatusCode::BAD_REQUEST));
    }
}
