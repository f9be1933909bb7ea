//! Request dispatch with retry logic and direct-connection fallback
//!
//! Every remote call goes through [`RequestDispatcher::execute`]. Calls try
//! the account's proxy first (bounded retries), then fall back to a single
//! direct attempt. Failures never escape: they resolve to `None`.

use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, COOKIE};
use reqwest::StatusCode;
use serde_json::Value;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use super::endpoints::Endpoint;
use super::headers::browser_headers;
use crate::config::Config;
use crate::error::{BotError, Result};
use crate::models::{Account, Proxy};
use crate::proxy::{ProxyHealthManager, ProxyTransport};

/// Configuration for request dispatch
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// API base URL without trailing slash
    pub base_url: String,
    /// Attempts through a proxy before falling back
    pub max_retries: u32,
    /// Pause between soft-failed proxy attempts
    pub retry_delay: Duration,
    /// Wall-clock bound for a single attempt
    pub request_timeout: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.fardog.xyz/api".to_string(),
            max_retries: 3,
            retry_delay: Duration::from_millis(1000),
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl From<&Config> for DispatchConfig {
    fn from(config: &Config) -> Self {
        Self {
            base_url: config.api.base_url.clone(),
            max_retries: config.proxy.max_retries.max(1),
            retry_delay: config.proxy.retry_delay,
            request_timeout: config.api.request_timeout,
        }
    }
}

/// A delivered response (status below 500)
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// Issues authenticated calls on behalf of accounts
pub struct RequestDispatcher {
    config: DispatchConfig,
    transport: ProxyTransport,
    headers: HeaderMap,
}

impl RequestDispatcher {
    pub fn new(config: DispatchConfig) -> Result<Self> {
        let transport = ProxyTransport::new(config.request_timeout)?;
        Ok(Self {
            config,
            transport,
            headers: browser_headers(),
        })
    }

    /// Execute one logical call for `account`
    ///
    /// Updates `account.proxy_enabled` and the proxy failure counters in
    /// `health`. Returns `None` when every attempt failed.
    pub async fn execute(
        &mut self,
        health: &mut ProxyHealthManager,
        account: &mut Account,
        endpoint: Endpoint,
        payload: Option<&Value>,
    ) -> Option<ApiResponse> {
        if let Some(proxy) = account.active_proxy().cloned() {
            if endpoint.announces_connection() {
                info!("Using proxy: {}", proxy.label());
            }

            if let Some(response) = self
                .execute_via_proxy(health, account, &proxy, endpoint, payload)
                .await
            {
                return Some(response);
            }

            error!(
                account = %account.label(),
                "All proxy attempts failed, disabling proxy"
            );
            account.disable_proxy();
            info!("Falling back to direct connection...");
        } else if endpoint.announces_connection() {
            let suffix = if account.proxy.is_some() {
                " (proxy disabled)"
            } else {
                ""
            };
            info!("Using direct connection{}", suffix);
        }

        match self.send(None, account, endpoint, payload).await {
            Ok(response) => Some(response),
            Err(e) => {
                error!(
                    account = %account.label(),
                    endpoint = %endpoint,
                    "Request failed: {}",
                    e
                );
                None
            }
        }
    }

    /// Proxy attempt loop; `None` means fall back
    async fn execute_via_proxy(
        &mut self,
        health: &mut ProxyHealthManager,
        account: &mut Account,
        proxy: &Proxy,
        endpoint: Endpoint,
        payload: Option<&Value>,
    ) -> Option<ApiResponse> {
        let max_attempts = self.config.max_retries.max(1);
        let started = Instant::now();

        for attempt in 1..=max_attempts {
            match self.send(Some(proxy), account, endpoint, payload).await {
                Ok(response) => {
                    health.record_success(&proxy.url);
                    if attempt > 1 {
                        info!(
                            "Request succeeded after {} attempts ({}ms)",
                            attempt,
                            started.elapsed().as_millis()
                        );
                    }
                    return Some(response);
                }
                Err(e) => {
                    let failures = health.record_failure(&proxy.url);
                    debug!(proxy = %proxy.label(), failures, "Proxy attempt failed");

                    if e.is_transport() {
                        error!(
                            proxy = %proxy.label(),
                            "Proxy connection failed ({}), disabling proxy",
                            e
                        );
                        account.disable_proxy();
                        break;
                    }

                    warn!(
                        endpoint = %endpoint,
                        "Proxy request failed ({}/{}): {}",
                        attempt,
                        max_attempts,
                        e
                    );
                    if attempt < max_attempts {
                        info!("Retrying in {}ms...", self.config.retry_delay.as_millis());
                        sleep(self.config.retry_delay).await;
                    }
                }
            }
        }

        None
    }

    /// One attempt over one route
    async fn send(
        &mut self,
        proxy: Option<&Proxy>,
        account: &Account,
        endpoint: Endpoint,
        payload: Option<&Value>,
    ) -> Result<ApiResponse> {
        let url = format!("{}{}", self.config.base_url, endpoint.path());

        let client = match proxy {
            Some(proxy) => self.transport.via(proxy)?.clone(),
            None => self.transport.direct().clone(),
        };

        let mut request = client
            .request(endpoint.method(), &url)
            .headers(self.headers.clone())
            .header(COOKIE, account.cookie_header());

        if let Some(proxy) = proxy {
            request = request
                .header("x-forwarded-for", proxy.host.as_str())
                .header("x-forwarded-proto", "https");
        }

        if let Some(body) = payload {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();

        if endpoint.is_expected_cooldown(status) {
            debug!(endpoint = %endpoint, "Cooldown status {}", status);
            return Ok(ApiResponse {
                status,
                body: Value::Null,
            });
        }

        if status.is_server_error() {
            return Err(BotError::ServerStatus {
                status: status.as_u16(),
            });
        }

        if !(status.is_success() || status.is_client_error()) {
            return Err(BotError::MalformedResponse(format!(
                "unexpected status {}",
                status
            )));
        }

        let bytes = response.bytes().await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(BotError::EmptyResponse);
        }

        let body: Value = serde_json::from_slice(&bytes)?;
        if body.is_null() {
            return Err(BotError::EmptyResponse);
        }

        Ok(ApiResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::HealthCheckerConfig;
    use serde_json::json;
    use wiremock::matchers::{any, body_json, header, method, path};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    fn dispatcher(server: &MockServer) -> RequestDispatcher {
        RequestDispatcher::new(DispatchConfig {
            base_url: format!("{}/api", server.uri()),
            max_retries: 3,
            retry_delay: Duration::ZERO,
            request_timeout: Duration::from_secs(2),
        })
        .unwrap()
    }

    fn health() -> ProxyHealthManager {
        ProxyHealthManager::new(HealthCheckerConfig::default())
    }

    fn closed_port() -> String {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        addr.to_string()
    }

    fn proxied_account(proxy_addr: &str) -> Account {
        let mut account = Account::new(0, "cookie-1");
        account.assign_proxy(Proxy::parse(proxy_addr).unwrap());
        account
    }

    /// A mock relay that answers every forwarded request with `template`
    async fn relay(template: ResponseTemplate, expected: u64) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(any())
            .respond_with(template)
            .expect(expected)
            .mount(&server)
            .await;
        server
    }

    fn without_forwarding_headers(request: &Request) -> bool {
        !request.headers.contains_key("x-forwarded-for")
    }

    #[tokio::test]
    async fn test_direct_request_sends_cookie_and_payload() {
        let api = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/user/update_point"))
            .and(header("cookie", "token=cookie-1"))
            .and(header("origin", "https://farcasterdog.xyz"))
            .and(body_json(json!({"taskId": 1, "fid": "9", "point": 10})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "ok"})))
            .expect(1)
            .mount(&api)
            .await;

        let mut account = Account::new(0, "cookie-1");
        let payload = json!({"taskId": 1, "fid": "9", "point": 10});
        let response = dispatcher(&api)
            .execute(&mut health(), &mut account, Endpoint::UpdatePoints, Some(&payload))
            .await
            .unwrap();

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body, json!({"message": "ok"}));
    }

    #[tokio::test]
    async fn test_client_error_bodies_are_delivered() {
        let api = MockServer::start().await;
        Mock::given(path("/api/user/update_point"))
            .respond_with(
                ResponseTemplate::new(409)
                    .set_body_json(json!({"message": "Already inserted previously"})),
            )
            .mount(&api)
            .await;

        let mut account = Account::new(0, "c");
        let response = dispatcher(&api)
            .execute(&mut health(), &mut account, Endpoint::UpdatePoints, None)
            .await
            .unwrap();

        assert_eq!(response.status, StatusCode::CONFLICT);
        assert_eq!(response.body["message"], "Already inserted previously");
    }

    #[tokio::test]
    async fn test_direct_failures_resolve_to_none() {
        let api = MockServer::start().await;
        Mock::given(path("/api/user/select"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&api)
            .await;
        Mock::given(path("/api/point/select_point_by_fid"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>nope</html>"))
            .mount(&api)
            .await;
        Mock::given(path("/api/user/all_task/task_main"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&api)
            .await;

        let mut dispatcher = dispatcher(&api);
        let mut health = health();
        let mut account = Account::new(0, "c");

        for endpoint in [Endpoint::UserInfo, Endpoint::Points, Endpoint::MainTasks] {
            assert!(dispatcher
                .execute(&mut health, &mut account, endpoint, None)
                .await
                .is_none());
        }
    }

    #[tokio::test]
    async fn test_magic_chest_400_is_cooldown_not_failure() {
        let api = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/farcaster_dog/open_magic_chest"))
            .respond_with(ResponseTemplate::new(400).set_body_string("cooldown"))
            .mount(&api)
            .await;

        let mut account = Account::new(0, "c");
        let response = dispatcher(&api)
            .execute(&mut health(), &mut account, Endpoint::OpenMagicChest, None)
            .await
            .unwrap();

        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.body, Value::Null);
    }

    #[tokio::test]
    async fn test_proxy_success_resets_failure_count() {
        let api = MockServer::start().await;
        let relay = relay(
            ResponseTemplate::new(200).set_body_json(json!({"status": true})),
            1,
        )
        .await;

        let mut health = health();
        let mut account = proxied_account(&relay.address().to_string());
        let proxy_url = account.proxy.as_ref().unwrap().url.clone();
        health.record_failure(&proxy_url);

        let response = dispatcher(&api)
            .execute(&mut health, &mut account, Endpoint::LoginCheck, None)
            .await
            .unwrap();

        assert_eq!(response.body, json!({"status": true}));
        assert_eq!(health.failure_count(&proxy_url), 0);
        assert!(account.proxy_enabled);
    }

    #[tokio::test]
    async fn test_soft_failures_respect_retry_ceiling_then_fall_back() {
        let api = MockServer::start().await;
        Mock::given(path("/api/login_farquest_dog/check-status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": true})))
            .expect(1)
            .mount(&api)
            .await;
        // exactly max_retries attempts reach the relay, never more
        let relay = relay(ResponseTemplate::new(502), 3).await;

        let mut health = health();
        let mut account = proxied_account(&relay.address().to_string());
        let proxy_url = account.proxy.as_ref().unwrap().url.clone();

        let response = dispatcher(&api)
            .execute(&mut health, &mut account, Endpoint::LoginCheck, None)
            .await;

        assert_eq!(response.unwrap().body, json!({"status": true}));
        assert_eq!(health.failure_count(&proxy_url), 3);
        assert!(!account.proxy_enabled);

        let direct = api.received_requests().await.unwrap();
        assert!(direct.iter().all(without_forwarding_headers));
    }

    #[tokio::test]
    async fn test_hard_failure_disables_proxy_immediately_and_sticks() {
        let api = MockServer::start().await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"fid": 1}])))
            .expect(2)
            .mount(&api)
            .await;

        let mut dispatcher = dispatcher(&api);
        let mut health = health();
        let mut account = proxied_account(&closed_port());
        let proxy_url = account.proxy.as_ref().unwrap().url.clone();

        let first = dispatcher
            .execute(&mut health, &mut account, Endpoint::UserInfo, None)
            .await;
        assert!(first.is_some());
        assert!(!account.proxy_enabled);
        // one refused connection, no retries on a dead relay
        assert_eq!(health.failure_count(&proxy_url), 1);

        let second = dispatcher
            .execute(&mut health, &mut account, Endpoint::UserInfo, None)
            .await;
        assert!(second.is_some());
        assert_eq!(health.failure_count(&proxy_url), 1);
    }

    #[tokio::test]
    async fn test_everything_failing_returns_none() {
        let api = MockServer::start().await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&api)
            .await;
        let relay = relay(ResponseTemplate::new(500), 3).await;

        let mut account = proxied_account(&relay.address().to_string());
        let response = dispatcher(&api)
            .execute(&mut health(), &mut account, Endpoint::Points, None)
            .await;

        assert!(response.is_none());
        assert!(!account.proxy_enabled);
    }

    #[tokio::test]
    async fn test_proxied_request_carries_forwarding_headers() {
        let api = MockServer::start().await;
        let relay = MockServer::start().await;
        Mock::given(header("x-forwarded-proto", "https"))
            .and(header("x-forwarded-for", "127.0.0.1"))
            .and(header("cookie", "token=cookie-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&relay)
            .await;

        let mut account = proxied_account(&relay.address().to_string());
        let response = dispatcher(&api)
            .execute(&mut health(), &mut account, Endpoint::DailyTasks, None)
            .await
            .unwrap();

        assert_eq!(response.body, json!([]));
        assert!(api.received_requests().await.unwrap().is_empty());
    }
}
