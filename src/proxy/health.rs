//! Health checking for upstream proxies
//!
//! Validates candidates against an IP echo endpoint and keeps the working
//! pool together with per-proxy failure counters.

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use reqwest::header::USER_AGENT;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::api::headers::BROWSER_USER_AGENT;
use crate::config::ProxyConfig;
use crate::error::{BotError, Result};
use crate::models::Proxy;
use crate::proxy::transport::ProxyTransport;

/// Health checker configuration
#[derive(Debug, Clone)]
pub struct HealthCheckerConfig {
    /// IP echo endpoint, must answer `{"ip": "..."}`
    pub probe_url: String,
    /// Timeout for each probe
    pub probe_timeout: Duration,
}

impl Default for HealthCheckerConfig {
    fn default() -> Self {
        Self {
            probe_url: "https://api.ipify.org?format=json".to_string(),
            probe_timeout: Duration::from_secs(5),
        }
    }
}

impl From<&ProxyConfig> for HealthCheckerConfig {
    fn from(config: &ProxyConfig) -> Self {
        Self {
            probe_url: config.probe_url.clone(),
            probe_timeout: config.probe_timeout,
        }
    }
}

/// Result of probing one candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub success: bool,
    pub public_ip: Option<String>,
}

impl ProbeResult {
    fn failed() -> Self {
        Self {
            success: false,
            public_ip: None,
        }
    }
}

/// Owns the working proxy pool and the failure counters for one run
pub struct ProxyHealthManager {
    config: HealthCheckerConfig,
    pool: Vec<Proxy>,
    failures: HashMap<String, u32>,
}

impl ProxyHealthManager {
    pub fn new(config: HealthCheckerConfig) -> Self {
        Self {
            config,
            pool: Vec::new(),
            failures: HashMap::new(),
        }
    }

    /// Probe a single candidate line; never mutates the pool
    pub async fn validate(&self, candidate: &str) -> ProbeResult {
        match parse_candidate(candidate) {
            Some(proxy) => self.probe(&proxy).await,
            None => ProbeResult::failed(),
        }
    }

    /// Validate candidates one after another and keep the ones that answer
    ///
    /// Replaces the current pool. An empty result is not an error; the run
    /// then uses direct connections only.
    #[instrument(skip(self, candidates), fields(candidates = candidates.len()))]
    pub async fn build_pool(&mut self, candidates: &[String]) -> &[Proxy] {
        self.pool.clear();
        self.failures.clear();

        if candidates.is_empty() {
            warn!("No proxies configured, running with direct connections");
            return &self.pool;
        }

        let mut seen = HashSet::new();
        for candidate in candidates {
            let Some(proxy) = parse_candidate(candidate) else {
                continue;
            };
            // `host:port` and `http://host:port` are the same relay
            if !seen.insert(proxy.url.clone()) {
                debug!("Skipping duplicate proxy {}", proxy.label());
                continue;
            }

            let result = self.probe(&proxy).await;
            if let (true, Some(ip)) = (result.success, result.public_ip) {
                self.pool.push(proxy.with_public_ip(ip));
            }
        }

        if self.pool.is_empty() {
            warn!("No working proxies found, running with direct connections");
        } else {
            info!("Found {} working proxies", self.pool.len());
        }

        &self.pool
    }

    async fn probe(&self, proxy: &Proxy) -> ProbeResult {
        debug!("Probing proxy {}", proxy.label());

        let started = Instant::now();
        match self.fetch_public_ip(proxy).await {
            Ok(ip) => {
                info!(
                    "Proxy IP: {} ({}ms)",
                    ip,
                    started.elapsed().as_millis()
                );
                ProbeResult {
                    success: true,
                    public_ip: Some(ip),
                }
            }
            Err(e) => {
                warn!("Proxy {} failed probe: {}", proxy.label(), e);
                ProbeResult::failed()
            }
        }
    }

    async fn fetch_public_ip(&self, proxy: &Proxy) -> Result<String> {
        let client = ProxyTransport::probe_client(proxy, self.config.probe_timeout)?;
        let response = client
            .get(&self.config.probe_url)
            .header(USER_AGENT, BROWSER_USER_AGENT)
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Err(BotError::ProbeFailed(format!(
                "unexpected status {}",
                response.status()
            )));
        }

        let body: Value = response.json().await?;
        body.get("ip")
            .and_then(Value::as_str)
            .filter(|ip| !ip.is_empty())
            .map(str::to_string)
            .ok_or_else(|| BotError::ProbeFailed("response has no ip field".into()))
    }

    /// Working proxies in validation order
    pub fn pool(&self) -> &[Proxy] {
        &self.pool
    }

    pub fn working_count(&self) -> usize {
        self.pool.len()
    }

    /// Count a failed attempt through `proxy_url`, returning the new total
    pub fn record_failure(&mut self, proxy_url: &str) -> u32 {
        let count = self.failures.entry(proxy_url.to_string()).or_insert(0);
        *count += 1;
        *count
    }

    /// Any successful request resets the counter
    pub fn record_success(&mut self, proxy_url: &str) {
        self.failures.insert(proxy_url.to_string(), 0);
    }

    pub fn failure_count(&self, proxy_url: &str) -> u32 {
        self.failures.get(proxy_url).copied().unwrap_or(0)
    }
}

fn parse_candidate(candidate: &str) -> Option<Proxy> {
    match Proxy::parse(candidate) {
        Ok(proxy) => Some(proxy),
        Err(e) => {
            warn!("Skipping proxy candidate '{}': {}", candidate.trim(), e);
            None
        }
    }
}
