//! HTTP clients for direct and proxied routes
//!
//! One `reqwest::Client` per route, built lazily and reused so connection
//! pools survive across requests of the same account.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::{redirect, Client};
use tracing::debug;

use crate::error::{BotError, Result};
use crate::models::Proxy;

const MAX_REDIRECTS: usize = 5;

/// Builds and caches clients keyed by proxy URL
pub struct ProxyTransport {
    timeout: Duration,
    direct: Client,
    proxied: HashMap<String, Client>,
}

impl ProxyTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        Ok(Self {
            timeout,
            direct: Self::build(None, timeout)?,
            proxied: HashMap::new(),
        })
    }

    /// Client that never goes through a proxy, ignoring `HTTP(S)_PROXY` too
    pub fn direct(&self) -> &Client {
        &self.direct
    }

    /// Client routed through `proxy`
    pub fn via(&mut self, proxy: &Proxy) -> Result<&Client> {
        if !self.proxied.contains_key(&proxy.url) {
            debug!("Building client for proxy {}", proxy.label());
            let client = Self::build(Some(proxy), self.timeout)?;
            self.proxied.insert(proxy.url.clone(), client);
        }

        self.proxied
            .get(&proxy.url)
            .ok_or_else(|| BotError::Client(format!("no client for {}", proxy.label())))
    }

    /// One-off client for probing a candidate with its own timeout
    pub fn probe_client(proxy: &Proxy, timeout: Duration) -> Result<Client> {
        Self::build(Some(proxy), timeout)
    }

    fn build(proxy: Option<&Proxy>, timeout: Duration) -> Result<Client> {
        let mut builder = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .redirect(redirect::Policy::limited(MAX_REDIRECTS));

        builder = match proxy {
            Some(proxy) => {
                let upstream = reqwest::Proxy::all(&proxy.url).map_err(|e| {
                    BotError::InvalidProxyAddress(format!("{}: {}", proxy.label(), e))
                })?;
                builder.proxy(upstream)
            }
            None => builder.no_proxy(),
        };

        builder
            .build()
            .map_err(|e| BotError::Client(format!("failed to build HTTP client: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_via_caches_client_per_proxy() {
        let mut transport = ProxyTransport::new(Duration::from_secs(1)).unwrap();
        let a = Proxy::parse("127.0.0.1:8081").unwrap();
        let b = Proxy::parse("127.0.0.1:8082").unwrap();

        transport.via(&a).unwrap();
        transport.via(&a).unwrap();
        transport.via(&b).unwrap();

        assert_eq!(transport.proxied.len(), 2);
    }

    #[test]
    fn test_probe_client_accepts_socks() {
        let proxy = Proxy::parse("socks5://127.0.0.1:1080").unwrap();
        assert!(ProxyTransport::probe_client(&proxy, Duration::from_secs(1)).is_ok());
    }
}
