use super::Proxy;

/// One user session against the remote API
#[derive(Debug, Clone)]
pub struct Account {
    /// 0-based load order, drives round-robin proxy assignment
    pub index: usize,
    cookie: String,
    /// Current proxy assignment, if any
    pub proxy: Option<Proxy>,
    /// Flips to false after a hard transport failure or exhausted retries
    pub proxy_enabled: bool,
    /// Remote numeric identifier, known after the first user-info fetch
    pub fid: Option<String>,
}

impl Account {
    pub fn new(index: usize, cookie: impl Into<String>) -> Self {
        Self {
            index,
            cookie: cookie.into().trim().to_string(),
            proxy: None,
            proxy_enabled: false,
            fid: None,
        }
    }

    pub fn cookie(&self) -> &str {
        &self.cookie
    }

    /// Value of the `Cookie` header
    pub fn cookie_header(&self) -> String {
        format!("token={}", self.cookie)
    }

    /// `Account N`, 1-based
    pub fn label(&self) -> String {
        format!("Account {}", self.index + 1)
    }

    pub fn assign_proxy(&mut self, proxy: Proxy) {
        self.proxy = Some(proxy);
        self.proxy_enabled = true;
    }

    /// The proxy to go through, or `None` for a direct connection
    pub fn active_proxy(&self) -> Option<&Proxy> {
        if self.proxy_enabled {
            self.proxy.as_ref()
        } else {
            None
        }
    }

    pub fn disable_proxy(&mut self) {
        self.proxy_enabled = false;
    }

    /// Give a previously disabled proxy another chance; no-op without one
    pub fn restore_proxy(&mut self) {
        self.proxy_enabled = self.proxy.is_some();
    }

    /// `fid` for request payloads; empty until user info was fetched
    pub fn fid_or_empty(&self) -> &str {
        self.fid.as_deref().unwrap_or("")
    }
}
