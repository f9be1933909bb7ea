use url::Url;

use crate::error::{BotError, Result};

/// Proxy protocol type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyProtocol {
    Http,
    Https,
    Socks5,
    Socks5h,
}

impl ProxyProtocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProxyProtocol::Http => "http",
            ProxyProtocol::Https => "https",
            ProxyProtocol::Socks5 => "socks5",
            ProxyProtocol::Socks5h => "socks5h",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "http" => Some(ProxyProtocol::Http),
            "https" => Some(ProxyProtocol::Https),
            "socks5" => Some(ProxyProtocol::Socks5),
            "socks5h" => Some(ProxyProtocol::Socks5h),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProxyProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An outbound relay, validated or not
///
/// `public_ip` is only set once the proxy passed the IP probe, which is what
/// makes it "working".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proxy {
    /// Normalised proxy URL, always carrying a scheme
    pub url: String,
    pub protocol: ProxyProtocol,
    pub host: String,
    pub port: u16,
    /// Exit IP reported by the probe endpoint
    pub public_ip: Option<String>,
}

impl Proxy {
    /// Parse a candidate line (`host:port`, `user:pass@host:port` or a full URL)
    pub fn parse(candidate: &str) -> Result<Self> {
        let trimmed = candidate.trim();
        if trimmed.is_empty() {
            return Err(BotError::InvalidProxyAddress("empty proxy line".into()));
        }

        let trimmed = trimmed.trim_end_matches('/');
        let normalised = if trimmed.contains("://") {
            trimmed.to_string()
        } else {
            format!("http://{}", trimmed)
        };

        let url = Url::parse(&normalised)?;

        let protocol = ProxyProtocol::from_str(url.scheme())
            .ok_or_else(|| BotError::UnsupportedProtocol(url.scheme().to_string()))?;

        let host = url
            .host_str()
            .ok_or_else(|| {
                BotError::InvalidProxyAddress(format!("Invalid address '{}': missing host", trimmed))
            })?
            .to_string();

        let port = url.port_or_known_default().ok_or_else(|| {
            BotError::InvalidProxyAddress(format!("Invalid address '{}': missing port", trimmed))
        })?;

        Ok(Self {
            url: normalised,
            protocol,
            host,
            port,
            public_ip: None,
        })
    }

    /// Attach the exit IP resolved by the probe
    pub fn with_public_ip(mut self, ip: impl Into<String>) -> Self {
        self.public_ip = Some(ip.into());
        self
    }

    /// Whether the proxy passed the IP probe
    pub fn is_working(&self) -> bool {
        self.public_ip.is_some()
    }

    /// Human-readable name for logs; the exit IP when known, never credentials
    pub fn label(&self) -> String {
        match &self.public_ip {
            Some(ip) => ip.clone(),
            None => format!("{}:{}", self.host, self.port),
        }
    }
}
