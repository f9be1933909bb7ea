use thiserror::Error;

/// Unified error type for the Fardog runner
#[derive(Error, Debug)]
pub enum BotError {
    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("No credentials found in {path}; add one cookie per line")]
    NoCredentials { path: String },

    // Proxy errors
    #[error("Invalid proxy address: {0}")]
    InvalidProxyAddress(String),

    #[error("Unsupported proxy protocol: {0}")]
    UnsupportedProtocol(String),

    #[error("Proxy probe failed: {0}")]
    ProbeFailed(String),

    // HTTP errors
    #[error("HTTP client error: {0}")]
    Client(String),

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Server error: status {status}")]
    ServerStatus { status: u16 },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Empty response body")]
    EmptyResponse,

    // I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Fardog operations
pub type Result<T> = std::result::Result<T, BotError>;

impl BotError {
    /// Hard, transport-level failure: the relay is unreachable or unusable.
    ///
    /// Retrying through the same proxy is pointless for these.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            BotError::Connect(_) | BotError::Timeout | BotError::InvalidProxyAddress(_)
        )
    }
}

// Classify reqwest errors into hard (transport) and soft failures
impl From<reqwest::Error> for BotError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            BotError::Timeout
        } else if err.is_connect() {
            BotError::Connect(err.to_string())
        } else if err.is_decode() || err.is_body() {
            BotError::MalformedResponse(err.to_string())
        } else if let Some(status) = err.status() {
            BotError::ServerStatus {
                status: status.as_u16(),
            }
        } else {
            BotError::Client(err.to_string())
        }
    }
}

impl From<url::ParseError> for BotError {
    fn from(err: url::ParseError) -> Self {
        BotError::InvalidProxyAddress(err.to_string())
    }
}

impl From<serde_json::Error> for BotError {
    fn from(err: serde_json::Error) -> Self {
        BotError::MalformedResponse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_classification() {
        assert!(BotError::Timeout.is_transport());
        assert!(BotError::Connect("refused".to_string()).is_transport());
        assert!(BotError::InvalidProxyAddress("bad".to_string()).is_transport());

        assert!(!BotError::ServerStatus { status: 502 }.is_transport());
        assert!(!BotError::EmptyResponse.is_transport());
        assert!(!BotError::MalformedResponse("bad".to_string()).is_transport());
    }

    #[test]
    fn test_url_parse_error_maps_to_invalid_proxy() {
        let err: BotError = url::Url::parse("::nope").unwrap_err().into();
        assert!(matches!(err, BotError::InvalidProxyAddress(_)));
    }

    #[test]
    fn test_no_credentials_message_names_file() {
        let err = BotError::NoCredentials {
            path: "data.txt".to_string(),
        };
        assert!(err.to_string().contains("data.txt"));
    }
}
