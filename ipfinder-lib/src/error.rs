//! Error handling for reverse-IP lookups and scans.
//!
//! This module defines a single error type covering every way a scan can fail,
//! from a bad input line to a lookup service answering with garbage.

use std::fmt;
use std::time::Duration;

/// Main error type for ipfinder operations.
///
/// Errors fall into two groups: fatal ones that stop a scan before it starts
/// (see [`IpFinderError::is_fatal`]) and isolated ones that only affect a
/// single (IP, source) lookup or a single sink write.
#[derive(Debug, Clone)]
pub enum IpFinderError {
    /// Input string is not a syntactically valid IP address
    InvalidIp { input: String },

    /// Domain rejected by the normalizer or the sink
    InvalidDomain { domain: String, reason: String },

    /// Network-related errors (connection refused, DNS failure, reset, etc.)
    NetworkError {
        message: String,
        source: Option<String>,
    },

    /// Lookup service answered with a non-success status
    Http { service: String, status: u16 },

    /// Response body could not be interpreted
    ParseError {
        message: String,
        content: Option<String>,
    },

    /// Configuration errors (invalid settings, unknown source names, etc.)
    ConfigError { message: String },

    /// File I/O errors for IP lists, config files and the output artifact
    FileError { path: String, message: String },

    /// Timeout errors when operations take too long
    ///
    /// `duration` is `None` when the limit was enforced by the HTTP client.
    Timeout {
        operation: String,
        duration: Option<Duration>,
    },

    /// Work abandoned because the scan was cancelled
    Cancelled,

    /// Write attempted after the result sink was closed
    SinkClosed,

    /// Generic internal errors that don't fit other categories
    Internal { message: String },
}

impl IpFinderError {
    /// Create a new invalid IP error.
    pub fn invalid_ip<I: Into<String>>(input: I) -> Self {
        Self::InvalidIp {
            input: input.into(),
        }
    }

    /// Create a new invalid domain error.
    pub fn invalid_domain<D: Into<String>, R: Into<String>>(domain: D, reason: R) -> Self {
        Self::InvalidDomain {
            domain: domain.into(),
            reason: reason.into(),
        }
    }

    /// Create a new network error.
    pub fn network<M: Into<String>>(message: M) -> Self {
        Self::NetworkError {
            message: message.into(),
            source: None,
        }
    }

    /// Create a new network error with source information.
    pub fn network_with_source<M: Into<String>, S: Into<String>>(message: M, source: S) -> Self {
        Self::NetworkError {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create a new HTTP status error for a lookup service.
    pub fn http<S: Into<String>>(service: S, status: u16) -> Self {
        Self::Http {
            service: service.into(),
            status,
        }
    }

    /// Create a new parse error.
    pub fn parse<M: Into<String>>(message: M) -> Self {
        Self::ParseError {
            message: message.into(),
            content: None,
        }
    }

    /// Create a new configuration error.
    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a new file error.
    pub fn file_error<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::FileError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new timeout error.
    pub fn timeout<O: Into<String>>(operation: O, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration: Some(duration),
        }
    }

    /// Create a new internal error.
    pub fn internal<M: Into<String>>(message: M) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether this error should abort the whole run.
    ///
    /// Lookup failures, timeouts, cancellation and sink write problems are
    /// absorbed where they happen; only setup problems are fatal.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::InvalidIp { .. }
                | Self::ConfigError { .. }
                | Self::FileError { .. }
                | Self::Internal { .. }
        )
    }

    /// Short category label used in failure summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidIp { .. } => "invalid-ip",
            Self::InvalidDomain { .. } => "invalid-domain",
            Self::NetworkError { .. } => "network",
            Self::Http { .. } => "http",
            Self::ParseError { .. } => "parse",
            Self::ConfigError { .. } => "config",
            Self::FileError { .. } => "file",
            Self::Timeout { .. } => "timeout",
            Self::Cancelled => "cancelled",
            Self::SinkClosed => "sink-closed",
            Self::Internal { .. } => "internal",
        }
    }
}

impl fmt::Display for IpFinderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidIp { input } => write!(f, "Invalid IP address: {}", input),
            Self::InvalidDomain { domain, reason } => {
                write!(f, "Invalid domain '{}': {}", domain, reason)
            }
            Self::NetworkError { message, source } => {
                if let Some(source) = source {
                    write!(f, "Network error: {} (source: {})", message, source)
                } else {
                    write!(f, "Network error: {}", message)
                }
            }
            Self::Http { service, status } => write!(f, "{} returned status {}", service, status),
            Self::ParseError { message, content: _ } => write!(f, "Parse error: {}", message),
            Self::ConfigError { message } => write!(f, "Configuration error: {}", message),
            Self::FileError { path, message } => write!(f, "File error at '{}': {}", path, message),
            Self::Timeout {
                operation,
                duration: Some(duration),
            } => write!(f, "Timeout after {:?} during: {}", duration, operation),
            Self::Timeout {
                operation,
                duration: None,
            } => write!(f, "Timeout during: {}", operation),
            Self::Cancelled => write!(f, "Scan cancelled"),
            Self::SinkClosed => write!(f, "Result sink is already closed"),
            Self::Internal { message } => write!(f, "Internal error: {}", message),
        }
    }
}

impl std::error::Error for IpFinderError {}

impl From<reqwest::Error> for IpFinderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                operation: "HTTP request".to_string(),
                duration: None,
            }
        } else if err.is_connect() {
            Self::network_with_source("Connection failed", err.to_string())
        } else if let Some(status) = err.status() {
            let service = err
                .url()
                .and_then(|u| u.host_str().map(String::from))
                .unwrap_or_else(|| "remote".to_string());
            Self::http(service, status.as_u16())
        } else {
            Self::network_with_source("HTTP request failed", err.to_string())
        }
    }
}

impl From<serde_json::Error> for IpFinderError {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError {
            message: format!("JSON parsing failed: {}", err),
            content: None,
        }
    }
}

impl From<std::io::Error> for IpFinderError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal {
            message: format!("I/O error: {}", err),
        }
    }
}

impl From<regex::Error> for IpFinderError {
    fn from(err: regex::Error) -> Self {
        Self::Internal {
            message: format!("Regex error: {}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(IpFinderError::config("no sources").is_fatal());
        assert!(IpFinderError::file_error("out.txt", "denied").is_fatal());
        assert!(IpFinderError::invalid_ip("nope").is_fatal());

        assert!(!IpFinderError::http("rapiddns", 503).is_fatal());
        assert!(!IpFinderError::network("reset").is_fatal());
        assert!(!IpFinderError::Cancelled.is_fatal());
        assert!(!IpFinderError::SinkClosed.is_fatal());
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(
            IpFinderError::http("webscan", 429).to_string(),
            "webscan returned status 429"
        );
        assert_eq!(
            IpFinderError::invalid_ip("999.1.1.1").to_string(),
            "Invalid IP address: 999.1.1.1"
        );
        assert_eq!(
            IpFinderError::network_with_source("Connection failed", "refused").to_string(),
            "Network error: Connection failed (source: refused)"
        );
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(IpFinderError::parse("bad json").kind(), "parse");
        assert_eq!(
            IpFinderError::timeout("thc-org", Duration::from_secs(1)).kind(),
            "timeout"
        );
    }

    #[tokio::test]
    async fn test_client_timeout_message_has_no_guessed_duration() {
        // connections queue in the backlog and never get a response
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/", listener.local_addr().unwrap());

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .unwrap();
        let err: IpFinderError = client.get(&url).send().await.unwrap_err().into();

        assert_eq!(err.kind(), "timeout");
        assert_eq!(err.to_string(), "Timeout during: HTTP request");
        assert_eq!(
            IpFinderError::timeout("thc-org", Duration::from_secs(5)).to_string(),
            "Timeout after 5s during: thc-org"
        );
    }
}
