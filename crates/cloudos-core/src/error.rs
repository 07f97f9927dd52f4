//! Error types for the cloudos configuration core
//!
//! Two classes of failure exist here. Fatal errors (an unknown DNS mode,
//! an unknown hostname or an unresolvable host address) must abort the
//! startup sequence that triggered them. Everything else is an ordinary
//! error returned to the caller.

use thiserror::Error;

/// Result type alias for cloudos operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the cloudos configuration layer
#[derive(Error, Debug)]
pub enum Error {
    /// DNS is enabled but `dnsMode` does not name a known backend
    #[error("invalid DNS mode: {mode}")]
    InvalidDnsMode {
        /// The raw mode value that was configured
        mode: String,
    },

    /// The operating system could not report the machine hostname
    #[error("Error getting hostname: {source}")]
    Hostname {
        #[source]
        source: std::io::Error,
    },

    /// The local host name could not be resolved to an address
    #[error("Error getting public ip for {hostname}: {source}")]
    PublicIp {
        /// Hostname that failed to resolve
        hostname: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors (settings files, subprocesses)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(String),

    /// DNS manager errors
    #[error("DNS error ({manager}): {message}")]
    Dns {
        /// Manager name
        manager: String,
        /// Error message
        message: String,
    },

    /// A lazily-resolved resource was set after it had already been resolved
    #[error("{0} is already resolved")]
    AlreadyResolved(&'static str),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create a DNS manager error
    pub fn dns(manager: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Dns {
            manager: manager.into(),
            message: message.into(),
        }
    }

    /// Create an invalid DNS mode error
    pub fn invalid_dns_mode(mode: impl Into<String>) -> Self {
        Self::InvalidDnsMode { mode: mode.into() }
    }

    /// Whether this error must abort the enclosing startup or request
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::InvalidDnsMode { .. } | Self::Hostname { .. } | Self::PublicIp { .. }
        )
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.to_string())
    }
}
