//! Error types for the DDNS reconciler
//!
//! Every failure a reconciliation cycle can hit is one of these variants.
//! None of them is fatal to the scheduler: the cycle boundary logs and
//! swallows them (see [`crate::reconciler::Reconciler::run_cycle`]).

use thiserror::Error;

/// Result type alias for DDNS operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the DDNS reconciler
#[derive(Error, Debug)]
pub enum Error {
    /// Public IP lookup failed (unreachable service, bad status, bad body)
    #[error("IP lookup error: {0}")]
    IpLookup(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Transport-level HTTP failures (connect, timeout, body read)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Authentication errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Rate limiting errors
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Zone or record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// The zone has no A record with the configured name
    #[error("Record {record_name} not found in zone {zone_name}")]
    RecordNotFound {
        record_name: String,
        zone_name: String,
    },

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Provider-specific error
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },
}

impl Error {
    /// Create an IP lookup error
    pub fn ip_lookup(msg: impl Into<String>) -> Self {
        Self::IpLookup(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a rate limit error
    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::RateLimited(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create the error for a managed record absent from its zone
    pub fn record_not_found(record_name: impl Into<String>, zone_name: impl Into<String>) -> Self {
        Self::RecordNotFound {
            record_name: record_name.into(),
            zone_name: zone_name.into(),
        }
    }

    /// Whether this error is the logical "target does not exist" case
    /// rather than a transport or service failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::RecordNotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_names_the_provider() {
        let err = Error::provider("cloudflare", "boom");
        assert_eq!(err.to_string(), "Provider error (cloudflare): boom");
    }

    #[test]
    fn only_not_found_is_not_found() {
        assert!(Error::not_found("home.example.com").is_not_found());
        assert!(!Error::ip_lookup("timeout").is_not_found());
        assert!(!Error::rate_limited("slow down").is_not_found());
    }

    #[test]
    fn record_not_found_names_record_and_zone() {
        let err = Error::record_not_found("home.example.com", "example.com");
        assert!(err.is_not_found());
        assert_eq!(
            err.to_string(),
            "Record home.example.com not found in zone example.com"
        );
    }

    #[test]
    fn json_errors_convert() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{not json");
        let err: Error = parse.unwrap_err().into();
        assert!(matches!(err, Error::Json(_)));
    }
}
