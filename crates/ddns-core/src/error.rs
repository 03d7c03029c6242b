//! Error types for the DDNS agent
//!
//! Errors fall into two scopes:
//! - run-fatal: configuration, public IP resolution, zone resolution
//! - per-host: anything the provider reports while reading or writing records
//!
//! [`Error::is_fatal`] encodes that split for callers deciding exit codes.

use thiserror::Error;

/// Result type alias for DDNS operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the DDNS agent
#[derive(Error, Debug)]
pub enum Error {
    /// Required configuration is missing or malformed
    #[error("Configuration error: {0}")]
    Config(String),

    /// The IP-echo lookup failed or returned unusable data
    #[error("Network error: {0}")]
    Network(String),

    /// The zone lookup returned no hosted zone
    #[error("Hosted zone not found: {zone}")]
    ZoneNotFound {
        /// The zone DNS name that was looked up
        zone: String,
    },

    /// The zone lookup request itself failed
    #[error("Hosted zone lookup for {zone} failed: {message}")]
    ZoneLookup {
        /// The zone DNS name that was looked up
        zone: String,
        /// Provider diagnostic
        message: String,
    },

    /// The DNS provider rejected or failed a request
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Provider diagnostic
        message: String,
    },

    /// JSON serialization errors (run report)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create a "zone not found" error
    pub fn zone_not_found(zone: impl Into<String>) -> Self {
        Self::ZoneNotFound { zone: zone.into() }
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a zone lookup failure
    pub fn zone_lookup(zone: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ZoneLookup {
            zone: zone.into(),
            message: message.into(),
        }
    }

    /// Whether this error ends the whole run rather than a single host
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Config(_)
                | Self::Network(_)
                | Self::ZoneNotFound { .. }
                | Self::ZoneLookup { .. }
        )
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
