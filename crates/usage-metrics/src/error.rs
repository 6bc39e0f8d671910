//! Error types for metrics retrieval and usage generation.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used across the crate.
pub type MetricsResult<T> = Result<T, MetricsError>;

/// Errors that can occur while loading configuration, computing date
/// ranges, or talking to the vendor API.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Missing or invalid configuration field.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Config file could not be read.
    #[error("Failed to read config file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid date range or lookback window.
    #[error("Validation error: {0}")]
    Validation(String),

    /// API returned a non-2xx response.
    #[error("API error on {endpoint}: {status} - {message}")]
    Api {
        endpoint: String,
        status: u16,
        message: String,
    },

    /// Request never produced a response.
    #[error("Network error on {endpoint}: {source}")]
    Network {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// Response body was not the expected JSON shape.
    #[error("Failed to decode response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    /// Server handed back a cursor that was already followed.
    #[error("Pagination on {endpoint} returned an already-fetched cursor '{cursor}'")]
    RepeatedCursor { endpoint: String, cursor: String },
}

impl MetricsError {
    /// HTTP status code, when the failure carried one.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Network { source, .. } => source.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Endpoint the failure happened on, for API-class errors.
    #[must_use]
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            Self::Api { endpoint, .. }
            | Self::Network { endpoint, .. }
            | Self::Decode { endpoint, .. }
            | Self::RepeatedCursor { endpoint, .. } => Some(endpoint),
            _ => None,
        }
    }

    /// Whether this error came from talking to the API.
    #[must_use]
    pub fn is_api_error(&self) -> bool {
        self.endpoint().is_some()
    }

    /// Whether this error came from configuration loading.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Io { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_exposes_status_and_endpoint() {
        let err = MetricsError::Api {
            endpoint: "/organization/costs".to_string(),
            status: 401,
            message: "Unauthorized".to_string(),
        };
        assert_eq!(err.status(), Some(401));
        assert_eq!(err.endpoint(), Some("/organization/costs"));
        assert!(err.is_api_error());
        assert!(!err.is_config_error());
        assert_eq!(
            err.to_string(),
            "API error on /organization/costs: 401 - Unauthorized"
        );
    }

    #[test]
    fn test_config_error_has_no_endpoint() {
        let err = MetricsError::Config("api_key is required".to_string());
        assert!(err.is_config_error());
        assert!(!err.is_api_error());
        assert_eq!(err.status(), None);
    }
}
