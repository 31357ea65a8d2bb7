//! Error types for the audit engine

use thiserror::Error;

/// Result type alias for audit operations
pub type Result<T> = std::result::Result<T, AuditError>;

/// Main error type for audit operations
#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Package not found: {0}")]
    PackageNotFound(String),

    #[error("Version {version} of {package} not found in registry")]
    InvalidVersion { package: String, version: String },

    #[error("Registry unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Invalid package name: {0}")]
    InvalidPackageName(String),

    #[error("{service} error: {message}")]
    SourceError { service: String, message: String },

    #[error("Rate limit exceeded for {service}. Retry after: {retry_after:?}")]
    RateLimitExceeded {
        service: String,
        retry_after: Option<std::time::Duration>,
    },

    #[error("Failed to parse upstream response: {0}")]
    ParseError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("HTTP request error: {0}")]
    ReqwestError(#[from] reqwest::Error),
}

impl AuditError {
    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Create an error for an optional (non-fatal) source
    pub fn source(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SourceError {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Create a registry-unavailable error
    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::UpstreamUnavailable(msg.into())
    }

    /// True for errors the caller caused (4xx-equivalent), as opposed to
    /// upstream failures.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::PackageNotFound(_) | Self::InvalidVersion { .. } | Self::InvalidPackageName(_)
        )
    }
}
