//! Configuration for audit behavior and upstream endpoints

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main configuration for the audit process
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Network configuration
    pub network: NetworkConfig,
    /// Time-to-live for cached upstream responses, in seconds
    pub cache_ttl_secs: u64,
    /// Name-similarity threshold for typosquat detection (0.0-1.0)
    pub typosquat_threshold: f64,
}

/// Network configuration for upstream API calls.
///
/// Base URLs are configurable so tests can point the clients at a mock
/// server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// GitHub API token (optional, for higher rate limits)
    pub github_token: Option<String>,
    /// npm registry base URL
    pub registry_base: String,
    /// npm downloads API base URL
    pub downloads_base: String,
    /// OSV.dev API base URL
    pub osv_base: String,
    /// GitHub API base URL
    pub github_base: String,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            cache_ttl_secs: 3600,
            typosquat_threshold: 0.80,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 5,
            github_token: std::env::var("GITHUB_TOKEN").ok(),
            registry_base: "https://registry.npmjs.org".to_string(),
            downloads_base: "https://api.npmjs.org".to_string(),
            osv_base: "https://api.osv.dev".to_string(),
            github_base: "https://api.github.com".to_string(),
        }
    }
}

impl NetworkConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl AuditConfig {
    /// Get cache TTL as Duration
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AuditConfig::default();
        assert_eq!(config.cache_ttl_secs, 3600);
        assert!((config.typosquat_threshold - 0.80).abs() < f64::EPSILON);
        assert_eq!(config.network.timeout_secs, 5);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AuditConfig = toml::from_str(
            r#"
            cache_ttl_secs = 60

            [network]
            timeout_secs = 2
            "#,
        )
        .unwrap();
        assert_eq!(config.cache_ttl_secs, 60);
        assert_eq!(config.network.timeout_secs, 2);
        assert_eq!(config.network.registry_base, "https://registry.npmjs.org");
    }
}
