//! GitHub client for linked-repository verification

use crate::cache::{CacheKey, ResponseCache};
use crate::config::NetworkConfig;
use crate::error::{AuditError, Result};
use crate::types::RepositoryInfo;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

/// Client for the GitHub REST API. All failures here are degrading: an
/// unreachable repository just leaves the bundle field absent.
pub struct RepoHostClient {
    http: Client,
    cache: Arc<ResponseCache>,
    network: NetworkConfig,
}

#[derive(Debug, Deserialize)]
struct GitHubRepo {
    #[serde(default)]
    stargazers_count: u64,
    #[serde(default)]
    forks_count: u64,
    #[serde(default)]
    archived: bool,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    updated_at: Option<String>,
}

impl RepoHostClient {
    pub fn new(http: Client, cache: Arc<ResponseCache>, network: NetworkConfig) -> Self {
        Self {
            http,
            cache,
            network,
        }
    }

    /// Fetch repository info for a GitHub URL.
    pub async fn fetch_repository(&self, repo_url: &str) -> Result<RepositoryInfo> {
        let (owner, repo) = parse_github_url(repo_url)
            .ok_or_else(|| AuditError::source("GitHub", format!("unrecognized URL: {}", repo_url)))?;

        let key = CacheKey::new(&format!("{}/{}", owner, repo), None);
        if let Some(cached) = self.cache.repository.get(&key) {
            debug!("repository cache hit for {}/{}", owner, repo);
            return Ok(cached);
        }

        let url = format!("{}/repos/{}/{}", self.network.github_base, owner, repo);
        debug!("Fetching repository info for {}/{}", owner, repo);

        let mut request = self
            .http
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/vnd.github.v3+json");
        if let Some(token) = &self.network.github_token {
            request = request.header(reqwest::header::AUTHORIZATION, format!("token {}", token));
        }

        let response = request
            .send()
            .await
            .map_err(|e| AuditError::source("GitHub", format!("request failed: {}", e)))?;

        match response.status().as_u16() {
            404 => {
                return Err(AuditError::source(
                    "GitHub",
                    format!("repository {}/{} not found", owner, repo),
                ))
            }
            403 => {
                return Err(AuditError::RateLimitExceeded {
                    service: "GitHub".to_string(),
                    retry_after: None,
                })
            }
            _ if !response.status().is_success() => {
                return Err(AuditError::source(
                    "GitHub",
                    format!("HTTP {}", response.status()),
                ))
            }
            _ => {}
        }

        let repo_data: GitHubRepo = response
            .json()
            .await
            .map_err(|e| AuditError::source("GitHub", format!("invalid response: {}", e)))?;

        let info = RepositoryInfo {
            stars: repo_data.stargazers_count,
            forks: repo_data.forks_count,
            archived: repo_data.archived,
            created_at: repo_data.created_at.as_deref().and_then(parse_datetime),
            updated_at: repo_data.updated_at.as_deref().and_then(parse_datetime),
        };

        self.cache.repository.insert(key, info.clone());
        Ok(info)
    }
}

/// Extract `(owner, repo)` from a GitHub URL.
///
/// Handles `https://github.com/owner/repo`, `.git` suffixes, and the SSH
/// form `git@github.com:owner/repo`.
pub fn parse_github_url(url: &str) -> Option<(String, String)> {
    let url = url.trim_end_matches('/').trim_end_matches(".git");

    let rest = if let Some(rest) = url.split("github.com:").nth(1) {
        rest
    } else {
        url.split("github.com/").nth(1)?
    };

    let mut parts = rest.split('/');
    let owner = parts.next().filter(|s| !s.is_empty())?;
    let repo = parts.next().filter(|s| !s.is_empty())?;
    Some((owner.to_string(), repo.to_string()))
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_github_url_variants() {
        let cases = [
            ("https://github.com/lodash/lodash", ("lodash", "lodash")),
            ("https://github.com/lodash/lodash.git", ("lodash", "lodash")),
            ("https://github.com/expressjs/express", ("expressjs", "express")),
            ("git@github.com:lodash/lodash.git", ("lodash", "lodash")),
            ("https://github.com/a/b/tree/main", ("a", "b")),
        ];

        for (url, (owner, repo)) in cases {
            assert_eq!(
                parse_github_url(url),
                Some((owner.to_string(), repo.to_string())),
                "failed for {}",
                url
            );
        }
    }

    #[test]
    fn test_parse_non_github_url() {
        assert_eq!(parse_github_url("https://gitlab.com/a/b"), None);
        assert_eq!(parse_github_url("not a url"), None);
        assert_eq!(parse_github_url("https://github.com/only-owner"), None);
    }
}
