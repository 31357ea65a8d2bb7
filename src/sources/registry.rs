//! npm registry client: package metadata and download statistics

use crate::cache::{CacheKey, ResponseCache};
use crate::config::NetworkConfig;
use crate::error::{AuditError, Result};
use crate::types::{PackageIdentity, RegistryMetadata};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Client for the npm registry and its downloads API.
///
/// The metadata fetch is the one mandatory call of an audit; everything else
/// degrades.
pub struct RegistryClient {
    http: Client,
    cache: Arc<ResponseCache>,
    network: NetworkConfig,
}

#[derive(Debug, Deserialize)]
struct Packument {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    license: Value,
    #[serde(default)]
    repository: Value,
    #[serde(default)]
    author: Value,
    #[serde(default)]
    maintainers: Value,
    #[serde(default)]
    time: HashMap<String, String>,
    #[serde(rename = "dist-tags", default)]
    dist_tags: HashMap<String, String>,
    #[serde(default)]
    versions: HashMap<String, VersionManifest>,
}

#[derive(Debug, Default, Deserialize)]
struct VersionManifest {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    license: Value,
    #[serde(default)]
    repository: Value,
    #[serde(default)]
    author: Value,
    #[serde(default)]
    maintainers: Value,
    #[serde(default)]
    scripts: HashMap<String, String>,
    #[serde(default)]
    dependencies: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct DownloadsResponse {
    #[serde(default)]
    downloads: u64,
}

impl RegistryClient {
    pub fn new(http: Client, cache: Arc<ResponseCache>, network: NetworkConfig) -> Self {
        Self {
            http,
            cache,
            network,
        }
    }

    /// Fetch package metadata from the registry.
    ///
    /// A 404 maps to [`AuditError::PackageNotFound`]; any other failure maps
    /// to [`AuditError::UpstreamUnavailable`] since metadata is mandatory.
    pub async fn fetch_metadata(&self, identity: &PackageIdentity) -> Result<RegistryMetadata> {
        let key = CacheKey::new(&identity.name, identity.version.as_deref());
        if let Some(cached) = self.cache.registry.get(&key) {
            debug!("registry cache hit for {}", identity.name);
            return Ok(cached);
        }

        let url = format!(
            "{}/{}",
            self.network.registry_base,
            super::encode_package_name(&identity.name)
        );
        debug!("Fetching registry metadata for {}", identity.name);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| AuditError::upstream(format!("registry request failed: {}", e)))?;

        if response.status().as_u16() == 404 {
            return Err(AuditError::PackageNotFound(identity.name.clone()));
        }
        if !response.status().is_success() {
            return Err(AuditError::upstream(format!(
                "registry returned HTTP {} for {}",
                response.status(),
                identity.name
            )));
        }

        let packument: Packument = response
            .json()
            .await
            .map_err(|e| AuditError::upstream(format!("invalid registry response: {}", e)))?;

        let metadata = build_metadata(packument, identity.version.as_deref());
        self.cache.registry.insert(key, metadata.clone());
        Ok(metadata)
    }

    /// Fetch weekly download count. The downloads API returns 404 for
    /// packages with no downloads at all, which counts as zero; a failed
    /// request degrades to `None` so it cannot masquerade as low adoption.
    pub async fn fetch_weekly_downloads(&self, name: &str) -> Option<u64> {
        let key = CacheKey::new(name, None);
        if let Some(cached) = self.cache.downloads.get(&key) {
            return Some(cached);
        }

        let url = format!(
            "{}/downloads/point/last-week/{}",
            self.network.downloads_base,
            super::encode_package_name(name)
        );

        let downloads = match self.http.get(&url).send().await {
            Ok(response) if response.status().as_u16() == 404 => 0,
            Ok(response) if response.status().is_success() => {
                response.json::<DownloadsResponse>().await.ok()?.downloads
            }
            Ok(response) => {
                warn!("downloads API returned HTTP {} for {}", response.status(), name);
                return None;
            }
            Err(e) => {
                warn!("downloads request failed for {}: {}", name, e);
                return None;
            }
        };

        self.cache.downloads.insert(key, downloads);
        Some(downloads)
    }
}

/// Assemble [`RegistryMetadata`] from a packument, preferring the requested
/// version's manifest over the latest one where present.
fn build_metadata(packument: Packument, requested_version: Option<&str>) -> RegistryMetadata {
    let latest_version = packument
        .dist_tags
        .get("latest")
        .cloned()
        .unwrap_or_else(|| "unknown".to_string());

    let manifest = requested_version
        .and_then(|v| packument.versions.get(v))
        .or_else(|| packument.versions.get(&latest_version));
    let default_manifest = VersionManifest::default();
    let manifest = manifest.unwrap_or(&default_manifest);

    let repository = string_or_url(&manifest.repository)
        .or_else(|| string_or_url(&packument.repository))
        .map(clean_repo_url);

    let maintainers = name_list(&manifest.maintainers)
        .filter(|list| !list.is_empty())
        .or_else(|| name_list(&packument.maintainers))
        .unwrap_or_default();

    let mut versions: Vec<String> = packument.versions.keys().cloned().collect();
    versions.sort();

    RegistryMetadata {
        name: packument.name,
        description: manifest
            .description
            .clone()
            .or_else(|| packument.description.clone()),
        author: string_or_name(&manifest.author).or_else(|| string_or_name(&packument.author)),
        license: license_string(&manifest.license).or_else(|| license_string(&packument.license)),
        repository,
        created: packument.time.get("created").and_then(|s| parse_datetime(s)),
        modified: packument.time.get("modified").and_then(|s| parse_datetime(s)),
        maintainers,
        dependencies: manifest.dependencies.clone(),
        scripts: manifest.scripts.clone(),
        latest_version,
        versions,
    }
}

/// The registry serves `license` as either a string or `{ "type": ... }`.
fn license_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => map.get("type").and_then(Value::as_str).map(String::from),
        _ => None,
    }
}

/// `repository` is either a string or `{ "url": ... }`.
fn string_or_url(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => map.get("url").and_then(Value::as_str).map(String::from),
        _ => None,
    }
}

/// `author` is either a string or `{ "name": ... }`.
fn string_or_name(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => map.get("name").and_then(Value::as_str).map(String::from),
        _ => None,
    }
}

/// Maintainers come as a list of `{ "name": ... }` objects or plain strings.
fn name_list(value: &Value) -> Option<Vec<String>> {
    value.as_array().map(|entries| {
        entries
            .iter()
            .filter_map(|entry| match entry {
                Value::String(s) => Some(s.clone()),
                Value::Object(map) => map.get("name").and_then(Value::as_str).map(String::from),
                _ => None,
            })
            .collect()
    })
}

/// Normalize repository URLs: strip `git+` prefixes and map `git://` to
/// `https://`.
fn clean_repo_url(url: String) -> String {
    url.replace("git+", "").replace("git://", "https://")
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}
