//! Sigstore build-provenance lookup via the npm attestations API

use crate::cache::{CacheKey, ResponseCache};
use crate::config::NetworkConfig;
use crate::error::{AuditError, Result};
use crate::types::ProvenanceInfo;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Client for npm's attestations endpoint. Most packages publish without
/// provenance, so a 404 here is the normal case, not an error.
pub struct ProvenanceClient {
    http: Client,
    cache: Arc<ResponseCache>,
    network: NetworkConfig,
}

#[derive(Debug, Deserialize)]
struct AttestationsResponse {
    #[serde(default)]
    attestations: Vec<Attestation>,
}

#[derive(Debug, Deserialize)]
struct Attestation {
    #[serde(rename = "predicateType", default)]
    predicate_type: String,
    #[serde(default)]
    bundle: Value,
}

impl ProvenanceClient {
    pub fn new(http: Client, cache: Arc<ResponseCache>, network: NetworkConfig) -> Self {
        Self {
            http,
            cache,
            network,
        }
    }

    /// Fetch provenance attestations for an exact package version.
    ///
    /// Returns the absent default when the package has none.
    pub async fn fetch_provenance(&self, name: &str, version: &str) -> Result<ProvenanceInfo> {
        let key = CacheKey::new(name, Some(version));
        if let Some(cached) = self.cache.provenance.get(&key) {
            debug!("provenance cache hit for {}@{}", name, version);
            return Ok(cached);
        }

        // The attestations path takes name@version with the scope slash
        // percent-encoded.
        let url = format!(
            "{}/-/npm/v1/attestations/{}@{}",
            self.network.registry_base,
            name.replace('/', "%2F"),
            version
        );
        debug!("Fetching provenance for {}@{}", name, version);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| AuditError::source("Provenance", format!("request failed: {}", e)))?;

        if response.status().as_u16() == 404 {
            let info = ProvenanceInfo::default();
            self.cache.provenance.insert(key, info.clone());
            return Ok(info);
        }
        if !response.status().is_success() {
            return Err(AuditError::source(
                "Provenance",
                format!("HTTP {}", response.status()),
            ));
        }

        let data: AttestationsResponse = response
            .json()
            .await
            .map_err(|e| AuditError::source("Provenance", format!("invalid response: {}", e)))?;

        let info = extract_provenance(&data);
        self.cache.provenance.insert(key, info.clone());
        Ok(info)
    }
}

fn extract_provenance(data: &AttestationsResponse) -> ProvenanceInfo {
    let mut info = ProvenanceInfo::default();

    if data.attestations.is_empty() {
        return info;
    }

    info.has_provenance = true;
    // npm attestations are logged to Rekor on publish
    info.transparency_log = true;

    for attestation in &data.attestations {
        let predicate_type = attestation.predicate_type.to_lowercase();

        if predicate_type.contains("slsa") {
            info.slsa_level = slsa_level(&predicate_type);

            if let Some(payload) = decode_dsse_payload(&attestation.bundle) {
                if let Some(builder_id) = payload
                    .pointer("/predicate/builder/id")
                    .and_then(Value::as_str)
                {
                    let builder_id = builder_id.to_lowercase();
                    if builder_id.contains("github") {
                        info.build_source = Some("github-actions".to_string());
                    } else if builder_id.contains("gitlab") {
                        info.build_source = Some("gitlab-ci".to_string());
                    }
                }

                if let Some(materials) = payload
                    .pointer("/predicate/materials")
                    .and_then(Value::as_array)
                {
                    info.source_repo = materials
                        .iter()
                        .filter_map(|m| m.get("uri").and_then(Value::as_str))
                        .find(|uri| uri.contains("github.com") || uri.contains("gitlab.com"))
                        .map(String::from);
                }

                if payload
                    .pointer("/predicate/buildType")
                    .and_then(Value::as_str)
                    .map(|t| t.to_lowercase().contains("slsa"))
                    .unwrap_or(false)
                {
                    info.verified = true;
                }
            }
        }

        if predicate_type.contains("publish") {
            info.verified = true;
        }
    }

    info
}

/// The SLSA spec version is embedded in the predicate type URI.
fn slsa_level(predicate_type: &str) -> Option<u8> {
    if predicate_type.contains("v1") {
        Some(1)
    } else if predicate_type.contains("v0.2") {
        Some(2)
    } else {
        None
    }
}

/// Decode the base64 DSSE envelope payload into its statement JSON.
fn decode_dsse_payload(bundle: &Value) -> Option<Value> {
    let payload = bundle
        .pointer("/dsseEnvelope/payload")
        .and_then(Value::as_str)?;
    let bytes = BASE64.decode(payload).ok()?;
    serde_json::from_slice(&bytes).ok()
}
