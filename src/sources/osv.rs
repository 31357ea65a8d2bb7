//! OSV.dev vulnerability-database client

use crate::cache::{CacheKey, ResponseCache};
use crate::config::NetworkConfig;
use crate::error::{AuditError, Result};
use crate::types::{Severity, VersionRange, VulnerabilityRecord};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

const MAX_DETAILS_LEN: usize = 500;

/// Client for the OSV.dev query API.
pub struct VulnDbClient {
    http: Client,
    cache: Arc<ResponseCache>,
    network: NetworkConfig,
}

#[derive(Debug, Deserialize)]
struct OsvResponse {
    #[serde(default)]
    vulns: Vec<OsvVuln>,
}

#[derive(Debug, Deserialize)]
struct OsvVuln {
    id: String,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    details: Option<String>,
    #[serde(default)]
    aliases: Vec<String>,
    #[serde(default)]
    severity: Vec<OsvSeverity>,
    #[serde(default)]
    database_specific: Value,
    #[serde(default)]
    affected: Vec<OsvAffected>,
}

#[derive(Debug, Deserialize)]
struct OsvSeverity {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    score: String,
}

#[derive(Debug, Deserialize)]
struct OsvAffected {
    #[serde(default)]
    ranges: Vec<OsvRange>,
}

#[derive(Debug, Deserialize)]
struct OsvRange {
    #[serde(default)]
    events: Vec<std::collections::HashMap<String, String>>,
}

impl VulnDbClient {
    pub fn new(http: Client, cache: Arc<ResponseCache>, network: NetworkConfig) -> Self {
        Self {
            http,
            cache,
            network,
        }
    }

    /// Query known vulnerabilities for a package. Version filtering happens
    /// downstream; the full record set caches better.
    pub async fn fetch_vulnerabilities(&self, name: &str) -> Result<Vec<VulnerabilityRecord>> {
        let key = CacheKey::new(name, None);
        if let Some(cached) = self.cache.vulnerabilities.get(&key) {
            debug!("vulnerability cache hit for {}", name);
            return Ok(cached);
        }

        let url = format!("{}/v1/query", self.network.osv_base);
        debug!("Querying vulnerability database for {}", name);

        let response = self
            .http
            .post(&url)
            .json(&json!({ "package": { "name": name, "ecosystem": "npm" } }))
            .send()
            .await
            .map_err(|e| AuditError::source("OSV", format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AuditError::source(
                "OSV",
                format!("HTTP {}", response.status()),
            ));
        }

        let data: OsvResponse = response
            .json()
            .await
            .map_err(|e| AuditError::source("OSV", format!("invalid response: {}", e)))?;

        let records: Vec<VulnerabilityRecord> = data.vulns.into_iter().map(into_record).collect();
        self.cache.vulnerabilities.insert(key, records.clone());
        Ok(records)
    }
}

fn into_record(vuln: OsvVuln) -> VulnerabilityRecord {
    let severity = extract_severity(&vuln);

    let cve_id = vuln
        .aliases
        .iter()
        .find(|alias| alias.starts_with("CVE-"))
        .cloned();

    let ranges = vuln
        .affected
        .iter()
        .flat_map(|affected| affected.ranges.iter())
        .flat_map(|range| collect_ranges(&range.events))
        .collect();

    VulnerabilityRecord {
        id: vuln.id,
        cve_id,
        severity,
        summary: vuln
            .summary
            .unwrap_or_else(|| "Security vulnerability detected".to_string()),
        details: vuln.details.map(|d| truncate(&d, MAX_DETAILS_LEN)),
        ranges,
    }
}

/// Severity from the CVSS_V3 score string, overridden by the advisory
/// database's own label when present.
fn extract_severity(vuln: &OsvVuln) -> Severity {
    let mut severity = Severity::Medium;

    for sev in &vuln.severity {
        if sev.kind == "CVSS_V3" {
            let score = sev.score.to_uppercase();
            severity = if score.contains("CRITICAL") {
                Severity::Critical
            } else if score.contains("HIGH") {
                Severity::High
            } else if score.contains("LOW") {
                Severity::Low
            } else {
                Severity::Medium
            };
            break;
        }
    }

    if let Some(label) = vuln
        .database_specific
        .get("severity")
        .and_then(Value::as_str)
    {
        severity = Severity::from_advisory(label);
    }

    severity
}

/// Fold an OSV event list into affected-version intervals: each
/// `introduced` opens a range, a following `fixed`/`last_affected` closes
/// it.
fn collect_ranges(events: &[std::collections::HashMap<String, String>]) -> Vec<VersionRange> {
    let mut ranges: Vec<VersionRange> = Vec::new();

    for event in events {
        if let Some(introduced) = event.get("introduced") {
            ranges.push(VersionRange {
                introduced: introduced.clone(),
                fixed: None,
                last_affected: None,
            });
        }
        if let Some(fixed) = event.get("fixed") {
            if let Some(open) = ranges.last_mut() {
                open.fixed = Some(fixed.clone());
            }
        }
        if let Some(last) = event.get("last_affected") {
            if let Some(open) = ranges.last_mut() {
                open.last_affected = Some(last.clone());
            }
        }
    }

    ranges
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut cut = max_len;
    while cut > 0 && !s.is_char_boundary(cut) {
        cut -= 1;
    }
    s[..cut].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vuln_from(value: Value) -> OsvVuln {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_record_from_full_advisory() {
        let vuln = vuln_from(json!({
            "id": "GHSA-jf85-cpcp-j695",
            "summary": "Prototype pollution in lodash",
            "details": "Versions of lodash before 4.17.12 are vulnerable.",
            "aliases": ["CVE-2019-10744"],
            "severity": [{ "type": "CVSS_V3", "score": "CVSS:3.0/AV:N/AC:L" }],
            "database_specific": { "severity": "CRITICAL" },
            "affected": [{
                "ranges": [{
                    "events": [
                        { "introduced": "0" },
                        { "fixed": "4.17.12" }
                    ]
                }]
            }]
        }));

        let record = into_record(vuln);
        assert_eq!(record.id, "GHSA-jf85-cpcp-j695");
        assert_eq!(record.cve_id.as_deref(), Some("CVE-2019-10744"));
        assert_eq!(record.severity, Severity::Critical);
        assert_eq!(record.ranges.len(), 1);
        assert_eq!(record.ranges[0].introduced, "0");
        assert_eq!(record.ranges[0].fixed.as_deref(), Some("4.17.12"));
    }

    #[test]
    fn test_severity_from_cvss_string() {
        let vuln = vuln_from(json!({
            "id": "GHSA-x",
            "severity": [{ "type": "CVSS_V3", "score": "HIGH" }]
        }));
        assert_eq!(extract_severity(&vuln), Severity::High);
    }

    #[test]
    fn test_severity_defaults_to_medium() {
        let vuln = vuln_from(json!({ "id": "GHSA-x" }));
        assert_eq!(extract_severity(&vuln), Severity::Medium);
    }

    #[test]
    fn test_multiple_ranges_collected() {
        let events = |pairs: Value| -> Vec<std::collections::HashMap<String, String>> {
            serde_json::from_value(pairs).unwrap()
        };
        let ranges = collect_ranges(&events(json!([
            { "introduced": "0" },
            { "fixed": "1.0.0" },
            { "introduced": "2.0.0" },
            { "last_affected": "2.1.0" }
        ])));

        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges[0].fixed.as_deref(), Some("1.0.0"));
        assert_eq!(ranges[1].last_affected.as_deref(), Some("2.1.0"));
    }

    #[test]
    fn test_missing_summary_gets_placeholder() {
        let record = into_record(vuln_from(json!({ "id": "GHSA-x" })));
        assert_eq!(record.summary, "Security vulnerability detected");
    }

    #[test]
    fn test_details_truncated() {
        let record = into_record(vuln_from(json!({
            "id": "GHSA-x",
            "details": "a".repeat(2000)
        })));
        assert_eq!(record.details.unwrap().len(), MAX_DETAILS_LEN);
    }
}
