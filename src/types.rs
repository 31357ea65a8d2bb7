//! Core data types for package risk auditing

use crate::error::{AuditError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Risk severity levels for findings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Critical => write!(f, "critical"),
            Self::High => write!(f, "high"),
            Self::Medium => write!(f, "medium"),
            Self::Low => write!(f, "low"),
            Self::Info => write!(f, "info"),
        }
    }
}

impl Severity {
    /// Parse an advisory severity string, defaulting to medium.
    pub fn from_advisory(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "critical" => Self::Critical,
            "high" => Self::High,
            "low" => Self::Low,
            _ => Self::Medium,
        }
    }
}

/// Risk categories, one per radar-chart axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Authenticity,
    Maintenance,
    Security,
    Reputation,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Authenticity => write!(f, "authenticity"),
            Self::Maintenance => write!(f, "maintenance"),
            Self::Security => write!(f, "security"),
            Self::Reputation => write!(f, "reputation"),
        }
    }
}

/// Overall risk verdict derived from the numeric score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// A single typed risk observation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Brief finding name
    pub name: String,
    pub severity: Severity,
    pub category: Category,
    /// Human-readable explanation
    pub description: String,
    /// Specific evidence, if any
    pub details: Option<String>,
}

impl Finding {
    pub fn new(
        name: impl Into<String>,
        severity: Severity,
        category: Category,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            severity,
            category,
            description: description.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// The package under audit. Immutable once an audit begins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageIdentity {
    pub name: String,
    /// Requested version; `None` audits the latest published version
    pub version: Option<String>,
}

const MAX_NAME_LEN: usize = 214;
const INVALID_NAME_CHARS: &str = " !#$%^&*()+=[]{}|\\;:'\"<>,?~`";

impl PackageIdentity {
    /// Validate and construct a package identity.
    ///
    /// Follows npm naming rules loosely: non-empty, at most 214 characters,
    /// must not start with `.` or `_`, no shell metacharacters, and scoped
    /// names must look like `@scope/name`.
    pub fn parse(name: &str, version: Option<&str>) -> Result<Self> {
        let name = name.trim();

        if name.is_empty() {
            return Err(AuditError::InvalidPackageName(
                "package name cannot be empty".to_string(),
            ));
        }
        if name.len() > MAX_NAME_LEN {
            return Err(AuditError::InvalidPackageName(format!(
                "package name exceeds {} characters",
                MAX_NAME_LEN
            )));
        }
        if name.starts_with('.') || name.starts_with('_') {
            return Err(AuditError::InvalidPackageName(format!(
                "package name cannot start with . or _: {}",
                name
            )));
        }
        if name.chars().any(|c| INVALID_NAME_CHARS.contains(c)) {
            return Err(AuditError::InvalidPackageName(format!(
                "package name contains invalid characters: {}",
                name
            )));
        }
        if name.starts_with('@') {
            let parts: Vec<&str> = name.split('/').collect();
            if parts.len() != 2 || parts[0].len() < 2 || parts[1].is_empty() {
                return Err(AuditError::InvalidPackageName(format!(
                    "scoped package must have format @scope/name: {}",
                    name
                )));
            }
        }

        Ok(Self {
            name: name.to_string(),
            version: version.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()),
        })
    }
}

/// Package metadata resolved from the npm registry.
///
/// Produced once per audit from the mandatory registry fetch and read-only
/// afterward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryMetadata {
    pub name: String,
    pub description: Option<String>,
    pub author: Option<String>,
    pub license: Option<String>,
    /// Repository URL, cleaned of `git+` prefixes and `git://` schemes
    pub repository: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
    pub maintainers: Vec<String>,
    /// Direct dependencies declared by the resolved version
    pub dependencies: HashMap<String, String>,
    /// Lifecycle scripts declared by the resolved version
    pub scripts: HashMap<String, String>,
    pub latest_version: String,
    /// All published version strings
    pub versions: Vec<String>,
}

/// Linked source-repository info (GitHub)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryInfo {
    pub stars: u64,
    pub forks: u64,
    pub archived: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// One affected-version interval of a vulnerability record.
///
/// `fixed` is exclusive; `last_affected` is inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRange {
    pub introduced: String,
    pub fixed: Option<String>,
    pub last_affected: Option<String>,
}

/// A known vulnerability sourced from the vulnerability database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VulnerabilityRecord {
    pub id: String,
    pub cve_id: Option<String>,
    pub severity: Severity,
    pub summary: String,
    pub details: Option<String>,
    pub ranges: Vec<VersionRange>,
}

/// Sigstore build-provenance verification result
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvenanceInfo {
    pub has_provenance: bool,
    pub verified: bool,
    pub transparency_log: bool,
    pub build_source: Option<String>,
    pub slsa_level: Option<u8>,
    pub source_repo: Option<String>,
}

/// Best-effort collection of fetched external data for one audit.
///
/// Every optional field is fully resolved or absent by the time analyzers
/// run; nothing is ever in flight.
#[derive(Debug, Clone)]
pub struct SourceBundle {
    pub identity: PackageIdentity,
    pub resolved_version: String,
    pub metadata: RegistryMetadata,
    pub weekly_downloads: Option<u64>,
    pub repository: Option<RepositoryInfo>,
    pub vulnerabilities: Option<Vec<VulnerabilityRecord>>,
    pub provenance: Option<ProvenanceInfo>,
}

/// Per-category sub-scores for the radar chart (0-100 each)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryScores {
    pub authenticity: u8,
    pub maintenance: u8,
    pub security: u8,
    pub reputation: u8,
}

/// Repository verification summary included in the report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryVerification {
    pub exists: bool,
    pub verified: bool,
    pub stars: Option<u64>,
    pub forks: Option<u64>,
    pub archived: Option<bool>,
    pub last_updated: Option<DateTime<Utc>>,
}

/// Package metadata summary echoed back to the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageSummary {
    pub description: Option<String>,
    pub author: Option<String>,
    pub license: Option<String>,
    pub repository: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
    pub maintainers: Vec<String>,
    pub downloads_weekly: Option<u64>,
    pub versions_count: usize,
}

/// Complete audit report. Created once per audit and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReport {
    pub package_name: String,
    /// Version the audit was resolved against
    pub version: String,
    /// Overall risk score (0-100)
    pub risk_score: u8,
    pub risk_level: RiskLevel,
    pub findings: Vec<Finding>,
    pub metadata: PackageSummary,
    pub category_scores: CategoryScores,
    pub repository_verification: Option<RepositoryVerification>,
    pub timestamp: DateTime<Utc>,
    pub audit_duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_plain_name() {
        let id = PackageIdentity::parse("lodash", None).unwrap();
        assert_eq!(id.name, "lodash");
        assert_eq!(id.version, None);
    }

    #[test]
    fn test_identity_scoped_name() {
        let id = PackageIdentity::parse("@babel/core", Some("7.23.0")).unwrap();
        assert_eq!(id.name, "@babel/core");
        assert_eq!(id.version.as_deref(), Some("7.23.0"));
    }

    #[test]
    fn test_identity_rejects_empty() {
        assert!(PackageIdentity::parse("   ", None).is_err());
    }

    #[test]
    fn test_identity_rejects_leading_dot_and_underscore() {
        assert!(PackageIdentity::parse(".hidden", None).is_err());
        assert!(PackageIdentity::parse("_internal", None).is_err());
    }

    #[test]
    fn test_identity_rejects_shell_chars() {
        assert!(PackageIdentity::parse("lodash;rm", None).is_err());
        assert!(PackageIdentity::parse("lo dash", None).is_err());
    }

    #[test]
    fn test_identity_rejects_malformed_scope() {
        assert!(PackageIdentity::parse("@babel", None).is_err());
        assert!(PackageIdentity::parse("@/core", None).is_err());
        assert!(PackageIdentity::parse("@a/b/c", None).is_err());
    }

    #[test]
    fn test_blank_version_treated_as_none() {
        let id = PackageIdentity::parse("lodash", Some("  ")).unwrap();
        assert_eq!(id.version, None);
    }

    #[test]
    fn test_severity_from_advisory() {
        assert_eq!(Severity::from_advisory("CRITICAL"), Severity::Critical);
        assert_eq!(Severity::from_advisory("high"), Severity::High);
        assert_eq!(Severity::from_advisory("unknown"), Severity::Medium);
    }

    #[test]
    fn test_risk_level_ordering() {
        assert!(RiskLevel::Critical > RiskLevel::High);
        assert!(RiskLevel::High > RiskLevel::Medium);
        assert!(RiskLevel::Medium > RiskLevel::Low);
    }
}
