//! # npm_risk_audit
//!
//! A best-effort risk-audit engine for npm packages, providing insights into:
//! - **Supply-chain risk**: typosquatting, dangerous install scripts, build provenance
//! - **Known vulnerabilities**: OSV.dev advisories matched against the audited version
//! - **Maintenance signals**: maintainer count, repository health, license terms
//! - **Reputation signals**: package age, download patterns, community adoption
//!
//! ## Quick Start
//!
//! ```no_run
//! use npm_risk_audit::{AuditConfig, Auditor};
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let auditor = Auditor::new(AuditConfig::default())?;
//! let report = auditor.audit("lodash", None).await?;
//!
//! println!("{}: {} ({})", report.package_name, report.risk_score, report.risk_level);
//! for finding in report.findings {
//!     println!("  [{}] {}: {}", finding.severity, finding.name, finding.description);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Design
//!
//! An audit fans out to four external sources (the npm registry, the
//! downloads API, GitHub, and OSV.dev) concurrently. Only the registry fetch
//! is mandatory; every other source degrades to an absent field when it
//! fails or times out, so one slow upstream never sinks the whole audit.
//! Responses are cached in-process with a TTL, and scoring is a pure
//! function of the findings.

mod audit;
mod config;
mod error;

pub mod analyzers;
pub mod cache;
pub mod patterns;
pub mod scoring;
pub mod sources;
pub mod types;
pub mod typosquat;
pub mod version;

// Re-export public API
pub use audit::Auditor;
pub use config::{AuditConfig, NetworkConfig};
pub use error::{AuditError, Result};
pub use types::{
    AuditReport, Category, Finding, PackageIdentity, RiskLevel, Severity, SourceBundle,
};
