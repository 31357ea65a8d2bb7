//! Semantic-version parsing and affected-range evaluation
//!
//! Parsing is deliberately forgiving: a malformed version degrades to
//! `(0, 0, 0)` so that range checks over-report ("assume affected") instead
//! of silently dropping a vulnerability.

use crate::types::{VersionRange, VulnerabilityRecord};

/// A parsed `major.minor.patch` triple
pub type Version = (u64, u64, u64);

/// Parse a version string into a comparable triple.
///
/// Tolerates leading qualifiers (`v`, `^`, `~`, comparison operators) and
/// trailing prerelease suffixes. Non-numeric or malformed input parses to
/// `(0, 0, 0)`.
pub fn parse_version(text: &str) -> Version {
    let trimmed = text.trim_start_matches(|c: char| matches!(c, 'v' | '^' | '~' | '<' | '>' | '=' | ' '));

    let mut parts = trimmed.split('.');
    let major = leading_number(parts.next().unwrap_or(""));
    let minor = leading_number(parts.next().unwrap_or(""));
    let patch = leading_number(parts.next().unwrap_or(""));

    (major, minor, patch)
}

/// Parse the leading digit run of a version component ("12-beta" -> 12).
fn leading_number(component: &str) -> u64 {
    let digits: String = component.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}

/// Evaluate one affected-version interval.
///
/// Affected iff `version >= introduced` and, when an upper bound exists,
/// `version <= last_affected` (inclusive) or `version < fixed` (exclusive).
pub fn is_affected(version: Version, range: &VersionRange) -> bool {
    let introduced = parse_version(&range.introduced);
    if version < introduced {
        return false;
    }

    if let Some(last) = &range.last_affected {
        return version <= parse_version(last);
    }
    if let Some(fixed) = &range.fixed {
        return version < parse_version(fixed);
    }

    true
}

/// Whether a vulnerability record applies to the given version string.
///
/// A record with no ranges is assumed affecting.
pub fn record_affects(version: &str, record: &VulnerabilityRecord) -> bool {
    if record.ranges.is_empty() {
        return true;
    }
    let version = parse_version(version);
    record.ranges.iter().any(|range| is_affected(version, range))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Severity;

    fn range(introduced: &str, fixed: Option<&str>, last_affected: Option<&str>) -> VersionRange {
        VersionRange {
            introduced: introduced.to_string(),
            fixed: fixed.map(String::from),
            last_affected: last_affected.map(String::from),
        }
    }

    #[test]
    fn test_parse_plain() {
        assert_eq!(parse_version("4.17.11"), (4, 17, 11));
        assert_eq!(parse_version("1.0"), (1, 0, 0));
        assert_eq!(parse_version("2"), (2, 0, 0));
    }

    #[test]
    fn test_parse_qualifiers() {
        assert_eq!(parse_version("v1.2.3"), (1, 2, 3));
        assert_eq!(parse_version("^1.2.3"), (1, 2, 3));
        assert_eq!(parse_version("~0.4.1"), (0, 4, 1));
        assert_eq!(parse_version(">=2.0.0"), (2, 0, 0));
    }

    #[test]
    fn test_parse_prerelease_suffix() {
        assert_eq!(parse_version("1.2.3-rc.1"), (1, 2, 3));
        assert_eq!(parse_version("1.2.3-beta"), (1, 2, 3));
    }

    #[test]
    fn test_parse_malformed_degrades_to_zero() {
        assert_eq!(parse_version(""), (0, 0, 0));
        assert_eq!(parse_version("garbage"), (0, 0, 0));
        assert_eq!(parse_version("*"), (0, 0, 0));
    }

    #[test]
    fn test_affected_before_fix() {
        let r = range("0", Some("4.17.12"), None);
        assert!(is_affected(parse_version("4.17.11"), &r));
    }

    #[test]
    fn test_not_affected_after_fix() {
        let r = range("0", Some("4.17.12"), None);
        assert!(!is_affected(parse_version("4.17.21"), &r));
    }

    #[test]
    fn test_fixed_version_is_exclusive() {
        let r = range("0", Some("4.17.12"), None);
        assert!(!is_affected(parse_version("4.17.12"), &r));
    }

    #[test]
    fn test_last_affected_is_inclusive() {
        let r = range("1.0.0", None, Some("2.5.0"));
        assert!(is_affected(parse_version("2.5.0"), &r));
        assert!(!is_affected(parse_version("2.5.1"), &r));
    }

    #[test]
    fn test_below_introduced_not_affected() {
        let r = range("3.0.0", Some("3.2.0"), None);
        assert!(!is_affected(parse_version("2.9.9"), &r));
    }

    #[test]
    fn test_open_range_always_affected() {
        let r = range("1.0.0", None, None);
        assert!(is_affected(parse_version("99.0.0"), &r));
    }

    #[test]
    fn test_record_with_no_ranges_assumed_affecting() {
        let record = VulnerabilityRecord {
            id: "GHSA-test".to_string(),
            cve_id: None,
            severity: Severity::High,
            summary: "test".to_string(),
            details: None,
            ranges: vec![],
        };
        assert!(record_affects("1.0.0", &record));
    }

    #[test]
    fn test_record_any_range_matches() {
        let record = VulnerabilityRecord {
            id: "GHSA-test".to_string(),
            cve_id: None,
            severity: Severity::High,
            summary: "test".to_string(),
            details: None,
            ranges: vec![
                range("0", Some("1.0.0"), None),
                range("2.0.0", Some("2.1.0"), None),
            ],
        };
        assert!(record_affects("2.0.5", &record));
        assert!(!record_affects("1.5.0", &record));
    }
}
