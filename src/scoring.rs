//! Risk scoring
//!
//! Scoring is a pure function of the finding list: identical findings always
//! produce identical scores, regardless of the order analyzers emitted them.

use crate::types::{Category, CategoryScores, Finding, RiskLevel, Severity};

fn base_points(severity: Severity) -> f64 {
    match severity {
        Severity::Critical => 25.0,
        Severity::High => 15.0,
        Severity::Medium => 8.0,
        Severity::Low => 3.0,
        Severity::Info => 0.0,
    }
}

/// Authenticity and security findings weigh heavier: they represent
/// adversarial risk rather than quality-of-life risk.
fn category_multiplier(category: Category) -> f64 {
    match category {
        Category::Authenticity => 1.5,
        Category::Security => 1.5,
        Category::Maintenance => 1.0,
        Category::Reputation => 0.8,
    }
}

fn decay_weight(severity: Severity) -> f64 {
    match severity {
        Severity::Critical => 0.5,
        Severity::High => 0.3,
        Severity::Medium => 0.15,
        Severity::Low => 0.05,
        Severity::Info => 0.0,
    }
}

/// Compute the overall risk score (0-100) and whether a critical
/// authenticity or security finding forces an elevated risk level.
pub fn calculate_risk_score(findings: &[Finding]) -> (u8, bool) {
    let total: f64 = findings
        .iter()
        .map(|f| base_points(f.severity) * category_multiplier(f.category))
        .sum();

    let has_critical_adversarial = findings.iter().any(|f| {
        f.severity == Severity::Critical
            && matches!(f.category, Category::Authenticity | Category::Security)
    });

    (total.floor().min(100.0) as u8, has_critical_adversarial)
}

/// Map a numeric score to a discrete level.
///
/// A critical authenticity/security finding forces at least High so that a
/// single severe defect cannot be diluted by an otherwise clean report.
pub fn risk_level(score: u8, force_at_least_high: bool) -> RiskLevel {
    let level = match score {
        76..=u8::MAX => RiskLevel::Critical,
        51..=75 => RiskLevel::High,
        26..=50 => RiskLevel::Medium,
        _ => RiskLevel::Low,
    };

    if force_at_least_high {
        level.max(RiskLevel::High)
    } else {
        level
    }
}

/// Per-category sub-scores via severity-weighted exponential decay.
///
/// Repeated low-severity findings do diminishing marginal damage while a few
/// criticals still crater a category. The floor of 5 keeps every axis
/// visibly non-zero.
pub fn category_scores(findings: &[Finding]) -> CategoryScores {
    CategoryScores {
        authenticity: decayed_score(findings, Category::Authenticity),
        maintenance: decayed_score(findings, Category::Maintenance),
        security: decayed_score(findings, Category::Security),
        reputation: decayed_score(findings, Category::Reputation),
    }
}

fn decayed_score(findings: &[Finding], category: Category) -> u8 {
    let weight: f64 = findings
        .iter()
        .filter(|f| f.category == category)
        .map(|f| decay_weight(f.severity))
        .sum();

    if weight <= 0.0 {
        return 100;
    }

    (100.0 * 0.5_f64.powf(weight)).floor().max(5.0) as u8
}
