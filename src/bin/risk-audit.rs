//! CLI tool for auditing npm packages before installing them

use clap::{Parser, Subcommand};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use npm_risk_audit::{AuditConfig, AuditReport, Auditor, RiskLevel, Severity};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "risk-audit")]
#[command(about = "Audit npm packages for supply-chain, security, and maintenance risks", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to custom configuration file (TOML)
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short = 'v', long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Audit a package and display a summary
    Scan {
        /// Package name (e.g. lodash or @babel/core)
        package: String,

        /// Specific version to audit (default: latest)
        #[arg(long = "pkg-version")]
        version: Option<String>,

        /// Display every finding, including info-level notes
        #[arg(long)]
        detailed: bool,
    },

    /// Generate a full audit report
    Report {
        /// Package name
        package: String,

        /// Specific version to audit (default: latest)
        #[arg(long = "pkg-version")]
        version: Option<String>,

        /// Output format
        #[arg(short = 'f', long, default_value = "json")]
        format: ReportFormat,

        /// Output file (default: stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },

    /// Check a package against a risk threshold (exit code based)
    Check {
        /// Package name
        package: String,

        /// Specific version to audit (default: latest)
        #[arg(long = "pkg-version")]
        version: Option<String>,

        /// Maximum acceptable risk score (0-100)
        #[arg(long, default_value = "50")]
        max_score: u8,
    },
}

#[derive(Clone, Debug)]
enum ReportFormat {
    Json,
    Markdown,
}

impl std::str::FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ReportFormat::Json),
            "markdown" | "md" => Ok(ReportFormat::Markdown),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let config = if let Some(config_path) = &cli.config {
        match load_config(config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{} Failed to load config: {}", "Error:".red().bold(), e);
                process::exit(1);
            }
        }
    } else {
        AuditConfig::default()
    };

    let auditor = match Auditor::new(config) {
        Ok(auditor) => auditor,
        Err(e) => {
            eprintln!("{} Failed to initialize: {}", "Error:".red().bold(), e);
            process::exit(1);
        }
    };

    let (package, version) = match &cli.command {
        Commands::Scan { package, version, .. }
        | Commands::Report { package, version, .. }
        | Commands::Check { package, version, .. } => (package.clone(), version.clone()),
    };

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    spinner.set_message(format!("Auditing {}...", package));
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));

    let result = auditor.audit(&package, version.as_deref()).await;

    spinner.finish_and_clear();

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            eprintln!("{} Audit failed: {}", "Error:".red().bold(), e);
            process::exit(if e.is_caller_error() { 2 } else { 1 });
        }
    };

    match cli.command {
        Commands::Scan { detailed, .. } => {
            display_summary(&report, detailed);
        }

        Commands::Report { format, output, .. } => {
            let content = match format {
                ReportFormat::Json => generate_json_report(&report),
                ReportFormat::Markdown => generate_markdown_report(&report),
            };

            if let Some(output_path) = output {
                match std::fs::write(&output_path, content) {
                    Ok(_) => println!("Report written to: {}", output_path.display()),
                    Err(e) => {
                        eprintln!("{} Failed to write report: {}", "Error:".red().bold(), e);
                        process::exit(1);
                    }
                }
            } else {
                println!("{}", content);
            }
        }

        Commands::Check { max_score, .. } => {
            if report.risk_score > max_score {
                eprintln!(
                    "{} {} v{} has risk score {} > {} ({})",
                    "Failed:".red().bold(),
                    report.package_name,
                    report.version,
                    report.risk_score,
                    max_score,
                    report.risk_level
                );
                process::exit(1);
            }
            println!(
                "{} {} v{}: risk score {} ({})",
                "Success:".green().bold(),
                report.package_name,
                report.version,
                report.risk_score,
                report.risk_level
            );
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_config(path: &PathBuf) -> Result<AuditConfig, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)?;
    let config: AuditConfig = toml::from_str(&content)?;
    Ok(config)
}

fn level_colored(level: RiskLevel) -> ColoredString {
    match level {
        RiskLevel::Low => level.to_string().green(),
        RiskLevel::Medium => level.to_string().yellow(),
        RiskLevel::High => level.to_string().truecolor(255, 165, 0),
        RiskLevel::Critical => level.to_string().red().bold(),
    }
}

fn severity_colored(severity: Severity) -> ColoredString {
    match severity {
        Severity::Critical => severity.to_string().red().bold(),
        Severity::High => severity.to_string().truecolor(255, 165, 0),
        Severity::Medium => severity.to_string().yellow(),
        Severity::Low => severity.to_string().cyan(),
        Severity::Info => severity.to_string().dimmed(),
    }
}

fn display_summary(report: &AuditReport, detailed: bool) {
    println!("\n{}", "=== Audit Summary ===".bold());
    println!(
        "Package: {} v{}",
        report.package_name.cyan(),
        report.version
    );
    println!(
        "Risk score: {} [{}]",
        report.risk_score,
        level_colored(report.risk_level)
    );
    println!();

    println!("Category scores:");
    println!("  Authenticity: {}", report.category_scores.authenticity);
    println!("  Maintenance:  {}", report.category_scores.maintenance);
    println!("  Security:     {}", report.category_scores.security);
    println!("  Reputation:   {}", report.category_scores.reputation);
    println!();

    if let Some(verification) = &report.repository_verification {
        if verification.verified {
            println!(
                "Repository: {} ({} stars)",
                "verified".green(),
                verification.stars.unwrap_or(0)
            );
        } else {
            println!("Repository: {}", "not verified".yellow());
        }
    } else {
        println!("Repository: {}", "none linked".dimmed());
    }

    let shown: Vec<_> = report
        .findings
        .iter()
        .filter(|f| detailed || f.severity != Severity::Info)
        .collect();

    if shown.is_empty() {
        println!("\n{} No significant findings", "●".green());
    } else {
        println!("\nFindings ({}):", shown.len());
        for finding in shown {
            println!(
                "  [{}] {}: {}",
                severity_colored(finding.severity),
                finding.name.bold(),
                finding.description
            );
            if detailed {
                if let Some(details) = &finding.details {
                    println!("      {}", details.dimmed());
                }
            }
        }
    }

    println!("\nCompleted in {} ms", report.audit_duration_ms);
}

fn generate_json_report(report: &AuditReport) -> String {
    serde_json::to_string_pretty(report).unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
}

fn generate_markdown_report(report: &AuditReport) -> String {
    let mut md = String::new();

    md.push_str(&format!(
        "# Risk Audit: {} v{}\n\n",
        report.package_name, report.version
    ));
    md.push_str(&format!(
        "**Risk score:** {} ({})\n\n",
        report.risk_score, report.risk_level
    ));

    md.push_str("## Category Scores\n\n");
    md.push_str("| Category | Score |\n|----------|-------|\n");
    md.push_str(&format!(
        "| Authenticity | {} |\n",
        report.category_scores.authenticity
    ));
    md.push_str(&format!(
        "| Maintenance | {} |\n",
        report.category_scores.maintenance
    ));
    md.push_str(&format!(
        "| Security | {} |\n",
        report.category_scores.security
    ));
    md.push_str(&format!(
        "| Reputation | {} |\n\n",
        report.category_scores.reputation
    ));

    md.push_str("## Findings\n\n");
    if report.findings.is_empty() {
        md.push_str("No findings.\n");
    } else {
        for finding in &report.findings {
            md.push_str(&format!(
                "- **{}** ({} / {}): {}\n",
                finding.name, finding.severity, finding.category, finding.description
            ));
            if let Some(details) = &finding.details {
                md.push_str(&format!("  - {}\n", details));
            }
        }
    }

    md.push_str(&format!(
        "\n---\nGenerated at {} in {} ms\n",
        report.timestamp.to_rfc3339(),
        report.audit_duration_ms
    ));

    md
}
