//! Audit orchestration
//!
//! One [`Auditor`] owns the HTTP client, the response cache, and the four
//! source clients. Each call to [`Auditor::audit`] fans out the source
//! fetches concurrently, assembles a best-effort bundle, runs the analyzers,
//! and scores the result.

use crate::analyzers;
use crate::cache::ResponseCache;
use crate::config::AuditConfig;
use crate::error::{AuditError, Result};
use crate::scoring;
use crate::sources::{
    parse_github_url, ProvenanceClient, RegistryClient, RepoHostClient, VulnDbClient, USER_AGENT,
};
use crate::types::{
    AuditReport, PackageIdentity, PackageSummary, RepositoryVerification, SourceBundle,
};
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Audit engine with injected cache and configuration.
///
/// Cheap to share behind an `Arc`; concurrent audits only contend on the
/// cache's internal shards.
pub struct Auditor {
    config: AuditConfig,
    registry: RegistryClient,
    repo_host: RepoHostClient,
    vuln_db: VulnDbClient,
    provenance: ProvenanceClient,
}

impl Auditor {
    /// Build an auditor with a fresh cache.
    pub fn new(config: AuditConfig) -> Result<Self> {
        let cache = Arc::new(ResponseCache::new(config.cache_ttl()));
        Self::with_cache(config, cache)
    }

    /// Build an auditor sharing an existing cache.
    pub fn with_cache(config: AuditConfig, cache: Arc<ResponseCache>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.network.timeout())
            .build()?;

        Ok(Self {
            registry: RegistryClient::new(http.clone(), Arc::clone(&cache), config.network.clone()),
            repo_host: RepoHostClient::new(http.clone(), Arc::clone(&cache), config.network.clone()),
            vuln_db: VulnDbClient::new(http.clone(), Arc::clone(&cache), config.network.clone()),
            provenance: ProvenanceClient::new(http, cache, config.network.clone()),
            config,
        })
    }

    /// Run one end-to-end audit.
    ///
    /// The registry fetch is mandatory: not-found and registry failures are
    /// fatal. Every other source degrades to an absent bundle field.
    pub async fn audit(&self, name: &str, version: Option<&str>) -> Result<AuditReport> {
        let start = Instant::now();
        let identity = PackageIdentity::parse(name, version)?;
        info!("Starting audit of {}", identity.name);

        let (metadata, weekly_downloads) = tokio::join!(
            self.registry.fetch_metadata(&identity),
            self.registry.fetch_weekly_downloads(&identity.name),
        );
        let metadata = metadata?;

        let resolved_version = match &identity.version {
            Some(requested) => {
                if !metadata.versions.iter().any(|v| v == requested) {
                    return Err(AuditError::InvalidVersion {
                        package: identity.name.clone(),
                        version: requested.clone(),
                    });
                }
                requested.clone()
            }
            None => metadata.latest_version.clone(),
        };

        // A repository URL only counts as resolvable when we recognize the
        // host; anything else is left for the repository analyzer to flag.
        let repo_url = metadata
            .repository
            .as_deref()
            .filter(|url| parse_github_url(url).is_some());

        let (repository, vulnerabilities, provenance) = tokio::join!(
            async {
                match repo_url {
                    Some(url) => degrade("repository", self.repo_host.fetch_repository(url).await),
                    None => None,
                }
            },
            async {
                degrade(
                    "vulnerabilities",
                    self.vuln_db.fetch_vulnerabilities(&identity.name).await,
                )
            },
            async {
                degrade(
                    "provenance",
                    self.provenance
                        .fetch_provenance(&identity.name, &resolved_version)
                        .await,
                )
            },
        );

        let bundle = SourceBundle {
            identity,
            resolved_version,
            metadata,
            weekly_downloads,
            repository,
            vulnerabilities,
            provenance,
        };

        let findings = analyzers::run_all(&bundle, self.config.typosquat_threshold);
        let (risk_score, force_high) = scoring::calculate_risk_score(&findings);
        let risk_level = scoring::risk_level(risk_score, force_high);
        let category_scores = scoring::category_scores(&findings);

        info!(
            "Audit of {} complete: score {} ({}), {} findings",
            bundle.identity.name,
            risk_score,
            risk_level,
            findings.len()
        );

        Ok(AuditReport {
            package_name: bundle.identity.name.clone(),
            version: bundle.resolved_version.clone(),
            risk_score,
            risk_level,
            findings,
            metadata: summarize(&bundle),
            category_scores,
            repository_verification: verify_repository(&bundle),
            timestamp: Utc::now(),
            audit_duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}

/// Collapse a degrading source failure into an absent field.
fn degrade<T>(source: &str, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("{} fetch degraded: {}", source, e);
            None
        }
    }
}

fn summarize(bundle: &SourceBundle) -> PackageSummary {
    PackageSummary {
        description: bundle.metadata.description.clone(),
        author: bundle.metadata.author.clone(),
        license: bundle.metadata.license.clone(),
        repository: bundle.metadata.repository.clone(),
        created: bundle.metadata.created,
        modified: bundle.metadata.modified,
        maintainers: bundle.metadata.maintainers.clone(),
        downloads_weekly: bundle.weekly_downloads,
        versions_count: bundle.metadata.versions.len(),
    }
}

fn verify_repository(bundle: &SourceBundle) -> Option<RepositoryVerification> {
    match (&bundle.metadata.repository, &bundle.repository) {
        (Some(_), Some(info)) => Some(RepositoryVerification {
            exists: true,
            verified: true,
            stars: Some(info.stars),
            forks: Some(info.forks),
            archived: Some(info.archived),
            last_updated: info.updated_at,
        }),
        // URL declared but the fetch failed or the host is unrecognized.
        (Some(_), None) => Some(RepositoryVerification {
            exists: false,
            verified: false,
            stars: None,
            forks: None,
            archived: None,
            last_updated: None,
        }),
        (None, _) => None,
    }
}
