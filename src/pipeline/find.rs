// src/pipeline/find.rs

//! Detection run orchestration.
//!
//! Accumulates each target, enriches owners through the profile cache,
//! reconciles every target against the same previous store, then
//! merges the per-target results. A failing target never contributes
//! partial results; the remaining targets still run.

use chrono::Utc;
use futures::stream::{self, StreamExt};

use crate::config::SearchConfig;
use crate::error::AppError;
use crate::models::{EnrichedHit, ProjectedHit, ReconcileStats, RecordStore};
use crate::pipeline::accumulate::{Accumulation, ConfirmPolicy, DeclineReason, PageAccumulator};
use crate::services::{OwnerProfileCache, RepoSearch, SearchTarget};

/// Per-target reconciliation summary.
#[derive(Debug)]
pub struct TargetReport {
    pub target: SearchTarget,
    pub hits: usize,
    pub stats: ReconcileStats,
}

/// Result of one detection run.
#[derive(Debug)]
pub struct FindOutcome {
    /// Merged record store for persistence or dispatch
    pub store: RecordStore,

    /// Targets that completed, in run order
    pub reports: Vec<TargetReport>,

    /// Targets abandoned by operator decision
    pub declined: Vec<(SearchTarget, DeclineReason)>,

    /// Targets aborted by transport failure
    pub failures: Vec<(SearchTarget, AppError)>,
}

impl FindOutcome {
    /// True when at least one target completed.
    pub fn any_completed(&self) -> bool {
        !self.reports.is_empty()
    }
}

/// Run a full detection pass over the given targets.
pub async fn run_find(
    search: &dyn RepoSearch,
    profiles: &OwnerProfileCache,
    confirm: &dyn ConfirmPolicy,
    config: &SearchConfig,
    query: &str,
    targets: &[SearchTarget],
    previous: &RecordStore,
) -> FindOutcome {
    let accumulator = PageAccumulator::new(search, confirm, config);

    let mut per_target = Vec::new();
    let mut outcome = FindOutcome {
        store: RecordStore::new(),
        reports: Vec::new(),
        declined: Vec::new(),
        failures: Vec::new(),
    };

    for &target in targets {
        log::info!("Searching target {target} for '{query}'...");
        match accumulator.accumulate(query, target).await {
            Err(e) => {
                log::error!("Target {target} aborted: {e}");
                outcome.failures.push((target, e));
            }
            Ok(Accumulation::Declined(reason)) => {
                log::info!("Target {target} declined by operator: {reason:?}");
                outcome.declined.push((target, reason));
            }
            Ok(Accumulation::Complete(accumulated)) => {
                let enriched =
                    enrich_hits(accumulated.hits, profiles, config.max_concurrent_profiles).await;

                let mut store = previous.clone();
                let stats = store.reconcile(&enriched, Utc::now());
                log::info!(
                    "Target {target}: {} new, {} re-detected",
                    stats.new,
                    stats.redetected
                );

                outcome.reports.push(TargetReport {
                    target,
                    hits: enriched.len(),
                    stats,
                });
                per_target.push(store);
            }
        }
    }

    outcome.store = if per_target.is_empty() {
        // Nothing reconciled; carry the previous state through unchanged.
        previous.clone()
    } else {
        super::merge::merge_stores(per_target)
    };

    outcome
}

/// Attach owner profiles to hits with bounded concurrency.
///
/// Hit order is preserved; the cache guarantees one fetch per distinct
/// profile URL even while lookups overlap.
async fn enrich_hits(
    hits: Vec<ProjectedHit>,
    profiles: &OwnerProfileCache,
    concurrency: usize,
) -> Vec<EnrichedHit> {
    stream::iter(hits)
        .map(|hit| async move {
            let profile = profiles.lookup(&hit.owner_api_url).await;
            EnrichedHit { hit, profile }
        })
        .buffered(concurrency.max(1))
        .collect()
        .await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;
    use crate::error::Result;
    use crate::models::{OwnerProfile, RawHit, RawOwner, RepoStatus, SearchPage};
    use crate::pipeline::accumulate::AutoConfirm;
    use crate::services::ProfileFetch;

    fn raw_hit(owner: &str, repo: &str) -> RawHit {
        RawHit {
            name: Some(repo.to_string()),
            html_url: Some(format!("https://github.com/{owner}/{repo}")),
            owner: Some(RawOwner {
                login: Some(owner.to_string()),
                url: Some(format!("https://api.github.com/users/{owner}")),
                html_url: Some(format!("https://github.com/{owner}")),
            }),
            repository: None,
        }
    }

    /// Serves one canned page per target; optionally fails a target.
    struct TargetedSearch {
        code: Vec<RawHit>,
        repositories: Vec<RawHit>,
        fail_code: bool,
    }

    #[async_trait]
    impl RepoSearch for TargetedSearch {
        async fn search(
            &self,
            _query: &str,
            target: SearchTarget,
            page: u32,
            _per_page: u32,
        ) -> Result<SearchPage> {
            if self.fail_code && target == SearchTarget::Code {
                return Err(AppError::search(target.as_str(), page, "rate limited"));
            }
            let items = match target {
                SearchTarget::Code => self.code.clone(),
                SearchTarget::Repositories => self.repositories.clone(),
            };
            Ok(SearchPage {
                total: items.len() as u64,
                items,
            })
        }
    }

    struct StaticProfiles;

    #[async_trait]
    impl ProfileFetch for StaticProfiles {
        async fn fetch_profile(&self, api_url: &str) -> Result<OwnerProfile> {
            let login = api_url.rsplit('/').next().unwrap_or_default().to_string();
            Ok(OwnerProfile {
                email: Some(format!("{login}@example.com")),
                login: Some(login),
                name: None,
                html_url: None,
            })
        }
    }

    fn cache() -> OwnerProfileCache {
        OwnerProfileCache::new(Arc::new(StaticProfiles))
    }

    #[tokio::test]
    async fn test_two_targets_merge_without_double_count() {
        let search = TargetedSearch {
            code: vec![raw_hit("alice", "r1")],
            repositories: vec![raw_hit("alice", "r1"), raw_hit("bob", "r2")],
            fail_code: false,
        };
        let profiles = cache();
        let config = SearchConfig::default();
        let targets = [SearchTarget::Code, SearchTarget::Repositories];

        let outcome = run_find(
            &search,
            &profiles,
            &AutoConfirm,
            &config,
            "react antd",
            &targets,
            &RecordStore::new(),
        )
        .await;

        assert_eq!(outcome.reports.len(), 2);
        assert!(outcome.failures.is_empty());
        assert_eq!(outcome.store.repo_count(), 2);
        assert_eq!(
            outcome.store.get("alice").unwrap().repos["r1"].status,
            RepoStatus::New
        );
        assert!(outcome
            .store
            .get("alice")
            .unwrap()
            .emails
            .contains("alice@example.com"));
    }

    #[tokio::test]
    async fn test_previous_store_drives_redetection() {
        let search = TargetedSearch {
            code: vec![raw_hit("alice", "r1"), raw_hit("alice", "r2")],
            repositories: Vec::new(),
            fail_code: false,
        };
        let profiles = cache();
        let config = SearchConfig::default();

        // First run seeds the store.
        let first = run_find(
            &search,
            &profiles,
            &AutoConfirm,
            &config,
            "react antd",
            &[SearchTarget::Code],
            &RecordStore::new(),
        )
        .await;

        let second = run_find(
            &search,
            &profiles,
            &AutoConfirm,
            &config,
            "react antd",
            &[SearchTarget::Code],
            &first.store,
        )
        .await;

        let owner = second.store.get("alice").unwrap();
        assert_eq!(owner.repos["r1"].status, RepoStatus::Redetected);
        assert_eq!(owner.repos["r1"].history.len(), 1);
        assert_eq!(second.reports[0].stats.redetected, 2);
    }

    #[tokio::test]
    async fn test_failed_target_does_not_block_others() {
        let search = TargetedSearch {
            code: vec![raw_hit("alice", "r1")],
            repositories: vec![raw_hit("bob", "r2")],
            fail_code: true,
        };
        let profiles = cache();
        let config = SearchConfig::default();
        let targets = [SearchTarget::Code, SearchTarget::Repositories];

        let outcome = run_find(
            &search,
            &profiles,
            &AutoConfirm,
            &config,
            "react antd",
            &targets,
            &RecordStore::new(),
        )
        .await;

        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].0, SearchTarget::Code);
        assert_eq!(outcome.reports.len(), 1);
        assert!(outcome.store.get("bob").is_some());
        assert!(outcome.store.get("alice").is_none());
    }

    #[tokio::test]
    async fn test_all_targets_failing_preserves_previous_state() {
        let search = TargetedSearch {
            code: Vec::new(),
            repositories: Vec::new(),
            fail_code: true,
        };
        let profiles = cache();
        let config = SearchConfig::default();

        let mut previous = RecordStore::new();
        previous.reconcile(
            &[EnrichedHit {
                hit: ProjectedHit {
                    owner_login: "carol".to_string(),
                    owner_api_url: String::new(),
                    owner_profile_url: String::new(),
                    repo_name: "kept".to_string(),
                    repo_url: "u".to_string(),
                },
                profile: OwnerProfile::default(),
            }],
            Utc::now(),
        );

        let outcome = run_find(
            &search,
            &profiles,
            &AutoConfirm,
            &config,
            "react antd",
            &[SearchTarget::Code],
            &previous,
        )
        .await;

        assert!(!outcome.any_completed());
        assert_eq!(outcome.store, previous);
    }
}
