// src/pipeline/accumulate.rs

//! Page accumulation for a single search target.
//!
//! Drives the paginated search operation sequentially, enforces the
//! retrieval ceiling and operator-confirmation guards, and yields one
//! deduplicated, projected hit list. Any page-fetch failure aborts the
//! whole target; no partial hit list escapes.

use std::collections::HashSet;

use crate::config::SearchConfig;
use crate::error::{AppError, Result};
use crate::models::{ProjectedHit, RawHit};
use crate::services::{RepoSearch, SearchTarget};

/// Why an accumulation was abandoned without running.
///
/// A decline is an operator decision, not a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclineReason {
    /// Query was shorter than the configured minimum
    ShortQuery,

    /// Total hit count exceeded the large-result threshold
    LargeResult { total: u64 },
}

/// Result of accumulating one target.
#[derive(Debug)]
pub enum Accumulation {
    /// All pages within the ceiling were retrieved
    Complete(AccumulateOutcome),

    /// The operator declined a confirmation prompt
    Declined(DeclineReason),
}

/// The deduplicated, projected hit set for one target.
#[derive(Debug, Default)]
pub struct AccumulateOutcome {
    /// Projected hits in first-requested-first page order
    pub hits: Vec<ProjectedHit>,

    /// Total hit count reported by the first page
    pub total: u64,

    /// Pages actually retrieved
    pub pages_fetched: u32,

    /// Hits skipped for missing mandatory fields
    pub anomalies: usize,

    /// Hits dropped as repository-URL duplicates within this target
    pub duplicates: usize,
}

/// Accumulates one target's paginated search into a projected hit list.
pub struct PageAccumulator<'a> {
    search: &'a dyn RepoSearch,
    confirm: &'a dyn ConfirmPolicy,
    config: &'a SearchConfig,
}

impl<'a> PageAccumulator<'a> {
    pub fn new(
        search: &'a dyn RepoSearch,
        confirm: &'a dyn ConfirmPolicy,
        config: &'a SearchConfig,
    ) -> Self {
        Self {
            search,
            confirm,
            config,
        }
    }

    /// Run the full accumulation for one target.
    ///
    /// Requests page 1, applies the short-query and large-result
    /// guards, then pages sequentially from page 2 until the retrieved
    /// pages cover `total` or the page ceiling is reached.
    pub async fn accumulate(&self, query: &str, target: SearchTarget) -> Result<Accumulation> {
        if query.trim().is_empty() {
            return Err(AppError::validation("Search query is empty"));
        }

        if query.len() < self.config.min_query_len && !self.confirm.confirm_short_query(query) {
            return Ok(Accumulation::Declined(DeclineReason::ShortQuery));
        }

        let per_page = self.config.page_size;
        let first = self.search.search(query, target, 1, per_page).await?;

        if first.total > self.config.large_result_threshold
            && !self
                .confirm
                .confirm_large_result(query, first.total, self.config.retrieval_ceiling())
        {
            return Ok(Accumulation::Declined(DeclineReason::LargeResult {
                total: first.total,
            }));
        }

        let mut outcome = AccumulateOutcome {
            total: first.total,
            pages_fetched: 1,
            ..AccumulateOutcome::default()
        };
        let mut seen_urls = HashSet::new();
        self.ingest_page(&first.items, &mut seen_urls, &mut outcome);

        while u64::from(outcome.pages_fetched) * u64::from(per_page) < outcome.total
            && outcome.pages_fetched < self.config.max_pages
        {
            let page_no = outcome.pages_fetched + 1;
            let page = self.search.search(query, target, page_no, per_page).await?;
            outcome.pages_fetched = page_no;
            self.ingest_page(&page.items, &mut seen_urls, &mut outcome);
        }

        log::info!(
            "Target {}: {} hits over {} pages ({} total reported, {} duplicates, {} anomalies)",
            target,
            outcome.hits.len(),
            outcome.pages_fetched,
            outcome.total,
            outcome.duplicates,
            outcome.anomalies
        );

        Ok(Accumulation::Complete(outcome))
    }

    /// Project one page of hits, keeping the first record per repo URL.
    fn ingest_page(
        &self,
        items: &[RawHit],
        seen_urls: &mut HashSet<String>,
        outcome: &mut AccumulateOutcome,
    ) {
        for item in items {
            match item.project() {
                None => {
                    log::warn!("Skipping search hit with missing repository fields");
                    outcome.anomalies += 1;
                }
                Some(hit) => {
                    if seen_urls.insert(hit.repo_url.clone()) {
                        outcome.hits.push(hit);
                    } else {
                        outcome.duplicates += 1;
                    }
                }
            }
        }
    }
}

/// Operator confirmation hooks for risky searches.
pub trait ConfirmPolicy: Send + Sync {
    /// Ask whether to proceed with a suspiciously short query.
    fn confirm_short_query(&self, query: &str) -> bool;

    /// Ask whether to proceed with a result set above the threshold.
    fn confirm_large_result(&self, query: &str, total: u64, ceiling: u64) -> bool;
}

/// Policy that proceeds without prompting.
pub struct AutoConfirm;

impl ConfirmPolicy for AutoConfirm {
    fn confirm_short_query(&self, _query: &str) -> bool {
        true
    }

    fn confirm_large_result(&self, _query: &str, _total: u64, _ceiling: u64) -> bool {
        true
    }
}
