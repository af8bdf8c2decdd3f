// src/services/profile.rs

//! Owner profile cache.
//!
//! Memoizes profile lookups by URL within a single run. Lookups may be
//! issued concurrently during hit enrichment; a miss triggers exactly
//! one remote fetch per distinct URL, with concurrent callers awaiting
//! the in-flight fetch instead of duplicating it.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OnceCell};

use crate::models::OwnerProfile;
use crate::services::ProfileFetch;

/// Duplicate-suppressing memoization of owner profile lookups.
pub struct OwnerProfileCache {
    fetcher: Arc<dyn ProfileFetch>,
    entries: Mutex<HashMap<String, Arc<OnceCell<OwnerProfile>>>>,
}

impl OwnerProfileCache {
    /// Create a cache over the given profile fetcher.
    pub fn new(fetcher: Arc<dyn ProfileFetch>) -> Self {
        Self {
            fetcher,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Look up a profile, fetching it at most once per URL.
    ///
    /// A fetch failure degrades to an empty profile (all fields
    /// absent) and is cached like a success, so one broken URL is not
    /// retried for every hit naming it.
    pub async fn lookup(&self, api_url: &str) -> OwnerProfile {
        if api_url.is_empty() {
            return OwnerProfile::default();
        }

        let cell = {
            let mut entries = self.entries.lock().await;
            Arc::clone(entries.entry(api_url.to_string()).or_default())
        };

        cell.get_or_init(|| async {
            match self.fetcher.fetch_profile(api_url).await {
                Ok(profile) => profile,
                Err(e) => {
                    log::warn!("Profile fetch failed for {api_url}: {e}");
                    OwnerProfile::default()
                }
            }
        })
        .await
        .clone()
    }

    /// Number of distinct URLs cached so far.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}
