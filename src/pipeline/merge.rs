// src/pipeline/merge.rs

//! Multi-target store merging.
//!
//! Each target reconciles against the same previous store in
//! isolation; this merge combines the per-target results without
//! counting an `(owner, repository)` pair twice. The first target in
//! run order wins for a repository surfaced by several targets.

use std::collections::HashSet;

use crate::models::RecordStore;

/// Combine per-target stores in fixed target order.
pub fn merge_stores(stores: Vec<RecordStore>) -> RecordStore {
    let mut merged = RecordStore::new();
    let mut seen: HashSet<(String, String)> = HashSet::new();

    for store in stores {
        for owner in store.owners() {
            match merged.get_mut(&owner.username) {
                None => {
                    for repo_name in owner.repos.keys() {
                        seen.insert((owner.username.clone(), repo_name.clone()));
                    }
                    merged.insert(owner.clone());
                }
                Some(existing) => {
                    for (repo_name, repo) in &owner.repos {
                        let key = (owner.username.clone(), repo_name.clone());
                        if seen.insert(key) {
                            existing.repos.insert(repo_name.clone(), repo.clone());
                        }
                    }
                    existing.emails.extend(owner.emails.iter().cloned());
                    if existing.name.is_none() {
                        existing.name = owner.name.clone();
                    }
                }
            }
        }
    }

    merged
}
