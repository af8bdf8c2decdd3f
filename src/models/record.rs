//! Canonical detection records and the reconciliation state machine.
//!
//! A [`RecordStore`] maps owner usernames to [`OwnerRecord`]s, each
//! holding its repositories keyed by name. The store is the entire
//! persisted state between runs and is mutated only through
//! [`RecordStore::reconcile`], [`RecordStore::absorb`] and
//! [`RecordStore::mark_waiting`].

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::hit::ProjectedHit;
use crate::models::profile::OwnerProfile;

/// Detection status of a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RepoStatus {
    /// Detected for the first time ever
    New,

    /// Already on record and detected again
    #[serde(rename = "Re-detected")]
    Redetected,

    /// A takedown notification has been queued
    Waiting,

    /// Externally determined to be resolved
    Done,
}

impl RepoStatus {
    /// Parse a case-insensitive status tag.
    ///
    /// Accepts both the `redetected` and `re-detected` spellings.
    pub fn parse_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_lowercase().as_str() {
            "new" => Some(Self::New),
            "redetected" | "re-detected" => Some(Self::Redetected),
            "waiting" => Some(Self::Waiting),
            "done" => Some(Self::Done),
            _ => None,
        }
    }
}

impl fmt::Display for RepoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::New => "New",
            Self::Redetected => "Re-detected",
            Self::Waiting => "Waiting",
            Self::Done => "Done",
        };
        write!(f, "{s}")
    }
}

/// One superseded `(status, date)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub status: RepoStatus,
    pub date: DateTime<Utc>,
}

/// Detection record of a single repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoRecord {
    /// Repository name, unique within its owner
    pub name: String,

    /// Canonical repository URL
    pub url: String,

    /// Current status
    pub status: RepoStatus,

    /// Timestamp of the most recent status change
    pub last_event_date: DateTime<Utc>,

    /// Superseded `(status, date)` pairs, oldest first, append-only
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

impl RepoRecord {
    /// Create a freshly detected record in `New` status.
    pub fn new(name: impl Into<String>, url: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            status: RepoStatus::New,
            last_event_date: now,
            history: Vec::new(),
        }
    }

    /// Transition to a new status, pushing the superseded pair to history.
    pub fn transition(&mut self, status: RepoStatus, now: DateTime<Utc>) {
        self.history.push(HistoryEntry {
            status: self.status,
            date: self.last_event_date,
        });
        self.status = status;
        self.last_event_date = now;
    }
}

/// Detection records of a single owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerRecord {
    /// Unique identity key, stable across runs
    pub username: String,

    /// Human display name, absent when the profile carries none
    #[serde(default)]
    pub name: Option<String>,

    /// Known contact addresses; grows across runs, never shrinks
    #[serde(default)]
    pub emails: BTreeSet<String>,

    /// Link to the owner's profile
    pub profile_url: String,

    /// Repositories keyed by name
    #[serde(default)]
    pub repos: BTreeMap<String, RepoRecord>,
}

impl OwnerRecord {
    /// Create an owner record with no repositories yet.
    pub fn new(username: impl Into<String>, profile_url: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            name: None,
            emails: BTreeSet::new(),
            profile_url: profile_url.into(),
            repos: BTreeMap::new(),
        }
    }

    /// Fold profile enrichment fields into this record.
    ///
    /// Optional fields only ever fill gaps or add addresses; nothing is
    /// overwritten or removed.
    fn enrich(&mut self, profile: &OwnerProfile) {
        if self.name.is_none() {
            self.name = profile.name.clone();
        }
        if let Some(email) = &profile.email {
            self.emails.insert(email.clone());
        }
        if self.profile_url.is_empty() {
            if let Some(url) = &profile.html_url {
                self.profile_url = url.clone();
            }
        }
    }
}

/// A projected hit together with its owner profile enrichment.
#[derive(Debug, Clone)]
pub struct EnrichedHit {
    pub hit: ProjectedHit,
    pub profile: OwnerProfile,
}

impl EnrichedHit {
    /// Owner identity used as the merge key.
    ///
    /// The profile's canonical login wins over the login embedded in
    /// the hit when both are present.
    fn username(&self) -> &str {
        match &self.profile.login {
            Some(login) if !login.is_empty() => login,
            _ => &self.hit.owner_login,
        }
    }
}

/// Counters reported by one reconcile pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    /// Repositories entering `New`
    pub new: usize,

    /// Repositories transitioned to `Redetected`
    pub redetected: usize,

    /// Hits skipped for lacking any owner identity
    pub anomalies: usize,
}

/// The canonical owner-keyed record set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordStore {
    owners: BTreeMap<String, OwnerRecord>,
}

impl RecordStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    /// Number of owners on record.
    pub fn owner_count(&self) -> usize {
        self.owners.len()
    }

    /// Number of repositories on record across all owners.
    pub fn repo_count(&self) -> usize {
        self.owners.values().map(|o| o.repos.len()).sum()
    }

    pub fn get(&self, username: &str) -> Option<&OwnerRecord> {
        self.owners.get(username)
    }

    pub fn get_mut(&mut self, username: &str) -> Option<&mut OwnerRecord> {
        self.owners.get_mut(username)
    }

    /// Iterate owners in key order.
    pub fn owners(&self) -> impl Iterator<Item = &OwnerRecord> {
        self.owners.values()
    }

    /// Insert or replace an owner record wholesale.
    pub fn insert(&mut self, owner: OwnerRecord) {
        self.owners.insert(owner.username.clone(), owner);
    }

    /// Fold one target's deduplicated hit batch into the store.
    ///
    /// A repository already on record (from a previous run or earlier
    /// in the batch) transitions to `Redetected` with its superseded
    /// pair appended to history; anything else enters as `New`. Field
    /// lookups are keyed by stable identity, so batch order does not
    /// affect the final store.
    pub fn reconcile(&mut self, hits: &[EnrichedHit], now: DateTime<Utc>) -> ReconcileStats {
        let mut stats = ReconcileStats::default();

        for enriched in hits {
            let username = enriched.username().to_string();
            if username.is_empty() {
                log::warn!(
                    "Skipping hit for {} with no owner identity",
                    enriched.hit.repo_url
                );
                stats.anomalies += 1;
                continue;
            }

            let owner = self.owners.entry(username.clone()).or_insert_with(|| {
                let profile_url = match &enriched.profile.html_url {
                    Some(url) if !url.is_empty() => url.clone(),
                    _ => enriched.hit.owner_profile_url.clone(),
                };
                OwnerRecord::new(username, profile_url)
            });
            owner.enrich(&enriched.profile);

            match owner.repos.get_mut(&enriched.hit.repo_name) {
                Some(record) => {
                    record.transition(RepoStatus::Redetected, now);
                    stats.redetected += 1;
                }
                None => {
                    owner.repos.insert(
                        enriched.hit.repo_name.clone(),
                        RepoRecord::new(&enriched.hit.repo_name, &enriched.hit.repo_url, now),
                    );
                    stats.new += 1;
                }
            }
        }

        stats
    }

    /// Merge a previously persisted store into this one.
    ///
    /// Used when several previous-output sources are loaded for one
    /// run: for a repository present on both sides, the record with
    /// the later `last_event_date` wins; emails are unioned and
    /// missing optional owner fields are filled.
    pub fn absorb(&mut self, other: RecordStore) {
        for (username, incoming) in other.owners {
            match self.owners.get_mut(&username) {
                None => {
                    self.owners.insert(username, incoming);
                }
                Some(existing) => {
                    if existing.name.is_none() {
                        existing.name = incoming.name;
                    }
                    if existing.profile_url.is_empty() {
                        existing.profile_url = incoming.profile_url;
                    }
                    existing.emails.extend(incoming.emails);
                    for (repo_name, repo) in incoming.repos {
                        match existing.repos.get_mut(&repo_name) {
                            None => {
                                existing.repos.insert(repo_name, repo);
                            }
                            Some(current) if repo.last_event_date > current.last_event_date => {
                                *current = repo;
                            }
                            Some(_) => {}
                        }
                    }
                }
            }
        }
    }

    /// Transition the named repositories of an owner to `Waiting`.
    ///
    /// Called after a notification attempt referencing them; unknown
    /// names are ignored.
    pub fn mark_waiting(&mut self, username: &str, repo_names: &[String], now: DateTime<Utc>) {
        if let Some(owner) = self.owners.get_mut(username) {
            for name in repo_names {
                if let Some(record) = owner.repos.get_mut(name) {
                    record.transition(RepoStatus::Waiting, now);
                }
            }
        }
    }
}
