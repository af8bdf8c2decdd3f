//! Persistence for record sets.
//!
//! The persisted document has a `results` list of owner objects whose
//! repositories are serialized as a list (not a map); loading re-keys
//! them by repository name. Two interchangeable textual encodings are
//! supported, JSON and YAML, and decoding falls back across them.

pub mod local;

use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{OwnerRecord, RecordStore, RepoRecord};

// Re-export for convenience
pub use local::{load_previous, load_records, save_records};

/// Supported textual encodings of a record document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFormat {
    Json,
    Yaml,
}

impl FromStr for RecordFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            other => Err(AppError::validation(format!(
                "Unknown output format '{other}' (expected 'json' or 'yaml')"
            ))),
        }
    }
}

/// Serialized shape of a record set.
#[derive(Debug, Serialize, Deserialize)]
pub struct RecordDocument {
    pub results: Vec<OwnerEntry>,
}

/// One owner in the serialized document, repos flattened to a list.
#[derive(Debug, Serialize, Deserialize)]
pub struct OwnerEntry {
    pub username: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub emails: BTreeSet<String>,

    #[serde(default)]
    pub profile_url: String,

    #[serde(default)]
    pub repos: Vec<RepoRecord>,
}

impl From<&RecordStore> for RecordDocument {
    fn from(store: &RecordStore) -> Self {
        Self {
            results: store
                .owners()
                .map(|owner| OwnerEntry {
                    username: owner.username.clone(),
                    name: owner.name.clone(),
                    emails: owner.emails.clone(),
                    profile_url: owner.profile_url.clone(),
                    repos: owner.repos.values().cloned().collect(),
                })
                .collect(),
        }
    }
}

impl RecordDocument {
    /// Re-key the flattened repo lists into the in-memory store.
    pub fn into_store(self) -> RecordStore {
        let mut store = RecordStore::new();
        for entry in self.results {
            let mut owner = OwnerRecord::new(entry.username, entry.profile_url);
            owner.name = entry.name;
            owner.emails = entry.emails;
            for repo in entry.repos {
                owner.repos.insert(repo.name.clone(), repo);
            }
            store.insert(owner);
        }
        store
    }
}

/// Encode a store in the given format.
pub fn encode(store: &RecordStore, format: RecordFormat) -> Result<String> {
    let document = RecordDocument::from(store);
    match format {
        RecordFormat::Json => Ok(serde_json::to_string_pretty(&document)?),
        RecordFormat::Yaml => Ok(serde_yaml::to_string(&document)?),
    }
}

/// Decode a store from either supported encoding.
///
/// Tries JSON first, then YAML; a source that fails both, or whose
/// top-level shape is not the expected document, is an error the
/// caller may choose to absorb.
pub fn decode(text: &str) -> Result<RecordStore> {
    match serde_json::from_str::<RecordDocument>(text) {
        Ok(document) => Ok(document.into_store()),
        Err(json_err) => match serde_yaml::from_str::<RecordDocument>(text) {
            Ok(document) => Ok(document.into_store()),
            Err(yaml_err) => Err(AppError::decode(
                "<record document>",
                format!("not JSON ({json_err}) nor YAML ({yaml_err})"),
            )),
        },
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::models::{EnrichedHit, OwnerProfile, ProjectedHit, RepoStatus};

    fn sample_store() -> RecordStore {
        let mut store = RecordStore::new();
        let hits = vec![
            EnrichedHit {
                hit: ProjectedHit {
                    owner_login: "alice".to_string(),
                    owner_api_url: String::new(),
                    owner_profile_url: "https://github.com/alice".to_string(),
                    repo_name: "r1".to_string(),
                    repo_url: "https://github.com/alice/r1".to_string(),
                },
                profile: OwnerProfile {
                    name: Some("Alice".to_string()),
                    email: Some("alice@example.com".to_string()),
                    ..OwnerProfile::default()
                },
            },
            EnrichedHit {
                hit: ProjectedHit {
                    owner_login: "bob".to_string(),
                    owner_api_url: String::new(),
                    owner_profile_url: "https://github.com/bob".to_string(),
                    repo_name: "r2".to_string(),
                    repo_url: "https://github.com/bob/r2".to_string(),
                },
                // No profile at all: name stays None, emails empty.
                profile: OwnerProfile::default(),
            },
        ];
        store.reconcile(&hits, Utc::now());
        // Give one repo some history.
        store.reconcile(&hits[..1], Utc::now());
        store
    }

    #[test]
    fn test_json_round_trip() {
        let store = sample_store();
        let text = encode(&store, RecordFormat::Json).unwrap();
        assert_eq!(decode(&text).unwrap(), store);
    }

    #[test]
    fn test_yaml_round_trip() {
        let store = sample_store();
        let text = encode(&store, RecordFormat::Yaml).unwrap();
        assert_eq!(decode(&text).unwrap(), store);
    }

    #[test]
    fn test_encodings_decode_identically() {
        let store = sample_store();
        let json = encode(&store, RecordFormat::Json).unwrap();
        let yaml = encode(&store, RecordFormat::Yaml).unwrap();
        assert_eq!(decode(&json).unwrap(), decode(&yaml).unwrap());
    }

    #[test]
    fn test_round_trip_preserves_optional_gaps() {
        let store = sample_store();
        let decoded = decode(&encode(&store, RecordFormat::Yaml).unwrap()).unwrap();
        let bob = decoded.get("bob").unwrap();
        assert!(bob.name.is_none());
        assert!(bob.emails.is_empty());
    }

    #[test]
    fn test_repos_serialized_as_list() {
        let store = sample_store();
        let value: serde_json::Value =
            serde_json::from_str(&encode(&store, RecordFormat::Json).unwrap()).unwrap();
        assert!(value["results"].is_array());
        assert!(value["results"][0]["repos"].is_array());
    }

    #[test]
    fn test_status_wire_spelling() {
        let store = sample_store();
        let text = encode(&store, RecordFormat::Json).unwrap();
        assert!(text.contains("\"Re-detected\""));

        let decoded = decode(&text).unwrap();
        assert_eq!(
            decoded.get("alice").unwrap().repos["r1"].status,
            RepoStatus::Redetected
        );
    }

    #[test]
    fn test_decode_rejects_wrong_shape() {
        assert!(decode("just some prose").is_err());
        assert!(decode("{\"unexpected\": true}").is_err());
        assert!(decode("- a\n- list\n").is_err());
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("json".parse::<RecordFormat>().unwrap(), RecordFormat::Json);
        assert_eq!("YAML".parse::<RecordFormat>().unwrap(), RecordFormat::Yaml);
        assert_eq!("yml".parse::<RecordFormat>().unwrap(), RecordFormat::Yaml);
        assert!("csv".parse::<RecordFormat>().is_err());
    }
}
