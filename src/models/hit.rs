//! Search hit shapes and projection.
//!
//! The search API nests repository and owner metadata differently per
//! endpoint: a code-search item wraps its `repository`, while a
//! repository-search item *is* the repository. [`ProjectedHit`] flattens
//! either shape into the minimal field tuple the reconciliation core
//! consumes.

use serde::{Deserialize, Serialize};

/// One page of search results as returned by the API.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchPage {
    /// Total hit count across all pages
    #[serde(rename = "total_count")]
    pub total: u64,

    /// Hits on this page
    #[serde(default)]
    pub items: Vec<RawHit>,
}

/// One raw search hit, tolerant of both endpoint shapes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawHit {
    /// Repository name (repository-search shape)
    #[serde(default)]
    pub name: Option<String>,

    /// Repository URL (repository-search shape)
    #[serde(default)]
    pub html_url: Option<String>,

    /// Repository owner (repository-search shape)
    #[serde(default)]
    pub owner: Option<RawOwner>,

    /// Nested repository (code-search shape)
    #[serde(default)]
    pub repository: Option<RawRepo>,
}

/// Nested repository metadata of a code-search hit.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRepo {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub html_url: Option<String>,

    #[serde(default)]
    pub owner: Option<RawOwner>,
}

/// Owner metadata nested in a hit.
#[derive(Debug, Clone, Deserialize)]
pub struct RawOwner {
    /// Account login
    #[serde(default)]
    pub login: Option<String>,

    /// API URL of the owner profile
    #[serde(default)]
    pub url: Option<String>,

    /// Human-facing profile URL
    #[serde(default)]
    pub html_url: Option<String>,
}

/// Flattened hit fields consumed by reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectedHit {
    /// Owner login as reported by the hit
    pub owner_login: String,

    /// API URL used for owner profile enrichment
    pub owner_api_url: String,

    /// Human-facing owner profile URL
    pub owner_profile_url: String,

    /// Repository name, unique within its owner
    pub repo_name: String,

    /// Canonical repository URL
    pub repo_url: String,
}

impl RawHit {
    /// Project this hit into the flattened field tuple.
    ///
    /// Returns `None` when the mandatory repository name/URL pair is
    /// missing; callers count that as a non-fatal input anomaly.
    pub fn project(&self) -> Option<ProjectedHit> {
        let (name, url, owner) = match &self.repository {
            Some(repo) => (repo.name.as_ref(), repo.html_url.as_ref(), repo.owner.as_ref()),
            None => (self.name.as_ref(), self.html_url.as_ref(), self.owner.as_ref()),
        };

        let repo_name = name?.clone();
        let repo_url = url?.clone();

        let owner_login = owner
            .and_then(|o| o.login.clone())
            .unwrap_or_default();
        let owner_api_url = owner.and_then(|o| o.url.clone()).unwrap_or_default();
        let owner_profile_url = owner
            .and_then(|o| o.html_url.clone())
            .unwrap_or_default();

        Some(ProjectedHit {
            owner_login,
            owner_api_url,
            owner_profile_url,
            repo_name,
            repo_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_code_search_shape() {
        let hit: RawHit = serde_json::from_value(serde_json::json!({
            "path": "src/index.js",
            "repository": {
                "name": "r1",
                "html_url": "https://github.com/alice/r1",
                "owner": {
                    "login": "alice",
                    "url": "https://api.github.com/users/alice",
                    "html_url": "https://github.com/alice"
                }
            }
        }))
        .unwrap();

        let projected = hit.project().unwrap();
        assert_eq!(projected.owner_login, "alice");
        assert_eq!(projected.repo_name, "r1");
        assert_eq!(projected.repo_url, "https://github.com/alice/r1");
        assert_eq!(projected.owner_api_url, "https://api.github.com/users/alice");
    }

    #[test]
    fn test_project_repo_search_shape() {
        let hit: RawHit = serde_json::from_value(serde_json::json!({
            "name": "r2",
            "html_url": "https://github.com/bob/r2",
            "owner": {
                "login": "bob",
                "url": "https://api.github.com/users/bob",
                "html_url": "https://github.com/bob"
            }
        }))
        .unwrap();

        let projected = hit.project().unwrap();
        assert_eq!(projected.owner_login, "bob");
        assert_eq!(projected.repo_name, "r2");
    }

    #[test]
    fn test_project_missing_mandatory_fields() {
        let hit: RawHit = serde_json::from_value(serde_json::json!({
            "owner": { "login": "carol" }
        }))
        .unwrap();
        assert!(hit.project().is_none());
    }

    #[test]
    fn test_project_missing_owner_is_tolerated() {
        let hit: RawHit = serde_json::from_value(serde_json::json!({
            "name": "r3",
            "html_url": "https://github.com/x/r3"
        }))
        .unwrap();

        let projected = hit.project().unwrap();
        assert!(projected.owner_login.is_empty());
        assert!(projected.owner_api_url.is_empty());
    }

    #[test]
    fn test_search_page_deserializes_total_count() {
        let page: SearchPage = serde_json::from_value(serde_json::json!({
            "total_count": 1500,
            "items": []
        }))
        .unwrap();
        assert_eq!(page.total, 1500);
        assert!(page.items.is_empty());
    }
}
