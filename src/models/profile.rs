//! Owner profile data.

use serde::{Deserialize, Serialize};

/// Enrichment fields fetched from an owner's profile URL.
///
/// Every field is optional: a failed or partial profile fetch degrades
/// to an empty profile rather than aborting reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerProfile {
    /// Canonical account login
    #[serde(default)]
    pub login: Option<String>,

    /// Human display name
    #[serde(default)]
    pub name: Option<String>,

    /// Public contact address
    #[serde(default)]
    pub email: Option<String>,

    /// Canonical profile URL
    #[serde(default)]
    pub html_url: Option<String>,
}

impl OwnerProfile {
    /// True when no enrichment field is present.
    pub fn is_empty(&self) -> bool {
        self.login.is_none() && self.name.is_none() && self.email.is_none() && self.html_url.is_none()
    }
}
