// src/config.rs

//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// GitHub API client settings
    #[serde(default)]
    pub github: GithubConfig,

    /// Search guard and pagination settings
    #[serde(default)]
    pub search: SearchConfig,

    /// Takedown notification email settings
    #[serde(default)]
    pub email: EmailConfig,

    /// Output settings
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.github.api_base.trim().is_empty() {
            return Err(AppError::validation("github.api_base is empty"));
        }
        if self.github.user_agent.trim().is_empty() {
            return Err(AppError::validation("github.user_agent is empty"));
        }
        if self.github.timeout_secs == 0 {
            return Err(AppError::validation("github.timeout_secs must be > 0"));
        }
        if self.search.page_size == 0 {
            return Err(AppError::validation("search.page_size must be > 0"));
        }
        if self.search.max_pages == 0 {
            return Err(AppError::validation("search.max_pages must be > 0"));
        }
        if self.search.max_concurrent_profiles == 0 {
            return Err(AppError::validation(
                "search.max_concurrent_profiles must be > 0",
            ));
        }
        if self.email.subject.trim().is_empty() {
            return Err(AppError::validation("email.subject is empty"));
        }
        Ok(())
    }
}

/// GitHub API client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    /// Base URL of the REST API
    #[serde(default = "defaults::api_base")]
    pub api_base: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_base: defaults::api_base(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Search guard and pagination settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Hits per page requested from the search API
    #[serde(default = "defaults::page_size")]
    pub page_size: u32,

    /// Hard ceiling on pages fetched per target
    #[serde(default = "defaults::max_pages")]
    pub max_pages: u32,

    /// Result counts above this require operator confirmation
    #[serde(default = "defaults::large_result_threshold")]
    pub large_result_threshold: u64,

    /// Queries shorter than this require operator confirmation
    #[serde(default = "defaults::min_query_len")]
    pub min_query_len: usize,

    /// Bounded concurrency for owner profile enrichment
    #[serde(default = "defaults::max_concurrent_profiles")]
    pub max_concurrent_profiles: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            page_size: defaults::page_size(),
            max_pages: defaults::max_pages(),
            large_result_threshold: defaults::large_result_threshold(),
            min_query_len: defaults::min_query_len(),
            max_concurrent_profiles: defaults::max_concurrent_profiles(),
        }
    }
}

impl SearchConfig {
    /// Maximum number of hits retrievable per target.
    pub fn retrieval_ceiling(&self) -> u64 {
        u64::from(self.page_size) * u64::from(self.max_pages)
    }
}

/// Takedown notification email settings.
///
/// `preface` may contain `{user}`; `ending` may contain `{sender}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    /// Display name used in the From header and the ending template
    #[serde(default = "defaults::sender")]
    pub sender: String,

    /// Message subject
    #[serde(default = "defaults::subject")]
    pub subject: String,

    /// HTML fragment placed before the repository list
    #[serde(default = "defaults::preface")]
    pub preface: String,

    /// HTML fragment placed after the repository list
    #[serde(default = "defaults::ending")]
    pub ending: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            sender: defaults::sender(),
            subject: defaults::subject(),
            preface: defaults::preface(),
            ending: defaults::ending(),
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Default serialization format: "json" or "yaml"
    #[serde(default = "defaults::format")]
    pub format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: defaults::format(),
        }
    }
}

mod defaults {
    pub fn api_base() -> String {
        "https://api.github.com".to_string()
    }

    pub fn user_agent() -> String {
        "takedown".to_string()
    }

    pub fn timeout() -> u64 {
        30
    }

    pub fn page_size() -> u32 {
        100
    }

    pub fn max_pages() -> u32 {
        10
    }

    pub fn large_result_threshold() -> u64 {
        500
    }

    pub fn min_query_len() -> usize {
        5
    }

    pub fn max_concurrent_profiles() -> usize {
        8
    }

    pub fn sender() -> String {
        "Takedown Bot".to_string()
    }

    pub fn subject() -> String {
        "GitHub Takedown Result Regarding your Repositories".to_string()
    }

    pub fn preface() -> String {
        "<p>Hello {user},<br><br>Our program recently detected following one or more \
         repositories related to this email address violate copyright information. \
         Please remove them or turn them into private repositories.</p>"
            .to_string()
    }

    pub fn ending() -> String {
        "<p>Thanks,<br>{sender}</p>".to_string()
    }

    pub fn format() -> String {
        "json".to_string()
    }
}
