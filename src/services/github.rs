// src/services/github.rs

//! GitHub REST API client.
//!
//! Search endpoint docs: <https://docs.github.com/en/rest/search>
//!
//! The pipeline consumes the client through the [`RepoSearch`] and
//! [`ProfileFetch`] traits so tests can substitute canned responses.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;

use crate::config::GithubConfig;
use crate::error::{AppError, Result};
use crate::models::{OwnerProfile, SearchPage};
use crate::utils::http;

/// A named search mode run independently and later merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchTarget {
    /// File-content search
    Code,

    /// Repository-metadata search
    Repositories,
}

impl SearchTarget {
    /// API path of the search endpoint.
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Code => "/search/code",
            Self::Repositories => "/search/repositories",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Repositories => "repositories",
        }
    }
}

impl fmt::Display for SearchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SearchTarget {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "code" => Ok(Self::Code),
            "repo" | "repos" | "repositories" => Ok(Self::Repositories),
            other => Err(AppError::validation(format!(
                "Unknown search target '{other}' (expected 'code' or 'repo')"
            ))),
        }
    }
}

/// Paginated search operation consumed by the accumulator.
#[async_trait]
pub trait RepoSearch: Send + Sync {
    /// Fetch one page of search results.
    async fn search(
        &self,
        query: &str,
        target: SearchTarget,
        page: u32,
        per_page: u32,
    ) -> Result<SearchPage>;
}

/// Owner-profile operation consumed by the profile cache.
#[async_trait]
pub trait ProfileFetch: Send + Sync {
    /// Fetch enrichment fields from an owner profile URL.
    async fn fetch_profile(&self, api_url: &str) -> Result<OwnerProfile>;
}

/// Authenticated GitHub REST client.
pub struct GitHubClient {
    client: reqwest::Client,
    api_base: String,
    token: Option<String>,
}

impl GitHubClient {
    /// Create a client from configuration and an optional OAuth token.
    ///
    /// Code search across all of GitHub requires a token; without one
    /// the API rejects unscoped queries.
    pub fn new(config: &GithubConfig, token: Option<String>) -> Result<Self> {
        Ok(Self {
            client: http::create_client(config)?,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .get(url)
            .header("accept", "application/vnd.github.v3+json");
        if let Some(token) = &self.token {
            builder = builder.header("authorization", format!("token {token}"));
        }
        builder
    }
}

#[async_trait]
impl RepoSearch for GitHubClient {
    async fn search(
        &self,
        query: &str,
        target: SearchTarget,
        page: u32,
        per_page: u32,
    ) -> Result<SearchPage> {
        let url = format!("{}{}", self.api_base, target.endpoint());
        let response = self
            .get(&url)
            .query(&[
                ("q", query),
                ("page", &page.to_string()),
                ("per_page", &per_page.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::search(
                target.as_str(),
                page,
                format!("{status}: {body}"),
            ));
        }

        Ok(response.json::<SearchPage>().await?)
    }
}

#[async_trait]
impl ProfileFetch for GitHubClient {
    async fn fetch_profile(&self, api_url: &str) -> Result<OwnerProfile> {
        let response = self.get(api_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::profile(api_url, status));
        }
        Ok(response.json::<OwnerProfile>().await?)
    }
}
