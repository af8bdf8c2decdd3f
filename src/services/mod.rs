//! Service layer for the takedown application.
//!
//! This module contains the remote-facing clients:
//! - GitHub search and profile client (`GitHubClient`)
//! - Owner profile memoization (`OwnerProfileCache`)

mod github;
mod profile;

pub use github::{GitHubClient, ProfileFetch, RepoSearch, SearchTarget};
pub use profile::OwnerProfileCache;
