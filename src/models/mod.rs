// src/models/mod.rs

//! Domain models for the takedown application.
//!
//! This module contains all data structures used throughout the
//! application, organized by their primary purpose.

mod hit;
mod profile;
mod record;

// Re-export all public types
pub use hit::{ProjectedHit, RawHit, RawOwner, RawRepo, SearchPage};
pub use profile::OwnerProfile;
pub use record::{
    EnrichedHit, HistoryEntry, OwnerRecord, ReconcileStats, RecordStore, RepoRecord, RepoStatus,
};
