//! Local filesystem persistence of record sets.
//!
//! Reads previous-output files with encoding fallback and writes new
//! snapshots atomically (write to temp, then rename).

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::RecordStore;
use crate::storage::{decode, encode, RecordFormat};

/// Load one record set from a file, trying both encodings.
pub async fn load_records(path: &Path) -> Result<RecordStore> {
    let text = tokio::fs::read_to_string(path).await?;
    decode(&text).map_err(|e| match e {
        AppError::Decode { message, .. } => AppError::decode(path.display().to_string(), message),
        other => other,
    })
}

/// Load and merge previous record sets from several sources.
///
/// A source that cannot be read or decoded in either encoding is
/// skipped with a warning; the remaining sources still contribute.
/// Owners colliding across sources are merged with the later
/// `last_event_date` winning per repository.
pub async fn load_previous(paths: &[PathBuf]) -> RecordStore {
    let mut merged = RecordStore::new();
    for path in paths {
        log::info!("Loading previous records from {}...", path.display());
        match load_records(path).await {
            Ok(store) => {
                log::info!(
                    "{}: {} owners, {} repos",
                    path.display(),
                    store.owner_count(),
                    store.repo_count()
                );
                merged.absorb(store);
            }
            Err(e) => {
                log::warn!("Skipping {}: {e}", path.display());
            }
        }
    }
    merged
}

/// Write a record set atomically in the given format.
pub async fn save_records(path: &Path, store: &RecordStore, format: RecordFormat) -> Result<()> {
    let text = encode(store, format)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let tmp = path.with_extension("tmp");
    let mut file = tokio::fs::File::create(&tmp).await?;
    file.write_all(text.as_bytes()).await?;
    file.flush().await?;
    drop(file);

    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}
