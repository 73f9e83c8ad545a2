//! Snapshot Module
//!
//! Serializes the shared store to a JSON file so it survives a restart.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cache::CacheEntry;
use crate::error::{CacheError, Result};

/// Point-in-time copy of the shared store's live records.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub saved_at: u64,
    pub entries: HashMap<String, CacheEntry>,
}

impl Snapshot {
    pub fn new(entries: HashMap<String, CacheEntry>, saved_at: u64) -> Self {
        Self { saved_at, entries }
    }
}

/// Reads a snapshot file. A missing file is not an error.
pub async fn load_snapshot(path: impl AsRef<Path>) -> Result<Option<Snapshot>> {
    let path = path.as_ref();
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(CacheError::Internal(format!(
                "reading snapshot {}: {}",
                path.display(),
                e
            )))
        }
    };

    let snapshot = serde_json::from_slice(&bytes).map_err(|e| {
        CacheError::Internal(format!("parsing snapshot {}: {}", path.display(), e))
    })?;
    Ok(Some(snapshot))
}

/// Writes a snapshot atomically (temp file, then rename).
pub async fn save_snapshot(path: impl AsRef<Path>, snapshot: &Snapshot) -> Result<()> {
    let path = path.as_ref();
    let bytes = serde_json::to_vec(snapshot)
        .map_err(|e| CacheError::Internal(format!("encoding snapshot: {}", e)))?;

    let tmp = path.with_extension("tmp");
    tokio::fs::write(&tmp, &bytes)
        .await
        .map_err(|e| CacheError::Internal(format!("writing {}: {}", tmp.display(), e)))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| CacheError::Internal(format!("renaming {}: {}", tmp.display(), e)))?;

    info!(
        path = %path.display(),
        entries = snapshot.entries.len(),
        "shared store snapshot saved"
    );
    Ok(())
}
