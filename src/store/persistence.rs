//! Durable storage of per-user vector stores.
//!
//! Each user's store is persisted as two co-located artifacts under
//! `<root>/<user_id>/`:
//!
//! - `index.bin` — the similarity index as a binary blob
//! - `chunks.json` — the index-to-chunk map plus index parameters
//!
//! Both must be present and mutually consistent for a load to succeed;
//! anything less degrades to "absent" so the query path never crashes on
//! a damaged store.

use std::path::PathBuf;

use ragchat_vector::{DistanceMetric, FlatIndex};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::StorageConfig;
use crate::store::retry::RetryPolicy;
use crate::store::UserVectorStore;
use crate::types::{AppError, DocumentChunk, Result};

const INDEX_FILE: &str = "index.bin";
const CHUNKS_FILE: &str = "chunks.json";

/// Chunk-map artifact stored next to the index blob.
#[derive(Debug, Serialize, Deserialize)]
struct StoreMetadata {
    dimensions: usize,
    metric: DistanceMetric,
    chunks: Vec<DocumentChunk>,
}

/// Loads and saves per-user vector stores under a fixed root directory.
#[derive(Debug, Clone)]
pub struct StoreManager {
    root: PathBuf,
    retry: RetryPolicy,
}

impl StoreManager {
    pub fn new(root: impl Into<PathBuf>, retry: RetryPolicy) -> Self {
        Self {
            root: root.into(),
            retry,
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(
            config.vector_root.clone(),
            RetryPolicy::new(config.retry_max_attempts, config.retry_backoff()),
        )
    }

    /// Load a user's store, or `None` if the user has none.
    ///
    /// Missing artifacts are the expected state for a user who has never
    /// uploaded documents. Faults that should not happen — unreadable
    /// files, corrupt blobs, artifacts that disagree with each other —
    /// are logged and also reported as `None`: retrieval degrades, it
    /// never takes down the query path.
    pub async fn load(&self, user_id: &str) -> Option<UserVectorStore> {
        match self.try_load(user_id).await {
            Ok(store) => store,
            Err(error) => {
                warn!(user_id, %error, "Failed to load vector store, treating as absent");
                None
            }
        }
    }

    async fn try_load(&self, user_id: &str) -> Result<Option<UserVectorStore>> {
        let user_dir = self.user_dir(user_id)?;
        let index_path = user_dir.join(INDEX_FILE);
        let chunks_path = user_dir.join(CHUNKS_FILE);

        if !index_path.exists() || !chunks_path.exists() {
            debug!(user_id, "No persisted vector store");
            return Ok(None);
        }

        let blob = self
            .retry
            .run("read index", || async {
                tokio::fs::read(&index_path)
                    .await
                    .map_err(|e| AppError::Storage(format!("reading {:?}: {}", index_path, e)))
            })
            .await?;
        let index = FlatIndex::from_bytes(&blob)?;

        let metadata_json = tokio::fs::read_to_string(&chunks_path)
            .await
            .map_err(|e| AppError::Storage(format!("reading {:?}: {}", chunks_path, e)))?;
        let metadata: StoreMetadata = serde_json::from_str(&metadata_json)
            .map_err(|e| AppError::Storage(format!("parsing {:?}: {}", chunks_path, e)))?;

        if metadata.dimensions != index.dimensions() || metadata.metric != index.metric() {
            return Err(AppError::Storage(format!(
                "artifacts disagree: index is {}-dim {}, metadata says {}-dim {}",
                index.dimensions(),
                index.metric(),
                metadata.dimensions,
                metadata.metric
            )));
        }

        let store = UserVectorStore::from_parts(index, metadata.chunks)?;
        info!(user_id, chunks = store.len(), "Loaded vector store");
        Ok(Some(store))
    }

    /// Persist both artifacts for a user, creating the user's directory
    /// if needed.
    ///
    /// The index blob is written first (with bounded retry against
    /// transient contention), the chunk map second; each goes through a
    /// temp file and an atomic rename. If the process dies between the
    /// two writes the artifacts disagree and the next load treats the
    /// store as absent — stale-but-consistent, never silently mismatched.
    ///
    /// Failures are returned to the caller: a failed save means uploaded
    /// content is not durably searchable.
    pub async fn save(&self, user_id: &str, store: &UserVectorStore) -> Result<()> {
        let user_dir = self.user_dir(user_id)?;
        tokio::fs::create_dir_all(&user_dir)
            .await
            .map_err(|e| AppError::Storage(format!("creating {:?}: {}", user_dir, e)))?;

        let index_path = user_dir.join(INDEX_FILE);
        let blob = store.index().to_bytes()?;
        self.retry
            .run("write index", || write_atomic(index_path.clone(), blob.clone()))
            .await?;

        let metadata = StoreMetadata {
            dimensions: store.dimensions(),
            metric: store.index().metric(),
            chunks: store.chunks().to_vec(),
        };
        let metadata_json = serde_json::to_string(&metadata)
            .map_err(|e| AppError::Storage(format!("serializing chunk map: {}", e)))?;
        write_atomic(user_dir.join(CHUNKS_FILE), metadata_json.into_bytes()).await?;

        info!(user_id, chunks = store.len(), "Saved vector store");
        Ok(())
    }

    /// Resolve the storage directory for a user.
    ///
    /// User ids can be attacker-influenced, so they are confined to a
    /// single path component: ASCII alphanumerics plus `.`, `_`, `-`,
    /// and never `.` or `..`. Anything else is rejected before any
    /// filesystem access.
    fn user_dir(&self, user_id: &str) -> Result<PathBuf> {
        let valid = !user_id.is_empty()
            && user_id != "."
            && user_id != ".."
            && user_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));

        if !valid {
            return Err(AppError::InvalidInput(format!(
                "invalid user id: {:?}",
                user_id
            )));
        }

        Ok(self.root.join(user_id))
    }
}

/// Write `data` to `path` via a temp file and an atomic rename, so a
/// crash mid-write never leaves a half-written artifact behind.
async fn write_atomic(path: PathBuf, data: Vec<u8>) -> Result<()> {
    let tmp_path = path.with_extension("tmp");

    tokio::fs::write(&tmp_path, &data)
        .await
        .map_err(|e| AppError::Storage(format!("writing {:?}: {}", tmp_path, e)))?;
    tokio::fs::rename(&tmp_path, &path)
        .await
        .map_err(|e| AppError::Storage(format!("renaming {:?}: {}", tmp_path, e)))?;

    Ok(())
}
