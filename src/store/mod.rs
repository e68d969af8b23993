//! Per-user vector stores and their durable persistence.
//!
//! A [`UserVectorStore`] pairs a similarity index with the chunks that
//! produced it; [`StoreManager`] saves and loads that pair as one atomic
//! logical unit under a per-user directory. Stores are reloaded fresh on
//! every request — there is no in-process cache — which trades some
//! performance for simplicity and crash consistency.

pub mod persistence;
pub mod retry;

pub use persistence::StoreManager;
pub use retry::RetryPolicy;

use ragchat_vector::{DistanceMetric, FlatIndex};
use tracing::debug;

use crate::types::{AppError, DocumentChunk, Result, RetrievedChunk};

/// One user's similarity index together with its index-to-chunk map.
///
/// The map is the position-indexed `chunks` vector: the chunk at
/// position `i` produced the vector at position `i` in the index. That
/// pairing (`index.len() == chunks.len()`) holds across every mutation;
/// stores only ever grow.
#[derive(Debug, Clone)]
pub struct UserVectorStore {
    index: FlatIndex,
    chunks: Vec<DocumentChunk>,
}

impl UserVectorStore {
    /// Build a new store from chunks and their embeddings.
    ///
    /// Dimensionality is taken from the first embedding.
    pub fn from_chunks(
        chunks: Vec<DocumentChunk>,
        embeddings: Vec<Vec<f32>>,
    ) -> Result<Self> {
        let dimensions = embeddings
            .first()
            .map(|e| e.len())
            .ok_or_else(|| AppError::InvalidInput("cannot build a store from zero chunks".into()))?;

        let mut store = Self {
            index: FlatIndex::new(dimensions, DistanceMetric::Cosine),
            chunks: Vec::new(),
        };
        store.append(chunks, embeddings)?;
        Ok(store)
    }

    /// Reassemble a store from persisted artifacts, validating that the
    /// index and the chunk map describe the same chunk set.
    pub(crate) fn from_parts(index: FlatIndex, chunks: Vec<DocumentChunk>) -> Result<Self> {
        if index.len() != chunks.len() {
            return Err(AppError::Storage(format!(
                "index holds {} vectors but chunk map holds {} entries",
                index.len(),
                chunks.len()
            )));
        }
        Ok(Self { index, chunks })
    }

    /// Append chunks and their embeddings, leaving existing positions
    /// untouched.
    ///
    /// Validates the whole batch before mutating so a bad embedding
    /// cannot leave the index and the chunk map out of step.
    pub fn append(
        &mut self,
        chunks: Vec<DocumentChunk>,
        embeddings: Vec<Vec<f32>>,
    ) -> Result<()> {
        if chunks.len() != embeddings.len() {
            return Err(AppError::InvalidInput(format!(
                "{} chunks paired with {} embeddings",
                chunks.len(),
                embeddings.len()
            )));
        }

        let dimensions = self.index.dimensions();
        for embedding in &embeddings {
            if embedding.len() != dimensions {
                return Err(AppError::Embedding(format!(
                    "embedding has {} dimensions, store expects {}",
                    embedding.len(),
                    dimensions
                )));
            }
            if embedding.iter().any(|v| !v.is_finite()) {
                return Err(AppError::Embedding(
                    "embedding contains non-finite values".into(),
                ));
            }
        }

        for (chunk, embedding) in chunks.into_iter().zip(embeddings) {
            // Cannot fail: dimensions and finiteness checked above.
            self.index.push(embedding)?;
            self.chunks.push(chunk);
        }

        debug_assert_eq!(self.index.len(), self.chunks.len());
        Ok(())
    }

    /// Top-k nearest neighbors of `query`, resolved to their chunks and
    /// ordered by similarity rank.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<RetrievedChunk> {
        let hits = self.index.search(query, k);
        debug!(hits = hits.len(), k, "Similarity search");

        hits.into_iter()
            .filter_map(|hit| {
                self.chunks.get(hit.position).map(|chunk| RetrievedChunk {
                    chunk: chunk.clone(),
                    position: hit.position,
                    score: hit.score,
                })
            })
            .collect()
    }

    /// Number of indexed chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Whether the store holds no chunks.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Embedding dimensionality of the store.
    pub fn dimensions(&self) -> usize {
        self.index.dimensions()
    }

    pub(crate) fn index(&self) -> &FlatIndex {
        &self.index
    }

    pub(crate) fn chunks(&self) -> &[DocumentChunk] {
        &self.chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(n: usize) -> DocumentChunk {
        DocumentChunk::new(format!("chunk {}", n), "test.txt")
    }

    #[test]
    fn from_chunks_pairs_every_position() {
        let store = UserVectorStore::from_chunks(
            vec![chunk(0), chunk(1)],
            vec![vec![1.0, 0.0], vec![0.0, 1.0]],
        )
        .unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.dimensions(), 2);
    }

    #[test]
    fn from_chunks_rejects_empty_input() {
        let err = UserVectorStore::from_chunks(vec![], vec![]).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn append_preserves_existing_positions() {
        let mut store = UserVectorStore::from_chunks(
            vec![chunk(0)],
            vec![vec![1.0, 0.0]],
        )
        .unwrap();

        store
            .append(vec![chunk(1)], vec![vec![0.0, 1.0]])
            .unwrap();

        let hits = store.search(&[1.0, 0.0], 2);
        assert_eq!(hits[0].position, 0);
        assert_eq!(hits[0].chunk, chunk(0));
        assert_eq!(hits[1].position, 1);
    }

    #[test]
    fn append_rejects_mismatched_pairing() {
        let mut store =
            UserVectorStore::from_chunks(vec![chunk(0)], vec![vec![1.0, 0.0]]).unwrap();

        let err = store.append(vec![chunk(1), chunk(2)], vec![vec![0.0, 1.0]]).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
        // The failed batch must not have touched the store.
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn append_rejects_wrong_dimensions_without_mutating() {
        let mut store =
            UserVectorStore::from_chunks(vec![chunk(0)], vec![vec![1.0, 0.0]]).unwrap();

        let err = store
            .append(vec![chunk(1), chunk(2)], vec![vec![0.0, 1.0], vec![0.0]])
            .unwrap_err();
        assert!(matches!(err, AppError::Embedding(_)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn search_resolves_hits_in_rank_order() {
        let store = UserVectorStore::from_chunks(
            vec![chunk(0), chunk(1), chunk(2)],
            vec![
                vec![1.0, 0.0, 0.0],
                vec![0.0, 1.0, 0.0],
                vec![0.9, 0.1, 0.0],
            ],
        )
        .unwrap();

        let hits = store.search(&[1.0, 0.0, 0.0], 2);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk, chunk(0));
        assert_eq!(hits[1].chunk, chunk(2));
        assert!(hits[0].score >= hits[1].score);
    }

    #[test]
    fn from_parts_rejects_mismatched_artifacts() {
        let mut index = FlatIndex::new(2, DistanceMetric::Cosine);
        index.push(vec![1.0, 0.0]).unwrap();
        index.push(vec![0.0, 1.0]).unwrap();

        let err = UserVectorStore::from_parts(index, vec![chunk(0)]).unwrap_err();
        assert!(matches!(err, AppError::Storage(_)));
    }
}
