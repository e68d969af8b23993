//! Flat exact-search index over embedding vectors.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::distance::DistanceMetric;
use crate::error::{Error, Result};

/// Current on-disk format version. Bumped whenever [`IndexData`] changes
/// incompatibly; older blobs are rejected rather than misread.
const FORMAT_VERSION: u8 = 1;

/// A search hit: the position of a stored vector and its similarity score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    /// Position of the matched vector in insertion order.
    pub position: usize,
    /// Similarity score (higher is more similar).
    pub score: f32,
}

/// Serializable payload of a [`FlatIndex`].
#[derive(Serialize, Deserialize)]
struct IndexData {
    dimensions: u32,
    metric: DistanceMetric,
    vectors: Vec<Vec<f32>>,
}

/// An ordered, grow-only collection of fixed-dimension vectors with
/// exact top-k similarity search.
///
/// Vectors are addressed by the position [`push`](FlatIndex::push)
/// returned for them; positions never change once assigned.
#[derive(Debug, Clone)]
pub struct FlatIndex {
    dimensions: usize,
    metric: DistanceMetric,
    vectors: Vec<Vec<f32>>,
}

impl FlatIndex {
    /// Create an empty index for vectors of the given dimensionality.
    pub fn new(dimensions: usize, metric: DistanceMetric) -> Self {
        Self {
            dimensions,
            metric,
            vectors: Vec::new(),
        }
    }

    /// Build an index from existing vectors, validating each one.
    pub fn with_vectors(
        dimensions: usize,
        metric: DistanceMetric,
        vectors: Vec<Vec<f32>>,
    ) -> Result<Self> {
        let mut index = Self::new(dimensions, metric);
        for vector in vectors {
            index.push(vector)?;
        }
        Ok(index)
    }

    /// Append a vector, returning its position.
    ///
    /// # Errors
    ///
    /// Rejects vectors whose length does not match the index dimensions
    /// and vectors containing non-finite values.
    pub fn push(&mut self, vector: Vec<f32>) -> Result<usize> {
        if vector.len() != self.dimensions {
            return Err(Error::DimensionMismatch {
                expected: self.dimensions,
                actual: vector.len(),
            });
        }
        if vector.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidVector(
                "vector contains non-finite values".to_string(),
            ));
        }

        self.vectors.push(vector);
        Ok(self.vectors.len() - 1)
    }

    /// Exact top-k search, ranked by similarity descending.
    ///
    /// Ties are broken by position (earlier insertions first) so results
    /// are deterministic. Returns fewer than `k` hits when the index
    /// holds fewer vectors; an empty index yields no hits.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<Hit> {
        if k == 0 || self.vectors.is_empty() || query.len() != self.dimensions {
            return Vec::new();
        }

        let mut hits: Vec<Hit> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(position, vector)| Hit {
                position,
                score: self.metric.similarity(query, vector),
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.position.cmp(&b.position))
        });
        hits.truncate(k);
        hits
    }

    /// Number of stored vectors.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Whether the index holds no vectors.
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Dimensionality of stored vectors.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// The distance metric used for search.
    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// Serialize the index into a single binary blob.
    ///
    /// The blob starts with a format-version byte followed by a
    /// postcard-encoded payload.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let data = IndexData {
            dimensions: self.dimensions as u32,
            metric: self.metric,
            vectors: self.vectors.clone(),
        };

        let payload = postcard::to_allocvec(&data)
            .map_err(|e| Error::CorruptBlob(format!("encode failed: {}", e)))?;

        let mut blob = Vec::with_capacity(payload.len() + 1);
        blob.push(FORMAT_VERSION);
        blob.extend_from_slice(&payload);
        Ok(blob)
    }

    /// Decode an index from a blob produced by [`to_bytes`](FlatIndex::to_bytes).
    ///
    /// # Errors
    ///
    /// Fails with [`Error::UnsupportedVersion`] for unknown version bytes
    /// and [`Error::CorruptBlob`] for truncated or undecodable payloads.
    pub fn from_bytes(blob: &[u8]) -> Result<Self> {
        let (version, payload) = blob
            .split_first()
            .ok_or_else(|| Error::CorruptBlob("empty blob".to_string()))?;

        if *version != FORMAT_VERSION {
            return Err(Error::UnsupportedVersion(*version));
        }

        let data: IndexData = postcard::from_bytes(payload)
            .map_err(|e| Error::CorruptBlob(format!("decode failed: {}", e)))?;

        let dimensions = data.dimensions as usize;
        for vector in &data.vectors {
            if vector.len() != dimensions {
                return Err(Error::CorruptBlob(format!(
                    "stored vector has {} dimensions, index declares {}",
                    vector.len(),
                    dimensions
                )));
            }
        }

        debug!(
            dimensions,
            metric = %data.metric,
            vectors = data.vectors.len(),
            "Decoded index blob"
        );

        Ok(Self {
            dimensions,
            metric: data.metric,
            vectors: data.vectors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn sample_index() -> FlatIndex {
        let mut index = FlatIndex::new(3, DistanceMetric::Cosine);
        index.push(vec![1.0, 0.0, 0.0]).unwrap();
        index.push(vec![0.0, 1.0, 0.0]).unwrap();
        index.push(vec![0.9, 0.1, 0.0]).unwrap();
        index
    }

    #[test]
    fn push_assigns_sequential_positions() {
        let mut index = FlatIndex::new(2, DistanceMetric::Cosine);
        assert_eq!(index.push(vec![1.0, 0.0]).unwrap(), 0);
        assert_eq!(index.push(vec![0.0, 1.0]).unwrap(), 1);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn push_rejects_wrong_dimensions() {
        let mut index = FlatIndex::new(3, DistanceMetric::Cosine);
        let err = index.push(vec![1.0, 0.0]).unwrap_err();
        assert!(matches!(
            err,
            Error::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        ));
    }

    #[test]
    fn push_rejects_nan() {
        let mut index = FlatIndex::new(2, DistanceMetric::Cosine);
        let err = index.push(vec![f32::NAN, 0.0]).unwrap_err();
        assert!(matches!(err, Error::InvalidVector(_)));
    }

    #[test]
    fn search_ranks_by_similarity() {
        let index = sample_index();
        let hits = index.search(&[1.0, 0.0, 0.0], 3);

        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].position, 0);
        assert_eq!(hits[1].position, 2);
        assert_eq!(hits[2].position, 1);
        assert!(hits[0].score >= hits[1].score);
        assert!(hits[1].score >= hits[2].score);
    }

    #[test]
    fn search_truncates_to_k() {
        let index = sample_index();
        assert_eq!(index.search(&[1.0, 0.0, 0.0], 2).len(), 2);
    }

    #[test]
    fn search_empty_index_yields_no_hits() {
        let index = FlatIndex::new(3, DistanceMetric::Cosine);
        assert!(index.search(&[1.0, 0.0, 0.0], 5).is_empty());
    }

    #[test]
    fn search_with_mismatched_query_yields_no_hits() {
        let index = sample_index();
        assert!(index.search(&[1.0, 0.0], 3).is_empty());
    }

    #[test]
    fn search_tie_break_is_by_position() {
        let mut index = FlatIndex::new(2, DistanceMetric::Cosine);
        // Two identical vectors: same score, earlier position wins.
        index.push(vec![1.0, 0.0]).unwrap();
        index.push(vec![1.0, 0.0]).unwrap();

        let hits = index.search(&[1.0, 0.0], 2);
        assert_eq!(hits[0].position, 0);
        assert_eq!(hits[1].position, 1);
    }

    #[test]
    fn blob_round_trip_preserves_everything() {
        let mut rng = rand::rng();
        let mut index = FlatIndex::new(8, DistanceMetric::Euclidean);
        for _ in 0..32 {
            let vector: Vec<f32> = (0..8).map(|_| rng.random_range(-1.0..1.0)).collect();
            index.push(vector).unwrap();
        }

        let blob = index.to_bytes().unwrap();
        let restored = FlatIndex::from_bytes(&blob).unwrap();

        assert_eq!(restored.len(), index.len());
        assert_eq!(restored.dimensions(), 8);
        assert_eq!(restored.metric(), DistanceMetric::Euclidean);
        assert_eq!(restored.vectors, index.vectors);
    }

    #[test]
    fn from_bytes_rejects_empty_blob() {
        assert!(matches!(
            FlatIndex::from_bytes(&[]),
            Err(Error::CorruptBlob(_))
        ));
    }

    #[test]
    fn from_bytes_rejects_unknown_version() {
        let mut blob = sample_index().to_bytes().unwrap();
        blob[0] = 99;
        assert!(matches!(
            FlatIndex::from_bytes(&blob),
            Err(Error::UnsupportedVersion(99))
        ));
    }

    #[test]
    fn from_bytes_rejects_truncated_payload() {
        let blob = sample_index().to_bytes().unwrap();
        let truncated = &blob[..blob.len() / 2];
        assert!(FlatIndex::from_bytes(truncated).is_err());
    }
}
