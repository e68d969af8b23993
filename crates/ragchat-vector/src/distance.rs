//! Distance metrics for vector similarity.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Distance metric for vector similarity calculations.
///
/// - **Cosine**: measures the angle between vectors, ignoring magnitude.
///   Best for text embeddings, which is what ragchat stores.
/// - **Euclidean**: straight-line (L2) distance, mapped to a similarity
///   in `(0, 1]` so that higher is always more similar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// Cosine similarity. Range: [-1, 1], where 1 means identical direction.
    #[default]
    Cosine,
    /// Euclidean (L2) distance, transformed to `1 / (1 + dist)`.
    Euclidean,
}

impl DistanceMetric {
    /// Compute the similarity score between two vectors.
    ///
    /// Returns a score where **higher is more similar** for both metrics.
    #[inline]
    pub fn similarity(&self, a: &[f32], b: &[f32]) -> f32 {
        debug_assert_eq!(a.len(), b.len(), "Vector dimensions must match");

        match self {
            DistanceMetric::Cosine => cosine_similarity(a, b),
            DistanceMetric::Euclidean => 1.0 / (1.0 + euclidean_distance(a, b)),
        }
    }

    /// Compute the raw distance between two vectors (lower is more similar).
    #[inline]
    pub fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        debug_assert_eq!(a.len(), b.len(), "Vector dimensions must match");

        match self {
            DistanceMetric::Cosine => 1.0 - cosine_similarity(a, b),
            DistanceMetric::Euclidean => euclidean_distance(a, b),
        }
    }

    /// Get the name of this distance metric.
    pub fn name(&self) -> &'static str {
        match self {
            DistanceMetric::Cosine => "cosine",
            DistanceMetric::Euclidean => "euclidean",
        }
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DistanceMetric {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cosine" => Ok(DistanceMetric::Cosine),
            "euclidean" | "l2" => Ok(DistanceMetric::Euclidean),
            other => Err(format!("Unknown distance metric: {}", other)),
        }
    }
}

/// Cosine similarity between two vectors.
///
/// Returns 0.0 for zero-magnitude vectors rather than NaN.
#[inline]
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Euclidean (L2) distance between two vectors.
#[inline]
fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum::<f32>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    #[test]
    fn cosine_identical_vectors() {
        let sim = DistanceMetric::Cosine.similarity(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]);
        assert!((sim - 1.0).abs() < EPS);
    }

    #[test]
    fn cosine_orthogonal_vectors() {
        let sim = DistanceMetric::Cosine.similarity(&[1.0, 0.0], &[0.0, 1.0]);
        assert!(sim.abs() < EPS);
    }

    #[test]
    fn cosine_opposite_vectors() {
        let sim = DistanceMetric::Cosine.similarity(&[1.0, 0.0], &[-1.0, 0.0]);
        assert!((sim + 1.0).abs() < EPS);
    }

    #[test]
    fn cosine_zero_vector_is_zero_not_nan() {
        let sim = DistanceMetric::Cosine.similarity(&[0.0, 0.0], &[1.0, 0.0]);
        assert_eq!(sim, 0.0);
    }

    #[test]
    fn cosine_ignores_magnitude() {
        let sim = DistanceMetric::Cosine.similarity(&[1.0, 1.0], &[10.0, 10.0]);
        assert!((sim - 1.0).abs() < EPS);
    }

    #[test]
    fn euclidean_identical_vectors_score_one() {
        let sim = DistanceMetric::Euclidean.similarity(&[1.0, 2.0], &[1.0, 2.0]);
        assert!((sim - 1.0).abs() < EPS);
    }

    #[test]
    fn euclidean_similarity_decreases_with_distance() {
        let near = DistanceMetric::Euclidean.similarity(&[0.0, 0.0], &[1.0, 0.0]);
        let far = DistanceMetric::Euclidean.similarity(&[0.0, 0.0], &[5.0, 0.0]);
        assert!(near > far);
    }

    #[test]
    fn euclidean_distance_is_l2() {
        let dist = DistanceMetric::Euclidean.distance(&[0.0, 0.0], &[3.0, 4.0]);
        assert!((dist - 5.0).abs() < EPS);
    }

    #[test]
    fn metric_round_trips_through_name() {
        for metric in [DistanceMetric::Cosine, DistanceMetric::Euclidean] {
            let parsed: DistanceMetric = metric.name().parse().unwrap();
            assert_eq!(parsed, metric);
        }
    }

    #[test]
    fn unknown_metric_name_is_rejected() {
        assert!("manhattan".parse::<DistanceMetric>().is_err());
    }
}
