//! # ragchat-vector
//!
//! A small, pure-Rust similarity index for the ragchat service.
//!
//! The index is a flat, ordered collection of fixed-dimension embedding
//! vectors addressed by integer position. Search is an exact scan over
//! all stored vectors, ranked by cosine or Euclidean similarity. For the
//! per-user corpus sizes ragchat deals with (hundreds to low thousands
//! of chunks) an exact scan is both simpler and faster to load than an
//! approximate graph structure, and it serializes to a single compact
//! binary blob.
//!
//! ## Example
//!
//! ```
//! use ragchat_vector::{DistanceMetric, FlatIndex};
//!
//! let mut index = FlatIndex::new(3, DistanceMetric::Cosine);
//! index.push(vec![1.0, 0.0, 0.0]).unwrap();
//! index.push(vec![0.0, 1.0, 0.0]).unwrap();
//!
//! let hits = index.search(&[0.9, 0.1, 0.0], 1);
//! assert_eq!(hits[0].position, 0);
//!
//! // Round-trip through the on-disk format.
//! let blob = index.to_bytes().unwrap();
//! let restored = FlatIndex::from_bytes(&blob).unwrap();
//! assert_eq!(restored.len(), 2);
//! ```

#![warn(missing_docs)]

mod distance;
mod error;
mod index;

pub use distance::DistanceMetric;
pub use error::{Error, Result};
pub use index::{FlatIndex, Hit};
