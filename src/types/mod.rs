use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============= Document Types =============

/// A bounded span of source text produced by splitting a larger document.
///
/// Chunks from the same source overlap by the configured amount so that
/// context is preserved across chunk boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// The chunk text, at most the configured chunk size in characters.
    pub content: String,
    /// Origin of the chunk, typically the uploaded file name.
    pub source: String,
}

impl DocumentChunk {
    pub fn new(content: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            source: source.into(),
        }
    }
}

// ============= Retrieval Types =============

/// A similarity-search hit resolved back to its chunk text.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedChunk {
    /// The matched chunk.
    pub chunk: DocumentChunk,
    /// Position of the chunk in the user's index.
    pub position: usize,
    /// Similarity score (higher is more similar).
    pub score: f32,
}

// ============= Conversation Types =============

/// One question/answer pair handed to the conversation log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    pub user_id: String,
    pub question: String,
    pub answer: String,
    /// When the question was asked.
    pub asked_at: DateTime<Utc>,
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No extractable content: {0}")]
    NoExtractableContent(String),

    #[error("Vector index error: {0}")]
    VectorIndex(#[from] ragchat_vector::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

pub type Result<T> = std::result::Result<T, AppError>;
