//! Model capability traits.

use async_trait::async_trait;
use futures::Stream;

use crate::types::Result;

/// A lazy sequence of answer fragments from a generator.
///
/// Items are `Result` so a backend can fail mid-stream; the orchestrator
/// turns such failures into an inline diagnostic fragment rather than an
/// error surfaced to the caller.
pub type FragmentStream = Box<dyn Stream<Item = Result<String>> + Send + Unpin>;

/// Converts text to fixed-dimension embedding vectors.
///
/// Implementations must be deterministic for a given model version:
/// the same text always embeds to the same vector.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text span.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a batch of texts, preserving order.
    ///
    /// The default implementation embeds one text at a time; providers
    /// with a batch endpoint should override it.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text).await?);
        }
        Ok(embeddings)
    }
}

/// Produces a lazy stream of text fragments for a prompt.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Start generating for `prompt`.
    ///
    /// An `Err` here means generation could not start at all; errors
    /// *within* the returned stream mean the backend failed mid-answer.
    async fn stream(&self, prompt: &str) -> Result<FragmentStream>;

    /// The model identifier, for logging.
    fn model_name(&self) -> &str;
}
