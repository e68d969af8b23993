//! Capability interfaces for the models the service consumes.
//!
//! The service never talks to a concrete model directly: ingestion and
//! the chat orchestrator depend on [`EmbeddingProvider`] and
//! [`TextGenerator`], which makes every model swappable (including with
//! test doubles). [`ollama::OllamaClient`] is the bundled implementation
//! of both, backed by a local Ollama server.

pub mod client;
pub mod ollama;

pub use client::{EmbeddingProvider, FragmentStream, TextGenerator};
pub use ollama::OllamaClient;
