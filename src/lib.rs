//! # ragchat - per-user retrieval-augmented chat
//!
//! A small RAG service core: users upload text documents, the documents
//! are chunked and embedded into a per-user persistent vector store, and
//! questions are answered by a streaming LLM with the user's most
//! relevant chunks folded into the prompt.
//!
//! The pipeline degrades rather than fails: a user without documents, a
//! damaged store, or a broken embedding backend all result in a plain
//! ungrounded answer, never an error on the query path.
//!
//! ## Library usage
//!
//! ```rust,ignore
//! use ragchat::{
//!     ChatService, Config, DocumentIngestor, InMemoryConversationLog,
//!     OllamaClient, StoreManager, TextChunker,
//! };
//! use futures::StreamExt;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> ragchat::Result<()> {
//!     let config = Config::from_env()?;
//!     let ollama = Arc::new(OllamaClient::from_config(&config.llm));
//!     let stores = StoreManager::from_config(&config.storage);
//!
//!     let ingestor = DocumentIngestor::new(
//!         stores.clone(),
//!         ollama.clone(),
//!         TextChunker::new(config.rag.chunk_size, config.rag.chunk_overlap),
//!     );
//!     ingestor.ingest_files("alice", &["notes.txt".into()]).await?;
//!
//!     let chat = ChatService::new(
//!         stores,
//!         ollama.clone(),
//!         ollama,
//!         Arc::new(InMemoryConversationLog::new()),
//!         config.rag.top_k,
//!     );
//!     let mut answer = chat.answer("alice", "What do my notes say?");
//!     while let Some(fragment) = answer.next().await {
//!         print!("{fragment}");
//!     }
//!     Ok(())
//! }
//! ```

pub mod chat;
pub mod config;
pub mod history;
pub mod llm;
pub mod rag;
pub mod store;
pub mod types;

pub use chat::{AnswerStream, ChatService, QueryPath};
pub use config::Config;
pub use history::{ConversationLog, InMemoryConversationLog};
pub use llm::{EmbeddingProvider, FragmentStream, OllamaClient, TextGenerator};
pub use rag::{DocumentIngestor, IngestReport, TextChunker, ALLOWED_EXTENSIONS};
pub use store::{RetryPolicy, StoreManager, UserVectorStore};
pub use types::{AppError, DocumentChunk, Exchange, Result, RetrievedChunk};
