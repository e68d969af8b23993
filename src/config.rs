use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::types::{AppError, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub storage: StorageConfig,
    pub llm: LlmConfig,
    pub rag: RagOptions,
}

/// Where per-user vector stores live and how stubbornly we talk to disk.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Root directory holding one subdirectory per user.
    pub vector_root: PathBuf,
    /// Attempts for index reads/writes before giving up.
    pub retry_max_attempts: u32,
    /// Fixed backoff between attempts.
    pub retry_backoff_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub ollama_url: String,
    pub chat_model: String,
    pub embedding_model: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RagOptions {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            vector_root: PathBuf::from("vectorstores"),
            retry_max_attempts: 3,
            retry_backoff_ms: 1000,
        }
    }
}

impl Default for RagOptions {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            top_k: 3,
        }
    }
}

impl StorageConfig {
    /// Backoff between retry attempts as a [`Duration`].
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Config {
            storage: StorageConfig {
                vector_root: env::var("VECTORSTORE_ROOT")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("vectorstores")),
                retry_max_attempts: parse_env("STORE_RETRY_ATTEMPTS", 3)?,
                retry_backoff_ms: parse_env("STORE_RETRY_BACKOFF_MS", 1000)?,
            },
            llm: LlmConfig {
                ollama_url: env::var("OLLAMA_URL")
                    .unwrap_or_else(|_| "http://localhost:11434".to_string()),
                chat_model: env::var("CHAT_MODEL").unwrap_or_else(|_| "llama3.2".to_string()),
                embedding_model: env::var("EMBEDDING_MODEL")
                    .unwrap_or_else(|_| "all-minilm".to_string()),
            },
            rag: RagOptions {
                chunk_size: parse_env("CHUNK_SIZE", 1000)?,
                chunk_overlap: parse_env("CHUNK_OVERLAP", 200)?,
                top_k: parse_env("TOP_K", 3)?,
            },
        })
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| AppError::Configuration(format!("{} has an invalid value: {}", key, raw))),
        Err(_) => Ok(default),
    }
}
