use async_stream::stream;
use async_trait::async_trait;
use futures::StreamExt;
use ollama_rs::{
    Ollama,
    generation::chat::{ChatMessage, request::ChatMessageRequest},
    generation::embeddings::request::{EmbeddingsInput, GenerateEmbeddingsRequest},
};

use crate::config::LlmConfig;
use crate::llm::client::{EmbeddingProvider, FragmentStream, TextGenerator};
use crate::types::{AppError, Result};

/// Ollama-backed implementation of both model capabilities.
///
/// One client serves embeddings and chat generation; the models used for
/// each are configured independently.
pub struct OllamaClient {
    client: Ollama,
    chat_model: String,
    embedding_model: String,
}

impl OllamaClient {
    pub fn new(base_url: &str, chat_model: String, embedding_model: String) -> Self {
        let url_parts: Vec<&str> = base_url.split("://").collect();
        let (host, port) = if url_parts.len() == 2 {
            let host_port: Vec<&str> = url_parts[1].split(':').collect();
            let host = host_port[0].to_string();
            let port = if host_port.len() == 2 {
                host_port[1].parse().unwrap_or(11434)
            } else {
                11434
            };
            (host, port)
        } else {
            ("localhost".to_string(), 11434)
        };

        Self {
            client: Ollama::new(host, port),
            chat_model,
            embedding_model,
        }
    }

    pub fn from_config(config: &LlmConfig) -> Self {
        Self::new(
            &config.ollama_url,
            config.chat_model.clone(),
            config.embedding_model.clone(),
        )
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = GenerateEmbeddingsRequest::new(
            self.embedding_model.clone(),
            EmbeddingsInput::Single(text.to_string()),
        );

        let response = self
            .client
            .generate_embeddings(request)
            .await
            .map_err(|e| AppError::Embedding(format!("Ollama error: {}", e)))?;

        response
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Embedding("Ollama returned no embedding".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = GenerateEmbeddingsRequest::new(
            self.embedding_model.clone(),
            EmbeddingsInput::Multiple(texts.to_vec()),
        );

        let response = self
            .client
            .generate_embeddings(request)
            .await
            .map_err(|e| AppError::Embedding(format!("Ollama error: {}", e)))?;

        if response.embeddings.len() != texts.len() {
            return Err(AppError::Embedding(format!(
                "Ollama returned {} embeddings for {} texts",
                response.embeddings.len(),
                texts.len()
            )));
        }

        Ok(response.embeddings)
    }
}

#[async_trait]
impl TextGenerator for OllamaClient {
    async fn stream(&self, prompt: &str) -> Result<FragmentStream> {
        let messages = vec![ChatMessage::user(prompt.to_string())];
        let request = ChatMessageRequest::new(self.chat_model.clone(), messages);

        let mut stream_response = self
            .client
            .send_chat_messages_stream(request)
            .await
            .map_err(|e| AppError::Generation(format!("Ollama stream error: {}", e)))?;

        // Yield content chunks as the model produces them.
        let output_stream = stream! {
            while let Some(chunk_result) = stream_response.next().await {
                match chunk_result {
                    Ok(chunk) => {
                        let content = chunk.message.content;
                        if !content.is_empty() {
                            yield Ok(content);
                        }
                    }
                    Err(_) => {
                        yield Err(AppError::Generation("Stream chunk error".to_string()));
                        break;
                    }
                }
            }
        };

        Ok(Box::new(Box::pin(output_stream)))
    }

    fn model_name(&self) -> &str {
        &self.chat_model
    }
}
