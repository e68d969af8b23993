//! The chat pipeline: retrieval-augmented, streaming, and degradable.
//!
//! Every question gets an answer stream. When the user has indexed
//! documents and retrieval succeeds, the prompt is grounded in the
//! retrieved chunks; any failure along the retrieval path demotes the
//! request to a plain ungrounded prompt instead of failing it. Only
//! when generation itself cannot start does the stream carry a single
//! diagnostic fragment.

use std::pin::Pin;
use std::sync::Arc;

use async_stream::stream;
use futures::{Stream, StreamExt};
use tracing::{debug, error, info, warn};

use crate::history::ConversationLog;
use crate::llm::{EmbeddingProvider, FragmentStream, TextGenerator};
use crate::store::StoreManager;
use crate::types::Result;

/// Fragment emitted when generation cannot start on either path.
pub const GENERATION_UNAVAILABLE: &str =
    "Sorry, I was unable to generate an answer. Please try again.";

/// Fragment appended when the backend fails partway through an answer.
pub const STREAM_INTERRUPTED: &str = "\n[The answer was interrupted by a model error.]";

/// The answer as the caller sees it: plain text fragments, no errors.
pub type AnswerStream = Pin<Box<dyn Stream<Item = String> + Send>>;

/// Which prompt a request ended up using.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryPath {
    /// Prompt grounded in retrieved document chunks.
    Grounded,
    /// Plain prompt, no document context.
    Ungrounded,
}

impl QueryPath {
    fn name(self) -> &'static str {
        match self {
            QueryPath::Grounded => "grounded",
            QueryPath::Ungrounded => "ungrounded",
        }
    }
}

/// Orchestrates retrieval, generation, and history for one deployment.
#[derive(Clone)]
pub struct ChatService {
    stores: StoreManager,
    embedder: Arc<dyn EmbeddingProvider>,
    generator: Arc<dyn TextGenerator>,
    log: Arc<dyn ConversationLog>,
    top_k: usize,
}

impl ChatService {
    pub fn new(
        stores: StoreManager,
        embedder: Arc<dyn EmbeddingProvider>,
        generator: Arc<dyn TextGenerator>,
        log: Arc<dyn ConversationLog>,
        top_k: usize,
    ) -> Self {
        Self {
            stores,
            embedder,
            generator,
            log,
            top_k,
        }
    }

    /// Answer a question as a stream of text fragments.
    ///
    /// The stream always yields at least one fragment. The completed
    /// exchange is recorded in the conversation log after the last
    /// fragment; if the caller drops the stream early, whatever was
    /// streamed so far is recorded best-effort.
    pub fn answer(&self, user_id: &str, question: &str) -> AnswerStream {
        let service = self.clone();
        let user_id = user_id.to_string();
        let question = question.to_string();

        Box::pin(stream! {
            let mut recorder =
                ExchangeRecorder::new(service.log.clone(), &user_id, &question);

            let (mut fragments, path) = match service.open_stream(&user_id, &question).await {
                Ok(opened) => opened,
                Err(error) => {
                    error!(user_id, %error, "Generation unavailable on both paths");
                    let diagnostic = GENERATION_UNAVAILABLE.to_string();
                    recorder.push(&diagnostic);
                    yield diagnostic;
                    recorder.finish().await;
                    return;
                }
            };
            info!(user_id, path = path.name(), "Answer stream opened");

            while let Some(fragment) = fragments.next().await {
                match fragment {
                    Ok(text) => {
                        recorder.push(&text);
                        yield text;
                    }
                    Err(error) => {
                        warn!(user_id, %error, "Generation failed mid-answer");
                        let diagnostic = STREAM_INTERRUPTED.to_string();
                        recorder.push(&diagnostic);
                        yield diagnostic;
                        break;
                    }
                }
            }

            recorder.finish().await;
        })
    }

    /// Open a fragment stream, preferring the grounded path.
    ///
    /// A grounded attempt that fails to start is demoted to the
    /// ungrounded path; `Err` means even the ungrounded prompt could
    /// not start generating.
    async fn open_stream(
        &self,
        user_id: &str,
        question: &str,
    ) -> Result<(FragmentStream, QueryPath)> {
        if let Some(context) = self.retrieve_context(user_id, question).await {
            let prompt = grounded_prompt(&context, question);
            match self.generator.stream(&prompt).await {
                Ok(fragments) => return Ok((fragments, QueryPath::Grounded)),
                Err(error) => {
                    warn!(user_id, %error, "Grounded generation failed to start, falling back");
                }
            }
        }

        let fragments = self.generator.stream(question).await?;
        Ok((fragments, QueryPath::Ungrounded))
    }

    /// Retrieve document context for a question, or `None` if the
    /// request should proceed ungrounded.
    ///
    /// "None" covers the expected case (no store, no hits) and every
    /// retrieval fault (embedding failure, damaged store); faults are
    /// logged but deliberately indistinguishable to the caller.
    async fn retrieve_context(&self, user_id: &str, question: &str) -> Option<String> {
        let store = self.stores.load(user_id).await?;

        let query = match self.embedder.embed(question).await {
            Ok(query) => query,
            Err(error) => {
                warn!(user_id, %error, "Failed to embed question, answering ungrounded");
                return None;
            }
        };

        let hits = store.search(&query, self.top_k);
        if hits.is_empty() {
            debug!(user_id, "No relevant chunks, answering ungrounded");
            return None;
        }

        info!(user_id, hits = hits.len(), "Retrieved document context");
        let context: Vec<&str> = hits.iter().map(|hit| hit.chunk.content.as_str()).collect();
        Some(context.join("\n\n"))
    }
}

fn grounded_prompt(context: &str, question: &str) -> String {
    format!(
        "Based on the following context, please answer the question. \
         If the context doesn't contain relevant information, say so.\n\n\
         Context:\n{context}\n\nQuestion: {question}\n\nAnswer:"
    )
}

/// Accumulates the streamed answer and records the exchange once.
///
/// [`finish`](ExchangeRecorder::finish) records after a complete stream;
/// the `Drop` impl covers a caller that walks away mid-answer, recording
/// whatever was streamed on the current runtime.
struct ExchangeRecorder {
    log: Arc<dyn ConversationLog>,
    user_id: String,
    question: String,
    answer: String,
    finished: bool,
}

impl ExchangeRecorder {
    fn new(log: Arc<dyn ConversationLog>, user_id: &str, question: &str) -> Self {
        Self {
            log,
            user_id: user_id.to_string(),
            question: question.to_string(),
            answer: String::new(),
            finished: false,
        }
    }

    fn push(&mut self, fragment: &str) {
        self.answer.push_str(fragment);
    }

    async fn finish(mut self) {
        self.finished = true;
        if let Err(error) = self
            .log
            .append(&self.user_id, &self.question, &self.answer)
            .await
        {
            // History is best-effort: the user already has the answer.
            error!(user_id = %self.user_id, %error, "Failed to record exchange");
        }
    }
}

impl Drop for ExchangeRecorder {
    fn drop(&mut self) {
        if self.finished || self.answer.is_empty() {
            return;
        }
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let log = self.log.clone();
            let user_id = std::mem::take(&mut self.user_id);
            let question = std::mem::take(&mut self.question);
            let answer = std::mem::take(&mut self.answer);
            handle.spawn(async move {
                if let Err(error) = log.append(&user_id, &question, &answer).await {
                    error!(user_id, %error, "Failed to record abandoned exchange");
                }
            });
        }
    }
}
