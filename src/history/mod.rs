//! Conversation history.
//!
//! Recording an exchange is best-effort by design: the chat pipeline
//! calls [`ConversationLog::append`] after the answer has streamed, and
//! a logging failure must never disturb the answer the user already
//! received.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::sync::Arc;

use crate::types::{Exchange, Result};

/// Sink for completed question/answer exchanges.
#[async_trait]
pub trait ConversationLog: Send + Sync {
    /// Record one completed exchange for a user.
    async fn append(&self, user_id: &str, question: &str, answer: &str) -> Result<()>;
}

/// In-process conversation log backed by a shared vector.
#[derive(Debug, Default, Clone)]
pub struct InMemoryConversationLog {
    exchanges: Arc<RwLock<Vec<Exchange>>>,
}

impl InMemoryConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every recorded exchange, oldest first.
    pub fn exchanges(&self) -> Vec<Exchange> {
        self.exchanges.read().clone()
    }

    /// Snapshot of one user's exchanges, oldest first.
    pub fn exchanges_for(&self, user_id: &str) -> Vec<Exchange> {
        self.exchanges
            .read()
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ConversationLog for InMemoryConversationLog {
    async fn append(&self, user_id: &str, question: &str, answer: &str) -> Result<()> {
        self.exchanges.write().push(Exchange {
            user_id: user_id.to_string(),
            question: question.to_string(),
            answer: answer.to_string(),
            asked_at: Utc::now(),
        });
        Ok(())
    }
}
