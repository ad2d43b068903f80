//! Memory-injection capability (C14 dependency). Embedding/retrieval of
//! `injected_memories` and `conversation_results` happens outside this
//! crate per spec.md §1; PromptAgent only needs the assembled text.

use async_trait::async_trait;
use shared::error::Result;
use uuid::Uuid;

#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Long-term memories relevant to `user_message`, rendered as
    /// ready-to-inject context text (spec.md §4.14 step 1).
    async fn injected_memories(&self, agent_id: Uuid, user_message: &str) -> Result<Vec<String>>;

    /// Prior results from this conversation worth recalling for the
    /// current turn.
    async fn conversation_results(&self, conversation_id: Uuid) -> Result<Vec<String>>;
}
