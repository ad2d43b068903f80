use async_trait::async_trait;
use dispatch::MemoryStore;
use shared::error::Result;
use uuid::Uuid;

/// Always reports no memories/prior results. A real deployment wires
/// `MemoryStore` to an embedding/retrieval backend.
pub struct StubMemoryStore;

#[async_trait]
impl MemoryStore for StubMemoryStore {
    async fn injected_memories(&self, _agent_id: Uuid, _user_message: &str) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    async fn conversation_results(&self, _conversation_id: Uuid) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}
