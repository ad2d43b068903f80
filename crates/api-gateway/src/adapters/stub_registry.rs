use async_trait::async_trait;
use dispatch::{CommandRegistry, CommandSpec};
use shared::error::{Error, Result};
use uuid::Uuid;

/// Empty manifest, every invocation rejected. A real deployment wires
/// `CommandRegistry` to the tenant's installed extensions.
pub struct StubCommandRegistry;

#[async_trait]
impl CommandRegistry for StubCommandRegistry {
    async fn manifest(&self, _tenant_id: Uuid) -> Result<Vec<CommandSpec>> {
        Ok(Vec::new())
    }

    async fn invoke(&self, _tenant_id: Uuid, command_name: &str, _arguments: serde_json::Value) -> Result<String> {
        Err(Error::not_found("Command", command_name.to_string()))
    }
}
