//! Tool-call invocation capability (C14 dependency). Commands are the
//! `ext:*`-scoped actions exposed to the model as `{COMMANDS}`/
//! `{command_list}` in prompt args and as the OpenAI `tools` array
//! (spec.md §4.13, §4.14). Concrete command execution (extension code,
//! shell, browser automation) lives outside this crate per spec.md §1.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared::error::Result;
use uuid::Uuid;

/// One entry of a tenant's available commands, as advertised to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandSpec {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

#[async_trait]
pub trait CommandRegistry: Send + Sync {
    /// The commands reachable for `tenant_id`, used both to build
    /// `{COMMANDS}`/`{command_list}` prompt substitutions and the `tools`
    /// array passed to `ModelProvider`.
    async fn manifest(&self, tenant_id: Uuid) -> Result<Vec<CommandSpec>>;

    /// Runs a single tool call the model emitted; the textual result is
    /// appended to the transcript as a `tool` role message (spec.md §4.14
    /// step 3).
    async fn invoke(&self, tenant_id: Uuid, command_name: &str, arguments: serde_json::Value) -> Result<String>;
}
