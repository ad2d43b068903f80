//! One conversational turn: context assembly, `ModelProvider` dispatch,
//! tool-call loop, billing debit, chat-completion-shaped result (C14).
//!
//! Grounded the same way as `chain_executor`: a thin struct over its
//! collaborators, `tracing`-instrumented, result bounded by a retry/attempt
//! limit the way the teacher's `RestWorker` bounds retries via
//! `RetryPolicy` — here the bound is `MAX_TOOL_ITERATIONS` rather than a
//! backoff policy, since a tool-call loop terminates on "no more tool
//! calls" rather than on success/failure.

use std::sync::Arc;

use billing::BillingGate;
use futures_util::stream::{self, BoxStream, StreamExt};
use shared::error::Result;
use uuid::Uuid;

use crate::command_registry::CommandRegistry;
use crate::memory_store::MemoryStore;
use crate::model_provider::{ChatChunk, ChatCompletionResult, ChatMessage, ChatRequest, MessageContent, ModelProvider};

/// Bound on the tool-call loop (spec.md §4.14 step 3).
pub const MAX_TOOL_ITERATIONS: u8 = 8;

pub struct PromptAgent<'a> {
    provider: Arc<dyn ModelProvider>,
    commands: Arc<dyn CommandRegistry>,
    memory: Arc<dyn MemoryStore>,
    billing: &'a BillingGate<'a>,
}

impl<'a> PromptAgent<'a> {
    pub fn new(
        provider: Arc<dyn ModelProvider>,
        commands: Arc<dyn CommandRegistry>,
        memory: Arc<dyn MemoryStore>,
        billing: &'a BillingGate<'a>,
    ) -> Self {
        Self { provider, commands, memory, billing }
    }

    /// Non-streaming turn. Runs the full context-assembly + tool-call loop
    /// and debits usage on completion.
    pub async fn complete(
        &self,
        user_id: Uuid,
        tenant_id: Uuid,
        conversation_id: Uuid,
        agent_id: Uuid,
        agent_name: &str,
        mut messages: Vec<ChatMessage>,
    ) -> Result<ChatCompletionResult> {
        self.assemble_context(agent_id, conversation_id, &mut messages).await?;
        let tools = self.command_manifest(tenant_id).await?;

        let mut total_input = 0i64;
        let mut total_output = 0i64;
        let mut last = None;

        for _ in 0..MAX_TOOL_ITERATIONS {
            let request = ChatRequest {
                agent_name: agent_name.to_string(),
                messages: messages.clone(),
                tools: tools.clone(),
                stream: false,
            };
            let result = self.provider.chat(request).await?;
            total_input += result.input_tokens;
            total_output += result.output_tokens;

            if result.tool_calls.is_empty() {
                last = Some(result);
                break;
            }

            if let Some(content) = &result.content {
                messages.push(assistant_message(content.clone()));
            }

            for call in &result.tool_calls {
                let output = self.commands.invoke(tenant_id, &call.name, call.arguments.clone()).await?;
                messages.push(tool_message(call.id.clone(), output));
            }

            last = Some(result);
        }

        self.billing.debit(user_id, tenant_id, total_input, total_output).await?;

        let mut result = last.unwrap_or(ChatCompletionResult {
            content: None,
            tool_calls: Vec::new(),
            finish_reason: "stop".to_string(),
            input_tokens: total_input,
            output_tokens: total_output,
        });
        result.input_tokens = total_input;
        result.output_tokens = total_output;
        Ok(result)
    }

    /// Streaming turn. The returned stream re-emits provider chunks
    /// verbatim; tool-call iterations within a stream are not supported by
    /// this capability surface (spec.md §4.14 step 3 applies to the
    /// non-streaming loop) — a model that emits tool calls while streaming
    /// ends the stream after the current chunk and the caller should fall
    /// back to `complete`.
    pub async fn stream(
        &self,
        conversation_id: Uuid,
        agent_id: Uuid,
        agent_name: &str,
        mut messages: Vec<ChatMessage>,
        tenant_id: Uuid,
    ) -> Result<BoxStream<'static, Result<ChatChunk>>> {
        self.assemble_context(agent_id, conversation_id, &mut messages).await?;
        let tools = self.command_manifest(tenant_id).await?;

        let request = ChatRequest {
            agent_name: agent_name.to_string(),
            messages,
            tools,
            stream: true,
        };
        self.provider.chat_stream(request).await
    }

    async fn assemble_context(&self, agent_id: Uuid, conversation_id: Uuid, messages: &mut [ChatMessage]) -> Result<()> {
        let Some(last_user_idx) = messages.iter().rposition(|m| m.role.eq_ignore_ascii_case("user")) else {
            return Ok(());
        };
        let user_text = messages[last_user_idx].content.as_text();

        let memories = self.memory.injected_memories(agent_id, &user_text).await?;
        let prior_results = self.memory.conversation_results(conversation_id).await?;

        if memories.is_empty() && prior_results.is_empty() {
            return Ok(());
        }

        let mut context = String::new();
        if !memories.is_empty() {
            context.push_str("Relevant memories:\n");
            context.push_str(&memories.join("\n"));
            context.push('\n');
        }
        if !prior_results.is_empty() {
            context.push_str("Prior results in this conversation:\n");
            context.push_str(&prior_results.join("\n"));
        }

        messages.insert(
            last_user_idx,
            ChatMessage {
                role: "system".to_string(),
                content: MessageContent::Text(context),
                tool_call_id: None,
                name: None,
            },
        );
        Ok(())
    }

    async fn command_manifest(&self, tenant_id: Uuid) -> Result<Vec<serde_json::Value>> {
        let specs = self.commands.manifest(tenant_id).await?;
        Ok(specs
            .into_iter()
            .map(|s| {
                serde_json::json!({
                    "type": "function",
                    "function": {
                        "name": s.name,
                        "description": s.description,
                        "parameters": s.parameters,
                    }
                })
            })
            .collect())
    }
}

fn assistant_message(content: String) -> ChatMessage {
    ChatMessage {
        role: "assistant".to_string(),
        content: MessageContent::Text(content),
        tool_call_id: None,
        name: None,
    }
}

fn tool_message(tool_call_id: String, content: String) -> ChatMessage {
    ChatMessage {
        role: "tool".to_string(),
        content: MessageContent::Text(content),
        tool_call_id: Some(tool_call_id),
        name: None,
    }
}

/// Wraps `synthetic_chunks` into `data: <json>\n\n` SSE frames terminated
/// by `data: [DONE]\n\n`, converting a mid-stream error into the single
/// synthetic error chunk spec.md §6 mandates rather than aborting the
/// stream raw.
pub fn into_sse_frames(chunks: BoxStream<'static, Result<ChatChunk>>) -> BoxStream<'static, String> {
    let terminated = chunks.flat_map(|item| {
        let frame = match item {
            Ok(chunk) => serde_json::to_string(&chunk).unwrap_or_else(|_| "{}".to_string()),
            Err(e) => {
                tracing::error!(error = %e, "error mid-stream");
                serde_json::json!({
                    "choices": [{
                        "index": 0,
                        "delta": { "content": format!("[Error: {e}]") },
                        "finish_reason": "stop"
                    }]
                })
                .to_string()
            }
        };
        stream::iter(vec![format!("data: {frame}\n\n")])
    });
    Box::pin(terminated.chain(stream::iter(vec!["data: [DONE]\n\n".to_string()])))
}
