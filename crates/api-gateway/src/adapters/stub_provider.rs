use async_trait::async_trait;
use dispatch::{ChatChunk, ChatCompletionResult, ChatRequest, ModelProvider};
use futures_util::stream::{self, BoxStream};
use shared::error::Result;

/// Echoes the last user message back as the completion, with a token count
/// derived from word count. A real deployment wires `ModelProvider` to an
/// inference backend (OpenAI-compatible, local model, etc).
pub struct StubModelProvider;

fn echo(request: &ChatRequest) -> String {
    request
        .messages
        .last()
        .map(|m| m.content.as_text())
        .unwrap_or_default()
}

#[async_trait]
impl ModelProvider for StubModelProvider {
    async fn chat(&self, request: ChatRequest) -> Result<ChatCompletionResult> {
        let content = echo(&request);
        let tokens = content.split_whitespace().count().max(1) as i64;
        Ok(ChatCompletionResult {
            content: Some(content),
            tool_calls: Vec::new(),
            finish_reason: "stop".to_string(),
            input_tokens: tokens,
            output_tokens: tokens,
        })
    }

    async fn chat_stream(&self, request: ChatRequest) -> Result<BoxStream<'static, Result<ChatChunk>>> {
        let content = echo(&request);
        let chunk = ChatChunk {
            delta_content: Some(content),
            tool_calls: Vec::new(),
            finish_reason: Some("stop".to_string()),
        };
        Ok(Box::pin(stream::iter(vec![Ok(chunk)])))
    }
}
