//! Chat/vision/speech dispatch capability (C14 dependency). PromptAgent
//! depends only on this trait, mirroring the teacher's `McpClient` seam in
//! `action-workers/src/mcp.rs`; a concrete provider (OpenAI, Anthropic,
//! local model) plugs in behind it and is out of scope here per spec.md §1.

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use serde::{Deserialize, Serialize};
use shared::error::Result;

/// A single message in an OpenAI-compatible chat transcript. `content` may
/// be a plain string or a list of parts (text + file/image references).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: MessageContent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl MessageContent {
    /// Concatenates the text of every part; used for `@mention` scanning
    /// (C12) and `{STEPk}` substitution text extraction (C13), neither of
    /// which care about attached files.
    pub fn as_text(&self) -> String {
        match self {
            MessageContent::Text(s) => s.clone(),
            MessageContent::Parts(parts) => parts
                .iter()
                .filter_map(|p| match p {
                    ContentPart::Text { text } => Some(text.as_str()),
                    ContentPart::FileUrl { .. } => None,
                })
                .collect::<Vec<_>>()
                .join(" "),
        }
    }

    /// Every `file_url` part, for PromptAgent's context-assembly step.
    pub fn file_urls(&self) -> Vec<String> {
        match self {
            MessageContent::Text(_) => Vec::new(),
            MessageContent::Parts(parts) => parts
                .iter()
                .filter_map(|p| match p {
                    ContentPart::FileUrl { file_url } => Some(file_url.url.clone()),
                    ContentPart::Text { .. } => None,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    FileUrl { file_url: FileUrlPart },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileUrlPart {
    pub url: String,
}

/// A tool invocation the model requested in place of (or alongside) text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

/// What a provider is asked to do for one turn. `tools` is the
/// `CommandRegistry` manifest (C14 step 1); a provider that does not
/// support tool calling may ignore it.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub agent_name: String,
    pub messages: Vec<ChatMessage>,
    pub tools: Vec<serde_json::Value>,
    pub stream: bool,
}

/// Non-streaming result, shaped for direct embedding into an
/// OpenAI-compatible `chat.completion` response (spec.md §4.14 step 5).
#[derive(Debug, Clone)]
pub struct ChatCompletionResult {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCall>,
    pub finish_reason: String,
    pub input_tokens: i64,
    pub output_tokens: i64,
}

/// One `chat.completion.chunk` delta (spec.md §6 streaming envelope).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatChunk {
    pub delta_content: Option<String>,
    pub tool_calls: Vec<ToolCall>,
    pub finish_reason: Option<String>,
}

#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Blocking chat dispatch; used for non-streaming requests and for each
    /// inner call of the ChainExecutor's Prompt-type steps that aren't the
    /// innermost streamed one.
    async fn chat(&self, request: ChatRequest) -> Result<ChatCompletionResult>;

    /// Token-level streaming dispatch. PromptAgent re-emits the yielded
    /// chunks as `data: <json>\n\n` SSE frames; ChainExecutor surfaces only
    /// the innermost `Prompt` step's stream (spec.md §4.13).
    async fn chat_stream(&self, request: ChatRequest) -> Result<BoxStream<'static, Result<ChatChunk>>>;
}
