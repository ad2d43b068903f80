//! Pure-logic coverage for the SSE framing and message-content helpers that
//! sit underneath `PromptAgent`. The context-assembly/tool-call loop needs
//! a live `ModelProvider`/`CommandRegistry`/`MemoryStore` and a database
//! pool for billing and is exercised by the crate's own `#[cfg(test)]`
//! modules rather than here.

use dispatch::model_provider::{ChatChunk, ContentPart, FileUrlPart, MessageContent, ToolCall};
use dispatch::prompt_agent::into_sse_frames;
use futures_util::stream::{self, StreamExt};
use shared::error::Error;

fn chunk(delta: &str) -> ChatChunk {
    ChatChunk {
        delta_content: Some(delta.to_string()),
        tool_calls: Vec::new(),
        finish_reason: None,
    }
}

#[tokio::test]
async fn frames_are_data_prefixed_and_dot_terminated() {
    let chunks: Vec<shared::error::Result<ChatChunk>> = vec![Ok(chunk("hel")), Ok(chunk("lo"))];
    let frames: Vec<String> = into_sse_frames(Box::pin(stream::iter(chunks))).collect().await;

    assert_eq!(frames.len(), 3);
    assert!(frames[0].starts_with("data: "));
    assert!(frames[0].ends_with("\n\n"));
    assert!(frames[0].contains("hel"));
    assert!(frames[1].contains("lo"));
    assert_eq!(frames[2], "data: [DONE]\n\n");
}

#[tokio::test]
async fn mid_stream_error_becomes_synthetic_error_chunk_and_stream_still_terminates() {
    let chunks: Vec<shared::error::Result<ChatChunk>> =
        vec![Ok(chunk("partial")), Err(Error::internal("provider disconnected"))];
    let frames: Vec<String> = into_sse_frames(Box::pin(stream::iter(chunks))).collect().await;

    assert_eq!(frames.len(), 3);
    assert!(frames[1].contains("[Error: provider disconnected]"));
    assert_eq!(frames[2], "data: [DONE]\n\n");
}

#[tokio::test]
async fn empty_stream_still_emits_done() {
    let chunks: Vec<shared::error::Result<ChatChunk>> = Vec::new();
    let frames: Vec<String> = into_sse_frames(Box::pin(stream::iter(chunks))).collect().await;

    assert_eq!(frames, vec!["data: [DONE]\n\n".to_string()]);
}

#[test]
fn message_content_as_text_joins_parts_and_skips_file_urls() {
    let content = MessageContent::Parts(vec![
        ContentPart::Text { text: "look at this".to_string() },
        ContentPart::FileUrl { file_url: FileUrlPart { url: "https://example.com/a.png".to_string() } },
        ContentPart::Text { text: "file".to_string() },
    ]);

    assert_eq!(content.as_text(), "look at this file");
    assert_eq!(content.file_urls(), vec!["https://example.com/a.png".to_string()]);
}

#[test]
fn message_content_text_variant_has_no_file_urls() {
    let content = MessageContent::Text("plain message".to_string());
    assert_eq!(content.as_text(), "plain message");
    assert!(content.file_urls().is_empty());
}

#[test]
fn tool_call_round_trips_through_json() {
    let call = ToolCall {
        id: "call_1".to_string(),
        name: "search_web".to_string(),
        arguments: serde_json::json!({ "query": "rust async streams" }),
    };
    let encoded = serde_json::to_string(&call).unwrap();
    let decoded: ToolCall = serde_json::from_str(&encoded).unwrap();
    assert_eq!(decoded.id, call.id);
    assert_eq!(decoded.name, call.name);
    assert_eq!(decoded.arguments, call.arguments);
}
