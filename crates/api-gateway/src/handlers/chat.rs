use actix_web::{web, HttpRequest, HttpResponse};
use billing::BillingGate;
use dispatch::{ChatMessage, PromptAgent};
use futures_util::StreamExt;
use serde::Deserialize;
use uuid::Uuid;

use crate::error_response::ApiError;
use crate::handlers::authenticate;
use crate::models::common::SuccessResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CompletionBody {
    pub tenant_id: Uuid,
    pub conversation_id: Uuid,
    pub agent_id: Uuid,
    pub agent_name: String,
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub stream: bool,
}

/// `POST /v1/chat/completions`: demonstrates C12->C13/C14->C6 dispatch.
/// `stream: true` returns an SSE body; otherwise a single JSON result.
pub async fn completions(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<CompletionBody>,
) -> Result<HttpResponse, ApiError> {
    let profile = authenticate(&req, &state).await?;
    let body = body.into_inner();

    let billing = BillingGate::new(&state.pool, &state.config.billing);
    let agent = PromptAgent::new(
        state.model_provider.clone(),
        state.command_registry.clone(),
        state.memory_store.clone(),
        &billing,
    );

    if body.stream {
        let frames = agent
            .stream(body.conversation_id, body.agent_id, &body.agent_name, body.messages, body.tenant_id)
            .await?;
        let sse_body = dispatch::prompt_agent::into_sse_frames(frames)
            .map(|frame| Ok::<_, std::convert::Infallible>(web::Bytes::from(frame)));
        return Ok(HttpResponse::Ok()
            .content_type("text/event-stream")
            .streaming(sse_body));
    }

    let result = agent
        .complete(
            profile.user.id,
            body.tenant_id,
            body.conversation_id,
            body.agent_id,
            &body.agent_name,
            body.messages,
        )
        .await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(result_to_json(result))))
}

fn result_to_json(result: dispatch::ChatCompletionResult) -> serde_json::Value {
    serde_json::json!({
        "content": result.content,
        "tool_calls": result.tool_calls,
        "finish_reason": result.finish_reason,
        "usage": {
            "prompt_tokens": result.input_tokens,
            "completion_tokens": result.output_tokens,
            "total_tokens": result.input_tokens + result.output_tokens,
        }
    })
}
