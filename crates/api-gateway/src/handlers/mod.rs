pub mod chat;
pub mod health;
pub mod invitations;
pub mod magic_link;
pub mod pats;
pub mod user;

use actix_web::HttpRequest;
use identity::{AuthSession, UserProfile};
use shared::error::Error;

use crate::error_response::ApiError;
use crate::state::AppState;

/// `Authorization: Bearer <token>` header, falling back to a `token` cookie
/// (mirrors the teacher's `extract_token` in `handlers/auth.rs`).
pub fn extract_token(req: &HttpRequest) -> Option<String> {
    if let Some(header) = req.headers().get("Authorization").and_then(|h| h.to_str().ok()) {
        return Some(header.strip_prefix("Bearer ").unwrap_or(header).trim().to_string());
    }
    req.cookie("token").map(|c| c.value().to_string())
}

/// Resolve the caller's `UserProfile` from the request's bearer credential.
pub async fn authenticate(req: &HttpRequest, state: &AppState) -> Result<UserProfile, ApiError> {
    let token = extract_token(req).ok_or_else(|| Error::unauthenticated("missing bearer token"))?;
    let credential = identity::auth_session::parse_bearer(&token, &state.config.server.master_key);
    let session = AuthSession::new(&state.pool, state.cache.clone(), &state.config.server, &state.config.billing);
    Ok(session.resolve(credential).await?)
}
