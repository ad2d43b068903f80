use actix_web::{web, HttpRequest, HttpResponse};

use crate::error_response::ApiError;
use crate::handlers::authenticate;
use crate::models::common::SuccessResponse;
use crate::state::AppState;

/// `GET /v1/user`: the consolidated profile for the caller's bearer
/// credential (memberships, per-tenant scopes/agents, paywall status).
pub async fn get_user(req: HttpRequest, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let profile = authenticate(&req, &state).await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(profile)))
}
