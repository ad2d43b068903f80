use actix_web::{web, HttpRequest, HttpResponse};
use identity::PatManager;
use identity::pat_manager::{CreatePatRequest, ExpirationSpec};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error_response::ApiError;
use crate::handlers::authenticate;
use crate::models::common::SuccessResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateBody {
    pub tenant_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub agent_ids: Vec<Uuid>,
    #[serde(default)]
    pub tenant_ids: Vec<Uuid>,
    #[serde(default = "default_expiration")]
    pub expires: String,
}

fn default_expiration() -> String {
    "never".to_string()
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub id: Uuid,
    pub token: String,
}

/// `GET /v1/pats`: the caller's own PATs (across all tenants).
pub async fn list(req: HttpRequest, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let profile = authenticate(&req, &state).await?;
    let manager = PatManager::new(&state.pool, &state.config.server, state.cache.clone());
    let pats = manager.list(profile.user.id).await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(pats)))
}

/// `POST /v1/pats`.
pub async fn create(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<CreateBody>,
) -> Result<HttpResponse, ApiError> {
    let profile = authenticate(&req, &state).await?;
    let manager = PatManager::new(&state.pool, &state.config.server, state.cache.clone());
    let created = manager
        .create(CreatePatRequest {
            creator_user_id: profile.user.id,
            creator_tenant_id: body.tenant_id,
            name: body.name.clone(),
            scopes: body.scopes.clone(),
            agent_ids: body.agent_ids.clone(),
            tenant_ids: body.tenant_ids.clone(),
            expires: ExpirationSpec::parse(&body.expires)?,
        })
        .await?;
    Ok(HttpResponse::Created().json(SuccessResponse::new(CreatedResponse {
        id: created.record.id,
        token: created.token,
    })))
}

/// `DELETE /v1/pats/{id}`.
pub async fn revoke(state: web::Data<AppState>, path: web::Path<Uuid>) -> Result<HttpResponse, ApiError> {
    let manager = PatManager::new(&state.pool, &state.config.server, state.cache.clone());
    let revoked = manager.revoke(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(revoked)))
}
