use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::error_response::ApiError;
use crate::models::common::SuccessResponse;
use crate::state::AppState;

/// `POST /v1/invitations/{id}/accept`.
pub async fn accept(state: web::Data<AppState>, path: web::Path<Uuid>) -> Result<HttpResponse, ApiError> {
    let invitations = identity::Invitations::new(&state.pool, state.cache.clone());
    let membership = invitations.accept(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(membership)))
}
