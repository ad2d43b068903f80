use actix_web::{web, HttpResponse};
use identity::MagicLink;
use serde::{Deserialize, Serialize};
use shared::error::Error;
use shared::models::User;
use validator::Validate;

use crate::adapters::LoggingNotifier;
use crate::error_response::ApiError;
use crate::models::common::SuccessResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct RequestBody {
    #[validate(email)]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyBody {
    #[validate(email)]
    pub email: String,
    pub otp: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub user: User,
    pub token: String,
    pub signed_url: String,
}

/// `POST /v1/auth/magic-link`: always `200`, known email or not.
pub async fn request(state: web::Data<AppState>, body: web::Json<RequestBody>) -> Result<HttpResponse, ApiError> {
    body.validate().map_err(|e| Error::validation(e.to_string()))?;
    let magic_link = MagicLink::new(
        &state.pool,
        state.cache.clone(),
        &state.config.server,
        std::sync::Arc::new(LoggingNotifier),
    );
    magic_link.request(&body.email).await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(())))
}

/// `POST /v1/auth/magic-link/verify`: OTP check, returns a signed JWT.
pub async fn verify(state: web::Data<AppState>, body: web::Json<VerifyBody>) -> Result<HttpResponse, ApiError> {
    body.validate().map_err(|e| Error::validation(e.to_string()))?;
    let magic_link = MagicLink::new(
        &state.pool,
        state.cache.clone(),
        &state.config.server,
        std::sync::Arc::new(LoggingNotifier),
    );
    let verified = magic_link.verify(&body.email, &body.otp).await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::new(VerifyResponse {
        user: verified.user,
        token: verified.token,
        signed_url: verified.signed_url,
    })))
}
