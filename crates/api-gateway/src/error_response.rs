//! Maps `shared::error::Error` onto HTTP responses. A local newtype works
//! around the orphan rule (`ResponseError` is foreign, `Error` is foreign).

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use shared::error::Error;
use std::fmt;

use crate::models::common::ErrorResponse;

pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl fmt::Debug for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match &self.0 {
            Error::Validation(_) | Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Error::Forbidden { .. } => StatusCode::FORBIDDEN,
            Error::PaymentRequired { .. } => StatusCode::PAYMENT_REQUIRED,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Conflict(_) => StatusCode::CONFLICT,
            Error::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            Error::Database(_) | Error::Cache(_) | Error::Config(_) | Error::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let Error::PaymentRequired {
            wallet_address,
            price_per_million_usd,
        } = &self.0
        {
            return HttpResponse::build(self.status_code()).json(json!({
                "error": "payment_required",
                "message": self.0.to_string(),
                "wallet_address": wallet_address,
                "price_per_million_usd": price_per_million_usd,
            }));
        }

        HttpResponse::build(self.status_code())
            .json(ErrorResponse::new(self.0.kind(), self.0.to_string()))
    }
}
