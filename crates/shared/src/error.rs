//! Error types shared across the orchestration substrate
//!
//! The variants here are the transport-agnostic error kinds every component
//! (C4-C14) raises; HTTP status mapping happens only at the api-gateway edge.

use thiserror::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Application error types
#[derive(Debug, Error)]
pub enum Error {
    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Cache backend errors (Redis or in-process)
    #[error("Cache error: {0}")]
    Cache(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Missing/invalid/revoked credential
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// Scope check failed
    #[error("Forbidden: missing scope {scope}")]
    Forbidden { scope: String },

    /// Paywall rejection
    #[error("Payment required: {price_per_million_usd} per million tokens")]
    PaymentRequired {
        wallet_address: Option<String>,
        price_per_million_usd: f64,
    },

    /// Target entity missing
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Duplicate registration/invitation/etc
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Too many failed attempts
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Malformed request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Unclassified internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn cache(msg: impl Into<String>) -> Self {
        Self::Cache(msg.into())
    }

    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn unauthenticated(msg: impl Into<String>) -> Self {
        Self::Unauthenticated(msg.into())
    }

    pub fn forbidden(scope: impl Into<String>) -> Self {
        Self::Forbidden {
            scope: scope.into(),
        }
    }

    pub fn payment_required(wallet_address: Option<String>, price_per_million_usd: f64) -> Self {
        Self::PaymentRequired {
            wallet_address,
            price_per_million_usd,
        }
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::RateLimited(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Stable string tag used in API error payloads (mirrors spec.md §7 kinds)
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Database(_) | Error::Cache(_) | Error::Config(_) | Error::Internal(_) => {
                "internal"
            }
            Error::Validation(_) => "validation",
            Error::Unauthenticated(_) => "unauthenticated",
            Error::Forbidden { .. } => "forbidden",
            Error::PaymentRequired { .. } => "payment_required",
            Error::NotFound { .. } => "not_found",
            Error::Conflict(_) => "conflict",
            Error::RateLimited(_) => "rate_limited",
            Error::BadRequest(_) => "bad_request",
        }
    }
}
