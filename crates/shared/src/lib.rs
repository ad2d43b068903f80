//! Shared library for the orchestration backend services
//!
//! This crate provides common functionality used across all backend crates:
//! - Database connection pooling and utilities
//! - Common data models matching the PostgreSQL schema
//! - Error handling types
//! - Configuration management
//! - Logging infrastructure
//! - Cross-process cache (C1) and the field-encryption/PAT-hashing half of
//!   Crypto (C3)

pub mod cache;
pub mod config;
pub mod crypto;
pub mod db;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::Config;
pub use db::DbPool;
pub use error::{Error, Result};

/// Initialize tracing subscriber for structured logging
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "shared=debug,authz=debug,billing=debug,identity=debug,dispatch=debug,api_gateway=debug,info"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
