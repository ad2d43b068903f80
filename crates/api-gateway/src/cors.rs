//! CORS configuration, trimmed from the teacher's `middleware/cors.rs`:
//! an explicit allow-list via `CORS_ALLOWED_ORIGINS`, permissive localhost
//! defaults outside production.

use actix_cors::Cors;
use std::env;

pub fn cors() -> Cors {
    let is_production = env::var("ENVIRONMENT").map(|e| e.eq_ignore_ascii_case("production")).unwrap_or(false);

    let allowed = env::var("CORS_ALLOWED_ORIGINS").unwrap_or_else(|_| {
        if is_production {
            tracing::warn!("CORS_ALLOWED_ORIGINS not set in production; no origins will be allowed");
            String::new()
        } else {
            "http://localhost:3000,http://localhost:8080".to_string()
        }
    });

    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers(vec!["Authorization", "Content-Type"])
        .max_age(3600);

    for origin in allowed.split(',').map(str::trim).filter(|o| !o.is_empty()) {
        cors = cors.allowed_origin(origin);
    }

    cors
}
