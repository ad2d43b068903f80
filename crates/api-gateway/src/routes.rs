//! Route configuration for the API.

use actix_web::web;

use crate::handlers;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .route("/health", web::get().to(handlers::health::health_check))
            .route("/user", web::get().to(handlers::user::get_user))
            .route("/auth/magic-link", web::post().to(handlers::magic_link::request))
            .route("/auth/magic-link/verify", web::post().to(handlers::magic_link::verify))
            .route("/invitations/{id}/accept", web::post().to(handlers::invitations::accept))
            .route("/pats", web::get().to(handlers::pats::list))
            .route("/pats", web::post().to(handlers::pats::create))
            .route("/pats/{id}", web::delete().to(handlers::pats::revoke))
            .route("/chat/completions", web::post().to(handlers::chat::completions)),
    );
}
