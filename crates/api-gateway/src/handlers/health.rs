use actix_web::{web, HttpResponse};

use crate::state::AppState;

pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    match shared::db::check_health(&state.pool).await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({"status": "ok"})),
        Err(e) => {
            tracing::error!(error = %e, "health check failed");
            HttpResponse::ServiceUnavailable().json(serde_json::json!({"status": "unhealthy"}))
        }
    }
}
