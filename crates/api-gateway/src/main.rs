//! API Gateway: the only crate in this workspace that terminates in a bound
//! HTTP server. Wires AuthSession/MagicLink/Invitations/PATManager (identity)
//! and PromptAgent (dispatch) behind REST + SSE endpoints.

mod adapters;
mod cors;
mod error_response;
mod handlers;
mod models;
mod routes;
mod state;

use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use redis::aio::ConnectionManager;
use shared::cache::{InMemoryCache, RedisCache, SharedCache};
use shared::{db, Config};

use adapters::{LoggingNotifier, StubCommandRegistry, StubMemoryStore, StubModelProvider};
use state::AppState;

#[actix_web::main]
async fn main() -> shared::error::Result<()> {
    shared::init_tracing();
    tracing::info!("Starting API Gateway...");

    let config = Config::from_env()?;

    let pool = db::create_pool(&config.database).await?;
    db::run_migrations(&pool).await?;
    db::check_health(&pool).await?;

    let cache: Arc<dyn SharedCache> = match redis::Client::open(config.redis.connection_url()) {
        Ok(client) => match ConnectionManager::new(client).await {
            Ok(conn) => {
                tracing::info!("Connected to Redis for shared cache");
                Arc::new(RedisCache::new(conn))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Redis unavailable, falling back to in-process cache");
                Arc::new(InMemoryCache::new())
            }
        },
        Err(e) => {
            tracing::warn!(error = %e, "invalid Redis URL, falling back to in-process cache");
            Arc::new(InMemoryCache::new())
        }
    };

    let state = AppState {
        pool,
        config: Arc::new(config),
        cache,
        model_provider: Arc::new(StubModelProvider),
        command_registry: Arc::new(StubCommandRegistry),
        memory_store: Arc::new(StubMemoryStore),
        notifier: Arc::new(LoggingNotifier),
    };

    let server_addr = format!("{}:{}", state.config.server.host, state.config.server.port);
    tracing::info!("API Gateway listening on {}", server_addr);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(cors::cors())
            .app_data(web::JsonConfig::default().limit(1_048_576))
            .app_data(web::Data::new(state.clone()))
            .configure(routes::configure)
    })
    .bind(&server_addr)
    .map_err(|e| shared::error::Error::internal(format!("failed to bind {server_addr}: {e}")))?
    .run()
    .await
    .map_err(|e| shared::error::Error::internal(format!("server error: {e}")))?;

    tracing::info!("API Gateway shutdown complete");
    Ok(())
}
