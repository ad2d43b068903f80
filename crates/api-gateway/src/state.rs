use std::sync::Arc;

use dispatch::{CommandRegistry, MemoryStore, ModelProvider};
use identity::Notifier;
use shared::cache::SharedCache;
use shared::{Config, DbPool};

/// Shared across all handlers via `web::Data`.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub config: Arc<Config>,
    pub cache: Arc<dyn SharedCache>,
    pub model_provider: Arc<dyn ModelProvider>,
    pub command_registry: Arc<dyn CommandRegistry>,
    pub memory_store: Arc<dyn MemoryStore>,
    pub notifier: Arc<dyn Notifier>,
}
