//! Cross-process TTL cache (C1) with pattern-delete, backing store pluggable.
//!
//! Caches are short-TTL hints, never the source of truth: every `get` miss
//! or deserialization failure must send the caller back to the `Store` (C2).

mod in_memory;
mod redis_cache;

pub use in_memory::InMemoryCache;
pub use redis_cache::RedisCache;

use crate::error::Result;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;

/// Required TTLs per spec.md §4.1.
pub mod ttl {
    use std::time::Duration;

    pub const TOKEN_VALIDATION: Duration = Duration::from_secs(5);
    pub const USER_ID: Duration = Duration::from_secs(60);
    pub const USER_COMPANY: Duration = Duration::from_secs(10);
    pub const USER_SCOPES: Duration = Duration::from_secs(60);
    pub const STRIPE_CHECK: Duration = Duration::from_secs(300);
}

/// Key-builder helpers matching the cache keys named throughout spec.md.
pub mod keys {
    use uuid::Uuid;

    pub fn token_validation(token_sha256_hex: &str) -> String {
        format!("token_validation:{}", token_sha256_hex)
    }

    pub fn user_scopes(user_id: Uuid, tenant_id: Uuid) -> String {
        format!("user_scopes:{}:{}", user_id, tenant_id)
    }

    pub fn failed_login(user_id: Uuid, bucket: i64) -> String {
        format!("failed_login:{}:{}", user_id, bucket)
    }

    pub fn stripe_check(tenant_id: Uuid) -> String {
        format!("stripe_check:{}", tenant_id)
    }
}

/// Contract for the shared cache: `get`/`set`/`delete`/`delete_pattern`.
#[async_trait]
pub trait SharedCache: Send + Sync {
    async fn get_raw(&self, key: &str) -> Result<Option<String>>;
    async fn set_raw(&self, key: &str, value: String, ttl: Duration) -> Result<()>;
    async fn delete(&self, key: &str) -> Result<()>;
    /// `glob` uses `*` as the only wildcard, matching the teacher's
    /// `SCAN ... MATCH` semantics.
    async fn delete_pattern(&self, glob: &str) -> Result<()>;
    /// Atomically increments a counter key, creating it with the given TTL
    /// if absent. Used by the sliding-window failed-login counter (C8).
    async fn increment(&self, key: &str, ttl: Duration) -> Result<i64>;
}

/// Convenience JSON helpers layered over the raw string contract so callers
/// don't each re-implement `serde_json::to_string`/`from_str`.
#[async_trait]
pub trait SharedCacheExt: SharedCache {
    async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get_raw(key).await? {
            Some(raw) => Ok(serde_json::from_str(&raw).ok()),
            None => Ok(None),
        }
    }

    async fn set<T: Serialize + Sync>(&self, key: &str, value: &T, ttl: Duration) -> Result<()> {
        let raw = serde_json::to_string(value)
            .map_err(|e| crate::error::Error::internal(format!("cache serialize: {e}")))?;
        self.set_raw(key, raw, ttl).await
    }
}

impl<T: SharedCache + ?Sized> SharedCacheExt for T {}
