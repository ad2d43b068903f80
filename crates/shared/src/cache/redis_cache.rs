//! Redis-backed `SharedCache` implementation.
//!
//! Graceful degradation: any Redis error is logged and surfaces as a cache
//! miss rather than an error, since the cache is never the source of truth.

use super::SharedCache;
use crate::error::Result;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::time::Duration;
use tracing::warn;

#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl SharedCache for RedisCache {
    async fn get_raw(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        match conn.get::<_, Option<String>>(key).await {
            Ok(v) => Ok(v),
            Err(e) => {
                warn!(key = key, error = %e, "Redis cache read failed");
                Ok(None)
            }
        }
    }

    async fn set_raw(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        let mut conn = self.conn.clone();
        if let Err(e) = conn
            .set_ex::<_, _, ()>(key, value, ttl.as_secs().max(1))
            .await
        {
            warn!(key = key, error = %e, "Redis cache write failed");
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        if let Err(e) = conn.del::<_, ()>(key).await {
            warn!(key = key, error = %e, "Redis cache delete failed");
        }
        Ok(())
    }

    async fn delete_pattern(&self, glob: &str) -> Result<()> {
        let mut conn = self.conn.clone();

        let keys: std::result::Result<Vec<String>, _> = redis::cmd("SCAN")
            .arg(0)
            .arg("MATCH")
            .arg(glob)
            .arg("COUNT")
            .arg(100)
            .query_async(&mut conn)
            .await;

        match keys {
            Ok(keys) if !keys.is_empty() => {
                if let Err(e) = conn.del::<_, ()>(&keys).await {
                    warn!(pattern = glob, error = %e, "Redis pattern delete failed");
                }
            }
            Err(e) => {
                warn!(pattern = glob, error = %e, "Redis SCAN failed");
            }
            _ => {}
        }
        Ok(())
    }

    async fn increment(&self, key: &str, ttl: Duration) -> Result<i64> {
        let mut conn = self.conn.clone();
        let count: i64 = match conn.incr(key, 1).await {
            Ok(c) => c,
            Err(e) => {
                warn!(key = key, error = %e, "Redis incr failed");
                return Ok(0);
            }
        };
        if count == 1 {
            let _ = conn.expire::<_, ()>(key, ttl.as_secs().max(1) as i64).await;
        }
        Ok(count)
    }
}
