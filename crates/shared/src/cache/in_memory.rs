//! In-process `SharedCache` implementation for tests and single-process
//! deployments, backed by `dashmap`.

use super::SharedCache;
use crate::error::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use regex::Regex;
use std::time::{Duration, Instant};

struct Entry {
    value: String,
    expires_at: Instant,
}

#[derive(Default)]
pub struct InMemoryCache {
    map: DashMap<String, Entry>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self {
            map: DashMap::new(),
        }
    }

    fn glob_to_regex(glob: &str) -> Option<Regex> {
        let mut pattern = String::from("^");
        for part in glob.split('*') {
            pattern.push_str(&regex::escape(part));
            pattern.push_str(".*");
        }
        // strip the trailing ".*" added after the last literal segment
        if glob.ends_with('*') {
            // keep it, trailing wildcard is intentional
        } else {
            pattern.truncate(pattern.len() - 2);
        }
        pattern.push('$');
        Regex::new(&pattern).ok()
    }
}

#[async_trait]
impl SharedCache for InMemoryCache {
    async fn get_raw(&self, key: &str) -> Result<Option<String>> {
        match self.map.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Ok(Some(entry.value.clone())),
            Some(_) => {
                self.map.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set_raw(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        self.map.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.map.remove(key);
        Ok(())
    }

    async fn delete_pattern(&self, glob: &str) -> Result<()> {
        let Some(re) = Self::glob_to_regex(glob) else {
            return Ok(());
        };
        let to_remove: Vec<String> = self
            .map
            .iter()
            .filter(|entry| re.is_match(entry.key()))
            .map(|entry| entry.key().clone())
            .collect();
        for key in to_remove {
            self.map.remove(&key);
        }
        Ok(())
    }

    async fn increment(&self, key: &str, ttl: Duration) -> Result<i64> {
        let mut entry = self.map.entry(key.to_string()).or_insert_with(|| Entry {
            value: "0".to_string(),
            expires_at: Instant::now() + ttl,
        });
        if entry.expires_at <= Instant::now() {
            entry.value = "0".to_string();
            entry.expires_at = Instant::now() + ttl;
        }
        let count: i64 = entry.value.parse().unwrap_or(0) + 1;
        entry.value = count.to_string();
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_get_roundtrips() {
        let cache = InMemoryCache::new();
        cache
            .set_raw("k", "v".into(), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(cache.get_raw("k").await.unwrap(), Some("v".to_string()));
    }

    #[tokio::test]
    async fn expired_entry_is_a_miss() {
        let cache = InMemoryCache::new();
        cache
            .set_raw("k", "v".into(), Duration::from_millis(1))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(cache.get_raw("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn delete_pattern_matches_glob() {
        let cache = InMemoryCache::new();
        cache
            .set_raw("user_scopes:1:2", "a".into(), Duration::from_secs(5))
            .await
            .unwrap();
        cache
            .set_raw("user_scopes:1:3", "b".into(), Duration::from_secs(5))
            .await
            .unwrap();
        cache
            .set_raw("other:1", "c".into(), Duration::from_secs(5))
            .await
            .unwrap();

        cache.delete_pattern("user_scopes:1:*").await.unwrap();

        assert_eq!(cache.get_raw("user_scopes:1:2").await.unwrap(), None);
        assert_eq!(cache.get_raw("user_scopes:1:3").await.unwrap(), None);
        assert_eq!(cache.get_raw("other:1").await.unwrap(), Some("c".into()));
    }

    #[tokio::test]
    async fn increment_creates_and_expires_bucket() {
        let cache = InMemoryCache::new();
        let ttl = Duration::from_secs(60);
        assert_eq!(cache.increment("failed_login:u:1", ttl).await.unwrap(), 1);
        assert_eq!(cache.increment("failed_login:u:1", ttl).await.unwrap(), 2);
    }
}
