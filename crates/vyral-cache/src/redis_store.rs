//! Redis-backed result cache.

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use serde_json::Value;
use tracing::debug;

use crate::error::{CacheError, CacheResult};
use crate::store::CacheStore;

/// Cache configuration.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Redis URL; `None` selects the in-process cache
    pub redis_url: Option<String>,
    /// Prefix prepended to every fingerprint
    pub key_prefix: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            key_prefix: "vyral:cache:".to_string(),
        }
    }
}

impl CacheConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            redis_url: std::env::var("REDIS_URL")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            key_prefix: std::env::var("CACHE_KEY_PREFIX")
                .unwrap_or_else(|_| "vyral:cache:".to_string()),
        }
    }
}

/// Result cache stored as JSON strings with `SET key value EX ttl`.
pub struct RedisCache {
    client: redis::Client,
    key_prefix: String,
}

impl RedisCache {
    /// Create a new Redis cache.
    pub fn new(redis_url: &str, key_prefix: impl Into<String>) -> CacheResult<Self> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self {
            client,
            key_prefix: key_prefix.into(),
        })
    }

    /// Create from a config, failing if no Redis URL is configured.
    pub fn from_config(config: &CacheConfig) -> CacheResult<Self> {
        let url = config
            .redis_url
            .as_deref()
            .ok_or_else(|| CacheError::connection_failed("REDIS_URL not set"))?;
        Self::new(url, config.key_prefix.clone())
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &str) -> CacheResult<Option<Value>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = self.full_key(key);

        let payload: Option<String> = conn.get(&key).await?;
        match payload {
            Some(payload) => {
                debug!(key = %key, "Redis cache entry found");
                Ok(Some(serde_json::from_str(&payload)?))
            }
            None => Ok(None),
        }
    }

    async fn put(&self, key: &str, value: &Value, ttl: Duration) -> CacheResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = self.full_key(key);
        let payload = serde_json::to_string(value)?;

        // Redis rejects EX 0
        let ttl_secs = ttl.as_secs().max(1);
        conn.set_ex::<_, _, ()>(&key, payload, ttl_secs).await?;

        debug!(key = %key, ttl_secs = ttl_secs, "Stored Redis cache entry");
        Ok(())
    }

    async fn ping(&self) -> CacheResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        redis::cmd("PING").query_async::<()>(&mut conn).await?;
        Ok(())
    }
}
