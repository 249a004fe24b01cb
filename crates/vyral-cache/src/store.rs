//! Cache store contract.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::CacheResult;

/// Expiring key/value store used to memoize job results.
///
/// Implementations must be safe to share across concurrent requests. Writes
/// are unconditional overwrites; callers never read-modify-write an entry.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Short name used in logs and readiness checks.
    fn name(&self) -> &'static str;

    /// Look up a key.
    ///
    /// `Ok(None)` means the key is absent or expired. A cached JSON `null`
    /// or `false` is returned as `Ok(Some(..))`.
    async fn get(&self, key: &str) -> CacheResult<Option<Value>>;

    /// Store a value that expires after `ttl`.
    async fn put(&self, key: &str, value: &Value, ttl: Duration) -> CacheResult<()>;

    /// Check connectivity to the backing store.
    async fn ping(&self) -> CacheResult<()> {
        Ok(())
    }
}
