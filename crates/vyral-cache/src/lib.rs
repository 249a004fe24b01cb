//! Result caching for orchestrated jobs.
//!
//! This crate provides:
//! - Deterministic, key-order independent fingerprints for cache keys
//! - The `CacheStore` contract consumed by the orchestrator
//! - A Redis-backed store (GET / SET EX) and an in-process expiring store

pub mod error;
pub mod fingerprint;
pub mod memory;
pub mod redis_store;
pub mod store;

pub use error::{CacheError, CacheResult};
pub use fingerprint::{canonical_json, fingerprint};
pub use memory::MemoryCache;
pub use redis_store::{CacheConfig, RedisCache};
pub use store::CacheStore;
