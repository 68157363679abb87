//! Cache port
//!
//! Every key is scoped to the configured namespace by the implementation.
//! Failures are logged by the adapter and surface as empty results, so a
//! cache outage never fails a request.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

/// Default time to live for cached values
pub const DEFAULT_TTL: Duration = Duration::from_secs(600);

#[async_trait]
pub trait CacheDriver: Send + Sync {
    async fn is_ready(&self) -> bool;

    /// All keys in the namespace, without the namespace prefix
    async fn keys(&self) -> Vec<String>;

    async fn get(&self, key: &str) -> Option<String>;

    /// Values for the given keys; missing keys are left out
    async fn get_many(&self, keys: &[String]) -> HashMap<String, String>;

    async fn set(&self, key: &str, value: &str, ttl: Duration);

    async fn set_many(&self, values: &HashMap<String, String>, ttl: Duration);

    /// Delete one key
    async fn dump(&self, key: &str);

    /// Delete every key starting with `prefix`
    async fn dump_prefix(&self, prefix: &str);

    /// Delete every key in the namespace
    async fn flush_for_namespace(&self);
}
