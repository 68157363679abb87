//! Redis implementation of the cache port

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use crate::config::RedisConfig;
use crate::domain::ports::CacheDriver;
use crate::error::CacheError;

/// Cache backed by a single Redis database, scoped to one namespace
pub struct RedisCache {
    client: redis::Client,
    namespace: String,
}

impl RedisCache {
    /// Validates the URL; the server is dialed on first use
    pub fn new(config: &RedisConfig) -> Result<Self, CacheError> {
        let client = redis::Client::open(config.connection_url())?;
        Ok(Self {
            client,
            namespace: config.namespace.clone(),
        })
    }

    async fn connection(&self) -> Result<MultiplexedConnection, CacheError> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }

    fn key(&self, key: &str) -> String {
        namespaced_key(&self.namespace, key)
    }

    async fn ping(&self) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        redis::cmd("PING").query_async::<_, String>(&mut conn).await?;
        Ok(())
    }

    async fn matching(&self, pattern: &str) -> Result<Vec<String>, CacheError> {
        let mut conn = self.connection().await?;
        Ok(conn.keys(pattern).await?)
    }

    async fn delete(&self, keys: &[String]) -> Result<(), CacheError> {
        if keys.is_empty() {
            return Ok(());
        }
        let mut conn = self.connection().await?;
        conn.del::<_, ()>(keys).await?;
        Ok(())
    }

    async fn try_get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.connection().await?;
        Ok(conn.get(self.key(key)).await?)
    }

    async fn try_get_many(&self, keys: &[String]) -> Result<HashMap<String, String>, CacheError> {
        if keys.is_empty() {
            return Ok(HashMap::new());
        }
        let namespaced: Vec<String> = keys.iter().map(|k| self.key(k)).collect();
        let mut conn = self.connection().await?;
        let values: Vec<Option<String>> = redis::cmd("MGET")
            .arg(&namespaced)
            .query_async(&mut conn)
            .await?;

        Ok(keys
            .iter()
            .zip(values)
            .filter_map(|(key, value)| value.map(|v| (key.clone(), v)))
            .collect())
    }

    async fn try_set_many(
        &self,
        values: &HashMap<String, String>,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let mut pipe = redis::pipe();
        for (key, value) in values {
            pipe.cmd("SET")
                .arg(self.key(key))
                .arg(value)
                .arg("EX")
                .arg(ttl.as_secs())
                .ignore();
        }
        let mut conn = self.connection().await?;
        pipe.query_async::<_, ()>(&mut conn).await?;
        Ok(())
    }
}

#[async_trait]
impl CacheDriver for RedisCache {
    async fn is_ready(&self) -> bool {
        match self.ping().await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(error = %e, "Cache readiness check failed");
                false
            }
        }
    }

    async fn keys(&self) -> Vec<String> {
        match self.matching(&self.key("*")).await {
            Ok(keys) => keys
                .iter()
                .filter_map(|k| strip_namespace(&self.namespace, k))
                .map(str::to_string)
                .collect(),
            Err(e) => {
                tracing::error!(error = %e, "Failed to list cache keys");
                Vec::new()
            }
        }
    }

    async fn get(&self, key: &str) -> Option<String> {
        self.try_get(key).await.unwrap_or_else(|e| {
            tracing::error!(key, error = %e, "Failed to read cache value");
            None
        })
    }

    async fn get_many(&self, keys: &[String]) -> HashMap<String, String> {
        self.try_get_many(keys).await.unwrap_or_else(|e| {
            tracing::error!(?keys, error = %e, "Failed to read cache values");
            HashMap::new()
        })
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) {
        let values = HashMap::from([(key.to_string(), value.to_string())]);
        if let Err(e) = self.try_set_many(&values, ttl).await {
            tracing::error!(key, error = %e, "Failed to write cache value");
        }
    }

    async fn set_many(&self, values: &HashMap<String, String>, ttl: Duration) {
        if values.is_empty() {
            return;
        }
        if let Err(e) = self.try_set_many(values, ttl).await {
            tracing::error!(count = values.len(), error = %e, "Failed to write cache values");
        }
    }

    async fn dump(&self, key: &str) {
        if let Err(e) = self.delete(&[self.key(key)]).await {
            tracing::error!(key, error = %e, "Failed to delete cache value");
        }
    }

    async fn dump_prefix(&self, prefix: &str) {
        let result = match self.matching(&self.key(&format!("{}*", prefix))).await {
            Ok(keys) => self.delete(&keys).await,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            tracing::error!(prefix, error = %e, "Failed to delete cache values by prefix");
        }
    }

    async fn flush_for_namespace(&self) {
        let result = match self.matching(&self.key("*")).await {
            Ok(keys) => self.delete(&keys).await,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            tracing::error!(namespace = %self.namespace, error = %e, "Failed to flush cache namespace");
        }
    }
}

/// `{namespace}:{key}`, or the bare key when no namespace is configured
pub fn namespaced_key(namespace: &str, key: &str) -> String {
    if namespace.is_empty() {
        key.to_string()
    } else {
        format!("{}:{}", namespace, key)
    }
}

pub fn strip_namespace<'a>(namespace: &str, key: &'a str) -> Option<&'a str> {
    if namespace.is_empty() {
        return Some(key);
    }
    key.strip_prefix(namespace)?.strip_prefix(':')
}
