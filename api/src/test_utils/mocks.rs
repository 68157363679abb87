//! Mock implementations of port traits
//!
//! These are in-memory implementations that can be configured for testing.
//! They store data in memory and allow tests to verify behavior.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde_json::{json, Value};

use crate::domain::entities::{MseInfoRequest, Row, SemdInfo, SemdStatusRecord, SqlQuery};
use crate::domain::ports::{CacheDriver, Database, SemdRepository, VistaClient};
use crate::error::{DomainError, VistaError};

// ============================================================================
// In-Memory Database
// ============================================================================

/// Answers every query with the same rows
pub struct InMemoryDatabase {
    ready: bool,
    rows: Vec<Row>,
    failure: Option<String>,
    closed: AtomicBool,
}

impl Default for InMemoryDatabase {
    fn default() -> Self {
        Self {
            ready: true,
            rows: Vec::new(),
            failure: None,
            closed: AtomicBool::new(false),
        }
    }
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(mut self, rows: Vec<Value>) -> Self {
        self.rows = rows
            .into_iter()
            .filter_map(|row| match row {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect();
        self
    }

    pub fn not_ready(mut self) -> Self {
        self.ready = false;
        self
    }

    /// Every query fails with `message`
    pub fn failing(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn run(&self, _query: &SqlQuery) -> Result<Vec<Row>, DomainError> {
        match &self.failure {
            Some(message) => Err(DomainError::Database(message.clone())),
            None => Ok(self.rows.clone()),
        }
    }
}

fn first_column(row: Row) -> Option<Value> {
    row.into_iter().next().map(|(_, value)| value)
}

#[async_trait]
impl Database for InMemoryDatabase {
    async fn is_ready(&self) -> bool {
        self.ready
    }

    async fn get_value(&self, query: &SqlQuery) -> Result<Option<Value>, DomainError> {
        Ok(self.run(query)?.into_iter().next().and_then(first_column))
    }

    async fn get_values(&self, query: &SqlQuery) -> Result<Vec<Value>, DomainError> {
        Ok(self.run(query)?.into_iter().filter_map(first_column).collect())
    }

    async fn get_record(&self, query: &SqlQuery) -> Result<Option<Row>, DomainError> {
        Ok(self.run(query)?.into_iter().next())
    }

    async fn get_records(&self, query: &SqlQuery) -> Result<Vec<Row>, DomainError> {
        self.run(query)
    }

    async fn execute(&self, query: &SqlQuery) -> Result<u64, DomainError> {
        Ok(self.run(query)?.len() as u64)
    }

    async fn close(&self) -> Result<(), DomainError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

// ============================================================================
// In-Memory SEMD Repository
// ============================================================================

#[derive(Default)]
pub struct InMemorySemdRepository {
    actions: Vec<SemdInfo>,
    events: Vec<SemdInfo>,
    inserted: RwLock<Vec<SemdStatusRecord>>,
    fail_collect: bool,
    fail_insert: bool,
}

impl InMemorySemdRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_actions(mut self, semds: Vec<SemdInfo>) -> Self {
        self.actions = semds;
        self
    }

    pub fn with_events(mut self, semds: Vec<SemdInfo>) -> Self {
        self.events = semds;
        self
    }

    pub fn failing_collect(mut self) -> Self {
        self.fail_collect = true;
        self
    }

    pub fn failing_insert(mut self) -> Self {
        self.fail_insert = true;
        self
    }

    pub fn inserted(&self) -> Vec<SemdStatusRecord> {
        self.inserted.read().unwrap().clone()
    }

    fn collect(&self, semds: &[SemdInfo]) -> Result<Vec<SemdInfo>, DomainError> {
        if self.fail_collect {
            return Err(DomainError::Database("collect failed".to_string()));
        }
        Ok(semds.to_vec())
    }
}

#[async_trait]
impl SemdRepository for InMemorySemdRepository {
    async fn collect_action_semds(
        &self,
        _start: NaiveDateTime,
        _end: NaiveDateTime,
    ) -> Result<Vec<SemdInfo>, DomainError> {
        self.collect(&self.actions)
    }

    async fn collect_event_semds(
        &self,
        _start: NaiveDateTime,
        _end: NaiveDateTime,
    ) -> Result<Vec<SemdInfo>, DomainError> {
        self.collect(&self.events)
    }

    async fn insert_status(&self, record: &SemdStatusRecord) -> Result<(), DomainError> {
        if self.fail_insert {
            return Err(DomainError::Database("insert failed".to_string()));
        }
        self.inserted.write().unwrap().push(record.clone());
        Ok(())
    }
}

// ============================================================================
// Mock Vista3 Client
// ============================================================================

/// Marks every SEMD as registered, except for the configured events
#[derive(Default)]
pub struct MockVistaClient {
    failing_events: HashSet<i64>,
    mse_calls: AtomicUsize,
}

impl MockVistaClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Status lookups for `event_id` fail
    pub fn failing_for(mut self, event_id: i64) -> Self {
        self.failing_events.insert(event_id);
        self
    }

    pub fn mse_calls(&self) -> usize {
        self.mse_calls.load(Ordering::SeqCst)
    }

    fn check(&self, semd: &SemdInfo) -> Result<SemdInfo, VistaError> {
        if self.failing_events.contains(&semd.event_id) {
            return Err(VistaError::Api {
                status: 500,
                message: format!("event {} unavailable", semd.event_id),
            });
        }
        Ok(SemdInfo {
            error_description: Some("registered".to_string()),
            ..semd.clone()
        })
    }
}

#[async_trait]
impl VistaClient for MockVistaClient {
    async fn get_semd_info(&self, semd: &SemdInfo) -> Result<SemdInfo, VistaError> {
        self.check(semd)
    }

    async fn get_semd_info_batch(
        &self,
        semds: &[SemdInfo],
    ) -> Result<Vec<Option<SemdInfo>>, VistaError> {
        Ok(semds.iter().map(|semd| self.check(semd).ok()).collect())
    }

    async fn get_mse_info(&self, request: &MseInfoRequest) -> Result<Value, VistaError> {
        self.mse_calls.fetch_add(1, Ordering::SeqCst);
        Ok(json!({"id": request.id, "status": "done"}))
    }
}

// ============================================================================
// In-Memory Cache
// ============================================================================

/// Cache without expiry; TTLs are ignored
pub struct InMemoryCache {
    ready: bool,
    values: RwLock<HashMap<String, String>>,
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self {
            ready: true,
            values: RwLock::new(HashMap::new()),
        }
    }
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheDriver for InMemoryCache {
    async fn is_ready(&self) -> bool {
        self.ready
    }

    async fn keys(&self) -> Vec<String> {
        self.values.read().unwrap().keys().cloned().collect()
    }

    async fn get(&self, key: &str) -> Option<String> {
        self.values.read().unwrap().get(key).cloned()
    }

    async fn get_many(&self, keys: &[String]) -> HashMap<String, String> {
        let values = self.values.read().unwrap();
        keys.iter()
            .filter_map(|key| values.get(key).map(|v| (key.clone(), v.clone())))
            .collect()
    }

    async fn set(&self, key: &str, value: &str, _ttl: Duration) {
        self.values
            .write()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    async fn set_many(&self, values: &HashMap<String, String>, _ttl: Duration) {
        self.values
            .write()
            .unwrap()
            .extend(values.iter().map(|(k, v)| (k.clone(), v.clone())));
    }

    async fn dump(&self, key: &str) {
        self.values.write().unwrap().remove(key);
    }

    async fn dump_prefix(&self, prefix: &str) {
        self.values
            .write()
            .unwrap()
            .retain(|key, _| !key.starts_with(prefix));
    }

    async fn flush_for_namespace(&self) {
        self.values.write().unwrap().clear();
    }
}
