//! Admin handlers
//!
//! Diagnostics for the database, the cache, logging and the middleware
//! stack. Closed off outside development through `BANNED_ROUTES`.

use std::collections::HashMap;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::Config;
use crate::domain::entities::{Row, SqlQuery};
use crate::domain::ports::DEFAULT_TTL;
use crate::error::AppError;
use crate::AppState;

/// Body shared by every admin response
#[derive(Debug, Serialize)]
pub struct Wrapped<T> {
    pub response: T,
}

fn wrapped<T>(response: T) -> Json<Wrapped<T>> {
    Json(Wrapped { response })
}

#[derive(Debug, Deserialize)]
pub struct TableQuery {
    pub table: String,
    pub filter: Option<String>,
    pub column: Option<String>,
}

impl TableQuery {
    fn to_sql(&self) -> Result<SqlQuery, AppError> {
        let filter = match (&self.column, &self.filter) {
            (Some(column), Some(value)) if !column.is_empty() && !value.is_empty() => {
                Some((column.as_str(), value.as_str()))
            }
            _ => None,
        };
        Ok(SqlQuery::select_all(&self.table, filter, None)?)
    }
}

#[derive(Debug, Deserialize)]
pub struct TableLimitQuery {
    pub table: String,
    #[serde(default = "default_columns")]
    pub columns: u64,
}

fn default_columns() -> u64 {
    10
}

#[derive(Debug, Deserialize)]
pub struct RawQuery {
    pub query: String,
}

#[derive(Debug, Deserialize)]
pub struct LoggerQuery {
    #[serde(default = "default_log_msg")]
    pub log_msg: String,
}

fn default_log_msg() -> String {
    "Default test log message".to_string()
}

#[derive(Debug, Deserialize)]
pub struct ExceptionQuery {
    #[serde(default = "default_exc_msg")]
    pub exc_msg: String,
}

fn default_exc_msg() -> String {
    "Test Exception message".to_string()
}

#[derive(Debug, Deserialize)]
pub struct SleepQuery {
    pub seconds: u64,
}

#[derive(Debug, Deserialize)]
pub struct CacheKeysQuery {
    /// Comma separated
    pub keys: String,
}

#[derive(Debug, Deserialize)]
pub struct CacheSetQuery {
    pub key: String,
    pub value: String,
    pub seconds: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct CacheDumpQuery {
    pub key: Option<String>,
    pub prefix: Option<String>,
}

/// GET /admin/get_config
pub async fn get_config(State(state): State<AppState>) -> Json<Wrapped<Config>> {
    wrapped(state.config.redacted())
}

/// GET /admin/test_db_connection
pub async fn test_db_connection(State(state): State<AppState>) -> Json<Wrapped<&'static str>> {
    wrapped(if state.database.is_ready().await {
        "Connection is ready!!"
    } else {
        "Connection ERROR"
    })
}

/// GET /admin/test_get_table
///
/// `columns` is the row limit; 0 returns the whole table.
pub async fn test_get_table(
    State(state): State<AppState>,
    Query(query): Query<TableLimitQuery>,
) -> Result<Json<Wrapped<Vec<Row>>>, AppError> {
    let limit = (query.columns > 0).then_some(query.columns);
    let sql = SqlQuery::select_all(&query.table, None, limit)?;
    Ok(wrapped(state.database.get_records(&sql).await?))
}

/// GET /admin/test_get_values
pub async fn test_get_values(
    State(state): State<AppState>,
    Query(query): Query<TableQuery>,
) -> Result<Json<Wrapped<Vec<Value>>>, AppError> {
    Ok(wrapped(state.database.get_values(&query.to_sql()?).await?))
}

/// GET /admin/test_get_record
pub async fn test_get_record(
    State(state): State<AppState>,
    Query(query): Query<TableQuery>,
) -> Result<Json<Wrapped<Option<Row>>>, AppError> {
    Ok(wrapped(state.database.get_record(&query.to_sql()?).await?))
}

/// GET /admin/test_get_records
pub async fn test_get_records(
    State(state): State<AppState>,
    Query(query): Query<TableQuery>,
) -> Result<Json<Wrapped<Vec<Row>>>, AppError> {
    Ok(wrapped(state.database.get_records(&query.to_sql()?).await?))
}

/// GET /admin/test_query_with_response
pub async fn test_query_with_response(
    State(state): State<AppState>,
    Query(query): Query<RawQuery>,
) -> Result<Json<Wrapped<Vec<Row>>>, AppError> {
    Ok(wrapped(
        state
            .database
            .get_records(&SqlQuery::raw(query.query))
            .await?,
    ))
}

/// GET /admin/test_query_without_response
///
/// Errors are reported in the body rather than as a status.
pub async fn test_query_without_response(
    State(state): State<AppState>,
    Query(query): Query<RawQuery>,
) -> Json<Wrapped<String>> {
    wrapped(
        match state.database.execute(&SqlQuery::raw(query.query)).await {
            Ok(affected) => affected.to_string(),
            Err(e) => format!("Error: {}", e),
        },
    )
}

/// GET /admin/test_logger
pub async fn test_logger(Query(query): Query<LoggerQuery>) -> Json<Value> {
    tracing::debug!("{}", query.log_msg);
    Json(json!({"resp": "true"}))
}

/// GET /admin/test_simple_request
pub async fn test_simple_request() -> Json<bool> {
    Json(true)
}

/// GET /admin/test_base_exception
pub async fn test_base_exception(Query(query): Query<ExceptionQuery>) -> Json<Value> {
    panic!("{}", query.exc_msg)
}

/// GET /admin/test_sleep
pub async fn test_sleep(Query(query): Query<SleepQuery>) -> Json<Wrapped<String>> {
    tokio::time::sleep(Duration::from_secs(query.seconds)).await;
    wrapped(format!("Slept {} seconds.", query.seconds))
}

/// GET /admin/test_cache_connection
pub async fn test_cache_connection(State(state): State<AppState>) -> Json<Wrapped<&'static str>> {
    wrapped(if state.cache.is_ready().await {
        "Cache is ready!!"
    } else {
        "Cache ERROR"
    })
}

/// GET /admin/test_cache_keys
pub async fn test_cache_keys(State(state): State<AppState>) -> Json<Wrapped<Vec<String>>> {
    let mut keys = state.cache.keys().await;
    keys.sort();
    wrapped(keys)
}

/// GET /admin/test_cache_get
pub async fn test_cache_get(
    State(state): State<AppState>,
    Query(query): Query<CacheKeysQuery>,
) -> Json<Wrapped<HashMap<String, String>>> {
    let keys: Vec<String> = query
        .keys
        .split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(String::from)
        .collect();
    wrapped(state.cache.get_many(&keys).await)
}

/// GET /admin/test_cache_set
pub async fn test_cache_set(
    State(state): State<AppState>,
    Query(query): Query<CacheSetQuery>,
) -> Json<Wrapped<String>> {
    let ttl = query.seconds.map(Duration::from_secs).unwrap_or(DEFAULT_TTL);
    state.cache.set(&query.key, &query.value, ttl).await;
    wrapped(format!("Set {} for {} seconds.", query.key, ttl.as_secs()))
}

/// GET /admin/test_cache_dump
///
/// Deletes `key`, or every key starting with `prefix`.
pub async fn test_cache_dump(
    State(state): State<AppState>,
    Query(query): Query<CacheDumpQuery>,
) -> Result<Json<Wrapped<String>>, AppError> {
    match (query.key, query.prefix) {
        (Some(key), _) => {
            state.cache.dump(&key).await;
            Ok(wrapped(format!("Dumped {}.", key)))
        }
        (None, Some(prefix)) => {
            state.cache.dump_prefix(&prefix).await;
            Ok(wrapped(format!("Dumped {}*.", prefix)))
        }
        (None, None) => Err(AppError::BadRequest(
            "either key or prefix is required".to_string(),
        )),
    }
}

/// GET /admin/test_cache_flush
pub async fn test_cache_flush(State(state): State<AppState>) -> Json<Wrapped<&'static str>> {
    state.cache.flush_for_namespace().await;
    wrapped("Namespace flushed.")
}
