//! Raw database access port
//!
//! Used by the admin tooling to probe the connection and run ad-hoc queries.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::entities::{Row, SqlQuery};
use crate::error::DomainError;

#[async_trait]
pub trait Database: Send + Sync {
    /// Whether a trivial statement succeeds
    async fn is_ready(&self) -> bool;

    /// First column of the first row
    async fn get_value(&self, query: &SqlQuery) -> Result<Option<Value>, DomainError>;

    /// First column of every row
    async fn get_values(&self, query: &SqlQuery) -> Result<Vec<Value>, DomainError>;

    /// First row
    async fn get_record(&self, query: &SqlQuery) -> Result<Option<Row>, DomainError>;

    /// All rows
    async fn get_records(&self, query: &SqlQuery) -> Result<Vec<Row>, DomainError>;

    /// Run a statement, returning the number of affected rows
    async fn execute(&self, query: &SqlQuery) -> Result<u64, DomainError>;

    /// Dispose of the connection pool
    async fn close(&self) -> Result<(), DomainError>;
}
