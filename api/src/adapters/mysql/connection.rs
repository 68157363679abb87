//! MySQL adapter for the raw Database port

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use sea_orm::{
    ConnectOptions, ConnectionTrait, DatabaseConnection, DbBackend, DbErr, FromQueryResult,
    JsonValue, Statement,
};
use serde_json::Value;

use crate::config::SqlConfig;
use crate::domain::entities::{Row, SqlQuery};
use crate::domain::ports::Database;
use crate::error::DomainError;

/// Pause between attempts when the server cannot be reached
const RETRY_DELAY: Duration = Duration::from_millis(200);
const MAX_RETRIES: usize = 5;

/// MySQL implementation of the Database port
pub struct MySqlDatabase {
    db: DatabaseConnection,
}

impl MySqlDatabase {
    /// Open a lazy pool; nothing is dialed until the first query
    pub async fn connect(config: &SqlConfig, development: bool) -> Result<Self, DomainError> {
        let mut options = ConnectOptions::new(config.connection_url());
        options
            .connect_lazy(true)
            .sqlx_logging(development || config.echo);

        let db = sea_orm::Database::connect(options)
            .await
            .map_err(|e| DomainError::Database(clean_message(&e.to_string())))?;

        Ok(Self::new(db))
    }

    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Shared handle for repositories built on the same pool
    pub fn connection(&self) -> DatabaseConnection {
        self.db.clone()
    }

    async fn fetch_rows(&self, query: &SqlQuery) -> Result<Vec<Row>, DomainError> {
        let rows = with_retry(|| JsonValue::find_by_statement(statement(query)).all(&self.db))
            .await?;

        Ok(rows.into_iter().filter_map(into_row).collect())
    }
}

#[async_trait]
impl Database for MySqlDatabase {
    async fn is_ready(&self) -> bool {
        match self.db.execute_unprepared("SELECT 1").await {
            Ok(_) => true,
            Err(e) => {
                tracing::error!(error = %e, "Database readiness check failed");
                false
            }
        }
    }

    async fn get_value(&self, query: &SqlQuery) -> Result<Option<Value>, DomainError> {
        let rows = self.fetch_rows(query).await?;
        Ok(rows.into_iter().next().and_then(first_column))
    }

    async fn get_values(&self, query: &SqlQuery) -> Result<Vec<Value>, DomainError> {
        let rows = self.fetch_rows(query).await?;
        Ok(rows.into_iter().filter_map(first_column).collect())
    }

    async fn get_record(&self, query: &SqlQuery) -> Result<Option<Row>, DomainError> {
        let rows = self.fetch_rows(query).await?;
        Ok(rows.into_iter().next())
    }

    async fn get_records(&self, query: &SqlQuery) -> Result<Vec<Row>, DomainError> {
        self.fetch_rows(query).await
    }

    async fn execute(&self, query: &SqlQuery) -> Result<u64, DomainError> {
        let result = with_retry(|| self.db.execute(statement(query))).await?;
        Ok(result.rows_affected())
    }

    async fn close(&self) -> Result<(), DomainError> {
        self.db
            .clone()
            .close()
            .await
            .map_err(|e| DomainError::Database(clean_message(&e.to_string())))
    }
}

pub(crate) fn statement(query: &SqlQuery) -> Statement {
    Statement::from_sql_and_values(
        DbBackend::MySql,
        &query.sql,
        query.params.iter().cloned().map(sea_orm::Value::from),
    )
}

/// Run `op`, retrying while the server is unreachable
pub(crate) async fn with_retry<T, F, Fut>(mut op: F) -> Result<T, DomainError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DbErr>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if is_connection_error(&e) && attempt < MAX_RETRIES => {
                attempt += 1;
                tracing::warn!(error = %e, attempt, "Database unreachable, retrying");
                tokio::time::sleep(RETRY_DELAY).await;
            }
            Err(e) => return Err(DomainError::Database(clean_message(&e.to_string()))),
        }
    }
}

fn is_connection_error(err: &DbErr) -> bool {
    matches!(err, DbErr::ConnectionAcquire(_) | DbErr::Conn(_))
}

/// Strip driver decoration from an error message
fn clean_message(message: &str) -> String {
    message
        .trim()
        .trim_start_matches('(')
        .trim_end_matches(')')
        .replace('"', "")
}

fn into_row(value: Value) -> Option<Row> {
    match value {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

fn first_column(row: Row) -> Option<Value> {
    row.into_iter().next().map(|(_, value)| value)
}
