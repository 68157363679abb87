//! Raw SQL queries issued through the database port

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::error::DomainError;

/// One result row, columns in select order
pub type Row = Map<String, Value>;

/// A SQL statement with positional (`?`) string parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlQuery {
    pub sql: String,
    pub params: Vec<String>,
}

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)?$")
            .expect("identifier pattern is valid")
    })
}

fn check_identifier(name: &str) -> Result<&str, DomainError> {
    if identifier_pattern().is_match(name) {
        Ok(name)
    } else {
        Err(DomainError::Validation(format!(
            "'{}' is not a valid identifier",
            name
        )))
    }
}

impl SqlQuery {
    /// Statement passed through verbatim
    pub fn raw(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// `SELECT * FROM table [WHERE column = ?] [LIMIT n]`
    ///
    /// Table and column must be plain identifiers; the filter value is bound.
    pub fn select_all(
        table: &str,
        filter: Option<(&str, &str)>,
        limit: Option<u64>,
    ) -> Result<Self, DomainError> {
        let mut sql = format!("SELECT * FROM {}", check_identifier(table)?);
        let mut params = Vec::new();

        if let Some((column, value)) = filter {
            sql.push_str(&format!(" WHERE {} = ?", check_identifier(column)?));
            params.push(value.to_string());
        }

        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        Ok(Self { sql, params })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_all_plain() {
        let query = SqlQuery::select_all("Event", None, None).unwrap();
        assert_eq!(query.sql, "SELECT * FROM Event");
        assert!(query.params.is_empty());
    }

    #[test]
    fn select_all_with_filter_and_limit() {
        let query = SqlQuery::select_all("Event", Some(("client_id", "42")), Some(10)).unwrap();
        assert_eq!(query.sql, "SELECT * FROM Event WHERE client_id = ? LIMIT 10");
        assert_eq!(query.params, vec!["42".to_string()]);
    }

    #[test]
    fn schema_qualified_table_is_accepted() {
        let query = SqlQuery::select_all("kladr.STREET", None, Some(1)).unwrap();
        assert_eq!(query.sql, "SELECT * FROM kladr.STREET LIMIT 1");
    }

    #[test]
    fn injection_in_table_is_rejected() {
        let result = SqlQuery::select_all("Event; DROP TABLE Event", None, None);
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn injection_in_column_is_rejected() {
        let result = SqlQuery::select_all("Event", Some(("id = 1 OR 1", "1")), None);
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn filter_value_is_never_inlined() {
        let query = SqlQuery::select_all("Event", Some(("id", "1' OR '1'='1")), None).unwrap();
        assert!(!query.sql.contains("OR"));
        assert_eq!(query.params[0], "1' OR '1'='1");
    }
}
