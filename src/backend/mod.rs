//! The relational execution seam: a thin query/execute handle the rest of the
//! layer talks through.

use async_trait::async_trait;

use crate::error::DocSqlResult;

mod sqlite;

pub use sqlite::SqliteBackend;

/// A single bound SQL parameter or result cell.
#[derive(Clone, Debug, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl SqlValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            SqlValue::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            SqlValue::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }
}

/// A parameterized statement produced by the query translator.
#[derive(Clone, Debug)]
pub struct SqlStatement {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

impl SqlStatement {
    pub fn new(sql: impl Into<String>, params: Vec<SqlValue>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

/// One result row, keyed by column name in select order.
#[derive(Clone, Debug, Default)]
pub struct Row {
    columns: Vec<(String, SqlValue)>,
}

impl Row {
    pub fn new(columns: Vec<(String, SqlValue)>) -> Self {
        Self { columns }
    }

    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, value)| value)
    }

    pub fn columns(&self) -> &[(String, SqlValue)] {
        &self.columns
    }
}

/// Connection handle to an arbitrary relational engine.
///
/// Implementations must support equality/inequality comparison, ordering,
/// limit, insert-or-update, delete, and a text column able to hold the JSON
/// payload.
#[async_trait]
pub trait RelationalBackend: Send + Sync + 'static {
    /// Runs a SELECT and returns every row.
    async fn query_rows(&self, statement: &SqlStatement) -> DocSqlResult<Vec<Row>>;

    /// Runs a single mutating statement, returning the affected row count.
    async fn execute(&self, statement: &SqlStatement) -> DocSqlResult<u64>;

    /// Runs the given statements inside one transaction; either all apply or
    /// none do.
    async fn execute_transaction(&self, statements: Vec<SqlStatement>) -> DocSqlResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_lookup_by_column_name() {
        let row = Row::new(vec![
            ("doc_id".to_string(), SqlValue::Text("d1".to_string())),
            ("payload".to_string(), SqlValue::Text("{}".to_string())),
        ]);
        assert_eq!(row.get("doc_id").and_then(SqlValue::as_text), Some("d1"));
        assert!(row.get("missing").is_none());
    }
}
