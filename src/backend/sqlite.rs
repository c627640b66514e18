use std::path::Path;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use log::error;
use rusqlite::types::{Value as SqliteValue, ValueRef};
use rusqlite::Connection;

use crate::backend::{RelationalBackend, Row, SqlStatement, SqlValue};
use crate::error::{backend_error, DocSqlResult};

/// SQLite-backed implementation of [`RelationalBackend`].
///
/// The connection is serialized behind a mutex; statements run on the calling
/// task. Suitable for the load this layer is designed for.
pub struct SqliteBackend {
    conn: Mutex<Connection>,
}

impl SqliteBackend {
    pub fn open(path: impl AsRef<Path>) -> DocSqlResult<Self> {
        let conn = Connection::open(path).map_err(|err| backend_error(err.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> DocSqlResult<Self> {
        let conn = Connection::open_in_memory().map_err(|err| backend_error(err.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn run_query(&self, statement: &SqlStatement) -> DocSqlResult<Vec<Row>> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        let mut prepared = conn
            .prepare(&statement.sql)
            .map_err(|err| backend_error(err.to_string()))?;
        let names: Vec<String> = prepared
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();
        let params = bind_params(&statement.params);
        let mut rows = prepared
            .query(rusqlite::params_from_iter(params))
            .map_err(|err| backend_error(err.to_string()))?;

        let mut result = Vec::new();
        while let Some(row) = rows.next().map_err(|err| backend_error(err.to_string()))? {
            let mut columns = Vec::with_capacity(names.len());
            for (index, name) in names.iter().enumerate() {
                let value = row
                    .get_ref(index)
                    .map_err(|err| backend_error(err.to_string()))?;
                columns.push((name.clone(), decode_cell(value)));
            }
            result.push(Row::new(columns));
        }
        Ok(result)
    }

    fn run_execute(&self, statement: &SqlStatement) -> DocSqlResult<u64> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        let params = bind_params(&statement.params);
        let changed = conn
            .execute(&statement.sql, rusqlite::params_from_iter(params))
            .map_err(|err| backend_error(err.to_string()))?;
        Ok(changed as u64)
    }

    fn run_transaction(&self, statements: &[SqlStatement]) -> DocSqlResult<()> {
        let mut conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        let tx = conn
            .transaction()
            .map_err(|err| backend_error(err.to_string()))?;
        for statement in statements {
            let params = bind_params(&statement.params);
            tx.execute(&statement.sql, rusqlite::params_from_iter(params))
                .map_err(|err| backend_error(err.to_string()))?;
        }
        tx.commit().map_err(|err| backend_error(err.to_string()))
    }
}

fn bind_params(params: &[SqlValue]) -> Vec<SqliteValue> {
    params
        .iter()
        .map(|param| match param {
            SqlValue::Null => SqliteValue::Null,
            SqlValue::Integer(value) => SqliteValue::Integer(*value),
            SqlValue::Real(value) => SqliteValue::Real(*value),
            SqlValue::Text(value) => SqliteValue::Text(value.clone()),
        })
        .collect()
}

fn decode_cell(value: ValueRef<'_>) -> SqlValue {
    match value {
        ValueRef::Null => SqlValue::Null,
        ValueRef::Integer(inner) => SqlValue::Integer(inner),
        ValueRef::Real(inner) => SqlValue::Real(inner),
        ValueRef::Text(inner) => SqlValue::Text(String::from_utf8_lossy(inner).into_owned()),
        ValueRef::Blob(inner) => SqlValue::Text(String::from_utf8_lossy(inner).into_owned()),
    }
}

#[async_trait]
impl RelationalBackend for SqliteBackend {
    async fn query_rows(&self, statement: &SqlStatement) -> DocSqlResult<Vec<Row>> {
        self.run_query(statement).map_err(|err| {
            error!("docsql backend query failed: {err}");
            err
        })
    }

    async fn execute(&self, statement: &SqlStatement) -> DocSqlResult<u64> {
        self.run_execute(statement).map_err(|err| {
            error!("docsql backend execute failed: {err}");
            err
        })
    }

    async fn execute_transaction(&self, statements: Vec<SqlStatement>) -> DocSqlResult<()> {
        self.run_transaction(&statements).map_err(|err| {
            error!("docsql backend transaction failed: {err}");
            err
        })
    }
}
