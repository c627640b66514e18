//! Translates declarative filter/order/limit constraints and write payloads
//! into backend statements.
//!
//! A filter field is resolved per the storage router: declared fields compare
//! as typed columns; everything else is extracted from the payload column and
//! compared as text. Text comparison of numeric payload fields is
//! lexicographic; that is part of the compatibility contract, not a defect
//! to paper over here.

use std::collections::BTreeMap;

use crate::api::query::QueryDefinition;
use crate::backend::{Row, SqlStatement, SqlValue};
use crate::error::{serialization_error, DocSqlResult};
use crate::model::{DocumentKey, Timestamp};
use crate::schema::{ColumnType, TableTarget};
use crate::value::{fields_from_json, value_to_json, Value, ValueKind};

/// A decoded result row: the document id plus its assembled field map.
#[derive(Clone, Debug)]
pub struct DecodedDocument {
    pub id: String,
    pub fields: BTreeMap<String, Value>,
}

pub fn select_document(target: &TableTarget<'_>, key: &DocumentKey) -> SqlStatement {
    match target {
        TableTarget::Dedicated(schema) => {
            let mut columns = vec!["\"id\"".to_string()];
            for column in schema.columns() {
                columns.push(format!("\"{}\"", column.name()));
            }
            columns.push("\"payload\"".to_string());
            SqlStatement::new(
                format!(
                    "SELECT {} FROM \"{}\" WHERE \"id\" = ?",
                    columns.join(", "),
                    schema.table()
                ),
                vec![SqlValue::Text(key.id().to_string())],
            )
        }
        TableTarget::Generic => SqlStatement::new(
            format!(
                "SELECT \"doc_id\", \"payload\" FROM \"{}\" \
                 WHERE \"collection_path\" = ? AND \"doc_id\" = ?",
                target.table_name()
            ),
            vec![
                SqlValue::Text(key.collection_path().canonical_string()),
                SqlValue::Text(key.id().to_string()),
            ],
        ),
    }
}

pub fn select_for_query(target: &TableTarget<'_>, definition: &QueryDefinition) -> SqlStatement {
    let mut conditions: Vec<String> = Vec::new();
    let mut params: Vec<SqlValue> = Vec::new();

    let select_list = match target {
        TableTarget::Dedicated(schema) => {
            let mut columns = vec!["\"id\"".to_string()];
            for column in schema.columns() {
                columns.push(format!("\"{}\"", column.name()));
            }
            columns.push("\"payload\"".to_string());
            columns.join(", ")
        }
        TableTarget::Generic => {
            conditions.push("\"collection_path\" = ?".to_string());
            params.push(SqlValue::Text(
                definition.collection_path().canonical_string(),
            ));
            "\"doc_id\", \"payload\"".to_string()
        }
    };

    // Constraints translate in composition order so repeated runs produce the
    // same backend call.
    for filter in definition.filters() {
        let declared = match target {
            TableTarget::Dedicated(schema) => schema.column(filter.field()),
            TableTarget::Generic => None,
        };
        match declared {
            Some(column) => {
                conditions.push(format!(
                    "\"{}\" {} ?",
                    column.name(),
                    filter.operator().sql()
                ));
                params.push(param_for_column(column.column_type(), filter.value()));
            }
            None => {
                conditions.push(format!(
                    "CAST(json_extract(\"payload\", ?) AS TEXT) {} ?",
                    filter.operator().sql()
                ));
                params.push(SqlValue::Text(json_path(filter.field())));
                params.push(SqlValue::Text(text_form(filter.value())));
            }
        }
    }

    let mut sql = format!("SELECT {} FROM \"{}\"", select_list, target.table_name());
    if !conditions.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }

    // No implicit default ordering: absent orderings, row order is whatever
    // the backend yields.
    let mut order_terms: Vec<String> = Vec::new();
    for order in definition.orderings() {
        let declared = match target {
            TableTarget::Dedicated(schema) => schema.column(order.field()),
            TableTarget::Generic => None,
        };
        match declared {
            Some(column) => {
                order_terms.push(format!("\"{}\" {}", column.name(), order.direction().sql()));
            }
            None => {
                order_terms.push(format!(
                    "CAST(json_extract(\"payload\", ?) AS TEXT) {}",
                    order.direction().sql()
                ));
                params.push(SqlValue::Text(json_path(order.field())));
            }
        }
    }
    if !order_terms.is_empty() {
        sql.push_str(" ORDER BY ");
        sql.push_str(&order_terms.join(", "));
    }

    if let Some(limit) = definition.limit() {
        sql.push_str(&format!(" LIMIT {limit}"));
    }

    SqlStatement::new(sql, params)
}

pub fn upsert_document(
    target: &TableTarget<'_>,
    key: &DocumentKey,
    columns: &[(String, SqlValue)],
    payload_json: &str,
) -> SqlStatement {
    match target {
        TableTarget::Dedicated(schema) => {
            let mut names = vec!["\"id\"".to_string()];
            let mut params = vec![SqlValue::Text(key.id().to_string())];
            for (name, value) in columns {
                names.push(format!("\"{name}\""));
                params.push(value.clone());
            }
            names.push("\"payload\"".to_string());
            params.push(SqlValue::Text(payload_json.to_string()));

            let placeholders = vec!["?"; names.len()].join(", ");
            let mut updates: Vec<String> = columns
                .iter()
                .map(|(name, _)| format!("\"{name}\" = excluded.\"{name}\""))
                .collect();
            updates.push("\"payload\" = excluded.\"payload\"".to_string());

            SqlStatement::new(
                format!(
                    "INSERT INTO \"{}\" ({}) VALUES ({}) \
                     ON CONFLICT(\"id\") DO UPDATE SET {}",
                    schema.table(),
                    names.join(", "),
                    placeholders,
                    updates.join(", ")
                ),
                params,
            )
        }
        TableTarget::Generic => SqlStatement::new(
            format!(
                "INSERT INTO \"{}\" (\"collection_path\", \"doc_id\", \"payload\") \
                 VALUES (?, ?, ?) \
                 ON CONFLICT(\"collection_path\", \"doc_id\") \
                 DO UPDATE SET \"payload\" = excluded.\"payload\"",
                target.table_name()
            ),
            vec![
                SqlValue::Text(key.collection_path().canonical_string()),
                SqlValue::Text(key.id().to_string()),
                SqlValue::Text(payload_json.to_string()),
            ],
        ),
    }
}

pub fn delete_document(target: &TableTarget<'_>, key: &DocumentKey) -> SqlStatement {
    match target {
        TableTarget::Dedicated(schema) => SqlStatement::new(
            format!("DELETE FROM \"{}\" WHERE \"id\" = ?", schema.table()),
            vec![SqlValue::Text(key.id().to_string())],
        ),
        TableTarget::Generic => SqlStatement::new(
            format!(
                "DELETE FROM \"{}\" WHERE \"collection_path\" = ? AND \"doc_id\" = ?",
                target.table_name()
            ),
            vec![
                SqlValue::Text(key.collection_path().canonical_string()),
                SqlValue::Text(key.id().to_string()),
            ],
        ),
    }
}

/// Reassembles a fetched row into document fields: the payload JSON first,
/// then declared columns layered on top (the two never share a field name).
pub fn decode_document_row(target: &TableTarget<'_>, row: &Row) -> DocSqlResult<DecodedDocument> {
    let id_column = match target {
        TableTarget::Dedicated(_) => "id",
        TableTarget::Generic => "doc_id",
    };
    let id = row
        .get(id_column)
        .and_then(SqlValue::as_text)
        .ok_or_else(|| serialization_error(format!("Row is missing the {id_column} column")))?
        .to_string();

    let mut fields = decode_payload(row)?;

    if let TableTarget::Dedicated(schema) = target {
        for column in schema.columns() {
            let Some(cell) = row.get(column.name()) else {
                continue;
            };
            if let Some(value) = column_value(column.column_type(), cell) {
                fields.insert(column.name().to_string(), value);
            }
        }
    }

    Ok(DecodedDocument { id, fields })
}

/// Decodes just the payload column; used by merge writes to fetch prior state.
pub fn decode_payload(row: &Row) -> DocSqlResult<BTreeMap<String, Value>> {
    let raw = match row.get("payload") {
        Some(SqlValue::Text(raw)) => raw.as_str(),
        Some(SqlValue::Null) | None => return Ok(BTreeMap::new()),
        Some(other) => {
            return Err(serialization_error(format!(
                "Payload column has non-text type: {other:?}"
            )))
        }
    };
    let json: serde_json::Value =
        serde_json::from_str(raw).map_err(|err| serialization_error(err.to_string()))?;
    fields_from_json(&json)
}

/// SQLite JSON path for a payload field, passed as a bound parameter.
fn json_path(field: &str) -> String {
    format!("$.\"{field}\"")
}

/// The text form a payload value compares as, matching what
/// `CAST(json_extract(..) AS TEXT)` yields for the stored JSON.
pub fn text_form(value: &Value) -> String {
    match value.kind() {
        ValueKind::Null => "null".to_string(),
        ValueKind::Boolean(inner) => if *inner { "1" } else { "0" }.to_string(),
        ValueKind::Integer(inner) => inner.to_string(),
        ValueKind::Double(inner) => {
            // SQLite renders integral reals with a trailing ".0"; Rust's
            // default formatting drops it and would never match.
            if inner.is_finite() && inner.fract() == 0.0 {
                format!("{inner:.1}")
            } else {
                inner.to_string()
            }
        }
        ValueKind::Timestamp(inner) => inner.to_rfc3339(),
        ValueKind::String(inner) => inner.clone(),
        ValueKind::Array(_) | ValueKind::Map(_) => value_to_json(value).to_string(),
    }
}

/// Typed parameter for a declared column.
pub fn param_for_column(column_type: ColumnType, value: &Value) -> SqlValue {
    match (column_type, value.kind()) {
        (_, ValueKind::Null) => SqlValue::Null,
        (ColumnType::Boolean, ValueKind::Boolean(inner)) => SqlValue::Integer(*inner as i64),
        (ColumnType::Integer, ValueKind::Integer(inner)) => SqlValue::Integer(*inner),
        (ColumnType::Integer, ValueKind::Boolean(inner)) => SqlValue::Integer(*inner as i64),
        (ColumnType::Real, ValueKind::Double(inner)) => SqlValue::Real(*inner),
        (ColumnType::Real, ValueKind::Integer(inner)) => SqlValue::Real(*inner as f64),
        (ColumnType::Timestamp, ValueKind::Timestamp(inner)) => SqlValue::Text(inner.to_rfc3339()),
        (ColumnType::Text, ValueKind::String(inner)) => SqlValue::Text(inner.clone()),
        _ => SqlValue::Text(text_form(value)),
    }
}

fn column_value(column_type: ColumnType, cell: &SqlValue) -> Option<Value> {
    match (column_type, cell) {
        (_, SqlValue::Null) => None,
        (ColumnType::Boolean, SqlValue::Integer(inner)) => Some(Value::from_bool(*inner != 0)),
        (ColumnType::Real, SqlValue::Integer(inner)) => Some(Value::from_double(*inner as f64)),
        (_, SqlValue::Integer(inner)) => Some(Value::from_integer(*inner)),
        (_, SqlValue::Real(inner)) => Some(Value::from_double(*inner)),
        (_, SqlValue::Text(inner)) => Some(match Timestamp::parse_rfc3339(inner) {
            Some(timestamp) => Value::from_timestamp(timestamp),
            None => Value::from_string(inner.clone()),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::query::{FilterOperator, OrderDirection, QueryDefinition};
    use crate::model::ResourcePath;
    use crate::schema::{ColumnType, SchemaRegistry, TableSchema};

    fn registry() -> SchemaRegistry {
        SchemaRegistry::new().register(
            TableSchema::new("profiles", "profiles")
                .with_column("full_name", ColumnType::Text)
                .with_column("age", ColumnType::Integer),
        )
    }

    fn definition(path: &str) -> QueryDefinition {
        QueryDefinition::new(ResourcePath::from_string(path).unwrap())
    }

    #[test]
    fn generic_query_filters_compare_as_text() {
        let registry = registry();
        let path = ResourcePath::from_string("cities").unwrap();
        let target = registry.route(&path);
        let mut definition = definition("cities");
        definition.push_filter(
            "enabled".to_string(),
            FilterOperator::Equal,
            Value::from_bool(true),
        );
        let statement = select_for_query(&target, &definition);
        assert!(statement.sql.contains("json_extract"));
        assert!(statement.sql.contains("CAST"));
        assert_eq!(
            statement.params.last(),
            Some(&SqlValue::Text("1".to_string()))
        );
    }

    #[test]
    fn double_operands_match_sqlite_real_text() {
        assert_eq!(text_form(&Value::from_double(1.0)), "1.0");
        assert_eq!(text_form(&Value::from_double(-3.0)), "-3.0");
        assert_eq!(text_form(&Value::from_double(2.5)), "2.5");
    }

    #[test]
    fn declared_field_filters_use_typed_columns() {
        let registry = registry();
        let path = ResourcePath::from_string("profiles").unwrap();
        let target = registry.route(&path);
        let mut definition = definition("profiles");
        definition.push_filter(
            "age".to_string(),
            FilterOperator::GreaterThanOrEqual,
            Value::from_integer(21),
        );
        let statement = select_for_query(&target, &definition);
        assert!(statement.sql.contains("\"age\" >= ?"));
        assert!(!statement.sql.contains("json_extract"));
        assert_eq!(statement.params.last(), Some(&SqlValue::Integer(21)));
    }

    #[test]
    fn orderings_and_limit_append_in_sequence() {
        let registry = registry();
        let path = ResourcePath::from_string("cities").unwrap();
        let target = registry.route(&path);
        let mut definition = definition("cities");
        definition.push_ordering("name".to_string(), OrderDirection::Ascending);
        definition.push_ordering("rank".to_string(), OrderDirection::Descending);
        definition.set_limit(5);
        let statement = select_for_query(&target, &definition);
        let order_at = statement.sql.find("ORDER BY").unwrap();
        let limit_at = statement.sql.find("LIMIT 5").unwrap();
        assert!(order_at < limit_at);
        assert!(statement.sql.contains("ASC"));
        assert!(statement.sql.contains("DESC"));
    }

    #[test]
    fn decode_layers_declared_columns_over_payload() {
        let registry = registry();
        let path = ResourcePath::from_string("profiles/p1").unwrap();
        let target = registry.route(&path);
        let row = Row::new(vec![
            ("id".to_string(), SqlValue::Text("p1".to_string())),
            ("full_name".to_string(), SqlValue::Text("Asha".to_string())),
            ("age".to_string(), SqlValue::Integer(33)),
            (
                "payload".to_string(),
                SqlValue::Text(r#"{"nickname":"ash"}"#.to_string()),
            ),
        ]);
        let decoded = decode_document_row(&target, &row).unwrap();
        assert_eq!(decoded.id, "p1");
        assert_eq!(
            decoded.fields.get("full_name").and_then(Value::as_str),
            Some("Asha")
        );
        assert_eq!(
            decoded.fields.get("age").and_then(Value::as_integer),
            Some(33)
        );
        assert_eq!(
            decoded.fields.get("nickname").and_then(Value::as_str),
            Some("ash")
        );
    }

    #[test]
    fn null_declared_columns_stay_absent() {
        let registry = registry();
        let path = ResourcePath::from_string("profiles/p1").unwrap();
        let target = registry.route(&path);
        let row = Row::new(vec![
            ("id".to_string(), SqlValue::Text("p1".to_string())),
            ("full_name".to_string(), SqlValue::Null),
            ("age".to_string(), SqlValue::Null),
            ("payload".to_string(), SqlValue::Text("{}".to_string())),
        ]);
        let decoded = decode_document_row(&target, &row).unwrap();
        assert!(decoded.fields.is_empty());
    }
}
