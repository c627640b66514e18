//! Write-side helpers: field partitioning between declared columns and the
//! payload, shallow merges, and payload encoding.

use std::collections::BTreeMap;

use crate::backend::SqlValue;
use crate::error::DocSqlResult;
use crate::schema::TableTarget;
use crate::translate;
use crate::value::{fields_to_json, Value};

/// Options for `set_doc` writes.
#[derive(Clone, Copy, Debug, Default)]
pub struct SetOptions {
    /// When `true`, the payload is shallow-merged into the existing payload
    /// instead of replacing it wholesale. Declared columns overwrite
    /// unconditionally either way.
    pub merge: bool,
}

impl SetOptions {
    pub fn merge() -> Self {
        Self { merge: true }
    }
}

/// A write split into its two destinations.
#[derive(Clone, Debug)]
pub(crate) struct PartitionedWrite {
    /// Declared columns actually provided, as typed parameters.
    pub columns: Vec<(String, SqlValue)>,
    /// Everything else, bound for the payload column.
    pub payload: BTreeMap<String, Value>,
}

/// Splits `fields` between declared columns and the payload. Membership is a
/// pure function of (root collection, field name); a field never lands in
/// both.
pub(crate) fn partition_fields(
    target: &TableTarget<'_>,
    fields: BTreeMap<String, Value>,
) -> PartitionedWrite {
    let mut columns = Vec::new();
    let mut payload = BTreeMap::new();
    for (name, value) in fields {
        let declared = match target {
            TableTarget::Dedicated(schema) => schema.column(&name),
            TableTarget::Generic => None,
        };
        match declared {
            Some(column) => {
                columns.push((
                    name,
                    translate::param_for_column(column.column_type(), &value),
                ));
            }
            None => {
                payload.insert(name, value);
            }
        }
    }
    PartitionedWrite { columns, payload }
}

/// Shallow key-by-key merge: incoming keys win, untouched keys survive.
pub(crate) fn merge_payload(
    existing: BTreeMap<String, Value>,
    incoming: BTreeMap<String, Value>,
) -> BTreeMap<String, Value> {
    let mut merged = existing;
    for (key, value) in incoming {
        merged.insert(key, value);
    }
    merged
}

pub(crate) fn payload_json(payload: &BTreeMap<String, Value>) -> DocSqlResult<String> {
    Ok(fields_to_json(payload).to_string())
}
