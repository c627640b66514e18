//! Codec between the document value tree and the JSON payload column.
//!
//! Timestamps are persisted as RFC 3339 strings. On the way back, any string
//! that parses as a full RFC 3339 datetime is rehydrated into a [`Timestamp`];
//! the check is purely syntactic, so a non-temporal string shaped like a
//! datetime is indistinguishable from a real one.

use std::collections::BTreeMap;

use serde_json::{json, Map, Number, Value as JsonValue};

use crate::error::{serialization_error, DocSqlResult};
use crate::model::Timestamp;
use crate::value::{Value, ValueKind};

pub fn value_to_json(value: &Value) -> JsonValue {
    match value.kind() {
        ValueKind::Null => JsonValue::Null,
        ValueKind::Boolean(inner) => JsonValue::Bool(*inner),
        ValueKind::Integer(inner) => JsonValue::Number(Number::from(*inner)),
        ValueKind::Double(inner) => json!(*inner),
        ValueKind::Timestamp(inner) => JsonValue::String(inner.to_rfc3339()),
        ValueKind::String(inner) => JsonValue::String(inner.clone()),
        ValueKind::Array(inner) => {
            JsonValue::Array(inner.values().iter().map(value_to_json).collect())
        }
        ValueKind::Map(inner) => {
            let mut object = Map::new();
            for (key, child) in inner.fields() {
                object.insert(key.clone(), value_to_json(child));
            }
            JsonValue::Object(object)
        }
    }
}

pub fn json_to_value(json: &JsonValue) -> Value {
    match json {
        JsonValue::Null => Value::null(),
        JsonValue::Bool(inner) => Value::from_bool(*inner),
        JsonValue::Number(inner) => match inner.as_i64() {
            Some(integer) => Value::from_integer(integer),
            None => Value::from_double(inner.as_f64().unwrap_or(0.0)),
        },
        JsonValue::String(inner) => match Timestamp::parse_rfc3339(inner) {
            Some(timestamp) => Value::from_timestamp(timestamp),
            None => Value::from_string(inner.clone()),
        },
        JsonValue::Array(items) => Value::from_array(items.iter().map(json_to_value).collect()),
        JsonValue::Object(object) => {
            let mut fields = BTreeMap::new();
            for (key, child) in object {
                fields.insert(key.clone(), json_to_value(child));
            }
            Value::from_map(fields)
        }
    }
}

pub fn fields_to_json(fields: &BTreeMap<String, Value>) -> JsonValue {
    let mut object = Map::new();
    for (key, value) in fields {
        object.insert(key.clone(), value_to_json(value));
    }
    JsonValue::Object(object)
}

pub fn fields_from_json(json: &JsonValue) -> DocSqlResult<BTreeMap<String, Value>> {
    let object = json
        .as_object()
        .ok_or_else(|| serialization_error("Document payload must be a JSON object"))?;
    let mut fields = BTreeMap::new();
    for (key, child) in object {
        fields.insert(key.clone(), json_to_value(child));
    }
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars_roundtrip() {
        let mut fields = BTreeMap::new();
        fields.insert("name".to_string(), Value::from_string("Mumbai"));
        fields.insert("enabled".to_string(), Value::from_bool(true));
        fields.insert("population".to_string(), Value::from_integer(20_000_000));
        let encoded = fields_to_json(&fields);
        let decoded = fields_from_json(&encoded).unwrap();
        assert_eq!(decoded, fields);
    }

    #[test]
    fn timestamps_rehydrate_by_shape() {
        let timestamp = Timestamp::new(1_700_000_000, 0);
        let mut fields = BTreeMap::new();
        fields.insert("created_at".to_string(), Value::from_timestamp(timestamp));
        let encoded = fields_to_json(&fields);
        let decoded = fields_from_json(&encoded).unwrap();
        assert_eq!(
            decoded.get("created_at").and_then(Value::as_timestamp),
            Some(timestamp)
        );
    }

    #[test]
    fn plain_strings_stay_strings() {
        let decoded = json_to_value(&JsonValue::String("Mumbai".to_string()));
        assert_eq!(decoded.as_str(), Some("Mumbai"));
    }

    #[test]
    fn nested_structures_roundtrip() {
        let mut inner = BTreeMap::new();
        inner.insert("floor".to_string(), Value::from_integer(3));
        let mut fields = BTreeMap::new();
        fields.insert("address".to_string(), Value::from_map(inner));
        fields.insert(
            "tags".to_string(),
            Value::from_array(vec![Value::from_string("a"), Value::from_string("b")]),
        );
        let encoded = fields_to_json(&fields);
        let decoded = fields_from_json(&encoded).unwrap();
        assert_eq!(decoded, fields);
    }

    #[test]
    fn rejects_non_object_payload() {
        let err = fields_from_json(&JsonValue::Array(Vec::new())).unwrap_err();
        assert_eq!(err.code_str(), "docsql/serialization");
    }
}
