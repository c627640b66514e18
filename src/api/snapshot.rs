use std::collections::BTreeMap;

use crate::model::DocumentKey;
use crate::value::Value;

/// Read-only view of a single fetched document, captured at fetch time.
///
/// Snapshots never update in place; every fetch produces a new one. A missing
/// document is represented by `exists() == false`, indistinguishable from
/// "not yet created".
#[derive(Clone, Debug)]
pub struct DocumentSnapshot {
    key: DocumentKey,
    fields: Option<BTreeMap<String, Value>>,
}

impl DocumentSnapshot {
    pub fn new(key: DocumentKey, fields: Option<BTreeMap<String, Value>>) -> Self {
        Self { key, fields }
    }

    pub fn exists(&self) -> bool {
        self.fields.is_some()
    }

    /// The decoded document fields, or `None` when the document is missing.
    pub fn data(&self) -> Option<&BTreeMap<String, Value>> {
        self.fields.as_ref()
    }

    /// Convenience accessor for a single field.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.as_ref().and_then(|fields| fields.get(name))
    }

    pub fn id(&self) -> &str {
        self.key.id()
    }

    pub fn key(&self) -> &DocumentKey {
        &self.key
    }
}
