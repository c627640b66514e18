//! Read and write operations on documents: the coordinator that partitions
//! writes, performs merge pre-fetches, and assembles snapshots.

use std::collections::BTreeMap;

use log::{debug, warn};

use crate::api::database::DocStore;
use crate::api::operations::{self, SetOptions};
use crate::api::query::{Query, QuerySnapshot};
use crate::api::reference::{CollectionReference, DocumentReference};
use crate::api::snapshot::DocumentSnapshot;
use crate::backend::Row;
use crate::error::DocSqlResult;
use crate::model::DocumentKey;
use crate::translate;
use crate::value::Value;

impl DocStore {
    /// Fetches the referenced document. A missing document yields
    /// `exists() == false`, never an error.
    pub async fn get_doc(&self, reference: &DocumentReference) -> DocSqlResult<DocumentSnapshot> {
        self.get_doc_by_key(reference.key()).await
    }

    pub(crate) async fn get_doc_by_key(&self, key: &DocumentKey) -> DocSqlResult<DocumentSnapshot> {
        let target = self.schemas().route(key.path());
        let row = self.fetch_row(&target, key).await?;
        let fields = match row {
            Some(row) => Some(translate::decode_document_row(&target, &row)?.fields),
            None => None,
        };
        Ok(DocumentSnapshot::new(key.clone(), fields))
    }

    /// Executes the query and assembles a result snapshot.
    pub async fn get_docs(&self, query: &Query) -> DocSqlResult<QuerySnapshot> {
        let target = self.schemas().route(query.collection_path());
        let statement = translate::select_for_query(&target, query.definition());
        let rows = self.backend().query_rows(&statement).await?;

        let mut documents = Vec::with_capacity(rows.len());
        for row in &rows {
            let decoded = translate::decode_document_row(&target, row)?;
            let path = query.collection_path().child([decoded.id])?;
            let key = DocumentKey::from_path(path)?;
            documents.push(DocumentSnapshot::new(key, Some(decoded.fields)));
        }
        Ok(QuerySnapshot::new(query.clone(), documents))
    }

    /// Creates a document with a generated id and returns its reference.
    pub async fn add_doc(
        &self,
        collection: &CollectionReference,
        fields: BTreeMap<String, Value>,
    ) -> DocSqlResult<DocumentReference> {
        let reference = collection.doc(None)?;
        self.set_doc(&reference, fields, None).await?;
        Ok(reference)
    }

    /// Writes `fields` to the referenced document.
    ///
    /// Without merge, provided declared columns are set and the payload is
    /// replaced wholesale with the non-declared subset. With merge, the
    /// payload is shallow-merged with the existing payload; declared columns
    /// still overwrite unconditionally. A failed pre-merge fetch degrades to
    /// treating the prior state as empty.
    pub async fn set_doc(
        &self,
        reference: &DocumentReference,
        fields: BTreeMap<String, Value>,
        options: Option<SetOptions>,
    ) -> DocSqlResult<()> {
        let key = reference.key();
        let target = self.schemas().route(key.path());
        let mut write = operations::partition_fields(&target, fields);

        if options.unwrap_or_default().merge {
            let existing = match self.fetch_row(&target, key).await {
                Ok(Some(row)) => translate::decode_payload(&row)?,
                Ok(None) => BTreeMap::new(),
                Err(err) => {
                    warn!(
                        "merge pre-fetch for {} failed, proceeding with empty prior state: {err}",
                        key.path()
                    );
                    BTreeMap::new()
                }
            };
            write.payload = operations::merge_payload(existing, write.payload);
        }

        let payload = operations::payload_json(&write.payload)?;
        let statement = translate::upsert_document(&target, key, &write.columns, &payload);
        self.backend().execute(&statement).await?;
        Ok(())
    }

    /// Merge-writes `fields` into an existing document; a silent no-op when
    /// the document does not exist. Distinguishing update from upsert is the
    /// caller's contract, not enforced here.
    pub async fn update_doc(
        &self,
        reference: &DocumentReference,
        fields: BTreeMap<String, Value>,
    ) -> DocSqlResult<()> {
        let key = reference.key();
        let target = self.schemas().route(key.path());

        let existing = match self.fetch_row(&target, key).await {
            Ok(Some(row)) => translate::decode_payload(&row)?,
            Ok(None) => {
                debug!("update of missing document {} is a no-op", key.path());
                return Ok(());
            }
            Err(err) => {
                warn!(
                    "existence fetch for {} failed, treating update as a no-op: {err}",
                    key.path()
                );
                return Ok(());
            }
        };

        let mut write = operations::partition_fields(&target, fields);
        write.payload = operations::merge_payload(existing, write.payload);
        let payload = operations::payload_json(&write.payload)?;
        let statement = translate::upsert_document(&target, key, &write.columns, &payload);
        self.backend().execute(&statement).await?;
        Ok(())
    }

    /// Deletes the referenced document; deleting a missing document is not an
    /// error.
    pub async fn delete_doc(&self, reference: &DocumentReference) -> DocSqlResult<()> {
        let key = reference.key();
        let target = self.schemas().route(key.path());
        let statement = translate::delete_document(&target, key);
        self.backend().execute(&statement).await?;
        Ok(())
    }

    async fn fetch_row(
        &self,
        target: &crate::schema::TableTarget<'_>,
        key: &DocumentKey,
    ) -> DocSqlResult<Option<Row>> {
        let statement = translate::select_document(target, key);
        let mut rows = self.backend().query_rows(&statement).await?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.swap_remove(0))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::database::DocStore;
    use crate::backend::SqliteBackend;
    use crate::schema::{ColumnType, SchemaRegistry, TableSchema};
    use std::sync::Arc;

    async fn store() -> DocStore {
        let registry = SchemaRegistry::new().register(
            TableSchema::new("profiles", "profiles")
                .with_column("full_name", ColumnType::Text)
                .with_column("age", ColumnType::Integer),
        );
        let store = DocStore::new(
            Arc::new(SqliteBackend::open_in_memory().unwrap()),
            registry,
        );
        store.ensure_schema().await.unwrap();
        store
    }

    #[tokio::test]
    async fn set_then_get_generic_document() {
        let store = store().await;
        let doc = store.doc("cities/mumbai").unwrap();
        let mut fields = BTreeMap::new();
        fields.insert("name".to_string(), Value::from_string("Mumbai"));
        store.set_doc(&doc, fields, None).await.unwrap();

        let snapshot = store.get_doc(&doc).await.unwrap();
        assert!(snapshot.exists());
        assert_eq!(snapshot.field("name").and_then(Value::as_str), Some("Mumbai"));
    }

    #[tokio::test]
    async fn set_without_merge_replaces_payload() {
        let store = store().await;
        let doc = store.doc("cities/mumbai").unwrap();
        let mut first = BTreeMap::new();
        first.insert("a".to_string(), Value::from_integer(1));
        store.set_doc(&doc, first, None).await.unwrap();

        let mut second = BTreeMap::new();
        second.insert("b".to_string(), Value::from_integer(2));
        store.set_doc(&doc, second, None).await.unwrap();

        let snapshot = store.get_doc(&doc).await.unwrap();
        assert!(snapshot.field("a").is_none());
        assert_eq!(snapshot.field("b").and_then(Value::as_integer), Some(2));
    }

    #[tokio::test]
    async fn set_with_merge_keeps_existing_payload() {
        let store = store().await;
        let doc = store.doc("cities/mumbai").unwrap();
        let mut first = BTreeMap::new();
        first.insert("a".to_string(), Value::from_integer(1));
        store.set_doc(&doc, first, None).await.unwrap();

        let mut second = BTreeMap::new();
        second.insert("b".to_string(), Value::from_integer(2));
        store
            .set_doc(&doc, second, Some(SetOptions::merge()))
            .await
            .unwrap();

        let snapshot = store.get_doc(&doc).await.unwrap();
        assert_eq!(snapshot.field("a").and_then(Value::as_integer), Some(1));
        assert_eq!(snapshot.field("b").and_then(Value::as_integer), Some(2));
    }

    #[tokio::test]
    async fn update_missing_document_is_noop() {
        let store = store().await;
        let doc = store.doc("cities/nowhere").unwrap();
        let mut fields = BTreeMap::new();
        fields.insert("x".to_string(), Value::from_integer(1));
        store.update_doc(&doc, fields).await.unwrap();

        let snapshot = store.get_doc(&doc).await.unwrap();
        assert!(!snapshot.exists());
    }

    #[tokio::test]
    async fn dedicated_table_partitions_declared_fields() {
        let store = store().await;
        let doc = store.doc("profiles/p1").unwrap();
        let mut fields = BTreeMap::new();
        fields.insert("full_name".to_string(), Value::from_string("Asha"));
        fields.insert("age".to_string(), Value::from_integer(33));
        fields.insert("nickname".to_string(), Value::from_string("ash"));
        store.set_doc(&doc, fields, None).await.unwrap();

        let snapshot = store.get_doc(&doc).await.unwrap();
        assert_eq!(
            snapshot.field("full_name").and_then(Value::as_str),
            Some("Asha")
        );
        assert_eq!(snapshot.field("age").and_then(Value::as_integer), Some(33));
        assert_eq!(snapshot.field("nickname").and_then(Value::as_str), Some("ash"));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = store().await;
        let doc = store.doc("cities/mumbai").unwrap();
        let mut fields = BTreeMap::new();
        fields.insert("name".to_string(), Value::from_string("Mumbai"));
        store.set_doc(&doc, fields, None).await.unwrap();

        store.delete_doc(&doc).await.unwrap();
        store.delete_doc(&doc).await.unwrap();
        let snapshot = store.get_doc(&doc).await.unwrap();
        assert!(!snapshot.exists());
    }
}
