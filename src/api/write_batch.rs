use std::collections::BTreeMap;

use log::{debug, warn};

use crate::api::database::DocStore;
use crate::api::operations::{self, SetOptions};
use crate::api::reference::DocumentReference;
use crate::backend::SqlStatement;
use crate::error::{invalid_argument, resource_exhausted, DocSqlResult};
use crate::translate;
use crate::value::Value;

const MAX_BATCH_WRITES: usize = 500;

/// Aggregates write operations and commits them in one backend transaction:
/// either every queued statement applies or none do.
///
/// Merge pre-fetches happen at queue time, so the fetch-modify-write race of
/// single merge writes applies to batched ones as well.
pub struct WriteBatch {
    store: DocStore,
    statements: Vec<SqlStatement>,
}

impl WriteBatch {
    pub(crate) fn new(store: DocStore) -> Self {
        Self {
            store,
            statements: Vec::new(),
        }
    }

    /// Number of queued statements.
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Queues a set operation; merge semantics match
    /// [`DocStore::set_doc`](crate::DocStore::set_doc).
    pub async fn set(
        &mut self,
        reference: &DocumentReference,
        fields: BTreeMap<String, Value>,
        options: Option<SetOptions>,
    ) -> DocSqlResult<()> {
        self.ensure_capacity()?;
        self.ensure_same_store(reference)?;
        let key = reference.key();
        let target = self.store.schemas().route(key.path());
        let mut write = operations::partition_fields(&target, fields);

        if options.unwrap_or_default().merge {
            let existing = self
                .store
                .get_doc(reference)
                .await
                .ok()
                .and_then(|snapshot| snapshot.data().cloned())
                .map(|fields| {
                    // Only the payload share of the prior state merges; the
                    // declared share is overwritten by column updates.
                    operations::partition_fields(&target, fields).payload
                })
                .unwrap_or_default();
            write.payload = operations::merge_payload(existing, write.payload);
        }

        let payload = operations::payload_json(&write.payload)?;
        self.statements
            .push(translate::upsert_document(&target, key, &write.columns, &payload));
        Ok(())
    }

    /// Queues a merge write that is skipped outright when the document does
    /// not exist at queue time.
    pub async fn update(
        &mut self,
        reference: &DocumentReference,
        fields: BTreeMap<String, Value>,
    ) -> DocSqlResult<()> {
        self.ensure_capacity()?;
        self.ensure_same_store(reference)?;
        let snapshot = match self.store.get_doc(reference).await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(
                    "existence fetch for {} failed, skipping batched update: {err}",
                    reference.path()
                );
                return Ok(());
            }
        };
        if !snapshot.exists() {
            debug!(
                "batched update of missing document {} is a no-op",
                reference.path()
            );
            return Ok(());
        }
        self.set(reference, fields, Some(SetOptions::merge())).await
    }

    /// Queues a delete operation.
    pub fn delete(&mut self, reference: &DocumentReference) -> DocSqlResult<()> {
        self.ensure_capacity()?;
        self.ensure_same_store(reference)?;
        let key = reference.key();
        let target = self.store.schemas().route(key.path());
        self.statements.push(translate::delete_document(&target, key));
        Ok(())
    }

    /// Commits all queued writes atomically.
    pub async fn commit(self) -> DocSqlResult<()> {
        if self.statements.is_empty() {
            return Ok(());
        }
        self.store
            .backend()
            .execute_transaction(self.statements)
            .await
    }

    fn ensure_same_store(&self, reference: &DocumentReference) -> DocSqlResult<()> {
        if !self.store.same_store(reference.store()) {
            return Err(invalid_argument(
                "All WriteBatch operations must target the same store",
            ));
        }
        Ok(())
    }

    fn ensure_capacity(&self) -> DocSqlResult<()> {
        if self.statements.len() >= MAX_BATCH_WRITES {
            return Err(resource_exhausted(format!(
                "WriteBatch cannot contain more than {MAX_BATCH_WRITES} operations"
            )));
        }
        Ok(())
    }
}
