use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::api::reference::{CollectionReference, DocumentReference};
use crate::api::write_batch::WriteBatch;
use crate::backend::{RelationalBackend, SqlStatement};
use crate::error::DocSqlResult;
use crate::model::ResourcePath;
use crate::schema::SchemaRegistry;

/// Interval between polls for emulated "live" subscriptions.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

#[derive(Clone, Debug)]
pub struct DocStoreSettings {
    /// How often active listeners re-fetch their target.
    pub poll_interval: Duration,
}

impl Default for DocStoreSettings {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Entry point of the compatibility layer: owns the backend handle, the
/// storage routing table, and listener settings.
///
/// Cheap to clone; all clones share the same backend connection.
#[derive(Clone)]
pub struct DocStore {
    inner: Arc<DocStoreInner>,
}

struct DocStoreInner {
    backend: Arc<dyn RelationalBackend>,
    schemas: SchemaRegistry,
    settings: DocStoreSettings,
}

impl DocStore {
    pub fn new(backend: Arc<dyn RelationalBackend>, schemas: SchemaRegistry) -> Self {
        Self::with_settings(backend, schemas, DocStoreSettings::default())
    }

    pub fn with_settings(
        backend: Arc<dyn RelationalBackend>,
        schemas: SchemaRegistry,
        settings: DocStoreSettings,
    ) -> Self {
        Self {
            inner: Arc::new(DocStoreInner {
                backend,
                schemas,
                settings,
            }),
        }
    }

    pub fn backend(&self) -> &Arc<dyn RelationalBackend> {
        &self.inner.backend
    }

    pub fn schemas(&self) -> &SchemaRegistry {
        &self.inner.schemas
    }

    pub fn poll_interval(&self) -> Duration {
        self.inner.settings.poll_interval
    }

    /// Creates the generic table and every registered dedicated table if they
    /// do not exist yet.
    pub async fn ensure_schema(&self) -> DocSqlResult<()> {
        let statements: Vec<SqlStatement> = self
            .inner
            .schemas
            .bootstrap_sql()
            .into_iter()
            .map(|sql| SqlStatement::new(sql, Vec::new()))
            .collect();
        self.inner.backend.execute_transaction(statements).await
    }

    /// Returns a reference to the collection at `path`.
    pub fn collection(&self, path: &str) -> DocSqlResult<CollectionReference> {
        let resource = ResourcePath::from_string(path)?;
        CollectionReference::new(self.clone(), resource)
    }

    /// Returns a reference to the document at `path`; the final segment is the
    /// document id.
    pub fn doc(&self, path: &str) -> DocSqlResult<DocumentReference> {
        let resource = ResourcePath::from_string(path)?;
        DocumentReference::new(self.clone(), resource)
    }

    /// Starts an empty write batch targeting this store.
    pub fn batch(&self) -> WriteBatch {
        WriteBatch::new(self.clone())
    }

    pub(crate) fn same_store(&self, other: &DocStore) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for DocStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocStore")
            .field("poll_interval", &self.inner.settings.poll_interval)
            .finish()
    }
}
