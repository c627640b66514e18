//! docsql is a document-store compatibility layer: application code written
//! against a hierarchical collection/document API (path-addressed references,
//! declarative filter/sort/limit queries, partial-merge writes, polled "live"
//! subscriptions) executes against a relational backend.
//!
//! Documents route per root collection to either a dedicated typed table or
//! one shared generic table; fields not promoted to declared columns live in
//! a side-car JSON payload column. See [`DocStore`] for the entry point.

pub mod api;
pub mod backend;
pub mod error;
pub mod model;
pub mod schema;
pub mod storage;
pub mod translate;
pub mod util;
pub mod value;

pub use api::{
    CollectionReference, DocStore, DocStoreSettings, DocumentReference, DocumentSnapshot,
    FilterOperator, ListenerRegistration, OrderDirection, Query, QuerySnapshot, SetOptions,
    SnapshotObserver, WriteBatch, DEFAULT_POLL_INTERVAL,
};
pub use backend::{RelationalBackend, Row, SqlStatement, SqlValue, SqliteBackend};
pub use error::{DocSqlError, DocSqlErrorCode, DocSqlResult};
pub use model::{DocumentKey, ResourcePath, Timestamp};
pub use schema::{ColumnSpec, ColumnType, SchemaRegistry, TableSchema, TableTarget};
pub use storage::{MemoryObjectStorage, ObjectStorage, StorageRef};
pub use util::TtlCache;
pub use value::{Value, ValueKind};
