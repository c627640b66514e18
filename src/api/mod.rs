pub mod database;
pub mod document;
pub mod listen;
pub mod operations;
pub mod query;
pub mod reference;
pub mod snapshot;
pub mod write_batch;

pub use database::{DocStore, DocStoreSettings, DEFAULT_POLL_INTERVAL};
pub use listen::{ListenerRegistration, SnapshotObserver};
pub use operations::SetOptions;
pub use query::{
    FieldFilter, FilterOperator, OrderBy, OrderDirection, Query, QueryDefinition, QuerySnapshot,
};
pub use reference::{CollectionReference, DocumentReference};
pub use snapshot::DocumentSnapshot;
pub use write_batch::WriteBatch;
