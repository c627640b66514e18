use std::fmt::{Display, Formatter};

use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};

use crate::api::database::DocStore;
use crate::api::query::Query;
use crate::error::{invalid_argument, DocSqlResult};
use crate::model::{DocumentKey, ResourcePath};

/// A typed pointer to a collection location.
///
/// Two references are equal iff their joined paths are equal; the owning
/// store handle does not participate.
#[derive(Clone, Debug)]
pub struct CollectionReference {
    store: DocStore,
    path: ResourcePath,
}

impl CollectionReference {
    pub(crate) fn new(store: DocStore, path: ResourcePath) -> DocSqlResult<Self> {
        if path.is_empty() || path.len() % 2 == 0 {
            return Err(invalid_argument(
                "Collection references must point to a collection (odd number of segments)",
            ));
        }
        Ok(Self { store, path })
    }

    pub fn store(&self) -> &DocStore {
        &self.store
    }

    /// The full path of the collection (e.g. `users/u1/orders`).
    pub fn path(&self) -> &ResourcePath {
        &self.path
    }

    /// The last segment of the collection path.
    pub fn id(&self) -> &str {
        self.path
            .last_segment()
            .expect("Collection path always has id")
    }

    /// The document that logically contains this collection, if any.
    pub fn parent(&self) -> Option<DocumentReference> {
        self.path.pop_last().and_then(|parent_path| {
            if parent_path.is_empty() {
                return None;
            }
            DocumentReference::new(self.store.clone(), parent_path).ok()
        })
    }

    /// Returns a reference to the document identified by `document_id`, or a
    /// freshly generated auto-ID when `None`.
    pub fn doc(&self, document_id: Option<&str>) -> DocSqlResult<DocumentReference> {
        let id = match document_id {
            Some(id) => {
                if id.contains('/') {
                    return Err(invalid_argument("Document ID cannot contain '/'."));
                }
                id.to_string()
            }
            None => generate_auto_id(),
        };
        let path = self.path.child([id])?;
        DocumentReference::new(self.store.clone(), path)
    }

    /// Creates a query that targets this collection.
    pub fn query(&self) -> Query {
        Query::new(self.store.clone(), self.path.clone())
            .expect("CollectionReference always points to a valid collection")
    }
}

impl PartialEq for CollectionReference {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for CollectionReference {}

impl Display for CollectionReference {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "CollectionReference({})", self.path.canonical_string())
    }
}

/// A typed pointer to a document location.
#[derive(Clone, Debug)]
pub struct DocumentReference {
    store: DocStore,
    key: DocumentKey,
}

impl DocumentReference {
    pub(crate) fn new(store: DocStore, path: ResourcePath) -> DocSqlResult<Self> {
        let key = DocumentKey::from_path(path)?;
        Ok(Self { store, key })
    }

    pub fn store(&self) -> &DocStore {
        &self.store
    }

    /// The document identifier (the last segment of its path).
    pub fn id(&self) -> &str {
        self.key.id()
    }

    pub fn path(&self) -> &ResourcePath {
        self.key.path()
    }

    pub(crate) fn key(&self) -> &DocumentKey {
        &self.key
    }

    /// The parent collection containing this document.
    pub fn parent(&self) -> CollectionReference {
        CollectionReference::new(self.store.clone(), self.key.collection_path())
            .expect("Document parent path is always a collection")
    }

    /// Returns a reference to a subcollection rooted at this document.
    pub fn collection(&self, path: &str) -> DocSqlResult<CollectionReference> {
        let sub_path = ResourcePath::from_string(path)?;
        if sub_path.is_empty() {
            return Err(invalid_argument("Subcollection path must be non-empty"));
        }
        let full_path = self.key.path().child(sub_path.as_vec().clone())?;
        CollectionReference::new(self.store.clone(), full_path)
    }
}

impl PartialEq for DocumentReference {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for DocumentReference {}

impl Display for DocumentReference {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "DocumentReference({})",
            self.key.path().canonical_string()
        )
    }
}

/// Millis-since-epoch concatenated with a random alphanumeric suffix.
///
/// Not monotonic and not collision-free under high concurrency; acceptable
/// for the load this layer serves.
fn generate_auto_id() -> String {
    let suffix: String = thread_rng()
        .sample_iter(&Alphanumeric)
        .map(char::from)
        .take(6)
        .collect();
    format!("{}{}", Utc::now().timestamp_millis(), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::database::DocStore;
    use crate::backend::SqliteBackend;
    use crate::schema::SchemaRegistry;
    use std::sync::Arc;

    fn store() -> DocStore {
        DocStore::new(
            Arc::new(SqliteBackend::open_in_memory().unwrap()),
            SchemaRegistry::new(),
        )
    }

    #[test]
    fn collection_and_document_roundtrip() {
        let store = store();
        let collection = store.collection("cities").unwrap();
        assert_eq!(collection.id(), "cities");
        let document = collection.doc(Some("mumbai")).unwrap();
        assert_eq!(document.id(), "mumbai");
        assert_eq!(document.parent().id(), "cities");
    }

    #[test]
    fn auto_id_generation() {
        let store = store();
        let collection = store.collection("cities").unwrap();
        let document = collection.doc(None).unwrap();
        assert_eq!(document.parent().id(), "cities");
        assert!(document.id().len() > 6);
        assert!(!document.id().contains('/'));
    }

    #[test]
    fn same_segments_compare_equal() {
        let store = store();
        let left = store.doc("cities/mumbai").unwrap();
        let right = store.collection("cities").unwrap().doc(Some("mumbai")).unwrap();
        assert_eq!(left, right);
    }

    #[test]
    fn subcollection_paths_nest() {
        let store = store();
        let document = store.doc("users/u1").unwrap();
        let orders = document.collection("orders").unwrap();
        assert_eq!(orders.path().canonical_string(), "users/u1/orders");
        assert_eq!(orders.parent().unwrap().id(), "u1");
    }

    #[test]
    fn rejects_slash_in_document_id() {
        let store = store();
        let collection = store.collection("cities").unwrap();
        let err = collection.doc(Some("a/b")).unwrap_err();
        assert_eq!(err.code_str(), "docsql/invalid-argument");
    }
}
