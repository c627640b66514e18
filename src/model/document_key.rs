use crate::error::{invalid_argument, DocSqlResult};
use crate::model::ResourcePath;

/// Identifies a single document: an alternating collection/document path with
/// an even number of segments, the last of which is the document id.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DocumentKey {
    path: ResourcePath,
}

impl DocumentKey {
    pub fn from_path(path: ResourcePath) -> DocSqlResult<Self> {
        if path.len() < 2 || path.len() % 2 != 0 {
            return Err(invalid_argument(
                "Document keys must point to a document (even number of segments)",
            ));
        }
        Ok(Self { path })
    }

    pub fn from_string(path: &str) -> DocSqlResult<Self> {
        let resource = ResourcePath::from_string(path)?;
        Self::from_path(resource)
    }

    /// The collection that contains this document.
    pub fn collection_path(&self) -> ResourcePath {
        self.path.without_last()
    }

    /// The root collection name, used for storage routing.
    pub fn root_collection(&self) -> &str {
        self.path
            .first_segment()
            .expect("DocumentKey path is never empty")
    }

    pub fn path(&self) -> &ResourcePath {
        &self.path
    }

    pub fn id(&self) -> &str {
        self.path
            .last_segment()
            .expect("DocumentKey path always has id")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_even_segments() {
        let err = DocumentKey::from_string("cities").unwrap_err();
        assert_eq!(err.code_str(), "docsql/invalid-argument");
    }

    #[test]
    fn parses_valid_path() {
        let key = DocumentKey::from_string("cities/mumbai").unwrap();
        assert_eq!(key.id(), "mumbai");
        assert_eq!(key.root_collection(), "cities");
        assert_eq!(key.collection_path().canonical_string(), "cities");
    }

    #[test]
    fn nested_document_key() {
        let key = DocumentKey::from_string("users/u1/orders/o7").unwrap();
        assert_eq!(key.id(), "o7");
        assert_eq!(key.root_collection(), "users");
        assert_eq!(key.collection_path().canonical_string(), "users/u1/orders");
    }
}
