use crate::api::database::DocStore;
use crate::api::snapshot::DocumentSnapshot;
use crate::error::{invalid_argument, DocSqlResult};
use crate::model::ResourcePath;
use crate::value::Value;

/// Comparison operator of a field filter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterOperator {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
}

impl FilterOperator {
    pub(crate) fn sql(&self) -> &'static str {
        match self {
            FilterOperator::Equal => "=",
            FilterOperator::NotEqual => "!=",
            FilterOperator::GreaterThan => ">",
            FilterOperator::GreaterThanOrEqual => ">=",
            FilterOperator::LessThan => "<",
            FilterOperator::LessThanOrEqual => "<=",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrderDirection {
    Ascending,
    Descending,
}

impl OrderDirection {
    pub(crate) fn sql(&self) -> &'static str {
        match self {
            OrderDirection::Ascending => "ASC",
            OrderDirection::Descending => "DESC",
        }
    }
}

#[derive(Clone, Debug)]
pub struct FieldFilter {
    field: String,
    operator: FilterOperator,
    value: Value,
}

impl FieldFilter {
    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn operator(&self) -> FilterOperator {
        self.operator
    }

    pub fn value(&self) -> &Value {
        &self.value
    }
}

#[derive(Clone, Debug)]
pub struct OrderBy {
    field: String,
    direction: OrderDirection,
}

impl OrderBy {
    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn direction(&self) -> OrderDirection {
        self.direction
    }
}

/// The constraints a query carries into translation: ordered filters, ordered
/// orderings, and an optional limit.
#[derive(Clone, Debug)]
pub struct QueryDefinition {
    collection_path: ResourcePath,
    filters: Vec<FieldFilter>,
    orderings: Vec<OrderBy>,
    limit: Option<u32>,
}

impl QueryDefinition {
    pub fn new(collection_path: ResourcePath) -> Self {
        Self {
            collection_path,
            filters: Vec::new(),
            orderings: Vec::new(),
            limit: None,
        }
    }

    pub fn collection_path(&self) -> &ResourcePath {
        &self.collection_path
    }

    pub fn filters(&self) -> &[FieldFilter] {
        &self.filters
    }

    pub fn orderings(&self) -> &[OrderBy] {
        &self.orderings
    }

    pub fn limit(&self) -> Option<u32> {
        self.limit
    }

    pub fn push_filter(&mut self, field: String, operator: FilterOperator, value: Value) {
        self.filters.push(FieldFilter {
            field,
            operator,
            value,
        });
    }

    pub fn push_ordering(&mut self, field: String, direction: OrderDirection) {
        self.orderings.push(OrderBy { field, direction });
    }

    pub fn set_limit(&mut self, limit: u32) {
        self.limit = Some(limit);
    }
}

/// An immutable query descriptor over one collection.
///
/// Each builder call returns a new query; constraint composition order is
/// preserved into the backend call.
#[derive(Clone, Debug)]
pub struct Query {
    store: DocStore,
    definition: QueryDefinition,
}

impl Query {
    pub(crate) fn new(store: DocStore, collection_path: ResourcePath) -> DocSqlResult<Self> {
        if collection_path.is_empty() || collection_path.len() % 2 == 0 {
            return Err(invalid_argument(
                "Queries must reference a collection (odd number of path segments)",
            ));
        }
        Ok(Self {
            store,
            definition: QueryDefinition::new(collection_path),
        })
    }

    pub fn store(&self) -> &DocStore {
        &self.store
    }

    pub fn collection_path(&self) -> &ResourcePath {
        self.definition.collection_path()
    }

    pub fn definition(&self) -> &QueryDefinition {
        &self.definition
    }

    /// Appends a field filter.
    pub fn where_field(
        mut self,
        field: impl Into<String>,
        operator: FilterOperator,
        value: Value,
    ) -> DocSqlResult<Self> {
        let field = field.into();
        if field.is_empty() {
            return Err(invalid_argument("Filter field must be a non-empty string"));
        }
        self.definition.push_filter(field, operator, value);
        Ok(self)
    }

    /// Appends an ordering; earlier calls take precedence over later ones.
    pub fn order_by(
        mut self,
        field: impl Into<String>,
        direction: OrderDirection,
    ) -> DocSqlResult<Self> {
        let field = field.into();
        if field.is_empty() {
            return Err(invalid_argument("Order field must be a non-empty string"));
        }
        self.definition.push_ordering(field, direction);
        Ok(self)
    }

    /// Bounds the result count. Zero is a caller error.
    pub fn limit(mut self, limit: u32) -> DocSqlResult<Self> {
        if limit == 0 {
            return Err(invalid_argument("Limit must be a positive integer"));
        }
        self.definition.set_limit(limit);
        Ok(self)
    }
}

/// Read-only result set of one query execution.
#[derive(Clone, Debug)]
pub struct QuerySnapshot {
    query: Query,
    documents: Vec<DocumentSnapshot>,
}

impl QuerySnapshot {
    pub(crate) fn new(query: Query, documents: Vec<DocumentSnapshot>) -> Self {
        Self { query, documents }
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn documents(&self) -> &[DocumentSnapshot] {
        &self.documents
    }

    pub fn size(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn into_documents(self) -> Vec<DocumentSnapshot> {
        self.documents
    }
}

impl IntoIterator for QuerySnapshot {
    type Item = DocumentSnapshot;
    type IntoIter = std::vec::IntoIter<DocumentSnapshot>;

    fn into_iter(self) -> Self::IntoIter {
        self.documents.into_iter()
    }
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
    fn rejects_document_paths() {
        let path = ResourcePath::from_string("cities/mumbai").unwrap();
        let err = Query::new(store(), path).unwrap_err();
        assert_eq!(err.code_str(), "docsql/invalid-argument");
    }

    #[test]
    fn preserves_constraint_order() {
        let path = ResourcePath::from_string("cities").unwrap();
        let query = Query::new(store(), path)
            .unwrap()
            .where_field("status", FilterOperator::Equal, Value::from_string("new"))
            .unwrap()
            .where_field("rank", FilterOperator::GreaterThan, Value::from_integer(3))
            .unwrap()
            .order_by("rank", OrderDirection::Descending)
            .unwrap()
            .limit(10)
            .unwrap();
        let definition = query.definition();
        assert_eq!(definition.filters()[0].field(), "status");
        assert_eq!(definition.filters()[1].field(), "rank");
        assert_eq!(definition.orderings()[0].field(), "rank");
        assert_eq!(definition.limit(), Some(10));
    }

    #[test]
    fn rejects_zero_limit() {
        let path = ResourcePath::from_string("cities").unwrap();
        let err = Query::new(store(), path).unwrap().limit(0).unwrap_err();
        assert_eq!(err.code_str(), "docsql/invalid-argument");
    }

    #[test]
    fn rejects_empty_filter_field() {
        let path = ResourcePath::from_string("cities").unwrap();
        let err = Query::new(store(), path)
            .unwrap()
            .where_field("", FilterOperator::Equal, Value::null())
            .unwrap_err();
        assert_eq!(err.code_str(), "docsql/invalid-argument");
    }
}
