//! Storage routing: decides, per root collection, whether a reference maps to
//! a dedicated typed table or to the shared generic table.

use std::collections::HashMap;

use crate::model::ResourcePath;

/// Name of the shared catch-all table.
pub const GENERIC_TABLE: &str = "documents";

/// Column type of a declared field in a dedicated table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Integer,
    Real,
    Boolean,
    Timestamp,
}

impl ColumnType {
    pub(crate) fn sql_type(&self) -> &'static str {
        match self {
            ColumnType::Text | ColumnType::Timestamp => "TEXT",
            ColumnType::Integer | ColumnType::Boolean => "INTEGER",
            ColumnType::Real => "REAL",
        }
    }
}

#[derive(Clone, Debug)]
pub struct ColumnSpec {
    name: String,
    column_type: ColumnType,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }
}

/// Declares the dedicated table for one allow-listed root collection: a fixed
/// `id` primary key, a small set of typed columns, and one `payload` column
/// for overflow attributes.
#[derive(Clone, Debug)]
pub struct TableSchema {
    root: String,
    table: String,
    columns: Vec<ColumnSpec>,
}

impl TableSchema {
    pub fn new(root: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            table: table.into(),
            columns: Vec::new(),
        }
    }

    pub fn with_column(mut self, name: impl Into<String>, column_type: ColumnType) -> Self {
        self.columns.push(ColumnSpec::new(name, column_type));
        self
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    /// Membership here is a pure function of the field name: a field is either
    /// a declared column or lives in the payload, never both.
    pub fn column(&self, field: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|column| column.name() == field)
    }

    pub fn is_declared(&self, field: &str) -> bool {
        self.column(field).is_some()
    }

    fn create_table_sql(&self) -> String {
        let mut sql = format!(
            "CREATE TABLE IF NOT EXISTS \"{}\" (\"id\" TEXT PRIMARY KEY",
            self.table
        );
        for column in &self.columns {
            sql.push_str(&format!(
                ", \"{}\" {}",
                column.name(),
                column.column_type().sql_type()
            ));
        }
        sql.push_str(", \"payload\" TEXT NOT NULL DEFAULT '{}')");
        sql
    }
}

/// Where a reference's data lives.
#[derive(Clone, Copy, Debug)]
pub enum TableTarget<'a> {
    Dedicated(&'a TableSchema),
    Generic,
}

impl TableTarget<'_> {
    pub fn is_generic(&self) -> bool {
        matches!(self, TableTarget::Generic)
    }

    pub fn table_name(&self) -> &str {
        match self {
            TableTarget::Dedicated(schema) => schema.table(),
            TableTarget::Generic => GENERIC_TABLE,
        }
    }
}

/// The static allow-list of dedicated tables, keyed by root collection name.
///
/// Maintained explicitly by the embedding application; nothing is inferred
/// from document shape at runtime.
#[derive(Clone, Debug, Default)]
pub struct SchemaRegistry {
    tables: HashMap<String, TableSchema>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, schema: TableSchema) -> Self {
        self.tables.insert(schema.root().to_string(), schema);
        self
    }

    pub fn dedicated(&self, root: &str) -> Option<&TableSchema> {
        self.tables.get(root)
    }

    /// Routes a collection or document path to its table.
    ///
    /// The decision keys off the root segment only, and dedicated tables hold
    /// exactly the root collection's own documents: nested subcollections
    /// under an allow-listed root still land in the generic table.
    pub fn route(&self, path: &ResourcePath) -> TableTarget<'_> {
        if path.len() > 2 {
            return TableTarget::Generic;
        }
        match path.first_segment().and_then(|root| self.tables.get(root)) {
            Some(schema) => TableTarget::Dedicated(schema),
            None => TableTarget::Generic,
        }
    }

    /// DDL for the generic table plus every registered dedicated table.
    pub fn bootstrap_sql(&self) -> Vec<String> {
        let mut statements = vec![format!(
            "CREATE TABLE IF NOT EXISTS \"{}\" (\
             \"collection_path\" TEXT NOT NULL, \
             \"doc_id\" TEXT NOT NULL, \
             \"payload\" TEXT NOT NULL DEFAULT '{{}}', \
             PRIMARY KEY (\"collection_path\", \"doc_id\"))",
            GENERIC_TABLE
        )];
        let mut tables: Vec<&TableSchema> = self.tables.values().collect();
        tables.sort_by(|left, right| left.table().cmp(right.table()));
        for schema in tables {
            statements.push(schema.create_table_sql());
        }
        statements
    }
}
