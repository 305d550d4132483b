//! Table schema
//!
//! Produced by introspection (`describe_table`) and consumed by DDL
//! generation. Callers also build one directly to create a table.
//!
//! ```json
//! {
//!   "title": "Person",
//!   "columns": {
//!     "Person_id": { "type": "serial" },
//!     "fname": { "type": "string", "maxLength": 32, "options": { "notNull": true } }
//!   },
//!   "primary": ["Person_id"],
//!   "options": { "engine": "InnoDB" }
//! }
//! ```

use serde::{Deserialize, Serialize};

use super::named::NamedList;
use super::types::ColumnType;
use crate::error::{Error, Result};

pub const DEFAULT_ENGINE: &str = "InnoDB";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub title: String,

    /// Columns in declaration order
    #[serde(default)]
    pub columns: NamedList<ColumnType>,

    /// Primary key columns
    #[serde(default)]
    pub primary: Vec<String>,

    #[serde(default)]
    pub options: TableOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableOptions {
    #[serde(default = "default_engine")]
    pub engine: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            engine: default_engine(),
            comment: None,
        }
    }
}

fn default_engine() -> String {
    DEFAULT_ENGINE.to_string()
}

impl TableSchema {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            columns: NamedList::new(),
            primary: Vec::new(),
            options: TableOptions::default(),
        }
    }

    /// Add a column (builder style)
    pub fn column(mut self, name: impl Into<String>, column_type: ColumnType) -> Self {
        self.columns.insert(name, column_type);
        self
    }

    pub fn primary_key<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn engine(mut self, engine: impl Into<String>) -> Self {
        self.options.engine = engine.into();
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.options.comment = Some(comment.into());
        self
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.names()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains(name)
    }

    /// Checks required before CREATE TABLE can be generated
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::schema_validation("missing table name"));
        }
        if self.columns.is_empty() {
            return Err(Error::schema_validation("no table columns"));
        }
        if self.primary.is_empty() {
            return Err(Error::schema_validation("primary key not specified"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::TypeKind;

    fn person() -> TableSchema {
        TableSchema::new("Person")
            .column("Person_id", ColumnType::new(TypeKind::Serial))
            .column("fname", ColumnType::new(TypeKind::String).with_max_length(32))
            .primary_key(["Person_id"])
    }

    #[test]
    fn test_validate() {
        assert!(person().validate().is_ok());

        let mut schema = person();
        schema.title = String::new();
        assert!(matches!(schema.validate(), Err(Error::SchemaValidation { .. })));

        let schema = TableSchema::new("Person").primary_key(["id"]);
        assert!(matches!(schema.validate(), Err(Error::SchemaValidation { .. })));

        let schema = person().primary_key(Vec::<String>::new());
        assert!(matches!(schema.validate(), Err(Error::SchemaValidation { .. })));
    }

    #[test]
    fn test_deserialize_defaults_engine() {
        let schema: TableSchema = serde_json::from_str(
            r#"{ "title": "Person", "columns": { "id": { "type": "serial" } }, "primary": ["id"] }"#,
        )
        .unwrap();
        assert_eq!(schema.options.engine, "InnoDB");
        assert_eq!(schema.column_names().collect::<Vec<_>>(), vec!["id"]);
    }
}
