//! ALTER TABLE specification
//!
//! ```json
//! {
//!   "title": "Person",
//!   "add": {
//!     "column": { "age": { "type": "integer", "format": "int8" } },
//!     "index": { "IDX_BK_ISBN": { "columns": ["ISBN", "title"], "unique": true } },
//!     "foreignKey": {
//!       "FK_bpdRbk": { "key": "bkID", "reference": "Books.bkID", "integrity": { "delete": "cascade" } }
//!     }
//!   },
//!   "drop": { "column": ["addr"], "index": ["IDX_OLD"], "foreignKey": ["FK_OLD"] }
//! }
//! ```

use serde::{Deserialize, Serialize};

use super::named::NamedList;
use super::types::ColumnType;

pub const DEFAULT_REFERENTIAL_RULE: &str = "restrict";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlterSpec {
    pub title: String,

    #[serde(default)]
    pub add: AlterAdd,

    #[serde(default)]
    pub drop: AlterDrop,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlterAdd {
    #[serde(default)]
    pub column: NamedList<ColumnType>,

    #[serde(default)]
    pub index: NamedList<IndexSpec>,

    #[serde(default)]
    pub foreign_key: NamedList<ForeignKeySpec>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlterDrop {
    #[serde(default)]
    pub column: Vec<String>,

    #[serde(default)]
    pub index: Vec<String>,

    #[serde(default)]
    pub foreign_key: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSpec {
    pub columns: Vec<String>,

    #[serde(default)]
    pub unique: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeySpec {
    /// Referencing column
    pub key: String,

    /// Referenced `table.column`
    pub reference: String,

    #[serde(default)]
    pub integrity: Integrity,
}

/// ON DELETE / ON UPDATE rules, `restrict` when unset
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Integrity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update: Option<String>,
}

impl Integrity {
    pub fn on_delete(&self) -> &str {
        self.delete.as_deref().unwrap_or(DEFAULT_REFERENTIAL_RULE)
    }

    pub fn on_update(&self) -> &str {
        self.update.as_deref().unwrap_or(DEFAULT_REFERENTIAL_RULE)
    }
}

impl ForeignKeySpec {
    /// Split `reference` into `(table, column)`.
    ///
    /// A reference without a dot names the table and reuses the key column.
    pub fn referenced(&self) -> (&str, &str) {
        match self.reference.split_once('.') {
            Some((table, column)) => (table, column),
            None => (self.reference.as_str(), self.key.as_str()),
        }
    }
}

impl AlterSpec {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn add_column(mut self, name: impl Into<String>, column_type: ColumnType) -> Self {
        self.add.column.insert(name, column_type);
        self
    }

    pub fn add_index<I, S>(mut self, name: impl Into<String>, columns: I, unique: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns = columns.into_iter().map(Into::into).collect();
        self.add.index.insert(name, IndexSpec { columns, unique });
        self
    }

    pub fn add_foreign_key(mut self, name: impl Into<String>, fk: ForeignKeySpec) -> Self {
        self.add.foreign_key.insert(name, fk);
        self
    }

    pub fn drop_column(mut self, name: impl Into<String>) -> Self {
        self.drop.column.push(name.into());
        self
    }

    pub fn drop_index(mut self, name: impl Into<String>) -> Self {
        self.drop.index.push(name.into());
        self
    }

    pub fn drop_foreign_key(mut self, name: impl Into<String>) -> Self {
        self.drop.foreign_key.push(name.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.add.column.is_empty()
            && self.add.index.is_empty()
            && self.add.foreign_key.is_empty()
            && self.drop.column.is_empty()
            && self.drop.index.is_empty()
            && self.drop.foreign_key.is_empty()
    }
}
