//! Table schemas and abstract column types
//!
//! # Module layout
//!
//! - `types`: abstract column type and its MySQL translation
//! - `column`: column options (NOT NULL, DEFAULT, ...)
//! - `table`: table schema used by introspection and CREATE TABLE
//! - `alter`: ALTER TABLE add/drop specification
//! - `named`: insertion-ordered name → value list

mod alter;
mod column;
mod named;
mod table;
mod types;

pub use alter::{
    AlterAdd, AlterDrop, AlterSpec, ForeignKeySpec, IndexSpec, Integrity, DEFAULT_REFERENTIAL_RULE,
};
pub use column::ColumnOptions;
pub use named::NamedList;
pub use table::{TableOptions, TableSchema, DEFAULT_ENGINE};
pub use types::{ColumnType, TypeKind, DEFAULT_VARCHAR_LENGTH, SERIAL_NATIVE_TYPE};
