//! vista-sql: SQL composition for Vista
//!
//! Turns entity definitions and runtime parameters into parameterized MySQL
//! statements, and table schemas into DDL. Everything here is pure and
//! synchronous; executing the statements is up to `vista-runtime`.
//!
//! # Module layout
//!
//! - `builder`: SELECT / INSERT / UPDATE / DELETE builders
//! - `filter`: filter tree to WHERE fragment compiler
//! - `interpolate`: raw `[key]` placeholder substitution (not parameterized)
//! - `ddl`: CREATE / ALTER / DROP TABLE generator
//! - `introspect`: describe-table SQL and result readers
//! - `layout`: compact or pretty clause separation

pub mod builder;
pub mod ddl;
pub mod filter;
pub mod interpolate;
pub mod introspect;
pub mod layout;

pub use builder::{DeleteBuilder, InsertBuilder, SelectBuilder, Statement, UpdateBuilder};
pub use ddl::DdlGenerator;
pub use filter::compile_filter;
pub use interpolate::interpolate_raw;
pub use layout::Layout;
