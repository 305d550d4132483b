//! vista-core: shared Vista types
//!
//! Entity definitions, filter trees, abstract column types and the error
//! type used by the SQL composer and the runtime.
//!
//! # Module layout
//!
//! - `entity`: entity definitions, filter trees, fluent template builder
//! - `schema`: abstract column types, table schemas, ALTER specifications
//! - `params`: parameter maps and pagination
//! - `cache`: generation-swapped definition / schema caches
//! - `config`: connection and composition settings
//! - `error`: shared error type

pub mod cache;
pub mod config;
pub mod entity;
pub mod error;
pub mod params;
pub mod schema;

pub use config::Config;
pub use error::{Error, Result};
pub use params::{PageRange, Pagination, Params, Row};
