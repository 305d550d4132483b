//! vista-runtime: executing Vista statements
//!
//! # Module layout
//!
//! - `connection`: connection / pool capability traits
//! - `mysql`: `sqlx` MySQL adapter
//! - `schema_manager`: describe / create / alter / drop tables
//! - `store`: definition resolution and operation orchestration

pub mod connection;
pub mod mysql;
pub mod schema_manager;
pub mod store;

#[cfg(test)]
mod testing;

pub use connection::{Connection, ConnectionPool, QueryResult};
pub use mysql::{MySqlConn, MySqlConnector};
pub use schema_manager::SchemaManager;
pub use store::{
    DeleteRequest, ExprOp, ExprOutput, ExprRequest, InsertRequest, ListRequest, ListResult,
    QueryRequest, Store, UpdateRequest,
};
