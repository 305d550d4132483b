//! Connection capability
//!
//! The runtime only needs a handful of primitives from a database
//! connection: run a statement, and begin / commit / roll back a
//! transaction. Releasing a connection is dropping it.

use async_trait::async_trait;

use vista_core::{Result, Row};
use vista_sql::Statement;

/// Outcome of one statement
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    /// Result rows (SELECT / SHOW)
    pub rows: Vec<Row>,

    /// Generated key of an INSERT
    pub insert_id: Option<u64>,

    pub affected_rows: u64,
}

impl QueryResult {
    pub fn from_rows(rows: Vec<Row>) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }

    /// First row, if any
    pub fn first_row(self) -> Option<Row> {
        self.rows.into_iter().next()
    }
}

/// A borrowed database connection
#[async_trait]
pub trait Connection: Send {
    /// Run a statement, binding `stmt.params` to its `?` placeholders
    async fn query(&mut self, stmt: &Statement) -> Result<QueryResult>;

    async fn begin(&mut self) -> Result<()>;

    async fn commit(&mut self) -> Result<()>;

    async fn rollback(&mut self) -> Result<()>;
}

/// Source of connections
#[async_trait]
pub trait ConnectionPool: Send + Sync {
    type Conn: Connection;

    /// Borrow a connection; dropping it gives it back
    async fn acquire(&self) -> Result<Self::Conn>;

    /// Close every connection of the pool
    async fn close(&self);
}
