//! In-memory connection for tests
//!
//! A [`ScriptedConnection`] answers statements from a queue of canned
//! results and records everything it is asked to do in a shared journal.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use vista_core::{Error, Result};
use vista_sql::Statement;

use crate::connection::{Connection, ConnectionPool, QueryResult};

#[derive(Default)]
struct JournalState {
    statements: Vec<Statement>,
    begins: usize,
    commits: usize,
    rollbacks: usize,
}

/// Shared record of what a connection executed
#[derive(Clone, Default)]
pub(crate) struct Journal(Arc<Mutex<JournalState>>);

impl Journal {
    pub fn statements(&self) -> Vec<Statement> {
        self.0.lock().unwrap().statements.clone()
    }

    pub fn sql(&self) -> Vec<String> {
        self.statements().into_iter().map(|s| s.sql).collect()
    }

    pub fn begins(&self) -> usize {
        self.0.lock().unwrap().begins
    }

    pub fn commits(&self) -> usize {
        self.0.lock().unwrap().commits
    }

    pub fn rollbacks(&self) -> usize {
        self.0.lock().unwrap().rollbacks
    }
}

#[derive(Default)]
pub(crate) struct ScriptedConnection {
    script: VecDeque<Result<QueryResult>>,
    journal: Journal,
    rollback_error: Option<String>,
}

impl ScriptedConnection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer the next statement with these rows (a JSON array of objects)
    pub fn rows(mut self, rows: Value) -> Self {
        let rows = serde_json::from_value(rows).unwrap();
        self.script.push_back(Ok(QueryResult::from_rows(rows)));
        self
    }

    /// Answer the next statement as a write
    pub fn write(mut self, insert_id: Option<u64>, affected_rows: u64) -> Self {
        self.script.push_back(Ok(QueryResult {
            rows: Vec::new(),
            insert_id,
            affected_rows,
        }));
        self
    }

    /// Fail the next statement with a backend error
    pub fn fail(mut self, message: &str) -> Self {
        self.script.push_back(Err(Error::backend(message)));
        self
    }

    /// Make `rollback` fail
    pub fn fail_rollback(mut self, message: &str) -> Self {
        self.rollback_error = Some(message.to_string());
        self
    }

    pub fn journal(&self) -> Journal {
        self.journal.clone()
    }

    pub fn executed_sql(&self) -> Vec<String> {
        self.journal.sql()
    }
}

#[async_trait]
impl Connection for ScriptedConnection {
    async fn query(&mut self, stmt: &Statement) -> Result<QueryResult> {
        self.journal.0.lock().unwrap().statements.push(stmt.clone());
        self.script
            .pop_front()
            .unwrap_or_else(|| Ok(QueryResult::default()))
    }

    async fn begin(&mut self) -> Result<()> {
        self.journal.0.lock().unwrap().begins += 1;
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        self.journal.0.lock().unwrap().commits += 1;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        self.journal.0.lock().unwrap().rollbacks += 1;
        match &self.rollback_error {
            Some(message) => Err(Error::backend(message.clone())),
            None => Ok(()),
        }
    }
}

/// Hands out queued connections, then empty ones
#[derive(Default)]
pub(crate) struct ScriptedPool {
    connections: Mutex<VecDeque<ScriptedConnection>>,
    acquired: Mutex<usize>,
}

impl ScriptedPool {
    pub fn new(connections: Vec<ScriptedConnection>) -> Self {
        Self {
            connections: Mutex::new(connections.into()),
            acquired: Mutex::new(0),
        }
    }

    pub fn acquired(&self) -> usize {
        *self.acquired.lock().unwrap()
    }
}

#[async_trait]
impl ConnectionPool for ScriptedPool {
    type Conn = ScriptedConnection;

    async fn acquire(&self) -> Result<ScriptedConnection> {
        *self.acquired.lock().unwrap() += 1;
        Ok(self
            .connections
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default())
    }

    async fn close(&self) {
        self.connections.lock().unwrap().clear();
    }
}
