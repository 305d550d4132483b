//! MySQL connection adapter over `sqlx`

use async_trait::async_trait;
use serde_json::Value;
use sqlx::mysql::{MySql, MySqlArguments, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::pool::PoolConnection;
use sqlx::query::Query;
use sqlx::{Column, Executor, Row as _, TypeInfo};

use vista_core::{Config, Error, Result, Row};
use vista_sql::Statement;

use crate::connection::{Connection, ConnectionPool, QueryResult};

/// Pool of MySQL connections
#[derive(Clone)]
pub struct MySqlConnector {
    pool: MySqlPool,
}

impl MySqlConnector {
    pub async fn connect(config: &Config) -> Result<Self> {
        let pool = MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await
            .map_err(backend_error)?;

        tracing::info!(max_connections = config.max_connections, "MySQL pool ready");
        Ok(Self { pool })
    }

    pub fn from_pool(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }
}

#[async_trait]
impl ConnectionPool for MySqlConnector {
    type Conn = MySqlConn;

    async fn acquire(&self) -> Result<MySqlConn> {
        let inner = self.pool.acquire().await.map_err(backend_error)?;
        Ok(MySqlConn { inner })
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

/// Connection borrowed from a [`MySqlConnector`]; returned to the pool on drop
pub struct MySqlConn {
    inner: PoolConnection<MySql>,
}

#[async_trait]
impl Connection for MySqlConn {
    async fn query(&mut self, stmt: &Statement) -> Result<QueryResult> {
        let conn = &mut *self.inner;

        // statements without values go over the text protocol
        if returns_rows(&stmt.sql) {
            let rows = if stmt.params.is_empty() {
                conn.fetch_all(stmt.sql.as_str()).await
            } else {
                bind_values(sqlx::query(&stmt.sql), &stmt.params)
                    .fetch_all(conn)
                    .await
            }
            .map_err(backend_error)?;

            Ok(QueryResult::from_rows(rows.iter().map(row_to_json).collect()))
        } else {
            let done = if stmt.params.is_empty() {
                conn.execute(stmt.sql.as_str()).await
            } else {
                bind_values(sqlx::query(&stmt.sql), &stmt.params)
                    .execute(conn)
                    .await
            }
            .map_err(backend_error)?;

            Ok(QueryResult {
                rows: Vec::new(),
                insert_id: Some(done.last_insert_id()).filter(|id| *id > 0),
                affected_rows: done.rows_affected(),
            })
        }
    }

    async fn begin(&mut self) -> Result<()> {
        self.run("START TRANSACTION").await
    }

    async fn commit(&mut self) -> Result<()> {
        self.run("COMMIT").await
    }

    async fn rollback(&mut self) -> Result<()> {
        self.run("ROLLBACK").await
    }
}

impl MySqlConn {
    async fn run(&mut self, sql: &str) -> Result<()> {
        tracing::debug!(sql, "transaction control");
        (&mut *self.inner)
            .execute(sql)
            .await
            .map_err(backend_error)?;
        Ok(())
    }
}

pub(crate) fn backend_error(err: sqlx::Error) -> Error {
    Error::backend(err.to_string())
}

/// Whether the statement produces a result set
fn returns_rows(sql: &str) -> bool {
    let keyword = sql
        .trim_start()
        .split(|c: char| c.is_whitespace() || c == '(')
        .next()
        .unwrap_or_default();

    ["SELECT", "SHOW", "DESCRIBE", "DESC", "EXPLAIN", "WITH"]
        .iter()
        .any(|k| keyword.eq_ignore_ascii_case(k))
}

fn bind_values<'q>(
    mut query: Query<'q, MySql, MySqlArguments>,
    values: &[Value],
) -> Query<'q, MySql, MySqlArguments> {
    for value in values {
        match value {
            Value::Null => {
                let v: Option<String> = None;
                query = query.bind(v);
            }
            Value::Bool(b) => query = query.bind(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    query = query.bind(i);
                } else if let Some(u) = n.as_u64() {
                    query = query.bind(u);
                } else if let Some(f) = n.as_f64() {
                    query = query.bind(f);
                } else {
                    query = query.bind(n.to_string());
                }
            }
            Value::String(s) => query = query.bind(s.clone()),
            Value::Array(_) | Value::Object(_) => {
                query = query.bind(sqlx::types::Json(value.clone()));
            }
        }
    }
    query
}

fn row_to_json(row: &MySqlRow) -> Row {
    let mut obj = Row::new();
    for column in row.columns() {
        let idx = column.ordinal();
        let value = match column.type_info().name() {
            "BOOLEAN" => row
                .try_get::<Option<bool>, _>(idx)
                .ok()
                .flatten()
                .map(Value::Bool),
            "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => row
                .try_get::<Option<i64>, _>(idx)
                .ok()
                .flatten()
                .map(|v| Value::Number(v.into())),
            "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
            | "BIGINT UNSIGNED" => row
                .try_get::<Option<u64>, _>(idx)
                .ok()
                .flatten()
                .map(|v| Value::Number(v.into())),
            "FLOAT" | "DOUBLE" => row
                .try_get::<Option<f64>, _>(idx)
                .ok()
                .flatten()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number),
            "JSON" => row.try_get::<Option<Value>, _>(idx).ok().flatten(),
            "DATETIME" | "TIMESTAMP" => row
                .try_get::<Option<chrono::NaiveDateTime>, _>(idx)
                .ok()
                .flatten()
                .map(|v| Value::String(v.format("%Y-%m-%d %H:%M:%S").to_string())),
            "DATE" => row
                .try_get::<Option<chrono::NaiveDate>, _>(idx)
                .ok()
                .flatten()
                .map(|v| Value::String(v.format("%Y-%m-%d").to_string())),
            _ => text_value(row, idx),
        }
        .unwrap_or(Value::Null);

        obj.insert(column.name().to_string(), value);
    }
    obj
}

/// DECIMAL, TIME, text and binary columns as text
fn text_value(row: &MySqlRow, idx: usize) -> Option<Value> {
    if let Ok(text) = row.try_get_unchecked::<Option<String>, _>(idx) {
        return text.map(Value::String);
    }
    row.try_get_unchecked::<Option<Vec<u8>>, _>(idx)
        .ok()
        .flatten()
        .map(|bytes| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
}
