//! Operation orchestration
//!
//! [`Store`] ties the pieces together: it resolves entity definitions
//! (cached), composes statements, and runs them either on a connection the
//! caller supplies or on one it borrows from the pool for the duration of
//! the call.
//!
//! A statement that fails on a caller connection is followed by a rollback
//! before the error is returned; the caller may have an open transaction on
//! it. Connections the store borrows itself are only released.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

use vista_core::cache::{DefinitionCache, SchemaCache};
use vista_core::entity::{unqualified, EntityDefinition, Field, FilterNode};
use vista_core::schema::{AlterSpec, TableSchema};
use vista_core::{Config, Error, PageRange, Pagination, Params, Result, Row};
use vista_sql::{DeleteBuilder, InsertBuilder, Layout, SelectBuilder, Statement, UpdateBuilder};

use crate::connection::{Connection, ConnectionPool, QueryResult};
use crate::schema_manager::SchemaManager;

/// Definition file extensions, in lookup order
const DEFINITION_EXTENSIONS: [&str; 3] = ["yaml", "yml", "json"];

/// View used by insert / update / delete of an entity (`<entity>/general`)
const GENERAL_VIEW: &str = "general";

// ─────────────────────────────────────────────────────────────────────────────
// Requests
// ─────────────────────────────────────────────────────────────────────────────

/// Single-row query through a view
#[derive(Debug, Clone, Default)]
pub struct QueryRequest {
    /// View key, e.g. `Person/list` or `udb.Person/list`
    pub view: String,
    pub params: Params,
    /// Restrict the projection to these fields
    pub fields: Option<Vec<String>>,
}

impl QueryRequest {
    pub fn new(view: impl Into<String>) -> Self {
        Self {
            view: view.into(),
            ..Self::default()
        }
    }

    pub fn params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    pub fn fields(mut self, fields: Vec<String>) -> Self {
        self.fields = Some(fields);
        self
    }
}

/// List query through a view, paged when `range` is set
#[derive(Debug, Clone, Default)]
pub struct ListRequest {
    pub view: String,
    pub params: Params,
    pub range: Option<PageRange>,
    pub fields: Option<Vec<String>>,
}

impl ListRequest {
    pub fn new(view: impl Into<String>) -> Self {
        Self {
            view: view.into(),
            ..Self::default()
        }
    }

    pub fn params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    pub fn range(mut self, range: PageRange) -> Self {
        self.range = Some(range);
        self
    }

    pub fn fields(mut self, fields: Vec<String>) -> Self {
        self.fields = Some(fields);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct InsertRequest {
    /// Entity name, optionally database-qualified
    pub entity: String,
    pub data: Params,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateRequest {
    pub entity: String,
    pub data: Params,
    /// Filter terms selecting the rows to update
    pub terms: Params,
}

#[derive(Debug, Clone, Default)]
pub struct DeleteRequest {
    pub entity: String,
    pub terms: Params,
}

/// Operation of a dynamic expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExprOp {
    Query,
    List,
    Insert,
    Update,
    Delete,
}

/// Statement over an in-code expression instead of a definition file
///
/// An expression without fields takes every column of the table; one without
/// filters gets `<column> = ?` leaves for each query term naming a column.
#[derive(Debug, Clone)]
pub struct ExprRequest {
    pub op: ExprOp,
    pub expr: EntityDefinition,
    /// Row data for insert / update
    pub data: Option<Params>,
    /// Filter terms
    pub query: Params,
    pub range: Option<PageRange>,
}

impl ExprRequest {
    pub fn new(op: ExprOp, expr: EntityDefinition) -> Self {
        Self {
            op,
            expr,
            data: None,
            query: Params::new(),
            range: None,
        }
    }

    pub fn data(mut self, data: Params) -> Self {
        self.data = Some(data);
        self
    }

    pub fn query(mut self, query: Params) -> Self {
        self.query = query;
        self
    }

    pub fn range(mut self, range: PageRange) -> Self {
        self.range = Some(range);
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Results
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListResult {
    pub rows: Vec<Row>,
    /// Unpaged row count, present for paged lists
    pub total: Option<u64>,
}

/// Outcome of [`Store::execute`]
#[derive(Debug, Clone, PartialEq)]
pub enum ExprOutput {
    Row(Option<Row>),
    List(ListResult),
    /// Primary key of the inserted row
    Inserted(Row),
    Affected(u64),
}

// ─────────────────────────────────────────────────────────────────────────────
// Sessions
// ─────────────────────────────────────────────────────────────────────────────

/// Connection used by one operation
enum Session<'c, C> {
    /// Supplied by the caller; never released here
    Borrowed(&'c mut C),
    /// Taken from the pool; released on drop
    Owned(C),
}

impl<C: Connection> Session<'_, C> {
    fn conn(&mut self) -> &mut C {
        match self {
            Session::Borrowed(conn) => &mut **conn,
            Session::Owned(conn) => conn,
        }
    }

    async fn run(&mut self, stmt: &Statement) -> Result<QueryResult> {
        match self {
            Session::Owned(conn) => conn.query(stmt).await,
            Session::Borrowed(conn) => match conn.query(stmt).await {
                Ok(result) => Ok(result),
                Err(err) => Err(rollback_after(&mut **conn, err).await),
            },
        }
    }
}

/// Roll back after `err`; a failing rollback is attached, never substituted
async fn rollback_after<C: Connection + ?Sized>(conn: &mut C, err: Error) -> Error {
    tracing::warn!(error = %err, "statement failed on caller connection, rolling back");
    match conn.rollback().await {
        Ok(()) => err,
        Err(rollback) => {
            tracing::warn!(error = %rollback, "rollback failed");
            Error::Rollback {
                source: Box::new(err),
                rollback: Box::new(rollback),
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Store
// ─────────────────────────────────────────────────────────────────────────────

pub struct Store<P: ConnectionPool> {
    pool: P,
    layout: Layout,
    default_page_size: u64,
    definition_path: PathBuf,
    definitions: DefinitionCache,
    schemas: SchemaCache,
}

impl<P: ConnectionPool> Store<P> {
    pub fn new(pool: P, config: &Config) -> Self {
        Self {
            pool,
            layout: Layout::from(config),
            default_page_size: config.default_page_size,
            definition_path: config.definition_path.clone(),
            definitions: DefinitionCache::new(),
            schemas: SchemaCache::new(),
        }
    }

    pub fn pool(&self) -> &P {
        &self.pool
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Page `page_index` with the configured page size
    pub fn page(&self, page_index: u64) -> PageRange {
        PageRange::new(page_index, self.default_page_size)
    }

    /// Cache a definition under `view`, replacing any loaded one
    pub fn register(&self, view: &str, def: EntityDefinition) -> Arc<EntityDefinition> {
        self.definitions.insert(strip_database(view), def)
    }

    /// Definition of `view`, loaded from the definition directory on first use
    ///
    /// The store talks to one database, so `udb.Person/list` and
    /// `Person/list` name the same view.
    pub fn definition(&self, view: &str) -> Result<Arc<EntityDefinition>> {
        let key = strip_database(view);
        self.definitions
            .get_or_load(key, || self.load_definition(key))
    }

    /// Drop every cached definition and table schema
    pub fn invalidate(&self) {
        self.definitions.invalidate();
        self.schemas.invalidate();
        tracing::info!("definition and schema caches invalidated");
    }

    pub async fn query(&self, req: &QueryRequest, conn: Option<&mut P::Conn>) -> Result<Option<Row>> {
        let def = self.definition(&req.view)?;
        let mut session = self.session(conn).await?;
        self.query_def(&def, &req.params, req.fields.as_deref(), &mut session)
            .await
    }

    pub async fn list(&self, req: &ListRequest, conn: Option<&mut P::Conn>) -> Result<ListResult> {
        let def = self.definition(&req.view)?;
        let mut session = self.session(conn).await?;
        self.list_def(
            &def,
            &req.params,
            req.range.as_ref(),
            req.fields.as_deref(),
            &mut session,
        )
        .await
    }

    /// Insert a row; returns its primary key (from the data, else the
    /// generated id)
    pub async fn insert(&self, req: &InsertRequest, conn: Option<&mut P::Conn>) -> Result<Row> {
        let def = self.definition(&general_view(&req.entity))?;
        let mut session = self.session(conn).await?;
        self.insert_def(&def, &req.data, &mut session).await
    }

    /// Update rows; returns the affected row count
    pub async fn update(&self, req: &UpdateRequest, conn: Option<&mut P::Conn>) -> Result<u64> {
        let def = self.definition(&general_view(&req.entity))?;
        let mut session = self.session(conn).await?;
        self.update_def(&def, &req.data, &req.terms, &mut session)
            .await
    }

    /// Delete rows; returns the affected row count
    pub async fn delete(&self, req: &DeleteRequest, conn: Option<&mut P::Conn>) -> Result<u64> {
        let def = self.definition(&general_view(&req.entity))?;
        let mut session = self.session(conn).await?;
        self.delete_def(&def, &req.terms, &mut session).await
    }

    /// Run a dynamic expression, filling in missing columns and filters from
    /// the table schema
    pub async fn execute(&self, req: ExprRequest, conn: Option<&mut P::Conn>) -> Result<ExprOutput> {
        let ExprRequest {
            op,
            expr: mut def,
            data,
            query,
            range,
        } = req;
        let mut session = self.session(conn).await?;

        let needs_columns =
            def.fields.is_empty() && (data.is_some() || matches!(op, ExprOp::Query | ExprOp::List));
        let needs_filters = def.filters.is_none() && !query.is_empty();

        if needs_columns || needs_filters {
            let table = base_table(&def).to_string();
            let schema = self.schema_on(&table, session.conn()).await?;

            if needs_columns {
                def.fields = schema.column_names().map(Field::new).collect();
            }
            if needs_filters {
                def.filters = term_filter(&schema, &query);
            }
        }

        match op {
            ExprOp::Query => self
                .query_def(&def, &query, None, &mut session)
                .await
                .map(ExprOutput::Row),
            ExprOp::List => self
                .list_def(&def, &query, range.as_ref(), None, &mut session)
                .await
                .map(ExprOutput::List),
            ExprOp::Insert => {
                let data = data.ok_or_else(|| Error::composition("missing insert data"))?;
                self.insert_def(&def, &data, &mut session)
                    .await
                    .map(ExprOutput::Inserted)
            }
            ExprOp::Update => {
                let data = data.ok_or_else(|| Error::composition("missing update data"))?;
                self.update_def(&def, &data, &query, &mut session)
                    .await
                    .map(ExprOutput::Affected)
            }
            ExprOp::Delete => self
                .delete_def(&def, &query, &mut session)
                .await
                .map(ExprOutput::Affected),
        }
    }

    /// Describe a table, bypassing the schema cache
    pub async fn describe_table(&self, table: &str, conn: Option<&mut P::Conn>) -> Result<TableSchema> {
        let mut session = self.session(conn).await?;
        SchemaManager::describe_table(session.conn(), unqualified(table)).await
    }

    /// Cached table schema, described on first use
    pub async fn table_schema(&self, table: &str, conn: Option<&mut P::Conn>) -> Result<Arc<TableSchema>> {
        let mut session = self.session(conn).await?;
        self.schema_on(unqualified(table), session.conn()).await
    }

    pub async fn create_table(&self, schema: &TableSchema, conn: Option<&mut P::Conn>) -> Result<()> {
        let mut session = self.session(conn).await?;
        SchemaManager::create_table(session.conn(), schema).await?;
        self.schemas.remove(&schema.title);
        Ok(())
    }

    pub async fn alter_table(&self, spec: &AlterSpec, conn: Option<&mut P::Conn>) -> Result<()> {
        let mut session = self.session(conn).await?;
        SchemaManager::alter_table(session.conn(), spec).await?;
        self.schemas.remove(&spec.title);
        Ok(())
    }

    pub async fn delete_table(&self, table: &str, conn: Option<&mut P::Conn>) -> Result<()> {
        let table = unqualified(table);
        let mut session = self.session(conn).await?;
        SchemaManager::delete_table(session.conn(), table).await?;
        self.schemas.remove(table);
        Ok(())
    }

    async fn session<'c>(&self, conn: Option<&'c mut P::Conn>) -> Result<Session<'c, P::Conn>> {
        match conn {
            Some(conn) => Ok(Session::Borrowed(conn)),
            None => Ok(Session::Owned(self.pool.acquire().await?)),
        }
    }

    async fn schema_on(&self, table: &str, conn: &mut P::Conn) -> Result<Arc<TableSchema>> {
        if let Some(schema) = self.schemas.get(table) {
            return Ok(schema);
        }
        let schema = SchemaManager::describe_table(conn, table).await?;
        Ok(self.schemas.insert(table, schema))
    }

    async fn query_def(
        &self,
        def: &EntityDefinition,
        params: &Params,
        fields: Option<&[String]>,
        session: &mut Session<'_, P::Conn>,
    ) -> Result<Option<Row>> {
        let stmt = SelectBuilder::new(def)
            .layout(self.layout)
            .query(params, fields)?;
        Ok(session.run(&stmt).await?.first_row())
    }

    async fn list_def(
        &self,
        def: &EntityDefinition,
        params: &Params,
        range: Option<&PageRange>,
        fields: Option<&[String]>,
        session: &mut Session<'_, P::Conn>,
    ) -> Result<ListResult> {
        let builder = SelectBuilder::new(def).layout(self.layout);
        let stmt = builder.list(params, range.map(|r| r as &dyn Pagination), fields)?;
        let count = match range {
            Some(_) => Some(builder.count(params)?),
            None => None,
        };

        let rows = session.run(&stmt).await?.rows;
        let total = match count {
            Some(count) => Some(read_count(&session.run(&count).await?)),
            None => None,
        };

        Ok(ListResult { rows, total })
    }

    async fn insert_def(
        &self,
        def: &EntityDefinition,
        data: &Params,
        session: &mut Session<'_, P::Conn>,
    ) -> Result<Row> {
        let stmt = InsertBuilder::new(def).build(data)?;
        let result = session.run(&stmt).await?;

        let schema = self.schema_on(base_table(def), session.conn()).await?;
        Ok(primary_key_map(&schema, data, result.insert_id))
    }

    async fn update_def(
        &self,
        def: &EntityDefinition,
        data: &Params,
        terms: &Params,
        session: &mut Session<'_, P::Conn>,
    ) -> Result<u64> {
        let stmt = UpdateBuilder::new(def)
            .layout(self.layout)
            .build(data, terms)?;
        Ok(session.run(&stmt).await?.affected_rows)
    }

    async fn delete_def(
        &self,
        def: &EntityDefinition,
        terms: &Params,
        session: &mut Session<'_, P::Conn>,
    ) -> Result<u64> {
        let stmt = DeleteBuilder::new(def).layout(self.layout).build(terms)?;
        Ok(session.run(&stmt).await?.affected_rows)
    }

    fn load_definition(&self, view: &str) -> Result<EntityDefinition> {
        for ext in DEFINITION_EXTENSIONS {
            let path = self.definition_path.join(format!("{}.{}", view, ext));
            let text = match fs::read_to_string(&path) {
                Ok(text) => text,
                Err(err) if err.kind() == ErrorKind::NotFound => continue,
                Err(err) => return Err(err.into()),
            };

            tracing::debug!(view, path = %path.display(), "loading entity definition");
            return if ext == "json" {
                EntityDefinition::from_json_str(&text)
            } else {
                EntityDefinition::from_yaml_str(&text)
            };
        }

        Err(Error::DefinitionNotFound {
            key: view.to_string(),
        })
    }
}

fn general_view(entity: &str) -> String {
    format!("{}/{}", entity, GENERAL_VIEW)
}

/// Drop a `db.` qualifier from the first segment of a view key
fn strip_database(view: &str) -> &str {
    let first = view.split('/').next().unwrap_or_default();
    match first.find('.') {
        Some(idx) if idx > 0 => &view[idx + 1..],
        _ => view,
    }
}

/// Main table name without database qualifier or alias
fn base_table(def: &EntityDefinition) -> &str {
    def.table
        .unqualified_name()
        .split_whitespace()
        .next()
        .unwrap_or_default()
}

/// `<column> = ?` for every term naming a column, in column order
fn term_filter(schema: &TableSchema, terms: &Params) -> Option<FilterNode> {
    let mut leaves: Vec<FilterNode> = schema
        .column_names()
        .filter(|column| terms.contains_key(*column))
        .map(|column| FilterNode::compare(column, "="))
        .collect();

    match leaves.len() {
        0 => None,
        1 => leaves.pop(),
        _ => Some(FilterNode::and(leaves)),
    }
}

fn primary_key_map(schema: &TableSchema, data: &Params, insert_id: Option<u64>) -> Row {
    schema
        .primary
        .iter()
        .map(|key| {
            let value = data
                .get(key)
                .cloned()
                .or_else(|| insert_id.map(Into::into))
                .unwrap_or_default();
            (key.clone(), value)
        })
        .collect()
}

fn read_count(result: &QueryResult) -> u64 {
    result
        .rows
        .first()
        .and_then(|row| row.get("ct"))
        .and_then(|ct| ct.as_u64().or_else(|| ct.as_str()?.parse().ok()))
        .unwrap_or(0)
}
