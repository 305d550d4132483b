//! Schema manager
//!
//! Introspection and DDL against a borrowed connection. The connection is
//! never released here; the caller owns it.

use vista_core::schema::{AlterSpec, TableSchema};
use vista_core::Result;
use vista_sql::{introspect, DdlGenerator, Statement};

use crate::connection::Connection;

pub struct SchemaManager;

impl SchemaManager {
    /// Describe a table: columns, then primary key, then table status
    pub async fn describe_table<C>(conn: &mut C, table: &str) -> Result<TableSchema>
    where
        C: Connection + ?Sized,
    {
        let mut schema = TableSchema::new(table);

        let result = conn
            .query(&Statement::raw(introspect::columns_sql(table)))
            .await?;
        schema.columns = introspect::read_columns(&result.rows)?;

        let result = conn
            .query(&Statement::raw(introspect::primary_key_sql(table)))
            .await?;
        schema.primary = introspect::read_primary_keys(&result.rows)?;

        let result = conn
            .query(&Statement::raw(introspect::table_status_sql(table)))
            .await?;
        schema.options = introspect::read_table_status(&result.rows);

        tracing::debug!(table, columns = schema.columns.len(), "described table");
        Ok(schema)
    }

    pub async fn create_table<C>(conn: &mut C, schema: &TableSchema) -> Result<()>
    where
        C: Connection + ?Sized,
    {
        let sql = DdlGenerator::create_table(schema)?;
        conn.query(&Statement::raw(sql)).await?;
        tracing::info!(table = %schema.title, "table created");
        Ok(())
    }

    pub async fn alter_table<C>(conn: &mut C, spec: &AlterSpec) -> Result<()>
    where
        C: Connection + ?Sized,
    {
        let sql = DdlGenerator::alter_table(spec)?;
        conn.query(&Statement::raw(sql)).await?;
        tracing::info!(table = %spec.title, "table altered");
        Ok(())
    }

    pub async fn delete_table<C>(conn: &mut C, table: &str) -> Result<()>
    where
        C: Connection + ?Sized,
    {
        let sql = DdlGenerator::drop_table(table)?;
        conn.query(&Statement::raw(sql)).await?;
        tracing::info!(table, "table dropped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedConnection;
    use serde_json::json;
    use vista_core::schema::{ColumnType, TypeKind};
    use vista_core::Error;

    #[tokio::test]
    async fn test_describe_table_runs_three_queries_in_order() {
        let mut conn = ScriptedConnection::new()
            .rows(json!([
                { "Field": "psnID", "Type": "bigint(20) unsigned", "Null": "NO", "Default": null, "Extra": "auto_increment" },
                { "Field": "fname", "Type": "varchar(32)", "Null": "NO", "Default": null, "Extra": "" }
            ]))
            .rows(json!([{ "Key_name": "PRIMARY", "Column_name": "psnID" }]))
            .rows(json!([{ "Name": "Person", "Engine": "InnoDB", "Comment": "people" }]));

        let schema = SchemaManager::describe_table(&mut conn, "Person").await.unwrap();

        assert_eq!(
            conn.executed_sql(),
            vec![
                "SHOW COLUMNS FROM Person",
                "SHOW INDEX FROM Person WHERE Key_name='PRIMARY'",
                "SHOW TABLE STATUS WHERE name='Person';",
            ]
        );
        assert_eq!(schema.title, "Person");
        assert_eq!(schema.column_names().collect::<Vec<_>>(), vec!["psnID", "fname"]);
        assert_eq!(schema.primary, vec!["psnID"]);
        assert_eq!(schema.options.comment.as_deref(), Some("people"));
    }

    #[tokio::test]
    async fn test_describe_stops_on_backend_error() {
        let mut conn = ScriptedConnection::new().fail("Table 'udb.Nope' doesn't exist");

        let err = SchemaManager::describe_table(&mut conn, "Nope").await.unwrap_err();
        assert!(matches!(err, Error::Backend { .. }));
        assert_eq!(conn.executed_sql().len(), 1);
    }

    #[tokio::test]
    async fn test_create_table_validates_before_executing() {
        let mut conn = ScriptedConnection::new();
        let schema = TableSchema::new("Person").column("id", ColumnType::new(TypeKind::Serial));

        let err = SchemaManager::create_table(&mut conn, &schema).await.unwrap_err();
        assert!(err.is_composition());
        assert!(conn.executed_sql().is_empty());
    }

    #[tokio::test]
    async fn test_create_and_drop() {
        let mut conn = ScriptedConnection::new();
        let schema = TableSchema::new("Person")
            .column("id", ColumnType::new(TypeKind::Serial))
            .primary_key(["id"]);

        SchemaManager::create_table(&mut conn, &schema).await.unwrap();
        SchemaManager::alter_table(&mut conn, &AlterSpec::new("Person").drop_column("addr"))
            .await
            .unwrap();
        SchemaManager::delete_table(&mut conn, "Person").await.unwrap();

        let sql = conn.executed_sql();
        assert!(sql[0].starts_with("CREATE TABLE Person\n(\n"));
        assert_eq!(sql[1], "ALTER TABLE Person\nDROP COLUMN addr;");
        assert_eq!(sql[2], "DROP TABLE Person");
    }
}
