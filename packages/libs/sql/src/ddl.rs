//! DDL generation
//!
//! MySQL `CREATE TABLE`, `ALTER TABLE` and `DROP TABLE` statements from
//! [`TableSchema`] / [`AlterSpec`] values. Column types go through
//! [`ColumnType::to_native_type`].

use vista_core::schema::{AlterSpec, ColumnType, TableSchema};
use vista_core::{Error, Result};

pub struct DdlGenerator;

impl DdlGenerator {
    /// `CREATE TABLE` with one column per line, the primary key last and
    /// the table options after the closing parenthesis
    pub fn create_table(schema: &TableSchema) -> Result<String> {
        schema.validate()?;

        let mut sql = format!("CREATE TABLE {}\n(\n", schema.title);
        for (name, column) in schema.columns.iter() {
            sql.push_str(&format!("  {}\t\t{},\n", name, Self::column_def(column)));
        }
        sql.push_str(&format!("  primary key ({})\n)\n", schema.primary.join(", ")));

        sql.push_str(&format!("engine = {}", schema.options.engine));
        if let Some(comment) = &schema.options.comment {
            sql.push_str(&format!(" COMMENT = '{}'", comment));
        }
        sql.push(';');

        tracing::debug!(table = %schema.title, "generated CREATE TABLE");
        Ok(sql)
    }

    /// One `ALTER TABLE` with comma-separated clauses: added columns,
    /// indexes and foreign keys first, then dropped columns, indexes and
    /// foreign keys
    pub fn alter_table(spec: &AlterSpec) -> Result<String> {
        if spec.title.trim().is_empty() {
            return Err(Error::schema_validation("missing table name"));
        }
        if spec.is_empty() {
            return Err(Error::schema_validation(format!(
                "nothing to alter on {}",
                spec.title
            )));
        }

        let mut clauses = Vec::new();

        for (name, column) in spec.add.column.iter() {
            clauses.push(format!("ADD COLUMN {}\t{}", name, Self::column_def(column)));
        }

        for (name, index) in spec.add.index.iter() {
            if index.columns.is_empty() {
                return Err(Error::schema_validation(format!(
                    "index {} has no columns",
                    name
                )));
            }
            let unique = if index.unique { "UNIQUE " } else { "" };
            clauses.push(format!(
                "ADD {}INDEX {} ({})",
                unique,
                name,
                index.columns.join(", ")
            ));
        }

        for (name, fk) in spec.add.foreign_key.iter() {
            let (table, column) = fk.referenced();
            clauses.push(format!(
                "ADD CONSTRAINT {} FOREIGN KEY ({}) references {} ({}) ON DELETE {} ON UPDATE {}",
                name,
                fk.key,
                table,
                column,
                fk.integrity.on_delete(),
                fk.integrity.on_update()
            ));
        }

        clauses.extend(spec.drop.column.iter().map(|c| format!("DROP COLUMN {}", c)));
        clauses.extend(spec.drop.index.iter().map(|i| format!("DROP INDEX {}", i)));
        clauses.extend(
            spec.drop
                .foreign_key
                .iter()
                .map(|fk| format!("DROP FOREIGN KEY {}", fk)),
        );

        tracing::debug!(table = %spec.title, clauses = clauses.len(), "generated ALTER TABLE");
        Ok(format!("ALTER TABLE {}\n{};", spec.title, clauses.join(",\n")))
    }

    pub fn drop_table(name: &str) -> Result<String> {
        if name.trim().is_empty() {
            return Err(Error::schema_validation("missing table name"));
        }
        Ok(format!("DROP TABLE {}", name))
    }

    fn column_def(column: &ColumnType) -> String {
        format!("{}{}", column.to_native_type(), column.options.to_ddl_suffix())
    }
}
