//! Table introspection
//!
//! `describe` runs three statements in sequence: the column listing, the
//! primary key index, then the table status. This module holds the SQL for
//! each step and folds their result rows into a [`TableSchema`].

use serde_json::Value;

use vista_core::schema::{ColumnType, NamedList, TableOptions};
use vista_core::{Error, Result, Row};

pub fn columns_sql(table: &str) -> String {
    format!("SHOW COLUMNS FROM {}", table)
}

pub fn primary_key_sql(table: &str) -> String {
    format!("SHOW INDEX FROM {} WHERE Key_name='PRIMARY'", table)
}

pub fn table_status_sql(table: &str) -> String {
    format!("SHOW TABLE STATUS WHERE name='{}';", table)
}

/// Columns from `SHOW COLUMNS` rows, nullability, default and
/// auto-increment folded into the column options
pub fn read_columns(rows: &[Row]) -> Result<NamedList<ColumnType>> {
    let mut columns = NamedList::new();

    for row in rows {
        let name = required_text(row, "Field")?;
        let mut column = ColumnType::from_native_type(&required_text(row, "Type")?);

        if let Some(null) = text(row, "Null") {
            column.options.not_null = null == "NO";
        }
        if let Some(default) = text(row, "Default").filter(|d| !d.is_empty()) {
            column.options.default = Some(default);
        }
        if text(row, "Extra").is_some_and(|extra| extra.contains("auto_increment")) {
            column.options.auto_inc = true;
        }

        columns.insert(name, column);
    }

    Ok(columns)
}

/// Primary key columns from `SHOW INDEX ... WHERE Key_name='PRIMARY'` rows
pub fn read_primary_keys(rows: &[Row]) -> Result<Vec<String>> {
    rows.iter().map(|row| required_text(row, "Column_name")).collect()
}

/// Table options from the first `SHOW TABLE STATUS` row
pub fn read_table_status(rows: &[Row]) -> TableOptions {
    let mut options = TableOptions::default();
    if let Some(row) = rows.first() {
        if let Some(engine) = text(row, "Engine") {
            options.engine = engine;
        }
        options.comment = text(row, "Comment").filter(|c| !c.is_empty());
    }
    options
}

fn text(row: &Row, key: &str) -> Option<String> {
    match row.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn required_text(row: &Row, key: &str) -> Result<String> {
    text(row, key).ok_or_else(|| Error::backend(format!("introspection row without {}", key)))
}
