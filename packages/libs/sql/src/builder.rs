//! Statement builders
//!
//! Compose parameterized SELECT / INSERT / UPDATE / DELETE statements from an
//! [`EntityDefinition`] and runtime parameters. Every builder returns a
//! [`Statement`]: SQL text with `?` placeholders plus the values to bind, in
//! placeholder order.
//!
//! Table names are emitted without their database qualifier since the
//! connection is already scoped to a database.

use serde::Serialize;
use serde_json::Value;

use vista_core::entity::{EntityDefinition, JoinCondition};
use vista_core::{Error, Pagination, Params, Result};

use crate::filter::where_clause;
use crate::interpolate::interpolate_raw;
use crate::layout::Layout;

/// Composed statement
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Statement {
    /// Statement without bound values (DDL, introspection)
    pub fn raw(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    fn composed(sql: String, params: Vec<Value>) -> Self {
        tracing::debug!(sql = %sql, params = ?params, "composed statement");
        Self { sql, params }
    }
}

fn table_name(def: &EntityDefinition) -> Result<&str> {
    let name = def.table.unqualified_name().trim();
    if name.is_empty() {
        return Err(Error::composition("the table name is missing"));
    }
    Ok(name)
}

/// `FROM`-side joins, each preceded by the clause separator
fn push_joins(sql: &mut String, def: &EntityDefinition, params: &Params, sep: &str) {
    for join in &def.table.joins {
        sql.push_str(sep);
        if let Some(kind) = &join.kind {
            sql.push_str(kind);
            sql.push(' ');
        }
        sql.push_str("JOIN ");
        sql.push_str(&join.table);

        match &join.condition {
            JoinCondition::Using(column) => {
                sql.push_str(&format!(" USING(`{}`)", column));
            }
            JoinCondition::On(clause) => {
                sql.push_str(" ON ");
                sql.push_str(&interpolate_raw(clause, params));
            }
        }
    }
}

fn push_where(sql: &mut String, def: &EntityDefinition, params: &Params, values: &mut Vec<Value>, sep: &str) {
    if let Some(clause) = where_clause(def, params, values) {
        sql.push_str(sep);
        sql.push_str("WHERE ");
        sql.push_str(&clause);
    }
}

/// Data columns in field-definition order, restricted to keys present in `data`
fn data_columns<'d>(def: &'d EntityDefinition, data: &Params) -> (Vec<&'d str>, Vec<Value>) {
    def.fields
        .iter()
        .filter_map(|field| {
            data.get(&field.name)
                .map(|value| (field.name.as_str(), value.clone()))
        })
        .unzip()
}

/// SELECT builder for single-row queries, paged lists and list counts
pub struct SelectBuilder<'a> {
    def: &'a EntityDefinition,
    layout: Layout,
}

impl<'a> SelectBuilder<'a> {
    pub fn new(def: &'a EntityDefinition) -> Self {
        Self {
            def,
            layout: Layout::default(),
        }
    }

    pub fn layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    /// Single-row query; always limited to one row
    ///
    /// `fields` restricts the projection to the named fields.
    pub fn query(&self, params: &Params, fields: Option<&[String]>) -> Result<Statement> {
        let mut values = Vec::new();
        let mut sql = self.select_core(params, fields, &mut values)?;
        sql.push_str(self.layout.separator());
        sql.push_str("LIMIT 1;");
        Ok(Statement::composed(sql, values))
    }

    /// List query, paged when `range` is given
    pub fn list(
        &self,
        params: &Params,
        range: Option<&dyn Pagination>,
        fields: Option<&[String]>,
    ) -> Result<Statement> {
        let mut values = Vec::new();
        let mut sql = self.select_core(params, fields, &mut values)?;
        if let Some(range) = range {
            sql.push_str(self.layout.separator());
            sql.push_str(&format!("LIMIT {}, {}", range.offset(), range.page_size()));
        }
        sql.push(';');
        Ok(Statement::composed(sql, values))
    }

    /// Row count matching what [`list`](Self::list) would return unpaged
    ///
    /// Counts the first field instead of `*` when its name starts with
    /// `distinct`.
    pub fn count(&self, params: &Params) -> Result<Statement> {
        let table = table_name(self.def)?;
        let sep = self.layout.separator();

        let target = match self.def.fields.first() {
            Some(field) if field.name.starts_with("distinct") => field.name.as_str(),
            _ => "*",
        };

        let mut values = Vec::new();
        let mut sql = format!("SELECT COUNT({}) AS ct FROM {}", target, table);
        push_joins(&mut sql, self.def, params, sep);
        push_where(&mut sql, self.def, params, &mut values, sep);
        sql.push(';');

        Ok(Statement::composed(sql, values))
    }

    /// `SELECT <columns> FROM <table>[ joins][ WHERE ..][ extra]`
    fn select_core(&self, params: &Params, fields: Option<&[String]>, values: &mut Vec<Value>) -> Result<String> {
        let table = table_name(self.def)?;
        let columns = self.column_list(fields)?;
        let sep = self.layout.separator();

        let mut sql = format!("SELECT {}{}FROM {}", columns, sep, table);
        push_joins(&mut sql, self.def, params, sep);
        push_where(&mut sql, self.def, params, values, sep);

        if let Some(extra) = &self.def.extra {
            let extra = interpolate_raw(extra, params);
            if !extra.trim().is_empty() {
                sql.push_str(sep);
                sql.push_str(extra.trim());
            }
        }

        Ok(sql)
    }

    fn column_list(&self, fields: Option<&[String]>) -> Result<String> {
        let columns: Vec<String> = self
            .def
            .fields
            .iter()
            .filter(|field| fields.map_or(true, |allowed| allowed.contains(&field.name)))
            .map(|field| match &field.tag {
                Some(tag) => format!("{} AS {}", field.name, tag),
                None => field.name.clone(),
            })
            .collect();

        if columns.is_empty() {
            return Err(Error::composition(format!(
                "no columns to select from {}",
                self.def.table.name
            )));
        }
        Ok(columns.join(", "))
    }
}

/// INSERT builder
pub struct InsertBuilder<'a> {
    def: &'a EntityDefinition,
}

impl<'a> InsertBuilder<'a> {
    pub fn new(def: &'a EntityDefinition) -> Self {
        Self { def }
    }

    /// `INSERT INTO <table> (<cols>) VALUES (?, ...);`
    ///
    /// Only fields present in `data` are inserted, in field-definition order.
    pub fn build(&self, data: &Params) -> Result<Statement> {
        let table = table_name(self.def)?;
        let (columns, values) = data_columns(self.def, data);
        if columns.is_empty() {
            return Err(Error::composition(format!(
                "no insert data matches the fields of {}",
                table
            )));
        }

        let placeholders = vec!["?"; columns.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({});",
            table,
            columns.join(", "),
            placeholders
        );
        Ok(Statement::composed(sql, values))
    }
}

/// UPDATE builder
pub struct UpdateBuilder<'a> {
    def: &'a EntityDefinition,
    layout: Layout,
}

impl<'a> UpdateBuilder<'a> {
    pub fn new(def: &'a EntityDefinition) -> Self {
        Self {
            def,
            layout: Layout::default(),
        }
    }

    pub fn layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    /// `UPDATE <table> SET a=?, ...[ WHERE ..];`
    ///
    /// SET values bind before the filter values taken from `terms`.
    pub fn build(&self, data: &Params, terms: &Params) -> Result<Statement> {
        let table = table_name(self.def)?;
        let sep = self.layout.separator();

        let (columns, mut values) = data_columns(self.def, data);
        if columns.is_empty() {
            return Err(Error::composition(format!(
                "no update data matches the fields of {}",
                table
            )));
        }

        let assignments: Vec<String> = columns.iter().map(|c| format!("{}=?", c)).collect();
        let mut sql = format!("UPDATE {}{}SET {}", table, sep, assignments.join(", "));
        push_where(&mut sql, self.def, terms, &mut values, sep);
        sql.push(';');

        Ok(Statement::composed(sql, values))
    }
}

/// DELETE builder
pub struct DeleteBuilder<'a> {
    def: &'a EntityDefinition,
    layout: Layout,
}

impl<'a> DeleteBuilder<'a> {
    pub fn new(def: &'a EntityDefinition) -> Self {
        Self {
            def,
            layout: Layout::default(),
        }
    }

    pub fn layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    /// `DELETE FROM <table>[ WHERE ..];`
    pub fn build(&self, terms: &Params) -> Result<Statement> {
        let table = table_name(self.def)?;
        let sep = self.layout.separator();

        let mut values = Vec::new();
        let mut sql = format!("DELETE FROM {}", table);
        push_where(&mut sql, self.def, terms, &mut values, sep);
        sql.push(';');

        Ok(Statement::composed(sql, values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use vista_core::entity::{FilterLeaf, FilterNode, JoinSpec, SqlTemplate};
    use vista_core::params::params_from_json;
    use vista_core::{PageRange, Params};

    fn person() -> EntityDefinition {
        SqlTemplate::new("udb.Person")
            .columns(["psnID", "fname", "age"])
            .filter(FilterNode::and(vec![
                FilterLeaf::new("psnID").into(),
                FilterNode::compare("age", ">"),
            ]))
            .build()
            .unwrap()
    }

    fn person_with_joins() -> EntityDefinition {
        SqlTemplate::new("Person AS psn")
            .join(JoinSpec::using("GeoLoc", "geID"))
            .join(JoinSpec::on("Org", "psn.orgID=Org.orgID AND Org.region='[region]'").kind("LEFT"))
            .column("psn.psnID")
            .column(vista_core::entity::Field::aliased("Org.title", "orgName"))
            .filter(FilterLeaf::new("psn.age").op(">").into())
            .extra("ORDER BY [order]")
            .build()
            .unwrap()
    }

    #[test]
    fn test_query_builder_basic() {
        let def = person();
        let params = params_from_json(json!({ "psnID": 3 }));

        let stmt = SelectBuilder::new(&def).query(&params, None).unwrap();
        assert_eq!(
            stmt.sql,
            "SELECT psnID, fname, age FROM Person WHERE psnID=? LIMIT 1;"
        );
        assert_eq!(stmt.params, vec![json!(3)]);
    }

    #[test]
    fn test_query_without_filters() {
        let def = person();
        let stmt = SelectBuilder::new(&def).query(&Params::new(), None).unwrap();
        assert_eq!(stmt.sql, "SELECT psnID, fname, age FROM Person LIMIT 1;");
        assert!(stmt.params.is_empty());
    }

    #[test]
    fn test_query_with_joins_and_extra() {
        let def = person_with_joins();
        let params = params_from_json(json!({ "age": 30, "region": "TW", "order": "psnID" }));

        let stmt = SelectBuilder::new(&def).query(&params, None).unwrap();
        assert_eq!(
            stmt.sql,
            "SELECT psn.psnID, Org.title AS orgName FROM Person AS psn \
             JOIN GeoLoc USING(`geID`) \
             LEFT JOIN Org ON psn.orgID=Org.orgID AND Org.region='TW' \
             WHERE psn.age > ? ORDER BY psnID LIMIT 1;"
        );
        assert_eq!(stmt.params, vec![json!(30)]);
    }

    #[test]
    fn test_pretty_layout() {
        let def = person();
        let params = params_from_json(json!({ "age": 20 }));

        let stmt = SelectBuilder::new(&def)
            .layout(Layout::Pretty)
            .query(&params, None)
            .unwrap();
        assert_eq!(
            stmt.sql,
            "SELECT psnID, fname, age\nFROM Person\nWHERE age > ?\nLIMIT 1;"
        );
    }

    #[test]
    fn test_list_with_range() {
        let def = person();
        let range = PageRange::new(3, 10);

        let stmt = SelectBuilder::new(&def)
            .list(&Params::new(), Some(&range), None)
            .unwrap();
        assert!(stmt.sql.ends_with("LIMIT 20, 10;"));
    }

    #[test]
    fn test_list_without_range() {
        let def = person();
        let stmt = SelectBuilder::new(&def).list(&Params::new(), None, None).unwrap();
        assert_eq!(stmt.sql, "SELECT psnID, fname, age FROM Person;");
    }

    #[test]
    fn test_field_allowlist() {
        let def = person();
        let allowed = vec!["age".to_string(), "psnID".to_string()];

        let stmt = SelectBuilder::new(&def)
            .list(&Params::new(), None, Some(&allowed))
            .unwrap();
        assert_eq!(stmt.sql, "SELECT psnID, age FROM Person;");

        let none = vec!["unknown".to_string()];
        let err = SelectBuilder::new(&def)
            .list(&Params::new(), None, Some(&none))
            .unwrap_err();
        assert!(err.is_composition());
    }

    #[test]
    fn test_count_mirrors_list() {
        let def = person_with_joins();
        let params = params_from_json(json!({ "age": 30, "region": "TW" }));

        let stmt = SelectBuilder::new(&def).count(&params).unwrap();
        assert_eq!(
            stmt.sql,
            "SELECT COUNT(*) AS ct FROM Person AS psn \
             JOIN GeoLoc USING(`geID`) \
             LEFT JOIN Org ON psn.orgID=Org.orgID AND Org.region='TW' \
             WHERE psn.age > ?;"
        );
        assert_eq!(stmt.params, vec![json!(30)]);
    }

    #[test]
    fn test_count_distinct() {
        let def = SqlTemplate::new("Person")
            .columns(["distinct fname", "age"])
            .build()
            .unwrap();
        let stmt = SelectBuilder::new(&def).count(&Params::new()).unwrap();
        assert_eq!(stmt.sql, "SELECT COUNT(distinct fname) AS ct FROM Person;");
    }

    #[test]
    fn test_insert_follows_field_order() {
        let def = person();
        let data = params_from_json(json!({ "age": 18, "extra": 1, "fname": "Ann" }));

        let stmt = InsertBuilder::new(&def).build(&data).unwrap();
        assert_eq!(stmt.sql, "INSERT INTO Person (fname, age) VALUES (?, ?);");
        assert_eq!(stmt.params, vec![json!("Ann"), json!(18)]);
    }

    #[test]
    fn test_insert_without_data() {
        let def = person();
        let data = params_from_json(json!({ "unknown": 1 }));
        assert!(InsertBuilder::new(&def).build(&data).unwrap_err().is_composition());
    }

    #[test]
    fn test_update_binds_set_then_where() {
        let def = person();
        let data = params_from_json(json!({ "age": 19, "fname": "Ann" }));
        let terms = params_from_json(json!({ "psnID": 3 }));

        let stmt = UpdateBuilder::new(&def).build(&data, &terms).unwrap();
        assert_eq!(stmt.sql, "UPDATE Person SET fname=?, age=? WHERE psnID=?;");
        assert_eq!(stmt.params, vec![json!("Ann"), json!(19), json!(3)]);
    }

    #[test]
    fn test_delete() {
        let def = person();
        let terms = params_from_json(json!({ "psnID": 3, "age": 60 }));

        let stmt = DeleteBuilder::new(&def).build(&terms).unwrap();
        assert_eq!(stmt.sql, "DELETE FROM Person WHERE (psnID=? AND age > ?);");
        assert_eq!(stmt.params, vec![json!(3), json!(60)]);

        let stmt = DeleteBuilder::new(&def)
            .layout(Layout::Pretty)
            .build(&Params::new())
            .unwrap();
        assert_eq!(stmt.sql, "DELETE FROM Person;");
    }

    #[test]
    fn test_missing_table_is_composition_error() {
        let mut def = person();
        def.table.name = String::new();
        let err = SelectBuilder::new(&def).query(&Params::new(), None).unwrap_err();
        assert!(err.is_composition());
    }
}
