//! Fluent entity definition builder
//!
//! Builds an [`EntityDefinition`] in code instead of loading it from a
//! definition file.
//!
//! ```
//! use vista_core::entity::{FilterLeaf, FilterNode, JoinSpec, SqlTemplate};
//!
//! let def = SqlTemplate::new("Person AS psn")
//!     .columns(["id", "addr AS address"])
//!     .join(JoinSpec::using("GeoLoc", "geID"))
//!     .filter(SqlTemplate::chain_filters(
//!         "AND",
//!         vec![FilterNode::compare("addr", "="), FilterLeaf::new("age").op(">").into()],
//!     ).unwrap())
//!     .extra("ORDER BY id")
//!     .build()
//!     .unwrap();
//! assert_eq!(def.fields.len(), 2);
//! ```

use super::definition::{EntityDefinition, Field, JoinCondition, JoinSpec, TableRef};
use super::filter::{FilterNode, LogicalOp};
use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct SqlTemplate {
    table: TableRef,
    fields: Vec<Field>,
    filters: Option<FilterNode>,
    extra: Option<String>,
}

impl SqlTemplate {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: TableRef::new(table),
            fields: Vec::new(),
            filters: None,
            extra: None,
        }
    }

    /// Append a join
    pub fn join(mut self, join: JoinSpec) -> Self {
        self.table.joins.push(join);
        self
    }

    /// Append one column
    pub fn column(mut self, field: impl Into<Field>) -> Self {
        self.fields.push(field.into());
        self
    }

    /// Replace the column list
    pub fn columns<I, F>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<Field>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn filter(mut self, filter: FilterNode) -> Self {
        self.filters = Some(filter);
        self
    }

    pub fn extra(mut self, extra: impl Into<String>) -> Self {
        self.extra = Some(extra.into());
        self
    }

    /// Combine filters under `AND` / `OR` (case-insensitive)
    pub fn chain_filters(op: &str, filters: Vec<FilterNode>) -> Result<FilterNode> {
        let op = LogicalOp::try_from(op.to_string())?;
        Ok(FilterNode::Combinator { op, filters })
    }

    pub fn build(self) -> Result<EntityDefinition> {
        if self.table.name.trim().is_empty() {
            return Err(Error::invalid_definition("the table name is missing"));
        }

        for join in &self.table.joins {
            if join.table.trim().is_empty() {
                return Err(Error::invalid_definition("joined table name is missing"));
            }
            let clause = match &join.condition {
                JoinCondition::Using(column) => column,
                JoinCondition::On(clause) => clause,
            };
            if clause.trim().is_empty() {
                return Err(Error::invalid_definition(format!(
                    "missing join clause for {}",
                    join.table
                )));
            }
        }

        Ok(EntityDefinition {
            table: self.table,
            fields: self.fields,
            filters: self.filters,
            extra: self.extra,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_build() {
        let def = SqlTemplate::new("Person")
            .column("id")
            .column(Field::aliased("addr", "address"))
            .join(JoinSpec::on("Org", "Person.orgID=Org.orgID").kind("LEFT"))
            .build()
            .unwrap();

        assert_eq!(def.table.name, "Person");
        assert_eq!(def.field_names().collect::<Vec<_>>(), vec!["id", "addr"]);
        assert_eq!(def.table.joins.len(), 1);
    }

    #[test]
    fn test_join_validation() {
        let err = SqlTemplate::new("Person")
            .join(JoinSpec::using("", "geID"))
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidDefinition { .. }));

        let err = SqlTemplate::new("Person")
            .join(JoinSpec::on("Org", "  "))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("missing join clause"));
    }

    #[test]
    fn test_chain_filters() {
        let node = SqlTemplate::chain_filters("or", vec![FilterNode::compare("a", "=")]).unwrap();
        assert!(matches!(node, FilterNode::Combinator { op: LogicalOp::Or, .. }));
        assert!(SqlTemplate::chain_filters("nand", vec![]).is_err());
    }
}
