//! Entity definitions
//!
//! An entity definition describes a queryable view over a table: the table
//! and its joins, the projected fields, an optional filter tree and an
//! optional trailing clause (`ORDER BY ...`). Definitions are immutable once
//! built and are shared between concurrent operations.

use serde::{Deserialize, Serialize};

use super::filter::FilterNode;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDefinition {
    pub table: TableRef,

    /// Projected fields; order drives SELECT and INSERT/UPDATE column order
    #[serde(default)]
    pub fields: Vec<Field>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<FilterNode>,

    /// Raw trailing SQL, may carry `[key]` placeholders
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<String>,
}

/// Main table and its joins
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRef {
    /// Table name, optionally qualified with a database (`db.table`)
    pub name: String,

    #[serde(default, rename = "join", skip_serializing_if = "Vec::is_empty")]
    pub joins: Vec<JoinSpec>,
}

/// Joined table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawJoin", into = "RawJoin")]
pub struct JoinSpec {
    pub table: String,

    /// Join type (`LEFT`, `INNER`, ...)
    pub kind: Option<String>,

    pub condition: JoinCondition,
}

/// How a joined table is matched
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinCondition {
    /// `USING(`column`)`
    Using(String),
    /// `ON <clause>`, the clause may carry `[key]` placeholders
    On(String),
}

/// Wire shape of a join: `{table, type?, use?, onWhat?}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawJoin {
    #[serde(default)]
    table: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    #[serde(default, rename = "use", skip_serializing_if = "Option::is_none")]
    using: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    on_what: Option<String>,
}

impl TryFrom<RawJoin> for JoinSpec {
    type Error = Error;

    fn try_from(raw: RawJoin) -> Result<Self> {
        if raw.table.trim().is_empty() {
            return Err(Error::invalid_definition("joined table name is missing"));
        }

        let condition = match (raw.using, raw.on_what) {
            (Some(column), None) => JoinCondition::Using(column),
            (None, Some(clause)) => JoinCondition::On(clause),
            (None, None) => {
                return Err(Error::invalid_definition(format!(
                    "missing join clause for {}",
                    raw.table
                )))
            }
            (Some(_), Some(_)) => {
                return Err(Error::invalid_definition(format!(
                    "join on {} sets both use and onWhat",
                    raw.table
                )))
            }
        };

        Ok(JoinSpec {
            table: raw.table,
            kind: raw.kind,
            condition,
        })
    }
}

impl From<JoinSpec> for RawJoin {
    fn from(join: JoinSpec) -> Self {
        let (using, on_what) = match join.condition {
            JoinCondition::Using(column) => (Some(column), None),
            JoinCondition::On(clause) => (None, Some(clause)),
        };
        RawJoin {
            table: join.table,
            kind: join.kind,
            using,
            on_what,
        }
    }
}

impl JoinSpec {
    pub fn using(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            kind: None,
            condition: JoinCondition::Using(column.into()),
        }
    }

    pub fn on(table: impl Into<String>, clause: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            kind: None,
            condition: JoinCondition::On(clause.into()),
        }
    }

    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }
}

/// Projected field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,

    /// Output alias (`AS <tag>`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

impl Field {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tag: None,
        }
    }

    pub fn aliased(name: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tag: Some(tag.into()),
        }
    }
}

impl From<&str> for Field {
    fn from(name: &str) -> Self {
        Field::new(name)
    }
}

impl TableRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            joins: Vec::new(),
        }
    }

    /// Table name without the database qualifier (`db.table` → `table`)
    pub fn unqualified_name(&self) -> &str {
        unqualified(&self.name)
    }

    /// Database qualifier, if any
    pub fn database(&self) -> Option<&str> {
        match self.name.find('.') {
            Some(idx) if idx > 0 => Some(&self.name[..idx]),
            _ => None,
        }
    }
}

/// Strip a leading `db.` qualifier
pub fn unqualified(name: &str) -> &str {
    match name.find('.') {
        Some(idx) if idx > 0 => &name[idx + 1..],
        _ => name,
    }
}

impl EntityDefinition {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: TableRef::new(table),
            fields: Vec::new(),
            filters: None,
            extra: None,
        }
    }

    /// Parse and validate a JSON definition
    pub fn from_json_str(json: &str) -> Result<Self> {
        let def: Self = serde_json::from_str(json)?;
        def.validate()?;
        Ok(def)
    }

    /// Parse and validate a YAML definition
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let def: Self = serde_yaml::from_str(yaml)?;
        def.validate()?;
        Ok(def)
    }

    /// Structural checks for definitions loaded from a definition source
    pub fn validate(&self) -> Result<()> {
        if self.table.name.trim().is_empty() {
            return Err(Error::invalid_definition("the table name is missing"));
        }
        if self.fields.is_empty() {
            return Err(Error::invalid_definition(format!(
                "the fields of {} are missing",
                self.table.name
            )));
        }
        Ok(())
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::FilterLeaf;

    const PERSON_YAML: &str = r#"
table:
  name: udb.Person AS psn
  join:
    - table: GeoLoc
      use: geID
    - table: Org
      type: LEFT
      onWhat: psn.orgID=Org.orgID
fields:
  - name: psnID
  - name: fname
    tag: name
filters:
  op: AND
  filters:
    - name: psnID
    - name: fname
      op: LIKE
extra: ORDER BY psnID
"#;

    #[test]
    fn test_yaml_definition() {
        let def = EntityDefinition::from_yaml_str(PERSON_YAML).unwrap();
        assert_eq!(def.table.unqualified_name(), "Person AS psn");
        assert_eq!(def.table.database(), Some("udb"));
        assert_eq!(def.table.joins[0], JoinSpec::using("GeoLoc", "geID"));
        assert_eq!(
            def.table.joins[1],
            JoinSpec::on("Org", "psn.orgID=Org.orgID").kind("LEFT")
        );
        assert_eq!(def.fields[1], Field::aliased("fname", "name"));
        assert_eq!(
            def.filters,
            Some(FilterNode::and(vec![
                FilterLeaf::new("psnID").into(),
                FilterNode::compare("fname", "LIKE"),
            ]))
        );
        assert_eq!(def.extra.as_deref(), Some("ORDER BY psnID"));
    }

    #[test]
    fn test_join_requires_exactly_one_condition() {
        let neither = r#"{ "table": { "name": "Person", "join": [{ "table": "Org" }] }, "fields": [{ "name": "id" }] }"#;
        assert!(EntityDefinition::from_json_str(neither).is_err());

        let both = r#"{ "table": { "name": "Person", "join": [{ "table": "Org", "use": "orgID", "onWhat": "a=b" }] }, "fields": [{ "name": "id" }] }"#;
        assert!(EntityDefinition::from_json_str(both).is_err());
    }

    #[test]
    fn test_missing_fields_rejected() {
        let result = EntityDefinition::from_json_str(r#"{ "table": { "name": "Person" } }"#);
        assert!(matches!(result, Err(Error::InvalidDefinition { .. })));
    }

    #[test]
    fn test_join_serializes_to_wire_shape() {
        let json = serde_json::to_value(JoinSpec::on("Org", "a=b").kind("LEFT")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "table": "Org", "type": "LEFT", "onWhat": "a=b" })
        );
    }

    #[test]
    fn test_unqualified() {
        assert_eq!(unqualified("udb.Person"), "Person");
        assert_eq!(unqualified("Person"), "Person");
    }
}
