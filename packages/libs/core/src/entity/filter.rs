//! Filter trees
//!
//! A filter is either a leaf condition or an AND/OR combinator over further
//! filters. Leaves are gated by the parameter map: a leaf only takes part in
//! the WHERE clause when its lookup key is present.
//!
//! # JSON
//!
//! ```json
//! { "op": "AND", "filters": [
//!     { "name": "addr", "op": "=" },
//!     { "op": "or", "filters": [
//!         { "name": "x", "field": "passwd", "op": "IS NOT NULL", "noArg": true },
//!         { "name": "age", "op": ">" }
//!     ] }
//! ] }
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Filter node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterNode {
    Combinator {
        op: LogicalOp,
        filters: Vec<FilterNode>,
    },
    Leaf(FilterLeaf),
}

/// Boolean combinator, parsed case-insensitively
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum LogicalOp {
    And,
    Or,
}

/// Leaf condition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterLeaf {
    /// Parameter name, possibly qualified (`table.column`)
    pub name: String,

    /// Column expression rendered instead of `name`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,

    /// Comparison operator (`=`, `>`, `LIKE`, `IS NOT NULL`, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub op: Option<String>,

    /// The operator takes no bound value; the parameter only switches the leaf on
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub no_arg: bool,
}

impl LogicalOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalOp::And => "AND",
            LogicalOp::Or => "OR",
        }
    }
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for LogicalOp {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.eq_ignore_ascii_case("and") {
            Ok(LogicalOp::And)
        } else if value.eq_ignore_ascii_case("or") {
            Ok(LogicalOp::Or)
        } else {
            Err(Error::invalid_definition(format!(
                "unknown filter combinator: {}",
                value
            )))
        }
    }
}

impl From<LogicalOp> for String {
    fn from(op: LogicalOp) -> Self {
        op.as_str().to_string()
    }
}

impl FilterLeaf {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field: None,
            op: None,
            no_arg: false,
        }
    }

    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    pub fn no_arg(mut self) -> Self {
        self.no_arg = true;
        self
    }

    /// Key looked up in the parameter map: the part after the first `.`
    pub fn lookup_key(&self) -> &str {
        match self.name.find('.') {
            Some(idx) if idx > 0 => &self.name[idx + 1..],
            _ => &self.name,
        }
    }

    /// Column expression rendered in SQL
    pub fn column(&self) -> &str {
        self.field.as_deref().unwrap_or(&self.name)
    }
}

impl FilterNode {
    pub fn and(filters: Vec<FilterNode>) -> Self {
        FilterNode::Combinator {
            op: LogicalOp::And,
            filters,
        }
    }

    pub fn or(filters: Vec<FilterNode>) -> Self {
        FilterNode::Combinator {
            op: LogicalOp::Or,
            filters,
        }
    }

    /// Leaf `<name> <op> ?`
    pub fn compare(name: impl Into<String>, op: impl Into<String>) -> Self {
        FilterNode::Leaf(FilterLeaf::new(name).op(op))
    }

    /// Visit every leaf, depth first
    pub fn leaves(&self) -> Vec<&FilterLeaf> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a FilterLeaf>) {
        match self {
            FilterNode::Leaf(leaf) => out.push(leaf),
            FilterNode::Combinator { filters, .. } => {
                for f in filters {
                    f.collect_leaves(out);
                }
            }
        }
    }
}

impl From<FilterLeaf> for FilterNode {
    fn from(leaf: FilterLeaf) -> Self {
        FilterNode::Leaf(leaf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookup_key() {
        assert_eq!(FilterLeaf::new("psn.age").lookup_key(), "age");
        assert_eq!(FilterLeaf::new("age").lookup_key(), "age");
        assert_eq!(FilterLeaf::new(".age").lookup_key(), ".age");
        assert_eq!(FilterLeaf::new("a.b.c").lookup_key(), "b.c");
    }

    #[test]
    fn test_filter_deserialization() {
        let node: FilterNode = serde_json::from_value(json!({
            "op": "and",
            "filters": [
                { "name": "addr", "op": "=" },
                { "op": "Or", "filters": [
                    { "name": "x", "field": "passwd", "op": "IS NOT NULL", "noArg": true },
                    { "name": "age", "op": ">" }
                ] }
            ]
        }))
        .unwrap();

        let expected = FilterNode::and(vec![
            FilterNode::compare("addr", "="),
            FilterNode::or(vec![
                FilterLeaf::new("x").field("passwd").op("IS NOT NULL").no_arg().into(),
                FilterNode::compare("age", ">"),
            ]),
        ]);
        assert_eq!(node, expected);
        assert_eq!(
            node.leaves().iter().map(|l| l.name.as_str()).collect::<Vec<_>>(),
            vec!["addr", "x", "age"]
        );
    }

    #[test]
    fn test_leaf_with_comparison_op_is_not_a_combinator() {
        let node: FilterNode = serde_json::from_value(json!({ "name": "age", "op": ">=" })).unwrap();
        assert_eq!(node, FilterNode::compare("age", ">="));
    }

    #[test]
    fn test_unknown_combinator_rejected() {
        let result: Result<FilterNode, _> = serde_json::from_value(json!({
            "op": "XOR",
            "filters": [{ "name": "a" }]
        }));
        assert!(result.is_err());
    }
}
