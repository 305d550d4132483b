//! Filter tree compilation
//!
//! Turns a [`FilterNode`] into a WHERE-clause fragment with `?` placeholders.
//! Values are appended to the output list in the same order their
//! placeholders appear in the text.
//!
//! - A leaf whose lookup key is absent from the parameters yields nothing.
//! - A combinator with no surviving children yields nothing, with one
//!   surviving child yields that child unwrapped, and with more yields
//!   `(a OP b ...)`.

use serde_json::Value;
use vista_core::entity::{EntityDefinition, FilterLeaf, FilterNode};
use vista_core::Params;

/// Compile `node` against `params`, appending bound values to `values`.
///
/// Returns an empty string when no leaf is active.
pub fn compile_filter(node: &FilterNode, params: &Params, values: &mut Vec<Value>) -> String {
    match node {
        FilterNode::Leaf(leaf) => compile_leaf(leaf, params, values),
        FilterNode::Combinator { op, filters } => {
            let mut parts: Vec<String> = filters
                .iter()
                .map(|child| compile_filter(child, params, values))
                .filter(|part| !part.is_empty())
                .collect();

            match parts.len() {
                0 => String::new(),
                1 => parts.pop().unwrap_or_default(),
                _ => format!("({})", parts.join(&format!(" {} ", op))),
            }
        }
    }
}

fn compile_leaf(leaf: &FilterLeaf, params: &Params, values: &mut Vec<Value>) -> String {
    let Some(value) = params.get(leaf.lookup_key()) else {
        return String::new();
    };

    let column = leaf.column();
    match leaf.op.as_deref() {
        Some(op) if leaf.no_arg => format!("{} {}", column, op),
        Some(op) => {
            values.push(value.clone());
            format!("{} {} ?", column, op)
        }
        None => {
            values.push(value.clone());
            format!("{}=?", column)
        }
    }
}

/// WHERE-clause body for a definition, if its filters produce anything
pub fn where_clause(def: &EntityDefinition, params: &Params, values: &mut Vec<Value>) -> Option<String> {
    let node = def.filters.as_ref()?;
    let compiled = compile_filter(node, params, values);
    if compiled.is_empty() {
        None
    } else {
        Some(compiled)
    }
}
