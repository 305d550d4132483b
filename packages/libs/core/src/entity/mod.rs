//! Entity definitions and filter trees
//!
//! - `definition`: table, joins, fields, filters and extra clause
//! - `filter`: leaf / combinator filter nodes
//! - `template`: fluent builder for definitions written in code

mod definition;
mod filter;
mod template;

pub use definition::{unqualified, EntityDefinition, Field, JoinCondition, JoinSpec, TableRef};
pub use filter::{FilterLeaf, FilterNode, LogicalOp};
pub use template::SqlTemplate;
