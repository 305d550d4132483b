//! Column options

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Column constraints and attributes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnOptions {
    #[serde(default, skip_serializing_if = "is_false")]
    pub not_null: bool,

    /// Default value, rendered into DDL as-is
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_default"
    )]
    pub default: Option<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub auto_inc: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub unsigned: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl ColumnOptions {
    pub fn is_empty(&self) -> bool {
        !self.not_null
            && self.default.is_none()
            && !self.auto_inc
            && !self.unsigned
            && self.comment.is_none()
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_inc = true;
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Column attribute suffix for DDL: `NOT NULL`, `DEFAULT`, `AUTO_INCREMENT`, `COMMENT`
    pub fn to_ddl_suffix(&self) -> String {
        let mut sql = String::new();
        if self.not_null {
            sql.push_str(" NOT NULL");
        }
        if let Some(default) = &self.default {
            sql.push_str(" DEFAULT ");
            sql.push_str(default);
        }
        if self.auto_inc {
            sql.push_str(" AUTO_INCREMENT");
        }
        if let Some(comment) = &self.comment {
            sql.push_str(&format!(" COMMENT '{}'", comment));
        }
        sql
    }
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// Accepts any JSON scalar as a default value (`true`, `0`, `"abc"`)
fn deserialize_default<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}
