//! Abstract column types
//!
//! Vista describes columns with a backend-neutral type descriptor and
//! translates it to and from MySQL column type strings. The translation is
//! lossy on purpose: `from_native_type(to_native_type(t))` is not guaranteed
//! to give `t` back (unsigned flags, display widths and precision are not
//! always carried).

use serde::{Deserialize, Serialize};

use super::column::ColumnOptions;

/// Length used for `varchar` when a string column has no `maxLength`
pub const DEFAULT_VARCHAR_LENGTH: u32 = 8;

/// Native fragment for the `serial` type
pub const SERIAL_NATIVE_TYPE: &str = "bigint unsigned not null auto_increment unique";

/// Type family of an abstract column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TypeKind {
    Boolean,
    Integer,
    Number,
    String,
    /// Auto-incrementing unsigned big integer
    Serial,
    /// Backend-specific type passed through verbatim
    Raw(String),
}

impl TypeKind {
    pub fn as_str(&self) -> &str {
        match self {
            TypeKind::Boolean => "boolean",
            TypeKind::Integer => "integer",
            TypeKind::Number => "number",
            TypeKind::String => "string",
            TypeKind::Serial => "serial",
            TypeKind::Raw(raw) => raw,
        }
    }
}

impl From<String> for TypeKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "boolean" => TypeKind::Boolean,
            "integer" => TypeKind::Integer,
            "number" => TypeKind::Number,
            "string" => TypeKind::String,
            "serial" => TypeKind::Serial,
            _ => TypeKind::Raw(value),
        }
    }
}

impl From<TypeKind> for String {
    fn from(kind: TypeKind) -> Self {
        match kind {
            TypeKind::Raw(raw) => raw,
            other => other.as_str().to_string(),
        }
    }
}

/// Abstract column type
///
/// # JSON
///
/// ```json
/// { "type": "integer", "format": "int64", "maxLength": 20, "options": { "unsigned": true } }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnType {
    #[serde(rename = "type")]
    pub kind: TypeKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,

    #[serde(default, skip_serializing_if = "ColumnOptions::is_empty")]
    pub options: ColumnOptions,
}

impl ColumnType {
    pub fn new(kind: TypeKind) -> Self {
        Self {
            kind,
            format: None,
            max_length: None,
            options: ColumnOptions::default(),
        }
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn with_max_length(mut self, max_length: u32) -> Self {
        self.max_length = Some(max_length);
        self
    }

    pub fn with_options(mut self, options: ColumnOptions) -> Self {
        self.options = options;
        self
    }

    /// Whether the type could not be mapped and was passed through verbatim
    pub fn is_raw(&self) -> bool {
        matches!(self.kind, TypeKind::Raw(_))
    }

    /// MySQL column type string
    pub fn to_native_type(&self) -> String {
        match &self.kind {
            TypeKind::Boolean => "bool".to_string(),
            TypeKind::Integer => match self.format.as_deref() {
                Some("int8") => "tinyint",
                Some("int16") => "smallint",
                Some("int64") => "bigint",
                _ => "int",
            }
            .to_string(),
            TypeKind::Number => match self.format.as_deref() {
                Some(format) if format.starts_with("decimal") => {
                    format!("decimal({})", &format["decimal".len()..])
                }
                Some("double") => "double".to_string(),
                _ => "float".to_string(),
            },
            TypeKind::String => {
                if self.format.as_deref() == Some("text") {
                    "text".to_string()
                } else {
                    format!(
                        "varchar({})",
                        self.max_length.unwrap_or(DEFAULT_VARCHAR_LENGTH)
                    )
                }
            }
            TypeKind::Serial => SERIAL_NATIVE_TYPE.to_string(),
            TypeKind::Raw(raw) => raw.clone(),
        }
    }

    /// Parse a MySQL column type string (as reported by `SHOW COLUMNS`)
    pub fn from_native_type(native: &str) -> Self {
        let exact = match native {
            "tinyint(1)" => Some((TypeKind::Boolean, None)),
            "tinyint" => Some((TypeKind::Integer, Some("int8"))),
            "smallint" => Some((TypeKind::Integer, Some("int16"))),
            "int" => Some((TypeKind::Integer, None)),
            "bigint" => Some((TypeKind::Integer, Some("int64"))),
            "float" => Some((TypeKind::Number, Some("float"))),
            "double" => Some((TypeKind::Number, Some("double"))),
            _ => None,
        };

        match exact {
            Some((kind, format)) => Self {
                format: format.map(str::to_string),
                ..Self::new(kind)
            },
            None => Self::from_parameterized(native),
        }
    }

    fn from_parameterized(native: &str) -> Self {
        if native.starts_with("decimal") {
            let mut prop = Self::new(TypeKind::Number);
            prop.format = paren_content(native).map(str::to_string);
            return prop;
        }

        if native.starts_with("varchar(") {
            let mut prop = Self::new(TypeKind::String);
            prop.max_length = paren_content(native).and_then(|s| s.trim().parse().ok());
            return prop;
        }

        // order matters: "bigint" must be tried before "int"
        const INTEGER_PREFIXES: [(&str, Option<&str>); 4] = [
            ("bigint", Some("int64")),
            ("int", None),
            ("smallint", Some("int16")),
            ("tinyint", Some("int8")),
        ];

        for (prefix, format) in INTEGER_PREFIXES {
            let Some(rest) = native.strip_prefix(prefix) else {
                continue;
            };

            let (max_length, modifiers) = if rest.starts_with('(') {
                let Some(close) = rest.find(')') else {
                    break;
                };
                (rest[1..close].trim().parse().ok(), &rest[close + 1..])
            } else if rest.starts_with(' ') {
                (None, rest)
            } else {
                continue;
            };

            let mut prop = Self::new(TypeKind::Integer);
            prop.format = format.map(str::to_string);
            prop.max_length = max_length;
            if modifiers.split_whitespace().any(|m| m == "unsigned") {
                prop.options.unsigned = true;
            }
            return prop;
        }

        tracing::warn!(native_type = native, "unrecognized column type, passed through");
        Self::new(TypeKind::Raw(native.to_string()))
    }
}

/// Text between the first `(` and the following `)`
fn paren_content(s: &str) -> Option<&str> {
    let open = s.find('(')?;
    let close = s[open..].find(')')? + open;
    Some(&s[open + 1..close])
}
