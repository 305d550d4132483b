//! Statement layout

use vista_core::Config;

/// How clauses of a composed statement are separated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Layout {
    /// Single line, clauses joined by one space
    #[default]
    Compact,
    /// One clause per line
    Pretty,
}

impl Layout {
    pub fn from_pretty(pretty: bool) -> Self {
        if pretty {
            Layout::Pretty
        } else {
            Layout::Compact
        }
    }

    /// Clause separator
    pub fn separator(self) -> &'static str {
        match self {
            Layout::Compact => " ",
            Layout::Pretty => "\n",
        }
    }
}

impl From<&Config> for Layout {
    fn from(config: &Config) -> Self {
        Layout::from_pretty(config.pretty_sql)
    }
}
