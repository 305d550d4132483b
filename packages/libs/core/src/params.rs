//! Runtime parameters and pagination

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Parameter map: filter terms, placeholder values or row data.
///
/// Filters test keys for presence only, so a key mapped to `null` still
/// switches its filter on.
pub type Params = HashMap<String, Value>;

/// Result row keyed by column name
pub type Row = serde_json::Map<String, Value>;

/// Default number of rows per page
pub const DEFAULT_PAGE_SIZE: u64 = 20;

/// Row window of a paged listing
pub trait Pagination {
    /// Zero-based row offset
    fn offset(&self) -> u64;

    fn page_size(&self) -> u64;
}

/// Page range with a 1-based page index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRange {
    pub page_index: u64,
    pub page_size: u64,
}

impl PageRange {
    pub fn new(page_index: u64, page_size: u64) -> Self {
        Self {
            page_index,
            page_size,
        }
    }

    /// Page with the default page size
    pub fn page(page_index: u64) -> Self {
        Self::new(page_index, DEFAULT_PAGE_SIZE)
    }
}

impl Pagination for PageRange {
    fn offset(&self) -> u64 {
        self.page_index.saturating_sub(1) * self.page_size
    }

    fn page_size(&self) -> u64 {
        self.page_size
    }
}

/// Build a [`Params`] map from a JSON object; anything else yields an empty map
pub fn params_from_json(value: Value) -> Params {
    match value {
        Value::Object(map) => map.into_iter().collect(),
        _ => Params::new(),
    }
}
