//! Search result types

use super::{Address, NumericType, TypedValue};
use serde::{Deserialize, Serialize};

/// One matching window found by a search
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub address: Address,
    pub value: TypedValue,
}

impl SearchResult {
    /// Creates a new search result
    pub fn new(address: Address, value: TypedValue) -> Self {
        SearchResult { address, value }
    }

    pub fn numeric_type(&self) -> NumericType {
        self.value.numeric_type()
    }
}

/// Transport form of a search result: every field rendered as text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultEntry {
    pub address: String,
    pub value: String,
    #[serde(rename = "type")]
    pub value_type: String,
}

impl From<&SearchResult> for ResultEntry {
    fn from(result: &SearchResult) -> Self {
        ResultEntry {
            address: result.address.to_string(),
            value: result.value.to_string(),
            value_type: result.numeric_type().as_str().to_string(),
        }
    }
}
