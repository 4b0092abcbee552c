//! Shared request value types.

use serde_json::Value;

use crate::http::Parameters;

/// Zero-based page selection sent as the `page` and `size` query parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub size: u32,
}

impl Pagination {
    pub const DEFAULT_SIZE: u32 = 20;

    pub fn new(page: u32, size: u32) -> Self {
        Self { page, size }
    }

    /// Write `page` and `size` into `params`, replacing any existing values.
    pub fn apply(&self, params: &mut Parameters) {
        params.insert("page".to_string(), Value::from(self.page));
        params.insert("size".to_string(), Value::from(self.size));
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 0,
            size: Self::DEFAULT_SIZE,
        }
    }
}
