use serde::{Deserialize, Serialize};

/// Default number of items per page, as used by the feed and comment views.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// One page of a paginated list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub has_more: Option<bool>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items,
            total: None,
            has_more: None,
        }
    }

    /// Whether another page follows this one.
    ///
    /// Uses the gateway's flag when it sends one, otherwise assumes a full
    /// page means there may be more.
    pub fn has_more(&self, page_size: u32) -> bool {
        self.has_more
            .unwrap_or(self.items.len() >= page_size as usize)
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

/// 1-based page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.max(1),
        }
    }

    pub fn first(page_size: u32) -> Self {
        Self::new(1, page_size)
    }

    pub fn next(self) -> Self {
        Self::new(self.page + 1, self.page_size)
    }

    pub fn query(&self) -> Vec<(&'static str, String)> {
        vec![
            ("page", self.page.to_string()),
            ("pageSize", self.page_size.to_string()),
        ]
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::first(DEFAULT_PAGE_SIZE)
    }
}
