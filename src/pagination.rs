//! This modules defines the common functionality for paging data.

/// The config for pagination
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// The page number to default to when not specified in a request.
    pub default_page: u64,
    /// The number of transactions per page when not specified in a request.
    pub default_page_size: u64,
    /// The largest page size a client may request.
    pub max_page_size: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page: 1,
            default_page_size: 10,
            max_page_size: 100,
        }
    }
}

/// A validated, one-based page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// The one-based page number.
    pub number: u64,
    /// The maximum number of items on the page.
    pub size: u64,
}

impl Page {
    /// Resolve the requested page number and size against `config`.
    ///
    /// Missing values use the config defaults. Page numbers below one are
    /// treated as the first page and the size is capped at
    /// `config.max_page_size`. A size of zero gives an empty page.
    pub fn new(number: Option<u64>, size: Option<u64>, config: &PaginationConfig) -> Self {
        let number = number.unwrap_or(config.default_page).max(1);
        let size = size
            .unwrap_or(config.default_page_size)
            .min(config.max_page_size);

        Self { number, size }
    }

    /// The number of items to skip before this page.
    pub fn offset(&self) -> u64 {
        (self.number - 1).saturating_mul(self.size)
    }

    /// The number of pages needed to show `item_count` items.
    ///
    /// Empty pages never show anything, so there are no pages when the size is zero.
    pub fn page_count(&self, item_count: u64) -> u64 {
        if self.size == 0 {
            return 0;
        }

        item_count.div_ceil(self.size)
    }
}
