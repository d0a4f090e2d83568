//! Page/limit pagination for list queries
//!
//! Lists are addressed by a 1-based page number and a page size. No upper
//! bound is applied to either.

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;

/// A validated page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    /// Build from raw arguments. Missing or non-positive values fall back
    /// to the defaults.
    pub fn new(page: Option<i32>, limit: Option<i32>) -> Self {
        Self {
            page: page.filter(|p| *p >= 1).map_or(DEFAULT_PAGE, i64::from),
            limit: limit.filter(|l| *l >= 1).map_or(DEFAULT_LIMIT, i64::from),
        }
    }

    /// Rows to skip before this page
    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }

    /// Whether rows remain beyond this page
    pub fn has_more(&self, total: i64) -> bool {
        total > self.page * self.limit
    }

    /// Number of pages needed to show `total` rows
    pub fn total_pages(&self, total: i64) -> i64 {
        if total <= 0 {
            0
        } else {
            (total + self.limit - 1) / self.limit
        }
    }
}
