//! Page-number pagination for collection reads.
//!
//! The order listing ships with `page_size = 5` and `max_page_size = 3`. A request
//! without a size gets five rows while an explicit size is capped at three. This
//! mirrors the deployed behavior and is kept as is.

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};

/// Page size limits for one collection; fields left out of config keep the order defaults
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PaginationSettings {
    /// Size used when the caller does not ask for one
    pub page_size: u64,
    /// Upper bound for a caller-requested size
    pub max_page_size: u64,
}

impl PaginationSettings {
    /// Limits used by the order listing.
    pub const ORDERS: Self = Self {
        page_size: 5,
        max_page_size: 3,
    };

    /// Effective page size for a request, never zero.
    #[must_use]
    pub fn resolve_page_size(&self, requested: Option<u64>) -> u64 {
        match requested {
            Some(size) if size > 0 => size.min(self.max_page_size).max(1),
            _ => self.page_size.max(1),
        }
    }
}

impl Default for PaginationSettings {
    fn default() -> Self {
        Self::ORDERS
    }
}

/// Which page the caller wants, 1-based
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Page number starting at 1
    pub page: u64,
    /// Requested size, resolved against `PaginationSettings`
    pub page_size: Option<u64>,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: None,
        }
    }
}

impl PageRequest {
    /// Request for page `page` with the default size.
    #[must_use]
    pub const fn page(page: u64) -> Self {
        Self {
            page,
            page_size: None,
        }
    }

    /// Zero-based page index, rejecting page numbers the collection does not have.
    ///
    /// Page 1 always exists, even for an empty collection.
    pub fn index(&self, total_pages: u64) -> Result<u64> {
        if self.page == 0 || (self.page > 1 && self.page > total_pages) {
            return Err(Error::InvalidValue {
                field: "page",
                message: format!("page {} does not exist", self.page),
            });
        }
        Ok(self.page - 1)
    }
}

/// One page of results
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    /// Rows on this page
    pub items: Vec<T>,
    /// 1-based page number
    pub page: u64,
    /// Effective page size
    pub page_size: u64,
    /// Rows across all pages
    pub total_items: u64,
    /// Number of pages
    pub total_pages: u64,
}
