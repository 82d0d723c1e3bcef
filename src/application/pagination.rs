//! Offset pagination over fully materialized result sets.

use serde::Serialize;
use thiserror::Error;

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Bounds applied when a request omits or oversizes its page parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
        }
    }
}

/// A validated one-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    page_size: u32,
}

impl PageRequest {
    pub fn new(page: u32, page_size: u32) -> Result<Self, PaginationError> {
        if page == 0 {
            return Err(PaginationError::InvalidPage);
        }
        if page_size == 0 {
            return Err(PaginationError::ZeroPageSize);
        }
        Ok(Self { page, page_size })
    }

    /// Resolve optional query parameters against the configured limits.
    pub fn from_query(
        page: Option<u32>,
        page_size: Option<u32>,
        limits: PageLimits,
    ) -> Result<Self, PaginationError> {
        let page = page.unwrap_or(1);
        let page_size = page_size.unwrap_or(limits.default_page_size);
        if page_size > limits.max_page_size {
            return Err(PaginationError::PageSizeTooLarge {
                max: limits.max_page_size,
            });
        }
        Self::new(page, page_size)
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    fn offset(&self) -> usize {
        (self.page as usize - 1).saturating_mul(self.page_size as usize)
    }
}

/// One page of an ordered result set plus the totals needed to walk it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub page_number: u32,
    pub page_size: u32,
    pub total_pages: u64,
    pub total_count: u64,
}

impl<T> Paginated<T> {
    /// Slice `all` to the requested page, preserving order.
    ///
    /// Pages past the end yield an empty `items` list with correct totals.
    pub fn from_items(all: Vec<T>, request: PageRequest) -> Self {
        let total_count = all.len() as u64;
        let page_size = u64::from(request.page_size);
        let total_pages = total_count.div_ceil(page_size);

        let items = all
            .into_iter()
            .skip(request.offset())
            .take(request.page_size as usize)
            .collect();

        Self {
            items,
            page_number: request.page,
            page_size: request.page_size,
            total_pages,
            total_count,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaginationError {
    #[error("page must be at least 1")]
    InvalidPage,
    #[error("pageSize must be at least 1")]
    ZeroPageSize,
    #[error("pageSize must not exceed {max}")]
    PageSizeTooLarge { max: u32 },
}
