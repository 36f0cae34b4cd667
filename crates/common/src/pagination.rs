//! Page-number pagination.

use serde::Serialize;

/// Upper bound on `per_page` for any listing.
pub const MAX_PER_PAGE: u64 = 100;

/// A normalized page request (1-based page number).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Page number, starting at 1.
    pub page: u64,
    /// Items per page, between 1 and [`MAX_PER_PAGE`].
    pub per_page: u64,
}

impl PageRequest {
    /// Build a page request, falling back to sane values.
    ///
    /// A page below 1 becomes 1, a `per_page` below 1 becomes
    /// `default_per_page`, and `per_page` is capped at [`MAX_PER_PAGE`].
    #[must_use]
    pub fn new(page: Option<i64>, per_page: Option<i64>, default_per_page: u64) -> Self {
        let page = page.filter(|p| *p >= 1).map_or(1, |p| p as u64);
        let per_page = per_page
            .filter(|p| *p >= 1)
            .map_or(default_per_page, |p| p as u64)
            .clamp(1, MAX_PER_PAGE);

        Self { page, per_page }
    }

    /// Build a page request from raw query-string values.
    ///
    /// Values that are not integers are ignored, as if they were absent.
    #[must_use]
    pub fn parse(page: Option<&str>, per_page: Option<&str>, default_per_page: u64) -> Self {
        let parse = |v: Option<&str>| v.and_then(|s| s.trim().parse::<i64>().ok());
        Self::new(parse(page), parse(per_page), default_per_page)
    }

    /// Zero-based page index, as expected by `sea_orm::Paginator::fetch_page`.
    #[must_use]
    pub const fn index(&self) -> u64 {
        self.page - 1
    }

    /// Number of rows before this page, or `None` if that overflows.
    #[must_use]
    pub const fn offset(&self) -> Option<u64> {
        self.index().checked_mul(self.per_page)
    }

    /// Whether this page starts at or after the last of `total` rows.
    ///
    /// Such a page is empty and should not be fetched.
    #[must_use]
    pub const fn is_past_end(&self, total: u64) -> bool {
        match self.offset() {
            Some(offset) => offset >= total,
            None => true,
        }
    }
}

/// One page of results plus totals.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// Total number of items across all pages.
    pub total: u64,
    /// Total number of pages (0 when there are no items).
    pub pages: u64,
    /// The page number that was requested.
    pub page: u64,
    /// Items per page.
    pub per_page: u64,
}

impl<T> Page<T> {
    /// Assemble a page, deriving the page count from `total`.
    #[must_use]
    pub const fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        Self {
            items,
            total,
            pages: total.div_ceil(request.per_page),
            page: request.page,
            per_page: request.per_page,
        }
    }

    /// Transform the items while keeping the totals.
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            pages: self.pages,
            page: self.page,
            per_page: self.per_page,
        }
    }
}
