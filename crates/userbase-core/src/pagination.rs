//! Pagination types for list operations.

use serde::{Deserialize, Serialize};

/// A request for a page of results.
///
/// Pages are numbered from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// The page number (1-indexed).
    pub page: u32,
    /// The number of items per page.
    pub limit: u32,
}

impl PageRequest {
    /// The default page size.
    pub const DEFAULT_LIMIT: u32 = 20;
    /// The maximum allowed page size.
    pub const MAX_LIMIT: u32 = 100;

    /// Creates a new page request, clamping the limit to [`Self::MAX_LIMIT`].
    #[must_use]
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page,
            limit: limit.min(Self::MAX_LIMIT),
        }
    }

    /// Creates a page request for the first page with default size.
    #[must_use]
    pub fn first() -> Self {
        Self::new(1, Self::DEFAULT_LIMIT)
    }

    /// Returns the offset for database queries.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.page.saturating_sub(1) as u64 * self.limit as u64
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::first()
    }
}

/// Summary of a paginated query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// The number of items per page.
    pub limit: u32,
    /// The current page number (1-indexed).
    pub page: u32,
    /// The total number of pages.
    pub pages: u64,
    /// The total number of matching rows.
    pub rows: u64,
}

impl Pagination {
    /// Builds the summary for `request` over `rows` matching records.
    #[must_use]
    pub fn new(request: PageRequest, rows: u64) -> Self {
        let pages = if request.limit > 0 {
            rows.div_ceil(u64::from(request.limit))
        } else {
            0
        };

        Self {
            limit: request.limit,
            page: request.page,
            pages,
            rows,
        }
    }

    /// Returns true if there is a page after this one.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        (self.page as u64) < self.pages
    }
}

/// Records returned by a list query, with an optional pagination summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fetched<T> {
    /// The matching records.
    pub data: Vec<T>,
    /// Present when both a page and a limit were requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

impl<T> Fetched<T> {
    /// Wraps an unpaginated result.
    #[must_use]
    pub fn all(data: Vec<T>) -> Self {
        Self {
            data,
            pagination: None,
        }
    }

    /// Wraps a page of results.
    #[must_use]
    pub fn paged(data: Vec<T>, pagination: Pagination) -> Self {
        Self {
            data,
            pagination: Some(pagination),
        }
    }

    /// Maps the records to a different type, keeping the summary.
    #[must_use]
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Fetched<U> {
        Fetched {
            data: self.data.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }

    /// Returns true if no records matched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the number of records in this result.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }
}

impl<T> IntoIterator for Fetched<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.into_iter()
    }
}
