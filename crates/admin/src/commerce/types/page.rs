//! Paged list results.

use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// A record the list controller can display, select and export.
///
/// Records are otherwise opaque to the controller: column formatters read
/// them through their serialized JSON form.
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Stable identifier used as the selection key.
    fn record_id(&self) -> &str;
}

/// Pagination metadata returned for the current query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// Page this response belongs to.
    pub current: u32,
    /// First page, when the backend reports it.
    pub first: Option<u32>,
    /// Next page, absent on the last page.
    pub next: Option<u32>,
    /// Final reachable page.
    pub last: u32,
    /// Record count under the current filter.
    pub total: u64,
}

impl Pagination {
    /// Metadata for a result set that fits on a single page.
    #[must_use]
    pub const fn single(total: u64) -> Self {
        Self {
            current: 1,
            first: Some(1),
            next: None,
            last: 1,
            total,
        }
    }

    /// Whether this response is the final page.
    #[must_use]
    pub const fn is_last(&self) -> bool {
        self.current >= self.last
    }
}

/// One page of records plus its pagination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Records on this page, in backend order.
    pub records: Vec<T>,
    /// Pagination for the query that produced this page.
    pub pagination: Pagination,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_page_is_last() {
        let pagination = Pagination::single(3);
        assert!(pagination.is_last());
        assert_eq!(pagination.next, None);
    }

    #[test]
    fn test_middle_page_is_not_last() {
        let pagination = Pagination {
            current: 2,
            first: Some(1),
            next: Some(3),
            last: 3,
            total: 107,
        };
        assert!(!pagination.is_last());
    }
}
