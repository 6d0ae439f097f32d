//! Page state helpers: location sync, page lists and summaries.

use std::collections::BTreeSet;
use std::fmt;

use url::Url;

use crate::commerce::Pagination;

/// Records per page.
pub const PER_PAGE: u32 = 50;

/// Pages shown on either side of the current page.
pub const PAGE_WINDOW: u32 = 3;

fn resolve(location: &str) -> Option<Url> {
    Url::parse(location)
        .or_else(|_| Url::parse("http://localhost/").and_then(|base| base.join(location)))
        .ok()
}

/// Page number carried by a location's `page=` parameter.
///
/// Absent, malformed and zero values give page 1.
#[must_use]
pub fn initial_page(location: &str) -> u32 {
    resolve(location)
        .and_then(|url| {
            url.query_pairs()
                .find(|(key, _)| key == "page")
                .and_then(|(_, value)| value.parse::<u32>().ok())
        })
        .filter(|&page| page >= 1)
        .unwrap_or(1)
}

/// Rewrite (or add) the `page=` parameter of a location, keeping every
/// other parameter in order. The result is origin-relative.
#[must_use]
pub fn location_with_page(location: &str, page: u32) -> String {
    let Some(mut url) = resolve(location) else {
        return format!("?page={page}");
    };

    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    match pairs.iter_mut().find(|(key, _)| key == "page") {
        Some((_, value)) => *value = page.to_string(),
        None => pairs.push(("page".to_string(), page.to_string())),
    }
    url.query_pairs_mut().clear().extend_pairs(&pairs);

    let mut relative = url.path().to_string();
    if let Some(query) = url.query() {
        relative.push('?');
        relative.push_str(query);
    }
    if let Some(fragment) = url.fragment() {
        relative.push('#');
        relative.push_str(fragment);
    }
    relative
}

/// Page numbers to offer for navigation.
///
/// Always the first and last page plus a window of [`PAGE_WINDOW`] pages
/// around `current`, ascending and without duplicates. Empty when there is
/// only one page.
#[must_use]
pub fn page_numbers(current: u32, last: u32) -> Vec<u32> {
    if last <= 1 {
        return Vec::new();
    }
    let current = current.clamp(1, last);
    let low = current.saturating_sub(PAGE_WINDOW).max(1);
    let high = current.saturating_add(PAGE_WINDOW).min(last);

    let mut pages: BTreeSet<u32> = (low..=high).collect();
    pages.insert(1);
    pages.insert(last);
    pages.into_iter().collect()
}

/// "Showing X–Y of Z" for the loaded page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSummary {
    /// One-based index of the first record on the page (0 when empty).
    pub from: u64,
    /// One-based index of the last record on the page.
    pub to: u64,
    /// Total records under the current filter.
    pub total: u64,
    /// Current page.
    pub current: u32,
    /// Last page.
    pub last: u32,
}

impl PageSummary {
    /// Summarize a pagination result.
    #[must_use]
    pub fn new(pagination: &Pagination, per_page: u32) -> Self {
        let offset = u64::from(pagination.current.saturating_sub(1)) * u64::from(per_page);
        let to = (offset + u64::from(per_page)).min(pagination.total);
        let from = if to > offset { offset + 1 } else { 0 };
        Self {
            from,
            to: to.max(from),
            total: pagination.total,
            current: pagination.current,
            last: pagination.last,
        }
    }
}

impl fmt::Display for PageSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Showing {}–{} of {} (page {} of {})",
            self.from, self.to, self.total, self.current, self.last
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_page() {
        assert_eq!(initial_page("/orders?page=3"), 3);
        assert_eq!(initial_page("https://admin.example.com/orders?q=x&page=12"), 12);
        assert_eq!(initial_page("/orders"), 1);
        assert_eq!(initial_page("/orders?page=abc"), 1);
        assert_eq!(initial_page("/orders?page=0"), 1);
        assert_eq!(initial_page("/orders?per_page=7"), 1);
    }

    #[test]
    fn test_location_with_page_replaces() {
        assert_eq!(location_with_page("/orders?page=3&q=x", 1), "/orders?page=1&q=x");
    }

    #[test]
    fn test_location_with_page_inserts() {
        assert_eq!(location_with_page("/orders", 2), "/orders?page=2");
        assert_eq!(location_with_page("/orders?q=x", 2), "/orders?q=x&page=2");
        assert_eq!(
            location_with_page("https://admin.example.com/orders#top", 4),
            "/orders?page=4#top"
        );
    }

    #[test]
    fn test_page_numbers_window() {
        assert_eq!(page_numbers(10, 20), vec![1, 7, 8, 9, 10, 11, 12, 13, 20]);
        assert_eq!(page_numbers(1, 20), vec![1, 2, 3, 4, 20]);
        assert_eq!(page_numbers(2, 3), vec![1, 2, 3]);
    }

    #[test]
    fn test_page_numbers_single_page() {
        assert!(page_numbers(1, 1).is_empty());
        assert!(page_numbers(1, 0).is_empty());
    }

    #[test]
    fn test_page_numbers_never_out_of_range() {
        assert_eq!(page_numbers(9, 5), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_page_summary() {
        let pagination = Pagination {
            current: 3,
            first: Some(1),
            next: None,
            last: 3,
            total: 107,
        };
        let summary = PageSummary::new(&pagination, PER_PAGE);
        assert_eq!((summary.from, summary.to), (101, 107));
        assert_eq!(summary.to_string(), "Showing 101–107 of 107 (page 3 of 3)");
    }

    #[test]
    fn test_page_summary_empty() {
        let summary = PageSummary::new(&Pagination::single(0), PER_PAGE);
        assert_eq!((summary.from, summary.to), (0, 0));
    }
}
