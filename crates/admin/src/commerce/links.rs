//! Pagination from `Link` and `X-Total-Count` response headers.
//!
//! The backend returns list bodies as bare JSON arrays and describes paging
//! with RFC 8288 links:
//!
//! ```text
//! Link: <https://api.example.com/orders?page=3&per_page=50>; rel="next",
//!       <https://api.example.com/orders?page=7&per_page=50>; rel="last"
//! X-Total-Count: 342
//! ```

use url::Url;

use super::types::Pagination;

/// Build pagination for a response to a request for `requested_page`.
///
/// A missing `last` link means the response is the last page.
#[must_use]
pub fn pagination_from_headers(
    link: Option<&str>,
    total_count: Option<&str>,
    requested_page: u32,
) -> Pagination {
    let mut first = None;
    let mut next = None;
    let mut last = None;

    for (rel, page) in link.map(parse_link_header).unwrap_or_default() {
        match rel.as_str() {
            "first" => first = Some(page),
            "next" => next = Some(page),
            "last" => last = Some(page),
            _ => {}
        }
    }

    Pagination {
        current: requested_page,
        first,
        next,
        last: last.unwrap_or(requested_page).max(1),
        total: total_count
            .and_then(|t| t.trim().parse().ok())
            .unwrap_or_default(),
    }
}

/// Extract `(rel, page)` pairs from a `Link` header value.
///
/// Entries without a parseable `page` query parameter are skipped.
#[must_use]
pub fn parse_link_header(header: &str) -> Vec<(String, u32)> {
    header
        .split(',')
        .filter_map(|entry| {
            let mut parts = entry.split(';');
            let target = parts.next()?.trim();
            let target = target.strip_prefix('<')?.strip_suffix('>')?;
            let rel = parts.find_map(|param| {
                let (name, value) = param.trim().split_once('=')?;
                (name.trim() == "rel").then(|| value.trim().trim_matches('"').to_owned())
            })?;
            let page = page_from_url(target)?;
            Some((rel, page))
        })
        .collect()
}

fn page_from_url(target: &str) -> Option<u32> {
    let url = Url::parse(target)
        .or_else(|_| Url::parse("http://localhost/").and_then(|base| base.join(target)))
        .ok()?;
    url.query_pairs()
        .find(|(key, _)| key == "page")
        .and_then(|(_, value)| value.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINKS: &str = "<https://api.example.com/orders?page=1&per_page=50>; rel=\"first\", \
        <https://api.example.com/orders?page=3&per_page=50>; rel=\"next\", \
        <https://api.example.com/orders?page=7&per_page=50>; rel=\"last\"";

    #[test]
    fn test_parse_link_header() {
        assert_eq!(
            parse_link_header(LINKS),
            vec![
                ("first".to_string(), 1),
                ("next".to_string(), 3),
                ("last".to_string(), 7),
            ]
        );
    }

    #[test]
    fn test_pagination_from_headers() {
        let pagination = pagination_from_headers(Some(LINKS), Some("342"), 2);
        assert_eq!(pagination.current, 2);
        assert_eq!(pagination.first, Some(1));
        assert_eq!(pagination.next, Some(3));
        assert_eq!(pagination.last, 7);
        assert_eq!(pagination.total, 342);
    }

    #[test]
    fn test_missing_links_means_last_page() {
        let pagination = pagination_from_headers(None, Some("7"), 3);
        assert_eq!(pagination.last, 3);
        assert_eq!(pagination.next, None);
        assert!(pagination.is_last());
    }

    #[test]
    fn test_relative_links_and_garbage_entries() {
        let header = "</orders?page=4>; rel=\"next\", <not a link>; rel=\"last\", junk";
        assert_eq!(parse_link_header(header), vec![("next".to_string(), 4)]);
    }
}
