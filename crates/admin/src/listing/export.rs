//! Full-dataset export: the page walk and per-record flattening.

use std::future::Future;

use serde::Serialize;
use serde_json::Value;

use crate::commerce::types::ADDRESS_FIELDS;
use crate::commerce::{CommerceError, Page, Record};
use crate::components::{ColumnFormat, TableColumn};
use crate::error::{ListError, PaginationError};

/// Default cap on pages fetched by one export.
pub const DEFAULT_MAX_EXPORT_PAGES: u32 = 1000;

/// One flattened record: `(header, value)` cells in column order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ExportRow {
    cells: Vec<(String, String)>,
}

impl ExportRow {
    /// Append a cell.
    pub fn push(&mut self, header: impl Into<String>, value: impl Into<String>) {
        self.cells.push((header.into(), value.into()));
    }

    /// Value under `header`.
    #[must_use]
    pub fn get(&self, header: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(h, _)| h == header)
            .map(|(_, v)| v.as_str())
    }

    /// Headers in order.
    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(h, _)| h.as_str())
    }

    /// Values in order.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(_, v)| v.as_str())
    }

    /// Number of cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the row has no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// CSV headers for `columns`, with address columns expanded.
pub fn export_headers<'a>(columns: impl IntoIterator<Item = &'a TableColumn>) -> Vec<String> {
    let mut headers = Vec::new();
    for column in columns {
        match column.address_prefix() {
            Some(prefix) => {
                headers.extend(ADDRESS_FIELDS.iter().map(|part| format!("{prefix} {part}")));
            }
            None => headers.push(column.title.clone()),
        }
    }
    headers
}

/// Render a JSON value as a cell: strings verbatim, null as empty.
fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Read a column through the generic rules, without a record-specific
/// formatter.
///
/// `Property` reads the snake_cased title, `Field` a named property and
/// `AddressPart` one part of an address.
#[must_use]
pub fn property_cell(json: &Value, column: &TableColumn) -> String {
    match column.format {
        ColumnFormat::Field(name) => cell_text(json.get(name)),
        ColumnFormat::AddressPart(kind, part) => {
            cell_text(json.get(kind.property()).and_then(|addr| addr.get(part)))
        }
        _ => cell_text(json.get(column.property_name())),
    }
}

/// Flatten one record for CSV.
///
/// Address columns (`"<Prefix> Address"`) expand into `"<Prefix> <part>"`
/// cells copied verbatim from the address. Other columns use `format` when
/// it returns a value, and the default property rule otherwise.
pub fn flatten_record<'a, R, F>(
    record: &R,
    columns: impl IntoIterator<Item = &'a TableColumn>,
    format: F,
) -> ExportRow
where
    R: Record,
    F: Fn(&R, &TableColumn) -> Option<String>,
{
    let json = serde_json::to_value(record).unwrap_or_default();
    let mut row = ExportRow::default();

    for column in columns {
        if let Some(prefix) = column.address_prefix() {
            let address = json.get(column.property_name());
            for part in ADDRESS_FIELDS {
                row.push(
                    format!("{prefix} {part}"),
                    cell_text(address.and_then(|a| a.get(part))),
                );
            }
            continue;
        }

        let value = format(record, column).unwrap_or_else(|| property_cell(&json, column));
        row.push(column.title.clone(), value);
    }
    row
}

/// Fetch every page of a result set, in order.
///
/// Starts at page 1 and follows `next` until a page reports
/// `current == last`. Fails with [`PaginationError`] when the backend
/// answers with a different page than requested, when `next` is missing or
/// does not advance, or after `max_pages` pages. Any fetch failure fails the
/// whole walk and discards what was collected.
///
/// # Errors
///
/// Returns `ListError::Fetch` or `ListError::Pagination`.
pub async fn walk_pages<T, F, Fut>(max_pages: u32, mut fetch: F) -> Result<Vec<T>, ListError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Page<T>, CommerceError>>,
{
    let mut records = Vec::new();
    let mut page = 1;

    for _ in 0..max_pages {
        let Page {
            records: batch,
            pagination,
        } = fetch(page).await?;

        if pagination.current != page {
            return Err(PaginationError::PageMismatch {
                requested: page,
                received: pagination.current,
            }
            .into());
        }

        tracing::debug!(page, last = pagination.last, count = batch.len(), "Export page fetched");
        records.extend(batch);

        if pagination.last == pagination.current {
            return Ok(records);
        }

        match pagination.next {
            Some(next) if next > page => page = next,
            next => {
                return Err(PaginationError::NonAdvancing {
                    current: page,
                    next,
                    last: pagination.last,
                }
                .into());
            }
        }
    }

    Err(PaginationError::TooManyPages(max_pages).into())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::commerce::Pagination;
    use crate::components::orders_table_config;

    fn page_of(current: u32, next: Option<u32>, last: u32, count: u32) -> Page<u32> {
        Page {
            records: (0..count).map(|i| current * 1000 + i).collect(),
            pagination: Pagination {
                current,
                first: Some(1),
                next,
                last,
                total: 0,
            },
        }
    }

    #[tokio::test]
    async fn test_walk_collects_pages_in_order() {
        let calls = Cell::new(0);
        let records = walk_pages(DEFAULT_MAX_EXPORT_PAGES, |page| {
            calls.set(calls.get() + 1);
            async move {
                Ok(match page {
                    1 => page_of(1, Some(2), 3, 50),
                    2 => page_of(2, Some(3), 3, 50),
                    _ => page_of(3, None, 3, 7),
                })
            }
        })
        .await
        .unwrap();

        assert_eq!(records.len(), 107);
        assert_eq!(calls.get(), 3);
        assert_eq!(records.first(), Some(&1000));
        assert_eq!(records.last(), Some(&3006));
    }

    #[tokio::test]
    async fn test_walk_rejects_non_advancing_next() {
        let err = walk_pages(DEFAULT_MAX_EXPORT_PAGES, |page| async move {
            Ok(page_of(page, Some(page), 5, 50))
        })
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            ListError::Pagination(PaginationError::NonAdvancing { current: 1, .. })
        ));
    }

    #[tokio::test]
    async fn test_walk_rejects_page_mismatch() {
        let err = walk_pages(DEFAULT_MAX_EXPORT_PAGES, |page| async move {
            Ok(page_of(1, Some(page + 1), 5, 50))
        })
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            ListError::Pagination(PaginationError::PageMismatch {
                requested: 2,
                received: 1
            })
        ));
    }

    #[tokio::test]
    async fn test_walk_stops_at_cap() {
        let err = walk_pages(4, |page| async move { Ok(page_of(page, Some(page + 1), u32::MAX, 1)) })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ListError::Pagination(PaginationError::TooManyPages(4))
        ));
    }

    #[tokio::test]
    async fn test_walk_fetch_failure_discards_rows() {
        let err = walk_pages(DEFAULT_MAX_EXPORT_PAGES, |page| async move {
            if page == 2 {
                Err(CommerceError::Timeout(30))
            } else {
                Ok(page_of(page, Some(page + 1), 3, 50))
            }
        })
        .await
        .unwrap_err();
        assert!(err.is_fetch());
    }

    #[test]
    fn test_export_headers_expand_addresses() {
        let table = orders_table_config();
        let columns = ["Total", "Billing Address"]
            .iter()
            .filter_map(|t| table.find(t));
        assert_eq!(
            export_headers(columns),
            vec![
                "Total",
                "Billing name",
                "Billing company",
                "Billing address1",
                "Billing address2",
                "Billing city",
                "Billing zip",
                "Billing state",
                "Billing country",
            ]
        );
    }
}
