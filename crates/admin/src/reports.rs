//! Sales and product reports.
//!
//! The backend returns one row per order group; these helpers fold them into
//! one row per currency (sales) or per product and currency (products).

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use commerce_admin_core::CurrencyCode;
use tracing::instrument;

use crate::commerce::{CommerceApi, CommerceError, ProductRow, ReportKind, ReportRange, SalesRow};

/// Preset report windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangePreset {
    /// The seven days before now.
    LastWeek,
    /// The thirty days before now.
    Last30Days,
    /// A calendar month in UTC.
    Month {
        /// Year.
        year: i32,
        /// Month, 1-12.
        month: u32,
    },
}

impl RangePreset {
    /// Resolve to a concrete range relative to `now`. Returns `None` for an
    /// invalid month.
    #[must_use]
    pub fn range(self, now: DateTime<Utc>) -> Option<ReportRange> {
        match self {
            Self::LastWeek => Some(trailing(now, Duration::days(7))),
            Self::Last30Days => Some(trailing(now, Duration::days(30))),
            Self::Month { year, month } => month_range(year, month),
        }
    }
}

fn trailing(now: DateTime<Utc>, span: Duration) -> ReportRange {
    ReportRange {
        from: Some((now - span).timestamp()),
        to: Some(now.timestamp()),
    }
}

/// First to last second of a calendar month.
#[must_use]
pub fn month_range(year: i32, month: u32) -> Option<ReportRange> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    let start = Utc.from_utc_datetime(&first.and_hms_opt(0, 0, 0)?);
    let end = Utc.from_utc_datetime(&next.and_hms_opt(0, 0, 0)?);
    Some(ReportRange {
        from: Some(start.timestamp()),
        to: Some(end.timestamp() - 1),
    })
}

/// The calendar month containing `now`.
#[must_use]
pub fn current_month(now: DateTime<Utc>) -> RangePreset {
    RangePreset::Month {
        year: now.year(),
        month: now.month(),
    }
}

/// Sum sales rows per currency, ordered by currency code.
#[must_use]
pub fn sales_totals(rows: &[SalesRow]) -> Vec<SalesRow> {
    let mut totals: BTreeMap<String, SalesRow> = BTreeMap::new();
    for row in rows {
        totals
            .entry(row.currency.code().to_owned())
            .and_modify(|acc| {
                acc.total += row.total;
                acc.subtotal += row.subtotal;
                acc.taxes += row.taxes;
                acc.count += row.count;
            })
            .or_insert_with(|| row.clone());
    }
    totals.into_values().collect()
}

/// Collapse rows for the same SKU and currency, summing quantity and total,
/// then sort by total descending.
#[must_use]
pub fn merge_product_rows(rows: Vec<ProductRow>) -> Vec<ProductRow> {
    let mut merged: Vec<ProductRow> = Vec::new();
    let mut index: HashMap<(String, CurrencyCode), usize> = HashMap::new();

    for row in rows {
        let key = (row.sku.clone(), row.currency.clone());
        if let Some(&i) = index.get(&key) {
            if let Some(acc) = merged.get_mut(i) {
                acc.quantity += row.quantity;
                acc.total += row.total;
                if acc.path.is_none() {
                    acc.path = row.path;
                }
            }
        } else {
            index.insert(key, merged.len());
            merged.push(row);
        }
    }

    merged.sort_by(|a, b| b.total.cmp(&a.total));
    merged
}

/// Fetch the sales report and total it per currency.
///
/// # Errors
///
/// Returns `CommerceError` if the report request fails.
#[instrument(skip(api))]
pub async fn sales_report<C: CommerceApi>(
    api: &C,
    range: ReportRange,
) -> Result<Vec<SalesRow>, CommerceError> {
    let rows: Vec<SalesRow> = api.report(ReportKind::Sales, range).await?;
    Ok(sales_totals(&rows))
}

/// Fetch the product report, merged and sorted by total.
///
/// # Errors
///
/// Returns `CommerceError` if the report request fails.
#[instrument(skip(api))]
pub async fn product_report<C: CommerceApi>(
    api: &C,
    range: ReportRange,
) -> Result<Vec<ProductRow>, CommerceError> {
    let rows: Vec<ProductRow> = api.report(ReportKind::Products, range).await?;
    Ok(merge_product_rows(rows))
}
