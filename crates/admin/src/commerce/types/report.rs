//! Report request and row types.

use std::fmt;

use commerce_admin_core::{CurrencyCode, Money};
use serde::{Deserialize, Serialize};

/// Report kinds exposed by the commerce backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    /// Totals per currency.
    Sales,
    /// Totals per product.
    Products,
}

impl ReportKind {
    /// Path segment for the report endpoint.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Sales => "sales",
            Self::Products => "products",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Time window for a report, in epoch seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReportRange {
    /// Inclusive start.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<i64>,
    /// Inclusive end.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<i64>,
}

/// One row of the sales report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesRow {
    /// Total in minor units.
    #[serde(default)]
    pub total: i64,
    /// Subtotal in minor units.
    #[serde(default)]
    pub subtotal: i64,
    /// Taxes in minor units.
    #[serde(default)]
    pub taxes: i64,
    /// Currency of the amounts.
    pub currency: CurrencyCode,
    /// Number of orders.
    #[serde(default, rename = "orders")]
    pub count: u64,
}

/// One row of the product report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRow {
    /// Stock keeping unit.
    pub sku: String,
    /// Product path on the storefront.
    #[serde(default)]
    pub path: Option<String>,
    /// Total sold in minor units.
    #[serde(default)]
    pub total: i64,
    /// Currency of the total.
    pub currency: CurrencyCode,
    /// Units sold.
    #[serde(default)]
    pub quantity: u64,
}

impl ProductRow {
    /// Total as money.
    #[must_use]
    pub fn total_money(&self) -> Money {
        Money::new(self.total, self.currency.clone())
    }
}
