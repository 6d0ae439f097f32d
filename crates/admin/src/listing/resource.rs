//! Listed resources: what a list controller lists and how it renders cells.

use std::fmt;
use std::future::Future;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::commerce::{CommerceApi, CommerceError, Customer, ListQuery, Order, Page, Record};
use crate::components::{
    AddressKind, ColumnFormat, DataTableConfig, DateField, PriceField, TableColumn,
    customers_table_config, orders_table_config,
};

use super::export::property_cell;
use super::query::{CustomerQueryState, OrderQueryState, build_customer_query, build_order_query};

/// Where a cell is going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellMode {
    /// Table display.
    Display,
    /// CSV export.
    Csv,
}

/// A resource a [`super::ListController`] can list.
pub trait Listing: Send + Sync {
    /// Listed record.
    type Record: Record;
    /// Filter, sort and search state.
    type State: Clone + Default + fmt::Debug + Send + Sync;

    /// Column catalogue.
    fn table(&self) -> &DataTableConfig;

    /// Backend query for `state` at `page`. Pure.
    fn build_query(&self, state: &Self::State, page: u32) -> ListQuery;

    /// Fetch one page.
    fn fetch<C: CommerceApi>(
        &self,
        api: &C,
        query: &ListQuery,
    ) -> impl Future<Output = Result<Page<Self::Record>, CommerceError>> + Send;

    /// Replace the free-text search.
    fn set_search(&self, state: &mut Self::State, search: Option<String>);

    /// Column-specific formatting. `None` falls back to the property rules.
    fn format_cell(
        &self,
        record: &Self::Record,
        column: &TableColumn,
        mode: CellMode,
    ) -> Option<String>;

    /// Render a cell, falling back to the property rules.
    fn render_cell(&self, record: &Self::Record, column: &TableColumn, mode: CellMode) -> String {
        self.format_cell(record, column, mode).unwrap_or_else(|| {
            let json = serde_json::to_value(record).unwrap_or_default();
            property_cell(&json, column)
        })
    }
}

// =============================================================================
// Formatters
// =============================================================================

/// `MMM DD YYYY` on screen, a JSON string in CSV.
#[must_use]
pub fn format_date(value: &DateTime<Utc>, mode: CellMode) -> String {
    match mode {
        CellMode::Display => value.format("%b %d %Y").to_string(),
        CellMode::Csv => serde_json::to_string(value).unwrap_or_default(),
    }
}

/// `"<pct>% → <amount>"`, percent of the order total rounded to a whole number.
#[must_use]
pub fn format_taxes(order: &Order) -> String {
    let percent = if order.total == 0 {
        Decimal::ZERO
    } else {
        (Decimal::from(order.taxes) * Decimal::ONE_HUNDRED / Decimal::from(order.total)).round()
    };
    format!("{percent}% \u{2192} {}", order.taxes_money())
}

/// `"<qty> x <title>"` for every line item.
#[must_use]
pub fn format_line_items(order: &Order, mode: CellMode) -> String {
    order
        .line_items
        .iter()
        .map(|item| match mode {
            CellMode::Display => format!("{} x \u{201c}{}\u{201d}", item.quantity, item.title),
            CellMode::Csv => format!("{} x {}", item.quantity, item.title),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

// =============================================================================
// Orders
// =============================================================================

/// Orders list.
#[derive(Debug, Clone)]
pub struct OrderListing {
    table: DataTableConfig,
}

impl Default for OrderListing {
    fn default() -> Self {
        Self {
            table: orders_table_config(),
        }
    }
}

impl OrderListing {
    /// Orders list with the standard columns.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn address(order: &Order, kind: AddressKind) -> Option<&crate::commerce::Address> {
        match kind {
            AddressKind::Billing => order.billing_address.as_ref(),
            AddressKind::Shipping => order.shipping_address.as_ref(),
        }
    }
}

impl Listing for OrderListing {
    type Record = Order;
    type State = OrderQueryState;

    fn table(&self) -> &DataTableConfig {
        &self.table
    }

    fn build_query(&self, state: &Self::State, page: u32) -> ListQuery {
        build_order_query(state, page)
    }

    fn fetch<C: CommerceApi>(
        &self,
        api: &C,
        query: &ListQuery,
    ) -> impl Future<Output = Result<Page<Order>, CommerceError>> + Send {
        api.list_orders(query)
    }

    fn set_search(&self, state: &mut Self::State, search: Option<String>) {
        state.search = search;
    }

    fn format_cell(&self, order: &Order, column: &TableColumn, mode: CellMode) -> Option<String> {
        match column.format {
            ColumnFormat::Date(DateField::Created) => Some(format_date(&order.created_at, mode)),
            ColumnFormat::Date(DateField::Updated) => Some(format_date(&order.updated_at, mode)),
            ColumnFormat::Price(PriceField::Subtotal) => Some(order.subtotal_money().display()),
            ColumnFormat::Price(PriceField::Total) => Some(order.total_money().display()),
            ColumnFormat::Taxes => Some(format_taxes(order)),
            ColumnFormat::LineItems => Some(format_line_items(order, mode)),
            ColumnFormat::LineItemTypes => Some(order.item_types().join(", ")),
            ColumnFormat::Address(kind) => {
                Some(Self::address(order, kind).map(|a| a.one_line()).unwrap_or_default())
            }
            ColumnFormat::AddressPart(kind, part) => Some(
                Self::address(order, kind)
                    .and_then(|a| a.field(part))
                    .unwrap_or_default()
                    .to_owned(),
            ),
            ColumnFormat::Property | ColumnFormat::Field(_) => None,
        }
    }
}

// =============================================================================
// Customers
// =============================================================================

/// Customers list.
#[derive(Debug, Clone)]
pub struct CustomerListing {
    table: DataTableConfig,
}

impl Default for CustomerListing {
    fn default() -> Self {
        Self {
            table: customers_table_config(),
        }
    }
}

impl CustomerListing {
    /// Customers list with the standard columns.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Listing for CustomerListing {
    type Record = Customer;
    type State = CustomerQueryState;

    fn table(&self) -> &DataTableConfig {
        &self.table
    }

    fn build_query(&self, state: &Self::State, page: u32) -> ListQuery {
        build_customer_query(state, page)
    }

    fn fetch<C: CommerceApi>(
        &self,
        api: &C,
        query: &ListQuery,
    ) -> impl Future<Output = Result<Page<Customer>, CommerceError>> + Send {
        api.list_customers(query)
    }

    fn set_search(&self, state: &mut Self::State, search: Option<String>) {
        state.search = search;
    }

    fn format_cell(
        &self,
        customer: &Customer,
        column: &TableColumn,
        mode: CellMode,
    ) -> Option<String> {
        match column.format {
            ColumnFormat::Date(_) => Some(format_date(&customer.created_at, mode)),
            _ => None,
        }
    }
}
