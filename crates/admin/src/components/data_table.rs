//! Data table column catalogues.
//!
//! A table is an ordered list of columns. Column order is display order and
//! CSV column order; each column names the formatter used to render it and,
//! when the backend can sort by it, the sort key.

use serde::Serialize;

/// Which timestamp a date column shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DateField {
    /// `created_at`
    Created,
    /// `updated_at`
    Updated,
}

/// Which amount a price column shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceField {
    /// `subtotal`
    Subtotal,
    /// `total`
    Total,
}

/// Which address an address column reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressKind {
    /// `billing_address`
    Billing,
    /// `shipping_address`
    Shipping,
}

impl AddressKind {
    /// Record property holding the address.
    #[must_use]
    pub const fn property(self) -> &'static str {
        match self {
            Self::Billing => "billing_address",
            Self::Shipping => "shipping_address",
        }
    }
}

/// How a column's cell is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "arg")]
pub enum ColumnFormat {
    /// Read the property named by the snake_cased title.
    Property,
    /// Read a named property.
    Field(&'static str),
    /// Timestamp: `MMM DD YYYY` on screen, JSON string in CSV.
    Date(DateField),
    /// Amount in the record currency.
    Price(PriceField),
    /// Tax share and amount, `"<pct>% → <amount>"`.
    Taxes,
    /// `"<qty> x <title>"` per line item.
    LineItems,
    /// Distinct line item types.
    LineItemTypes,
    /// Whole address; expands to one CSV column per address part.
    Address(AddressKind),
    /// One part of an address.
    AddressPart(AddressKind, &'static str),
}

/// Column definition for a data table.
#[derive(Debug, Clone, Serialize)]
pub struct TableColumn {
    /// Display title, also the CSV header and the preference key.
    pub title: String,
    /// Backend sort key, when the column is sortable.
    pub sort_key: Option<String>,
    /// Whether the column is visible by default.
    pub default_visible: bool,
    /// Cell formatter.
    pub format: ColumnFormat,
}

impl TableColumn {
    /// Create a new sortable column.
    #[must_use]
    pub fn sortable(title: &str, sort_key: &str, format: ColumnFormat) -> Self {
        Self {
            title: title.to_string(),
            sort_key: Some(sort_key.to_string()),
            default_visible: true,
            format,
        }
    }

    /// Create a new non-sortable column.
    #[must_use]
    pub fn new(title: &str, format: ColumnFormat) -> Self {
        Self {
            title: title.to_string(),
            sort_key: None,
            default_visible: true,
            format,
        }
    }

    /// Set whether the column is visible by default.
    #[must_use]
    pub const fn visible(mut self, visible: bool) -> Self {
        self.default_visible = visible;
        self
    }

    /// Property read by the default rule: the title lowercased with spaces
    /// replaced by underscores.
    #[must_use]
    pub fn property_name(&self) -> String {
        snake_case(&self.title)
    }

    /// For `"<Prefix> Address"` titles, the prefix used for expanded CSV keys.
    #[must_use]
    pub fn address_prefix(&self) -> Option<&str> {
        self.title
            .strip_suffix(" Address")
            .filter(|prefix| !prefix.is_empty() && !prefix.contains(char::is_whitespace))
    }
}

/// Lowercase a title and join its words with underscores.
#[must_use]
pub fn snake_case(title: &str) -> String {
    title
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

/// Configuration for a data table.
#[derive(Debug, Clone, Serialize)]
pub struct DataTableConfig {
    /// Unique table identifier.
    pub table_id: String,
    /// Preference key for persisted column visibility.
    pub prefs_key: String,
    /// Column definitions.
    pub columns: Vec<TableColumn>,
    /// Search placeholder text.
    pub search_placeholder: String,
    /// Path prefix for record detail pages.
    pub detail_path: String,
}

impl DataTableConfig {
    /// Create a new data table configuration.
    ///
    /// The preference key follows `commerce.admin.<table>Fields.v2`.
    #[must_use]
    pub fn new(table_id: &str, record_name: &str) -> Self {
        Self {
            table_id: table_id.to_string(),
            prefs_key: format!("commerce.admin.{record_name}Fields.v2"),
            columns: vec![],
            search_placeholder: "Search...".to_string(),
            detail_path: format!("/{table_id}"),
        }
    }

    /// Add a column.
    #[must_use]
    pub fn column(mut self, column: TableColumn) -> Self {
        self.columns.push(column);
        self
    }

    /// Set search placeholder.
    #[must_use]
    pub fn search_placeholder(mut self, placeholder: &str) -> Self {
        self.search_placeholder = placeholder.to_string();
        self
    }

    /// Find a column by title.
    #[must_use]
    pub fn find(&self, title: &str) -> Option<&TableColumn> {
        self.columns.iter().find(|c| c.title == title)
    }

    /// Get default visible columns.
    #[must_use]
    pub fn default_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.default_visible)
            .map(|c| c.title.clone())
            .collect()
    }

    /// Detail page path for a record.
    #[must_use]
    pub fn record_path(&self, id: &str) -> String {
        format!("{}/{id}", self.detail_path)
    }
}

/// Build the orders table configuration.
#[must_use]
pub fn orders_table_config() -> DataTableConfig {
    use AddressKind::{Billing, Shipping};

    DataTableConfig::new("orders", "order")
        .column(TableColumn::new("ID", ColumnFormat::Property).visible(false))
        .column(TableColumn::sortable(
            "Date",
            "created_at",
            ColumnFormat::Date(DateField::Created),
        ))
        .column(
            TableColumn::sortable(
                "Updated At",
                "updated_at",
                ColumnFormat::Date(DateField::Updated),
            )
            .visible(false),
        )
        .column(TableColumn::new("Items", ColumnFormat::LineItems))
        .column(TableColumn::new("Type", ColumnFormat::LineItemTypes))
        .column(
            TableColumn::sortable(
                "Subtotal",
                "subtotal",
                ColumnFormat::Price(PriceField::Subtotal),
            )
            .visible(false),
        )
        .column(TableColumn::sortable("Taxes", "taxes", ColumnFormat::Taxes).visible(false))
        .column(TableColumn::sortable(
            "Total",
            "total",
            ColumnFormat::Price(PriceField::Total),
        ))
        .column(TableColumn::new("Name", ColumnFormat::AddressPart(Billing, "name")).visible(false))
        .column(TableColumn::sortable("Email", "email", ColumnFormat::Property))
        .column(TableColumn::new("Payment State", ColumnFormat::Property))
        .column(TableColumn::new("Billing Address", ColumnFormat::Address(Billing)).visible(false))
        .column(
            TableColumn::new("Billing Country", ColumnFormat::AddressPart(Billing, "country"))
                .visible(false),
        )
        .column(
            TableColumn::new("Billing Company", ColumnFormat::AddressPart(Billing, "company"))
                .visible(false),
        )
        .column(TableColumn::new(
            "Shipping State",
            ColumnFormat::Field("fulfillment_state"),
        ))
        .column(
            TableColumn::new("Shipping Address", ColumnFormat::Address(Shipping)).visible(false),
        )
        .column(
            TableColumn::new("Shipping Country", ColumnFormat::AddressPart(Shipping, "country"))
                .visible(false),
        )
        .column(
            TableColumn::new("Shipping Company", ColumnFormat::AddressPart(Shipping, "company"))
                .visible(false),
        )
        .search_placeholder("Search orders by email or item type...")
}

/// Build the customers table configuration.
#[must_use]
pub fn customers_table_config() -> DataTableConfig {
    DataTableConfig::new("customers", "customer")
        .column(TableColumn::new("ID", ColumnFormat::Property).visible(false))
        .column(TableColumn::new("Name", ColumnFormat::Property))
        .column(TableColumn::new("Email", ColumnFormat::Property))
        .column(TableColumn::new("Orders", ColumnFormat::Field("order_count")))
        .column(TableColumn::new("Created", ColumnFormat::Date(DateField::Created)).visible(false))
        .search_placeholder("Look up a customer...")
}
