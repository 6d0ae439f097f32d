//! Order domain types.

use chrono::{DateTime, Utc};
use commerce_admin_core::{
    CurrencyCode, CustomerId, FulfillmentState, LineItemId, Money, OrderId, PaymentState,
    TransactionId,
};
use serde::{Deserialize, Serialize};

use super::common::Address;
use super::page::Record;

/// Line item type that needs a physical shipment.
const SHIPPABLE_ITEM_TYPE: &str = "Book";

// =============================================================================
// Order Types
// =============================================================================

/// An order as returned by the commerce backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Order ID.
    pub id: OrderId,
    /// Owning customer, absent for guest checkouts.
    #[serde(default)]
    pub user_id: Option<CustomerId>,
    /// Customer email.
    #[serde(default)]
    pub email: Option<String>,
    /// Subtotal in minor units.
    #[serde(default)]
    pub subtotal: i64,
    /// Taxes in minor units.
    #[serde(default)]
    pub taxes: i64,
    /// Total in minor units.
    #[serde(default)]
    pub total: i64,
    /// Currency for all amounts on the order.
    #[serde(default)]
    pub currency: CurrencyCode,
    /// Shipping address.
    #[serde(default)]
    pub shipping_address: Option<Address>,
    /// Billing address.
    #[serde(default)]
    pub billing_address: Option<Address>,
    /// Payment processor (`stripe`, `paypal`).
    #[serde(default)]
    pub payment_processor: Option<String>,
    /// Payment state.
    #[serde(default)]
    pub payment_state: PaymentState,
    /// Fulfillment state.
    #[serde(default)]
    pub fulfillment_state: FulfillmentState,
    /// VAT number supplied at checkout.
    #[serde(default)]
    pub vatnumber: Option<String>,
    /// Ordered items.
    #[serde(default)]
    pub line_items: Vec<LineItem>,
    /// Charges and refunds.
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    /// When the order was placed.
    pub created_at: DateTime<Utc>,
    /// Last modification.
    pub updated_at: DateTime<Utc>,
}

impl Record for Order {
    fn record_id(&self) -> &str {
        self.id.as_str()
    }
}

impl Order {
    /// Total as money.
    #[must_use]
    pub fn total_money(&self) -> Money {
        Money::new(self.total, self.currency.clone())
    }

    /// Subtotal as money.
    #[must_use]
    pub fn subtotal_money(&self) -> Money {
        Money::new(self.subtotal, self.currency.clone())
    }

    /// Taxes as money.
    #[must_use]
    pub fn taxes_money(&self) -> Money {
        Money::new(self.taxes, self.currency.clone())
    }

    /// Whether any line item needs a physical shipment.
    #[must_use]
    pub fn requires_shipping(&self) -> bool {
        requires_shipping(&self.line_items)
    }

    /// Distinct line item types in first-seen order.
    #[must_use]
    pub fn item_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = Vec::new();
        for item in &self.line_items {
            if let Some(kind) = item.item_type.as_deref()
                && !types.contains(&kind)
            {
                types.push(kind);
            }
        }
        types
    }
}

/// Whether any of the given line items needs a physical shipment.
#[must_use]
pub fn requires_shipping(items: &[LineItem]) -> bool {
    items
        .iter()
        .any(|item| item.item_type.as_deref() == Some(SHIPPABLE_ITEM_TYPE))
}

/// A single ordered product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Line item ID.
    pub id: LineItemId,
    /// Product title.
    #[serde(default)]
    pub title: String,
    /// Stock keeping unit.
    #[serde(default)]
    pub sku: Option<String>,
    /// Product path on the storefront.
    #[serde(default)]
    pub path: Option<String>,
    /// Quantity ordered.
    #[serde(default)]
    pub quantity: u32,
    /// Unit price in minor units.
    #[serde(default)]
    pub price: i64,
    /// Product type (e.g. `Book`, `E-Book`).
    #[serde(default, rename = "type")]
    pub item_type: Option<String>,
}

/// Kind of payment transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Money taken from the customer.
    Charge,
    /// Money returned to the customer.
    Refund,
}

/// A charge or refund against an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction ID.
    pub id: TransactionId,
    /// Amount in minor units.
    pub amount: i64,
    /// Currency of the amount.
    #[serde(default)]
    pub currency: CurrencyCode,
    /// Charge or refund.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// Processor failure message, when the transaction failed.
    #[serde(default)]
    pub failure_description: Option<String>,
    /// When the transaction happened.
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Mutations
// =============================================================================

/// Partial order update; only provided fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OrderUpdate {
    /// Replacement shipping address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_address: Option<Address>,
    /// Replacement billing address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_address: Option<Address>,
    /// New fulfillment state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fulfillment_state: Option<FulfillmentState>,
}

impl OrderUpdate {
    /// Update only the shipping address.
    #[must_use]
    pub fn shipping_address(address: Address) -> Self {
        Self {
            shipping_address: Some(address),
            ..Self::default()
        }
    }

    /// Update only the billing address.
    #[must_use]
    pub fn billing_address(address: Address) -> Self {
        Self {
            billing_address: Some(address),
            ..Self::default()
        }
    }

    /// Update only the fulfillment state.
    #[must_use]
    pub fn fulfillment(state: FulfillmentState) -> Self {
        Self {
            fulfillment_state: Some(state),
            ..Self::default()
        }
    }

    /// Whether the update carries no fields.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.shipping_address.is_none()
            && self.billing_address.is_none()
            && self.fulfillment_state.is_none()
    }
}
