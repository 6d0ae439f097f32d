//! Customer domain types.

use chrono::{DateTime, Utc};
use commerce_admin_core::CustomerId;
use serde::{Deserialize, Serialize};

use super::page::Record;

/// A customer (user) known to the commerce backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    /// Customer ID.
    pub id: CustomerId,
    /// Email address.
    pub email: String,
    /// Display name, when the identity service has one.
    #[serde(default)]
    pub name: Option<String>,
    /// Number of orders placed.
    #[serde(default)]
    pub order_count: u32,
    /// When the customer was created.
    pub created_at: DateTime<Utc>,
}

impl Record for Customer {
    fn record_id(&self) -> &str {
        self.id.as_str()
    }
}
