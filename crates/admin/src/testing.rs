//! In-memory commerce backend for unit tests.

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{TimeZone, Utc};
use commerce_admin_core::{CurrencyCode, CustomerId, FulfillmentState, OrderId, PaymentState};
use serde::de::DeserializeOwned;

use crate::commerce::{
    Address, CommerceApi, CommerceError, Customer, ListQuery, Order, OrderUpdate, Page,
    Pagination, ReportKind, ReportRange,
};

/// Records per page served by the fake.
const FAKE_PER_PAGE: usize = 50;

pub fn order(n: usize) -> Order {
    Order {
        id: OrderId::new(format!("ord_{n}")),
        user_id: Some(CustomerId::new(format!("usr_{n}"))),
        email: Some(format!("buyer{n}@example.com")),
        subtotal: 1000,
        taxes: 0,
        total: 1000,
        currency: CurrencyCode::USD,
        shipping_address: None,
        billing_address: Some(Address {
            name: Some(format!("Buyer {n}")),
            company: Some("B".to_string()),
            city: Some("C".to_string()),
            ..Address::default()
        }),
        payment_processor: Some("stripe".to_string()),
        payment_state: PaymentState::Paid,
        fulfillment_state: FulfillmentState::Pending,
        vatnumber: None,
        line_items: vec![],
        transactions: vec![],
        created_at: Utc.timestamp_opt(1_700_000_000, 0).single().unwrap_or_default(),
        updated_at: Utc.timestamp_opt(1_700_000_000, 0).single().unwrap_or_default(),
    }
}

pub fn customer(n: usize) -> Customer {
    Customer {
        id: CustomerId::new(format!("usr_{n}")),
        email: format!("buyer{n}@example.com"),
        name: Some(format!("Buyer {n}")),
        order_count: 1,
        created_at: Utc.timestamp_opt(1_700_000_000, 0).single().unwrap_or_default(),
    }
}

/// Serves fixed records, paged by the `page` parameter, and records every
/// list query it receives.
#[derive(Default)]
pub struct FakeCommerce {
    pub orders: Mutex<Vec<Order>>,
    pub customers: Vec<Customer>,
    pub list_calls: Mutex<Vec<ListQuery>>,
    pub fail: AtomicBool,
    pub failing_receipts: HashSet<String>,
}

impl FakeCommerce {
    pub fn with_orders(count: usize) -> Self {
        Self {
            orders: Mutex::new((1..=count).map(order).collect()),
            customers: (1..=count).map(customer).collect(),
            ..Self::default()
        }
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn list_call_count(&self) -> usize {
        self.list_calls.lock().map(|c| c.len()).unwrap_or_default()
    }

    pub fn requested_pages(&self) -> Vec<u32> {
        self.list_calls
            .lock()
            .map(|calls| calls.iter().filter_map(ListQuery::page).collect())
            .unwrap_or_default()
    }

    fn serve<T: Clone>(&self, query: &ListQuery, all: &[T]) -> Result<Page<T>, CommerceError> {
        if let Ok(mut calls) = self.list_calls.lock() {
            calls.push(query.clone());
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(CommerceError::Api {
                status: 500,
                message: "backend down".to_string(),
            });
        }

        let page = query.page().unwrap_or(1);
        let last = u32::try_from(all.len().div_ceil(FAKE_PER_PAGE).max(1)).unwrap_or(u32::MAX);
        let start = (page as usize - 1) * FAKE_PER_PAGE;
        let records = all.iter().skip(start).take(FAKE_PER_PAGE).cloned().collect();

        Ok(Page {
            records,
            pagination: Pagination {
                current: page,
                first: Some(1),
                next: (page < last).then_some(page + 1),
                last,
                total: all.len() as u64,
            },
        })
    }
}

impl CommerceApi for FakeCommerce {
    async fn list_orders(&self, query: &ListQuery) -> Result<Page<Order>, CommerceError> {
        let orders = self.orders.lock().map(|o| o.clone()).unwrap_or_default();
        self.serve(query, &orders)
    }

    async fn list_customers(&self, query: &ListQuery) -> Result<Page<Customer>, CommerceError> {
        self.serve(query, &self.customers)
    }

    async fn order_detail(&self, id: &OrderId) -> Result<Order, CommerceError> {
        self.orders
            .lock()
            .ok()
            .and_then(|orders| orders.iter().find(|o| &o.id == id).cloned())
            .ok_or_else(|| CommerceError::NotFound(format!("orders/{id}")))
    }

    async fn update_order(&self, id: &OrderId, update: &OrderUpdate) -> Result<Order, CommerceError> {
        let mut orders = self
            .orders
            .lock()
            .map_err(|_| CommerceError::NotFound(format!("orders/{id}")))?;
        let order = orders
            .iter_mut()
            .find(|o| &o.id == id)
            .ok_or_else(|| CommerceError::NotFound(format!("orders/{id}")))?;
        if let Some(address) = &update.shipping_address {
            order.shipping_address = Some(address.clone());
        }
        if let Some(address) = &update.billing_address {
            order.billing_address = Some(address.clone());
        }
        if let Some(state) = update.fulfillment_state {
            order.fulfillment_state = state;
        }
        Ok(order.clone())
    }

    async fn customer_detail(&self, id: &CustomerId) -> Result<Customer, CommerceError> {
        self.customers
            .iter()
            .find(|c| &c.id == id)
            .cloned()
            .ok_or_else(|| CommerceError::NotFound(format!("users/{id}")))
    }

    async fn order_receipt(
        &self,
        id: &OrderId,
        _template: Option<&str>,
    ) -> Result<String, CommerceError> {
        if self.failing_receipts.contains(id.as_str()) {
            return Err(CommerceError::NotFound(format!("orders/{id}/receipt")));
        }
        Ok(format!("<p>{id}</p>"))
    }

    async fn report<T: DeserializeOwned + Send + 'static>(
        &self,
        _kind: ReportKind,
        _range: ReportRange,
    ) -> Result<Vec<T>, CommerceError> {
        Ok(Vec::new())
    }
}
