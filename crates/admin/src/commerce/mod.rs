//! Commerce API client.
//!
//! # Architecture
//!
//! - [`CommerceApi`] is the seam the list controller and the detail/report
//!   helpers depend on; tests substitute in-memory implementations
//! - [`CommerceClient`] implements it over the backend's REST API using
//!   `reqwest`, bearer-token auth and `Link`/`X-Total-Count` pagination
//! - No local caching: every call goes to the backend
//!
//! # Example
//!
//! ```rust,ignore
//! use commerce_admin::commerce::{CommerceApi, CommerceClient, ListQuery};
//!
//! let client = CommerceClient::new(&config.commerce)?;
//!
//! let mut query = ListQuery::new();
//! query.insert("per_page", 50);
//! query.insert("page", 1);
//! let page = client.list_orders(&query).await?;
//! ```

mod client;
pub mod links;
pub mod params;
pub mod types;

use std::future::Future;

use commerce_admin_core::{CustomerId, OrderId};
use serde::de::DeserializeOwned;
use thiserror::Error;

pub use client::CommerceClient;
pub use params::{ListQuery, ParamValue};
pub use types::*;

/// Errors that can occur when talking to the commerce backend.
#[derive(Debug, Error)]
pub enum CommerceError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Request did not complete in time.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Request URL could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Authentication/authorization failed.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Backend rejected the request.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Message from the response body.
        message: String,
    },
}

/// Operations the admin needs from the commerce backend.
///
/// List operations take the flat query built by the list controller; negated
/// parameters travel in [`ListQuery::negated`] rather than in the params.
pub trait CommerceApi: Send + Sync {
    /// Fetch one page of orders.
    fn list_orders(
        &self,
        query: &ListQuery,
    ) -> impl Future<Output = Result<Page<Order>, CommerceError>> + Send;

    /// Fetch one page of customers.
    fn list_customers(
        &self,
        query: &ListQuery,
    ) -> impl Future<Output = Result<Page<Customer>, CommerceError>> + Send;

    /// Fetch a single order.
    fn order_detail(
        &self,
        id: &OrderId,
    ) -> impl Future<Output = Result<Order, CommerceError>> + Send;

    /// Apply a partial update to an order and return the updated record.
    fn update_order(
        &self,
        id: &OrderId,
        update: &OrderUpdate,
    ) -> impl Future<Output = Result<Order, CommerceError>> + Send;

    /// Fetch a single customer.
    fn customer_detail(
        &self,
        id: &CustomerId,
    ) -> impl Future<Output = Result<Customer, CommerceError>> + Send;

    /// Render the HTML receipt for an order.
    fn order_receipt(
        &self,
        id: &OrderId,
        template: Option<&str>,
    ) -> impl Future<Output = Result<String, CommerceError>> + Send;

    /// Fetch report rows for a time range.
    fn report<T: DeserializeOwned + Send + 'static>(
        &self,
        kind: ReportKind,
        range: ReportRange,
    ) -> impl Future<Output = Result<Vec<T>, CommerceError>> + Send;
}
