//! REST client for the commerce backend.
//!
//! This module provides a typed client for the commerce API. Every call
//! carries the operator's bearer token; list endpoints return bare JSON arrays
//! and describe paging in response headers (see [`super::links`]).

use std::sync::Arc;
use std::time::Duration;

use commerce_admin_core::{CustomerId, OrderId};
use reqwest::{RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, de::DeserializeOwned};
use tokio::sync::RwLock;
use tracing::instrument;
use url::Url;

use crate::config::CommerceConfig;

use super::links::pagination_from_headers;
use super::{
    CommerceApi, CommerceError, ListQuery,
    types::{Customer, Order, OrderUpdate, Page, ReportKind, ReportRange},
};

/// Header carrying the record count under the current filter.
const TOTAL_COUNT_HEADER: &str = "X-Total-Count";

/// Commerce REST API client.
///
/// Cheap to clone; clones share the HTTP connection pool and the token.
#[derive(Clone)]
pub struct CommerceClient {
    inner: Arc<CommerceClientInner>,
}

struct CommerceClientInner {
    client: reqwest::Client,
    base_url: Url,
    timeout_secs: u64,
    /// Operator access token (JWT from the identity service)
    token: RwLock<Option<SecretString>>,
}

/// Error body returned by the backend.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default, alias = "message", alias = "error")]
    msg: Option<String>,
}

/// Receipt response wrapper.
#[derive(Debug, Deserialize)]
struct ReceiptBody {
    data: String,
}

impl CommerceClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::Http` if the HTTP client cannot be built.
    pub fn new(config: &CommerceConfig) -> Result<Self, CommerceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        // Url::join drops the last path segment unless the base ends in '/'
        let mut base_url = config.api_url.clone();
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            inner: Arc::new(CommerceClientInner {
                client,
                base_url,
                timeout_secs: config.timeout_secs,
                token: RwLock::new(config.access_token.clone()),
            }),
        })
    }

    /// The API base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    // =========================================================================
    // Token Management
    // =========================================================================

    /// Set the access token used for subsequent calls.
    pub async fn set_token(&self, token: SecretString) {
        *self.inner.token.write().await = Some(token);
    }

    /// Whether an access token is configured.
    pub async fn has_token(&self) -> bool {
        self.inner.token.read().await.is_some()
    }

    /// Clear the cached token.
    pub async fn clear_token(&self) {
        *self.inner.token.write().await = None;
    }

    // =========================================================================
    // Request Plumbing
    // =========================================================================

    fn endpoint(&self, path: &str) -> Result<Url, CommerceError> {
        Ok(self.inner.base_url.join(path)?)
    }

    /// Attach auth, send, and map transport and status failures.
    async fn send(&self, request: RequestBuilder) -> Result<Response, CommerceError> {
        let request = match self.inner.token.read().await.as_ref() {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        };

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                CommerceError::Timeout(self.inner.timeout_secs)
            } else {
                CommerceError::Http(e)
            }
        })?;

        check_status(response).await
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, CommerceError> {
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, CommerceError> {
        let response = self.send(self.inner.client.get(url)).await?;
        Self::read_json(response).await
    }

    /// Fetch one page from a list endpoint.
    async fn list<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &ListQuery,
    ) -> Result<Page<T>, CommerceError> {
        let mut url = self.endpoint(path)?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query.to_pairs() {
                pairs.append_pair(&key, &value);
            }
        }

        let response = self.send(self.inner.client.get(url)).await?;

        let header = |name: &str| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(ToOwned::to_owned)
        };
        let pagination = pagination_from_headers(
            header(reqwest::header::LINK.as_str()).as_deref(),
            header(TOTAL_COUNT_HEADER).as_deref(),
            query.page().unwrap_or(1),
        );

        let records: Vec<T> = Self::read_json(response).await?;
        tracing::debug!(
            path,
            count = records.len(),
            page = pagination.current,
            last = pagination.last,
            "Fetched list page"
        );

        Ok(Page {
            records,
            pagination,
        })
    }
}

/// Map non-success responses to typed errors.
async fn check_status(response: Response) -> Result<Response, CommerceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok())
            .unwrap_or(60);
        return Err(CommerceError::RateLimited(retry_after));
    }

    let path = response.url().path().to_owned();
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .ok()
        .and_then(|body| body.msg)
        .unwrap_or(text);

    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => CommerceError::Unauthorized(message),
        StatusCode::NOT_FOUND => CommerceError::NotFound(path),
        _ => CommerceError::Api {
            status: status.as_u16(),
            message,
        },
    })
}

impl CommerceApi for CommerceClient {
    #[instrument(skip(self, query))]
    async fn list_orders(&self, query: &ListQuery) -> Result<Page<Order>, CommerceError> {
        self.list("orders", query).await
    }

    #[instrument(skip(self, query))]
    async fn list_customers(&self, query: &ListQuery) -> Result<Page<Customer>, CommerceError> {
        self.list("users", query).await
    }

    #[instrument(skip(self), fields(order_id = %id))]
    async fn order_detail(&self, id: &OrderId) -> Result<Order, CommerceError> {
        let url = self.endpoint(&format!("orders/{id}"))?;
        self.get_json(url).await
    }

    #[instrument(skip(self, update), fields(order_id = %id))]
    async fn update_order(&self, id: &OrderId, update: &OrderUpdate) -> Result<Order, CommerceError> {
        let url = self.endpoint(&format!("orders/{id}"))?;
        let response = self.send(self.inner.client.put(url).json(update)).await?;
        let order = Self::read_json(response).await?;
        tracing::info!(order_id = %id, "Order updated");
        Ok(order)
    }

    #[instrument(skip(self), fields(customer_id = %id))]
    async fn customer_detail(&self, id: &CustomerId) -> Result<Customer, CommerceError> {
        let url = self.endpoint(&format!("users/{id}"))?;
        self.get_json(url).await
    }

    #[instrument(skip(self), fields(order_id = %id))]
    async fn order_receipt(
        &self,
        id: &OrderId,
        template: Option<&str>,
    ) -> Result<String, CommerceError> {
        let mut url = self.endpoint(&format!("orders/{id}/receipt"))?;
        if let Some(template) = template {
            url.query_pairs_mut().append_pair("template", template);
        }
        let body: ReceiptBody = self.get_json(url).await?;
        Ok(body.data)
    }

    #[instrument(skip(self))]
    async fn report<T: DeserializeOwned + Send + 'static>(
        &self,
        kind: ReportKind,
        range: ReportRange,
    ) -> Result<Vec<T>, CommerceError> {
        let mut url = self.endpoint(&format!("reports/{kind}"))?;
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(from) = range.from {
                pairs.append_pair("from", &from.to_string());
            }
            if let Some(to) = range.to {
                pairs.append_pair("to", &to.to_string());
            }
        }
        self.get_json(url).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config(url: &str) -> CommerceConfig {
        CommerceConfig {
            api_url: Url::parse(url).unwrap(),
            access_token: None,
            timeout_secs: 5,
        }
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let client = CommerceClient::new(&config("https://shop.example.com/.netlify/commerce")).unwrap();
        assert_eq!(
            client.endpoint("orders").unwrap().as_str(),
            "https://shop.example.com/.netlify/commerce/orders"
        );
    }

    #[tokio::test]
    async fn test_token_management() {
        let client = CommerceClient::new(&config("https://shop.example.com/")).unwrap();
        assert!(!client.has_token().await);
        client.set_token(SecretString::from("jwt")).await;
        assert!(client.has_token().await);
        client.clear_token().await;
        assert!(!client.has_token().await);
    }
}
