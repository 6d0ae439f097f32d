//! Integration tests for the commerce admin.
//!
//! Tests run the real [`CommerceClient`] and list controller against an
//! in-process fake of the commerce backend, served by `axum` on a random
//! local port. The fake speaks the backend's wire format: bare JSON arrays
//! for list bodies, `Link` and `X-Total-Count` headers for pagination, and
//! `key!` query parameters for negated filters.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p commerce-admin-integration-tests
//! ```

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, HeaderName, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use commerce_admin::commerce::CommerceClient;
use commerce_admin::config::CommerceConfig;
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use url::Url;

/// Page size used when a request does not send `per_page`.
pub const DEFAULT_PER_PAGE: usize = 50;

type Params = Vec<(String, String)>;

/// A request the fake received.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// Path below the API root, e.g. `/orders`.
    pub path: String,
    /// Query pairs in the order they were sent.
    pub params: Params,
    /// `Authorization` header, if any.
    pub authorization: Option<String>,
}

impl RecordedRequest {
    /// First value for `key`.
    #[must_use]
    pub fn param(&self, key: &str) -> Option<&str> {
        param(&self.params, key)
    }
}

#[derive(Default)]
struct BackendState {
    orders: Mutex<Vec<Value>>,
    customers: Vec<Value>,
    reports: Mutex<Vec<(String, Value)>>,
    requests: Mutex<Vec<RecordedRequest>>,
    failure: Mutex<Option<(StatusCode, Value)>>,
    required_token: Option<String>,
}

impl BackendState {
    /// Record the request and return the response it must get instead of the
    /// normal one, if any.
    fn admit(&self, path: &str, headers: &HeaderMap, params: &[(String, String)]) -> Option<Response> {
        let authorization = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(ToOwned::to_owned);

        if let Ok(mut requests) = self.requests.lock() {
            requests.push(RecordedRequest {
                path: path.to_owned(),
                params: params.to_vec(),
                authorization: authorization.clone(),
            });
        }

        if let Some(token) = &self.required_token
            && authorization.as_deref() != Some(format!("Bearer {token}").as_str())
        {
            return Some((StatusCode::UNAUTHORIZED, Json(json!({"msg": "Invalid token"}))).into_response());
        }

        let failure = self.failure.lock().ok().and_then(|f| f.clone());
        failure.map(|(status, body)| {
            if status == StatusCode::TOO_MANY_REQUESTS {
                (status, [(header::RETRY_AFTER, "7")], Json(body)).into_response()
            } else {
                (status, Json(body)).into_response()
            }
        })
    }
}

/// In-process commerce backend.
pub struct FakeBackend {
    addr: SocketAddr,
    state: Arc<BackendState>,
    server: JoinHandle<()>,
}

impl Drop for FakeBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

/// Builder for [`FakeBackend`].
#[derive(Default)]
pub struct FakeBackendBuilder {
    orders: Vec<Value>,
    customers: Vec<Value>,
    required_token: Option<String>,
}

impl FakeBackendBuilder {
    /// Serve these orders.
    #[must_use]
    pub fn orders(mut self, orders: Vec<Value>) -> Self {
        self.orders = orders;
        self
    }

    /// Serve these customers.
    #[must_use]
    pub fn customers(mut self, customers: Vec<Value>) -> Self {
        self.customers = customers;
        self
    }

    /// Reject requests without `Authorization: Bearer <token>`.
    #[must_use]
    pub fn require_token(mut self, token: &str) -> Self {
        self.required_token = Some(token.to_owned());
        self
    }

    /// Bind a random local port and start serving.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    #[allow(clippy::expect_used)]
    pub async fn start(self) -> FakeBackend {
        let state = Arc::new(BackendState {
            orders: Mutex::new(self.orders),
            customers: self.customers,
            required_token: self.required_token,
            ..BackendState::default()
        });

        let api = Router::new()
            .route("/orders", get(list_orders))
            .route("/orders/{id}", get(order_detail).put(update_order))
            .route("/orders/{id}/receipt", get(order_receipt))
            .route("/users", get(list_customers))
            .route("/users/{id}", get(customer_detail))
            .route("/reports/{kind}", get(report))
            .with_state(Arc::clone(&state));
        let app = Router::new().nest("/api", api);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake backend");
        let addr = listener.local_addr().expect("Fake backend has no address");
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        FakeBackend {
            addr,
            state,
            server,
        }
    }
}

impl FakeBackend {
    /// Start building a backend.
    #[must_use]
    pub fn builder() -> FakeBackendBuilder {
        FakeBackendBuilder::default()
    }

    /// API root, e.g. `http://127.0.0.1:5555/api`.
    ///
    /// # Panics
    ///
    /// Never in practice: the address always forms a valid URL.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn url(&self) -> Url {
        Url::parse(&format!("http://{}/api", self.addr)).expect("Invalid fake backend URL")
    }

    /// Client configuration pointing at this backend.
    #[must_use]
    pub fn config(&self, token: Option<&str>) -> CommerceConfig {
        CommerceConfig {
            api_url: self.url(),
            access_token: token.map(|t| SecretString::from(t.to_owned())),
            timeout_secs: 5,
        }
    }

    /// Client for this backend.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn client(&self, token: Option<&str>) -> CommerceClient {
        CommerceClient::new(&self.config(token)).expect("Failed to build client")
    }

    /// Every request received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state
            .requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Requests received for `path`.
    #[must_use]
    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests().into_iter().filter(|r| r.path == path).collect()
    }

    /// Answer every following request with `status` and `{"msg": message}`.
    pub fn fail_with(&self, status: u16, message: &str) {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if let Ok(mut failure) = self.state.failure.lock() {
            *failure = Some((status, json!({"msg": message})));
        }
    }

    /// Stop injecting failures.
    pub fn recover(&self) {
        if let Ok(mut failure) = self.state.failure.lock() {
            *failure = None;
        }
    }

    /// Serve `rows` for the `kind` report.
    pub fn set_report(&self, kind: &str, rows: Value) {
        if let Ok(mut reports) = self.state.reports.lock() {
            reports.push((kind.to_owned(), rows));
        }
    }

    /// Current server-side copy of an order.
    #[must_use]
    pub fn order(&self, id: &str) -> Option<Value> {
        self.state
            .orders
            .lock()
            .ok()?
            .iter()
            .find(|o| o["id"] == id)
            .cloned()
    }
}

// =============================================================================
// Fixtures
// =============================================================================

/// Order `n`: paid, pending shipment, billed to Germany for odd `n` and the
/// US for even `n`.
#[must_use]
pub fn order_json(n: usize) -> Value {
    let country = if n % 2 == 1 { "DE" } else { "US" };
    json!({
        "id": format!("ord_{n}"),
        "user_id": format!("usr_{n}"),
        "email": format!("buyer{n}@example.com"),
        "subtotal": 1000,
        "taxes": 190,
        "total": 1190,
        "currency": "EUR",
        "billing_address": {
            "name": format!("Buyer {n}"),
            "company": null,
            "address1": format!("{n} Main St"),
            "city": "Berlin",
            "zip": "10115",
            "country": country
        },
        "shipping_address": null,
        "payment_processor": "stripe",
        "payment_state": if n % 3 == 0 { "pending" } else { "paid" },
        "fulfillment_state": "pending",
        "line_items": [
            {"id": format!("li_{n}"), "title": "Field Notes", "sku": "notes", "quantity": 2, "price": 500, "type": "Book"}
        ],
        "transactions": [],
        "created_at": "2024-03-05T12:00:00Z",
        "updated_at": "2024-03-05T12:00:00Z"
    })
}

/// Customer `n`.
#[must_use]
pub fn customer_json(n: usize) -> Value {
    json!({
        "id": format!("usr_{n}"),
        "email": format!("buyer{n}@example.com"),
        "name": format!("Buyer {n}"),
        "order_count": n,
        "created_at": "2024-01-01T00:00:00Z"
    })
}

// =============================================================================
// Handlers
// =============================================================================

fn param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

fn list_param(params: &[(String, String)], key: &str) -> Option<Vec<String>> {
    param(params, key).map(|v| v.split(',').map(ToOwned::to_owned).collect())
}

fn not_found(what: &str) -> Response {
    (StatusCode::NOT_FOUND, Json(json!({"msg": format!("{what} not found")}))).into_response()
}

/// Apply the filters the fake understands.
fn matches(order: &Value, params: &[(String, String)]) -> bool {
    let country = order["billing_address"]["country"].as_str().unwrap_or_default();

    if let Some(email) = param(params, "email")
        && order["email"] != email
    {
        return false;
    }
    if let Some(state) = param(params, "payment_state")
        && order["payment_state"] != state
    {
        return false;
    }
    if let Some(countries) = list_param(params, "billing_countries")
        && !countries.iter().any(|c| c == country)
    {
        return false;
    }
    if let Some(excluded) = list_param(params, "billing_countries!")
        && excluded.iter().any(|c| c == country)
    {
        return false;
    }
    true
}

/// Serve one page of `records` with pagination headers.
fn paged(path: &str, records: Vec<Value>, params: &[(String, String)]) -> Response {
    let page = param(params, "page")
        .and_then(|p| p.parse::<usize>().ok())
        .unwrap_or(1)
        .max(1);
    let per_page = param(params, "per_page")
        .and_then(|p| p.parse::<usize>().ok())
        .unwrap_or(DEFAULT_PER_PAGE)
        .max(1);

    let total = records.len();
    let last = total.div_ceil(per_page).max(1);
    let body: Vec<Value> = records
        .into_iter()
        .skip((page - 1) * per_page)
        .take(per_page)
        .collect();

    let link = |rel: &str, target: usize| {
        format!("</api{path}?page={target}&per_page={per_page}>; rel=\"{rel}\"")
    };
    let mut links = vec![link("first", 1)];
    if page < last {
        links.push(link("next", page + 1));
    }
    links.push(link("last", last));

    (
        [
            (header::LINK, links.join(", ")),
            (HeaderName::from_static("x-total-count"), total.to_string()),
        ],
        Json(body),
    )
        .into_response()
}

async fn list_orders(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Query(params): Query<Params>,
) -> Response {
    if let Some(response) = state.admit("/orders", &headers, &params) {
        return response;
    }
    let orders: Vec<Value> = state
        .orders
        .lock()
        .map(|o| o.iter().filter(|order| matches(order, &params)).cloned().collect())
        .unwrap_or_default();
    paged("/orders", orders, &params)
}

async fn list_customers(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Query(params): Query<Params>,
) -> Response {
    if let Some(response) = state.admit("/users", &headers, &params) {
        return response;
    }
    let customers: Vec<Value> = state
        .customers
        .iter()
        .filter(|c| param(&params, "email").is_none_or(|email| c["email"] == email))
        .cloned()
        .collect();
    paged("/users", customers, &params)
}

async fn order_detail(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if let Some(response) = state.admit(&format!("/orders/{id}"), &headers, &[]) {
        return response;
    }
    let order = state
        .orders
        .lock()
        .ok()
        .and_then(|orders| orders.iter().find(|o| o["id"] == id.as_str()).cloned());
    match order {
        Some(order) => Json(order).into_response(),
        None => not_found("Order"),
    }
}

async fn update_order(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(update): Json<Value>,
) -> Response {
    if let Some(response) = state.admit(&format!("/orders/{id}"), &headers, &[]) {
        return response;
    }
    let Ok(mut orders) = state.orders.lock() else {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };
    let Some(order) = orders.iter_mut().find(|o| o["id"] == id.as_str()) else {
        return not_found("Order");
    };
    if let (Some(target), Some(fields)) = (order.as_object_mut(), update.as_object()) {
        for (key, value) in fields {
            target.insert(key.clone(), value.clone());
        }
    }
    Json(order.clone()).into_response()
}

async fn order_receipt(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(params): Query<Params>,
) -> Response {
    if let Some(response) = state.admit(&format!("/orders/{id}/receipt"), &headers, &params) {
        return response;
    }
    let template = param(&params, "template").unwrap_or("default");
    Json(json!({"data": format!("<p>{template}:{id}</p>")})).into_response()
}

async fn customer_detail(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if let Some(response) = state.admit(&format!("/users/{id}"), &headers, &[]) {
        return response;
    }
    match state.customers.iter().find(|c| c["id"] == id.as_str()) {
        Some(customer) => Json(customer.clone()).into_response(),
        None => not_found("User"),
    }
}

async fn report(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Path(kind): Path<String>,
    Query(params): Query<Params>,
) -> Response {
    if let Some(response) = state.admit(&format!("/reports/{kind}"), &headers, &params) {
        return response;
    }
    let rows = state
        .reports
        .lock()
        .ok()
        .and_then(|reports| reports.iter().find(|(k, _)| *k == kind).map(|(_, rows)| rows.clone()))
        .unwrap_or_else(|| json!([]));
    Json(rows).into_response()
}
