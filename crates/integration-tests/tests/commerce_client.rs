//! `CommerceClient` against the fake backend: wire format, pagination
//! headers and error mapping.

use commerce_admin::commerce::{
    Address, CommerceApi, CommerceError, ListQuery, OrderUpdate, ProductRow, ReportKind,
    ReportRange, SalesRow,
};
use commerce_admin_core::{CustomerId, FulfillmentState, OrderId, PaymentState};
use commerce_admin_integration_tests::{FakeBackend, customer_json, order_json};
use serde_json::json;

fn page_query(page: u32) -> ListQuery {
    let mut query = ListQuery::new();
    query.insert("per_page", 50_u32);
    query.insert("page", page);
    query
}

async fn backend(orders: usize) -> FakeBackend {
    FakeBackend::builder()
        .orders((1..=orders).map(order_json).collect())
        .customers((1..=orders).map(customer_json).collect())
        .start()
        .await
}

#[tokio::test]
async fn test_list_reads_pagination_headers() {
    let backend = backend(107).await;
    let client = backend.client(None);

    let first = client.list_orders(&page_query(1)).await.unwrap();
    assert_eq!(first.records.len(), 50);
    assert_eq!(first.pagination.current, 1);
    assert_eq!(first.pagination.next, Some(2));
    assert_eq!(first.pagination.last, 3);
    assert_eq!(first.pagination.total, 107);

    let last = client.list_orders(&page_query(3)).await.unwrap();
    assert_eq!(last.records.len(), 7);
    assert_eq!(last.pagination.next, None);
    assert!(last.pagination.is_last());
    assert_eq!(last.records[0].id.as_str(), "ord_101");
}

#[tokio::test]
async fn test_negated_and_list_params_on_the_wire() {
    let backend = backend(4).await;
    let client = backend.client(None);

    let mut query = page_query(1);
    query.insert("user_id", "all");
    query.negate("billing_countries", vec!["DE".to_string(), "FR".to_string()]);
    let page = client.list_orders(&query).await.unwrap();

    assert!(page
        .records
        .iter()
        .all(|o| o.billing_address.as_ref().and_then(|a| a.country.as_deref()) == Some("US")));
    let request = &backend.requests_to("/orders")[0];
    assert_eq!(request.param("billing_countries!"), Some("DE,FR"));
    assert_eq!(request.param("billing_countries"), None);
    assert_eq!(request.param("user_id"), Some("all"));
}

#[tokio::test]
async fn test_bearer_token_is_sent() {
    let backend = FakeBackend::builder()
        .orders(vec![order_json(1)])
        .require_token("jwt-123")
        .start()
        .await;

    let err = backend.client(None).list_orders(&page_query(1)).await.unwrap_err();
    assert!(matches!(err, CommerceError::Unauthorized(ref msg) if msg == "Invalid token"));

    let page = backend
        .client(Some("jwt-123"))
        .list_orders(&page_query(1))
        .await
        .unwrap();
    assert_eq!(page.records.len(), 1);
    assert_eq!(
        backend.requests().last().unwrap().authorization.as_deref(),
        Some("Bearer jwt-123")
    );
}

#[tokio::test]
async fn test_error_statuses_map_to_typed_errors() {
    let backend = backend(1).await;
    let client = backend.client(None);

    let err = client.order_detail(&OrderId::new("ord_404")).await.unwrap_err();
    assert!(matches!(err, CommerceError::NotFound(ref path) if path.ends_with("/orders/ord_404")));

    backend.fail_with(429, "slow down");
    let err = client.list_orders(&page_query(1)).await.unwrap_err();
    assert!(matches!(err, CommerceError::RateLimited(7)));

    backend.fail_with(500, "database unavailable");
    let err = client.list_orders(&page_query(1)).await.unwrap_err();
    assert_eq!(err.to_string(), "API error (500): database unavailable");

    backend.recover();
    assert!(client.list_orders(&page_query(1)).await.is_ok());
}

#[tokio::test]
async fn test_order_update_round_trip() {
    let backend = backend(1).await;
    let client = backend.client(None);
    let id = OrderId::new("ord_1");

    let updated = client
        .update_order(&id, &OrderUpdate::fulfillment(FulfillmentState::Shipped))
        .await
        .unwrap();
    assert_eq!(updated.fulfillment_state, FulfillmentState::Shipped);
    assert_eq!(updated.payment_state, PaymentState::Paid);

    let address = Address {
        name: Some("Ada".to_string()),
        country: Some("GB".to_string()),
        ..Address::default()
    };
    client
        .update_order(&id, &OrderUpdate::shipping_address(address))
        .await
        .unwrap();
    let stored = backend.order("ord_1").unwrap();
    assert_eq!(stored["shipping_address"]["country"], "GB");
    assert_eq!(stored["fulfillment_state"], "shipped");
}

#[tokio::test]
async fn test_customer_and_receipt() {
    let backend = backend(2).await;
    let client = backend.client(None);

    let customer = client.customer_detail(&CustomerId::new("usr_2")).await.unwrap();
    assert_eq!(customer.order_count, 2);

    let receipt = client
        .order_receipt(&OrderId::new("ord_2"), Some("invoice"))
        .await
        .unwrap();
    assert_eq!(receipt, "<p>invoice:ord_2</p>");
}

#[tokio::test]
async fn test_reports_send_range() {
    let backend = backend(0).await;
    backend.set_report(
        "sales",
        json!([{"total": 1190, "subtotal": 1000, "taxes": 190, "currency": "EUR", "orders": 1}]),
    );
    backend.set_report(
        "products",
        json!([{"sku": "notes", "total": 1000, "currency": "USD", "quantity": 2}]),
    );
    let client = backend.client(None);
    let range = ReportRange {
        from: Some(1_700_000_000),
        to: Some(1_700_086_400),
    };

    let sales: Vec<SalesRow> = client.report(ReportKind::Sales, range).await.unwrap();
    assert_eq!(sales[0].count, 1);
    let products: Vec<ProductRow> = client.report(ReportKind::Products, range).await.unwrap();
    assert_eq!(products[0].quantity, 2);

    let request = &backend.requests_to("/reports/sales")[0];
    assert_eq!(request.param("from"), Some("1700000000"));
    assert_eq!(request.param("to"), Some("1700086400"));
}
