//! Order detail and edit helpers.

use commerce_admin_core::OrderId;
use tracing::instrument;

use crate::commerce::{Address, CommerceApi, CommerceError, Customer, Order, OrderUpdate};
use crate::components::AddressKind;

/// An order with the customer who placed it.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderDetail {
    /// The order.
    pub order: Order,
    /// Its customer, when the order has one and the backend still knows it.
    pub customer: Option<Customer>,
}

impl OrderDetail {
    /// Whether any line item is a physical book.
    #[must_use]
    pub fn requires_shipping(&self) -> bool {
        self.order.requires_shipping()
    }
}

/// Fetch an order and its customer.
///
/// Guest orders and customers the backend no longer has yield
/// `customer: None`.
///
/// # Errors
///
/// Returns `CommerceError` if the order fetch fails, or the customer fetch
/// fails for any reason other than not found.
#[instrument(skip(api), fields(order_id = %id))]
pub async fn load_order_detail<C: CommerceApi>(
    api: &C,
    id: &OrderId,
) -> Result<OrderDetail, CommerceError> {
    let order = api.order_detail(id).await?;

    let customer = match &order.user_id {
        Some(user_id) => match api.customer_detail(user_id).await {
            Ok(customer) => Some(customer),
            Err(CommerceError::NotFound(_)) => {
                tracing::debug!(user_id = %user_id, "Order customer not found");
                None
            }
            Err(e) => return Err(e),
        },
        None => None,
    };

    Ok(OrderDetail { order, customer })
}

/// Flip an order between pending and shipped.
///
/// # Errors
///
/// Returns `CommerceError` if the update is rejected.
#[instrument(skip(api, order), fields(order_id = %order.id, from = %order.fulfillment_state))]
pub async fn toggle_fulfillment<C: CommerceApi>(
    api: &C,
    order: &Order,
) -> Result<Order, CommerceError> {
    let update = OrderUpdate::fulfillment(order.fulfillment_state.toggled());
    api.update_order(&order.id, &update).await
}

/// Replace one of an order's addresses.
///
/// # Errors
///
/// Returns `CommerceError` if the update is rejected.
#[instrument(skip(api, address), fields(order_id = %id))]
pub async fn update_address<C: CommerceApi>(
    api: &C,
    id: &OrderId,
    kind: AddressKind,
    address: Address,
) -> Result<Order, CommerceError> {
    let update = match kind {
        AddressKind::Billing => OrderUpdate::billing_address(address),
        AddressKind::Shipping => OrderUpdate::shipping_address(address),
    };
    api.update_order(id, &update).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use commerce_admin_core::{CustomerId, FulfillmentState};

    use super::*;
    use crate::testing::FakeCommerce;

    #[tokio::test]
    async fn test_detail_includes_customer() {
        let api = FakeCommerce::with_orders(2);
        let detail = load_order_detail(&api, &OrderId::new("ord_2")).await.unwrap();
        assert_eq!(detail.order.id.as_str(), "ord_2");
        assert_eq!(detail.customer.unwrap().email, "buyer2@example.com");
    }

    #[tokio::test]
    async fn test_missing_customer_is_not_an_error() {
        let api = FakeCommerce::with_orders(1);
        api.orders.lock().unwrap()[0].user_id = Some(CustomerId::new("usr_gone"));
        let detail = load_order_detail(&api, &OrderId::new("ord_1")).await.unwrap();
        assert!(detail.customer.is_none());

        api.orders.lock().unwrap()[0].user_id = None;
        let detail = load_order_detail(&api, &OrderId::new("ord_1")).await.unwrap();
        assert!(detail.customer.is_none());
    }

    #[tokio::test]
    async fn test_missing_order_is_not_found() {
        let api = FakeCommerce::with_orders(1);
        let err = load_order_detail(&api, &OrderId::new("ord_9")).await.unwrap_err();
        assert!(matches!(err, CommerceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_toggle_fulfillment_flips_state() {
        let api = FakeCommerce::with_orders(1);
        let order = api.order_detail(&OrderId::new("ord_1")).await.unwrap();
        assert_eq!(order.fulfillment_state, FulfillmentState::Pending);

        let shipped = toggle_fulfillment(&api, &order).await.unwrap();
        assert_eq!(shipped.fulfillment_state, FulfillmentState::Shipped);
        let pending = toggle_fulfillment(&api, &shipped).await.unwrap();
        assert_eq!(pending.fulfillment_state, FulfillmentState::Pending);
    }

    #[tokio::test]
    async fn test_update_address_targets_one_kind() {
        let api = FakeCommerce::with_orders(1);
        let address = Address {
            name: Some("Grace".to_string()),
            country: Some("US".to_string()),
            ..Address::default()
        };
        let id = OrderId::new("ord_1");

        let updated = update_address(&api, &id, AddressKind::Shipping, address.clone())
            .await
            .unwrap();
        assert_eq!(updated.shipping_address, Some(address));
        assert_eq!(
            updated.billing_address.unwrap().name.as_deref(),
            Some("Buyer 1")
        );
    }
}
