//! Single order commands.
//!
//! # Usage
//!
//! ```bash
//! ca-cli order show ord_123
//! ca-cli order ship ord_123
//! ca-cli order address ord_123 shipping --name "Ada" --city London --country GB
//! ```

use std::io::{self, Write};

use commerce_admin::commerce::{Address, CommerceApi, Order};
use commerce_admin::components::AddressKind;
use commerce_admin::config::AdminConfig;
use commerce_admin::orders::{OrderDetail, load_order_detail, toggle_fulfillment, update_address};
use commerce_admin_core::OrderId;

use super::{AddressArg, AddressFields, CliError, OrderAction, connect};

impl From<AddressFields> for Address {
    fn from(fields: AddressFields) -> Self {
        Self {
            name: fields.name,
            company: fields.company,
            address1: fields.address1,
            address2: fields.address2,
            city: fields.city,
            zip: fields.zip,
            state: fields.state,
            country: fields.country,
            ..Self::default()
        }
    }
}

impl From<AddressArg> for AddressKind {
    fn from(arg: AddressArg) -> Self {
        match arg {
            AddressArg::Billing => Self::Billing,
            AddressArg::Shipping => Self::Shipping,
        }
    }
}

fn write_address(out: &mut impl Write, label: &str, address: Option<&Address>) -> io::Result<()> {
    let Some(address) = address else {
        return writeln!(out, "{label}: -");
    };
    let lines: Vec<&str> = [
        &address.name,
        &address.company,
        &address.address1,
        &address.address2,
    ]
    .into_iter()
    .filter_map(|part| part.as_deref())
    .filter(|part| !part.is_empty())
    .collect();
    writeln!(out, "{label}: {}", lines.join(", "))?;
    writeln!(out, "  {}", address.one_line())
}

fn write_order(out: &mut impl Write, order: &Order) -> io::Result<()> {
    writeln!(out, "Order {}", order.id)?;
    writeln!(out, "Placed: {}", order.created_at.format("%b %d %Y %H:%M"))?;
    writeln!(out, "Email: {}", order.email.as_deref().unwrap_or("-"))?;
    writeln!(
        out,
        "Payment: {} ({})",
        order.payment_state,
        order.payment_processor.as_deref().unwrap_or("-")
    )?;
    writeln!(out, "Fulfillment: {}", order.fulfillment_state)?;
    for item in &order.line_items {
        writeln!(out, "  {} x {}", item.quantity, item.title)?;
    }
    writeln!(out, "Subtotal: {}", order.subtotal_money())?;
    writeln!(out, "Taxes: {}", order.taxes_money())?;
    writeln!(out, "Total: {}", order.total_money())?;
    write_address(out, "Billing", order.billing_address.as_ref())?;
    write_address(out, "Shipping", order.shipping_address.as_ref())
}

fn write_detail(out: &mut impl Write, detail: &OrderDetail) -> io::Result<()> {
    write_order(out, &detail.order)?;
    if detail.requires_shipping() {
        writeln!(out, "Requires shipping")?;
    }
    match &detail.customer {
        Some(customer) => writeln!(
            out,
            "Customer: {} <{}>, {} orders",
            customer.name.as_deref().unwrap_or("-"),
            customer.email,
            customer.order_count
        ),
        None => writeln!(out, "Customer: guest"),
    }
}

/// Run an `order` subcommand.
pub async fn run(config: &AdminConfig, action: OrderAction) -> Result<(), CliError> {
    let (client, _) = connect(config).await?;
    let mut out = io::stdout();

    match action {
        OrderAction::Show { id } => {
            let detail = load_order_detail(&client, &OrderId::new(id)).await?;
            write_detail(&mut out, &detail)?;
        }
        OrderAction::Ship { id } => {
            let order = client.order_detail(&OrderId::new(id)).await?;
            let updated = toggle_fulfillment(&client, &order).await?;
            tracing::info!(
                order_id = %updated.id,
                state = %updated.fulfillment_state,
                "Fulfillment updated"
            );
            write_order(&mut out, &updated)?;
        }
        OrderAction::Address { id, kind, fields } => {
            let updated = update_address(&client, &OrderId::new(id), kind.into(), fields.into()).await?;
            write_order(&mut out, &updated)?;
        }
    }
    Ok(())
}
