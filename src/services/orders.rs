//! Checkout and order lifecycle.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info};
use uuid::Uuid;

use super::cart::{self, CartError, CartStore};
use super::email::Emails;
use super::inventory::AdjustmentRequest;
use super::notifications;
use crate::database::models::{NewOrder, NewOrderItem, Order, OrderWithItems, Tenant};
use crate::database::{DatabaseError, Stores};
use crate::types::{AdjustmentType, OrderStatus};

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Order {0} not found")]
    NotFound(Uuid),

    #[error("Cannot change order status from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// `ORD-YYYYMMDD-XXXXXX`, suffix from a random uuid
pub fn order_number(now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string()[..6].to_uppercase();
    format!("ORD-{}-{}", now.format("%Y%m%d"), suffix)
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
    pub customer_email: String,
    pub customer_name: String,
    pub shipping_address: Option<Value>,
    pub notes: Option<String>,
}

/// Turns the session's cart into an order.
///
/// Every line is re-checked against the live catalog first and charged at
/// the current price. The order row and the stock decrement are separate
/// writes; a failed decrement is logged against the order number.
pub async fn checkout(
    stores: &Stores,
    emails: &Emails,
    carts: &CartStore,
    tenant: &Tenant,
    session_id: Uuid,
    request: CheckoutRequest,
) -> Result<OrderWithItems, CartError> {
    let cart = carts
        .get(tenant.id, session_id)
        .await
        .filter(|c| !c.is_empty())
        .ok_or(CartError::Empty)?;

    let mut items = Vec::with_capacity(cart.lines.len());
    for line in &cart.lines {
        let live = cart::price_item(stores, tenant.id, line.product_id, line.variant_id).await?;
        if live.available < line.quantity {
            return Err(CartError::InsufficientStock {
                name: live.name,
                available: live.available,
            });
        }
        items.push(NewOrderItem {
            product_id: line.product_id,
            variant_id: line.variant_id,
            name: live.name,
            sku: live.sku,
            unit_price: live.unit_price,
            quantity: line.quantity,
        });
    }

    let number = order_number(Utc::now());
    let new_order = NewOrder {
        tenant_id: tenant.id,
        order_number: number.clone(),
        customer_email: request.customer_email.trim().to_lowercase(),
        customer_name: request.customer_name.trim().to_string(),
        shipping_address: request.shipping_address,
        notes: request.notes,
        items,
    };
    if new_order.checked_subtotal().is_none() {
        return Err(CartError::InvalidQuantity);
    }
    let order = stores.orders.create(new_order).await?;

    let adjustments: Vec<AdjustmentRequest> = order
        .items
        .iter()
        .map(|item| AdjustmentRequest {
            product_id: Some(item.product_id),
            variant_id: item.variant_id,
            adjustment_type: AdjustmentType::Decrease,
            quantity: item.quantity,
            reason: Some(format!("order {}", number)),
        })
        .collect();
    if let Err(e) = stores.catalog.apply_adjustments(tenant.id, &adjustments, None).await {
        error!("Stock decrement failed for order {}: {}", number, e);
    }

    carts.clear(tenant.id, session_id).await;
    info!("Order {} placed for tenant {}", number, tenant.subdomain);

    emails.order_confirmation(&tenant.name, &order).await;
    notifications::post(
        stores,
        tenant.id,
        None,
        "order",
        format!("New order {}", number),
        format!("{} ordered {} item(s), total {}", order.order.customer_name, order.items.len(), order.order.total),
        Some(format!("/api/orders/{}", order.order.id)),
    )
    .await;

    Ok(order)
}

pub async fn update_status(
    stores: &Stores,
    emails: &Emails,
    tenant: &Tenant,
    order_id: Uuid,
    next: OrderStatus,
) -> Result<Order, OrderError> {
    let current = stores
        .orders
        .get(tenant.id, order_id)
        .await?
        .ok_or(OrderError::NotFound(order_id))?;

    let from = current.order.status;
    if !from.can_transition_to(next) {
        return Err(OrderError::InvalidTransition { from, to: next });
    }

    let order = stores.orders.update_status(tenant.id, order_id, next).await?;
    info!("Order {} moved {} -> {}", order.order_number, from, next);
    emails.order_status(&tenant.name, &order).await;
    Ok(order)
}
