use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::types::OrderStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub order_number: String,
    pub customer_email: String,
    pub customer_name: String,
    pub status: OrderStatus,
    pub subtotal: Decimal,
    pub total: Decimal,
    pub shipping_address: Option<Value>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub name: String,
    pub sku: Option<String>,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub line_total: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub tenant_id: Uuid,
    pub order_number: String,
    pub customer_email: String,
    pub customer_name: String,
    pub shipping_address: Option<Value>,
    pub notes: Option<String>,
    pub items: Vec<NewOrderItem>,
}

#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub name: String,
    pub sku: Option<String>,
    pub unit_price: Decimal,
    pub quantity: i32,
}

impl NewOrderItem {
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

impl NewOrder {
    pub fn subtotal(&self) -> Decimal {
        self.items.iter().map(NewOrderItem::line_total).sum()
    }

    /// Subtotal, or `None` when it does not fit a `Decimal`
    pub fn checked_subtotal(&self) -> Option<Decimal> {
        self.items.iter().try_fold(Decimal::ZERO, |sum, item| {
            item.unit_price
                .checked_mul(Decimal::from(item.quantity))
                .and_then(|total| sum.checked_add(total))
        })
    }
}

/// Aggregates for the tenant dashboard
#[derive(Debug, Clone, Default, Serialize)]
pub struct OrderSummary {
    pub order_count: i64,
    /// Sum of totals over orders that are not cancelled
    pub revenue: Decimal,
    pub by_status: BTreeMap<String, i64>,
}
