use serde::Serialize;
use uuid::Uuid;

use super::subscription::{self, SubscriptionSummary};
use crate::database::models::{OrderSummary, Tenant};
use crate::database::{DatabaseError, Stores};

#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub orders: OrderSummary,
    pub product_count: usize,
    pub low_stock_count: usize,
    pub unread_notifications: usize,
    pub subscription: SubscriptionSummary,
}

pub async fn build(
    stores: &Stores,
    tenant: &Tenant,
    user_id: Uuid,
    low_stock_threshold: i32,
) -> Result<Dashboard, DatabaseError> {
    let (orders, products, low_stock, unread, subscription) = futures::try_join!(
        stores.orders.summary(tenant.id),
        stores.catalog.list_products(tenant.id, None),
        stores.catalog.low_stock(tenant.id, low_stock_threshold),
        stores.notifications.list(tenant.id, user_id, true),
        subscription::summary(stores, tenant),
    )?;

    Ok(Dashboard {
        orders,
        product_count: products.len(),
        low_stock_count: low_stock.len(),
        unread_notifications: unread.len(),
        subscription,
    })
}
