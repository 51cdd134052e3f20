use std::collections::BTreeMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{postgres::PgRow, Row};
use uuid::Uuid;

use super::{text_column, PgStore};
use crate::database::manager::DatabaseError;
use crate::database::models::{NewOrder, Order, OrderItem, OrderSummary, OrderWithItems};
use crate::database::store::OrderStore;
use crate::types::OrderStatus;

const ORDER_COLUMNS: &str = "id, tenant_id, order_number, customer_email, customer_name, status, \
                             subtotal, total, shipping_address, notes, created_at, updated_at";
const ITEM_COLUMNS: &str = "id, order_id, product_id, variant_id, name, sku, unit_price, quantity, line_total";

fn order_from_row(row: &PgRow) -> Result<Order, DatabaseError> {
    Ok(Order {
        id: row.try_get("id")?,
        tenant_id: row.try_get("tenant_id")?,
        order_number: row.try_get("order_number")?,
        customer_email: row.try_get("customer_email")?,
        customer_name: row.try_get("customer_name")?,
        status: text_column(row, "status")?,
        subtotal: row.try_get("subtotal")?,
        total: row.try_get("total")?,
        shipping_address: row.try_get("shipping_address")?,
        notes: row.try_get("notes")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn item_from_row(row: &PgRow) -> Result<OrderItem, DatabaseError> {
    Ok(OrderItem {
        id: row.try_get("id")?,
        order_id: row.try_get("order_id")?,
        product_id: row.try_get("product_id")?,
        variant_id: row.try_get("variant_id")?,
        name: row.try_get("name")?,
        sku: row.try_get("sku")?,
        unit_price: row.try_get("unit_price")?,
        quantity: row.try_get("quantity")?,
        line_total: row.try_get("line_total")?,
    })
}

#[async_trait]
impl OrderStore for PgStore {
    async fn create(&self, new: NewOrder) -> Result<OrderWithItems, DatabaseError> {
        let subtotal = new.subtotal();
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "INSERT INTO orders (id, tenant_id, order_number, customer_email, customer_name, status, \
                                 subtotal, total, shipping_address, notes) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING {}",
            ORDER_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(Uuid::new_v4())
            .bind(new.tenant_id)
            .bind(&new.order_number)
            .bind(&new.customer_email)
            .bind(&new.customer_name)
            .bind(OrderStatus::Pending.as_str())
            .bind(subtotal)
            .bind(subtotal)
            .bind(&new.shipping_address)
            .bind(&new.notes)
            .fetch_one(&mut *tx)
            .await?;
        let order = order_from_row(&row)?;

        let item_sql = format!(
            "INSERT INTO order_products ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {}",
            ITEM_COLUMNS, ITEM_COLUMNS
        );
        let mut items = Vec::with_capacity(new.items.len());
        for item in &new.items {
            let row = sqlx::query(&item_sql)
                .bind(Uuid::new_v4())
                .bind(order.id)
                .bind(item.product_id)
                .bind(item.variant_id)
                .bind(&item.name)
                .bind(&item.sku)
                .bind(item.unit_price)
                .bind(item.quantity)
                .bind(item.line_total())
                .fetch_one(&mut *tx)
                .await?;
            items.push(item_from_row(&row)?);
        }

        tx.commit().await?;
        Ok(OrderWithItems { order, items })
    }

    async fn get(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<OrderWithItems>, DatabaseError> {
        let sql = format!("SELECT {} FROM orders WHERE id = $1 AND tenant_id = $2", ORDER_COLUMNS);
        let Some(row) = sqlx::query(&sql)
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };
        let order = order_from_row(&row)?;

        let item_sql = format!("SELECT {} FROM order_products WHERE order_id = $1 ORDER BY name", ITEM_COLUMNS);
        let rows = sqlx::query(&item_sql).bind(order.id).fetch_all(&self.pool).await?;
        let items = rows.iter().map(item_from_row).collect::<Result<Vec<_>, _>>()?;

        Ok(Some(OrderWithItems { order, items }))
    }

    async fn list(&self, tenant_id: Uuid, status: Option<OrderStatus>) -> Result<Vec<Order>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM orders WHERE tenant_id = $1 AND ($2::text IS NULL OR status = $2) \
             ORDER BY created_at DESC",
            ORDER_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(tenant_id)
            .bind(status.map(|s| s.as_str()))
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(order_from_row).collect()
    }

    async fn update_status(&self, tenant_id: Uuid, id: Uuid, status: OrderStatus) -> Result<Order, DatabaseError> {
        let sql = format!(
            "UPDATE orders SET status = $3, updated_at = now() WHERE id = $1 AND tenant_id = $2 RETURNING {}",
            ORDER_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(tenant_id)
            .bind(status.as_str())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Order {} not found", id)))?;
        order_from_row(&row)
    }

    async fn summary(&self, tenant_id: Uuid) -> Result<OrderSummary, DatabaseError> {
        let rows = sqlx::query(
            "SELECT status, COUNT(*) AS order_count, COALESCE(SUM(total), 0) AS total \
             FROM orders WHERE tenant_id = $1 GROUP BY status",
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        let mut summary = OrderSummary {
            order_count: 0,
            revenue: Decimal::ZERO,
            by_status: BTreeMap::new(),
        };
        for row in &rows {
            let status: OrderStatus = text_column(row, "status")?;
            let count: i64 = row.try_get("order_count")?;
            let total: Decimal = row.try_get("total")?;

            summary.order_count += count;
            if status != OrderStatus::Cancelled {
                summary.revenue += total;
            }
            summary.by_status.insert(status.as_str().to_string(), count);
        }
        Ok(summary)
    }
}
