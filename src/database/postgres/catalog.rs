use async_trait::async_trait;
use sqlx::{postgres::PgRow, Postgres, Row, Transaction};
use uuid::Uuid;

use super::{text_column, PgStore};
use crate::database::manager::DatabaseError;
use crate::database::models::{
    InventoryHistory, NewProduct, NewVariant, Product, ProductUpdate, ProductVariant,
};
use crate::database::store::CatalogStore;
use crate::services::inventory::{
    self, AdjustmentRequest, BatchResult, InventoryError, StockLedger, StockRow, StockTarget,
};
use crate::types::ProductStatus;

const PRODUCT_COLUMNS: &str =
    "id, tenant_id, name, description, sku, price, stock_quantity, status, created_at, updated_at";
const VARIANT_COLUMNS: &str =
    "id, tenant_id, product_id, name, sku, price, stock_quantity, created_at, updated_at";
const HISTORY_COLUMNS: &str = "id, tenant_id, product_id, variant_id, adjustment_type, quantity_before, \
                               quantity_after, quantity_change, reason, created_by, created_at";

fn product_from_row(row: &PgRow) -> Result<Product, DatabaseError> {
    Ok(Product {
        id: row.try_get("id")?,
        tenant_id: row.try_get("tenant_id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        sku: row.try_get("sku")?,
        price: row.try_get("price")?,
        stock_quantity: row.try_get("stock_quantity")?,
        status: text_column(row, "status")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn variant_from_row(row: &PgRow) -> Result<ProductVariant, DatabaseError> {
    Ok(ProductVariant {
        id: row.try_get("id")?,
        tenant_id: row.try_get("tenant_id")?,
        product_id: row.try_get("product_id")?,
        name: row.try_get("name")?,
        sku: row.try_get("sku")?,
        price: row.try_get("price")?,
        stock_quantity: row.try_get("stock_quantity")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn history_from_row(row: &PgRow) -> Result<InventoryHistory, DatabaseError> {
    Ok(InventoryHistory {
        id: row.try_get("id")?,
        tenant_id: row.try_get("tenant_id")?,
        product_id: row.try_get("product_id")?,
        variant_id: row.try_get("variant_id")?,
        adjustment_type: text_column(row, "adjustment_type")?,
        quantity_before: row.try_get("quantity_before")?,
        quantity_after: row.try_get("quantity_after")?,
        quantity_change: row.try_get("quantity_change")?,
        reason: row.try_get("reason")?,
        created_by: row.try_get("created_by")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Stock ledger bound to one transaction; rows are locked as they are read
struct PgLedger<'c> {
    tx: Transaction<'c, Postgres>,
}

#[async_trait]
impl<'c> StockLedger for PgLedger<'c> {
    async fn load(&mut self, tenant_id: Uuid, target: StockTarget) -> Result<Option<StockRow>, DatabaseError> {
        let row = match target {
            StockTarget::Product(id) => {
                sqlx::query(
                    "SELECT id AS product_id, NULL::uuid AS variant_id, stock_quantity \
                     FROM products WHERE id = $1 AND tenant_id = $2 FOR UPDATE",
                )
                .bind(id)
                .bind(tenant_id)
                .fetch_optional(&mut *self.tx)
                .await?
            }
            StockTarget::Variant(id) => {
                sqlx::query(
                    "SELECT product_id, id AS variant_id, stock_quantity \
                     FROM product_variants WHERE id = $1 AND tenant_id = $2 FOR UPDATE",
                )
                .bind(id)
                .bind(tenant_id)
                .fetch_optional(&mut *self.tx)
                .await?
            }
        };

        row.map(|r| -> Result<StockRow, DatabaseError> {
            Ok(StockRow {
                product_id: r.try_get("product_id")?,
                variant_id: r.try_get("variant_id")?,
                stock_quantity: r.try_get("stock_quantity")?,
            })
        })
        .transpose()
    }

    async fn store(&mut self, tenant_id: Uuid, target: StockTarget, quantity: i32) -> Result<(), DatabaseError> {
        let (sql, id) = match target {
            StockTarget::Product(id) => (
                "UPDATE products SET stock_quantity = $1, updated_at = now() WHERE id = $2 AND tenant_id = $3",
                id,
            ),
            StockTarget::Variant(id) => (
                "UPDATE product_variants SET stock_quantity = $1, updated_at = now() WHERE id = $2 AND tenant_id = $3",
                id,
            ),
        };
        sqlx::query(sql)
            .bind(quantity)
            .bind(id)
            .bind(tenant_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn record(&mut self, entry: &InventoryHistory) -> Result<(), DatabaseError> {
        let sql = format!(
            "INSERT INTO inventory_history ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
            HISTORY_COLUMNS
        );
        sqlx::query(&sql)
            .bind(entry.id)
            .bind(entry.tenant_id)
            .bind(entry.product_id)
            .bind(entry.variant_id)
            .bind(entry.adjustment_type.as_str())
            .bind(entry.quantity_before)
            .bind(entry.quantity_after)
            .bind(entry.quantity_change)
            .bind(&entry.reason)
            .bind(entry.created_by)
            .bind(entry.created_at)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn variant_stocks(&mut self, tenant_id: Uuid, product_id: Uuid) -> Result<Vec<i32>, DatabaseError> {
        variant_stocks(&mut self.tx, tenant_id, product_id).await
    }
}

async fn variant_stocks(
    tx: &mut Transaction<'_, Postgres>,
    tenant_id: Uuid,
    product_id: Uuid,
) -> Result<Vec<i32>, DatabaseError> {
    let rows = sqlx::query("SELECT stock_quantity FROM product_variants WHERE product_id = $1 AND tenant_id = $2")
        .bind(product_id)
        .bind(tenant_id)
        .fetch_all(&mut **tx)
        .await?;
    rows.iter()
        .map(|r| r.try_get("stock_quantity").map_err(DatabaseError::from))
        .collect()
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn create_product(&self, tenant_id: Uuid, new: NewProduct) -> Result<Product, DatabaseError> {
        let sql = format!(
            "INSERT INTO products (id, tenant_id, name, description, sku, price, stock_quantity, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {}",
            PRODUCT_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(Uuid::new_v4())
            .bind(tenant_id)
            .bind(&new.name)
            .bind(&new.description)
            .bind(&new.sku)
            .bind(new.price)
            .bind(new.stock_quantity)
            .bind(new.status.as_str())
            .fetch_one(&self.pool)
            .await?;
        product_from_row(&row)
    }

    async fn get_product(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Product>, DatabaseError> {
        let sql = format!("SELECT {} FROM products WHERE id = $1 AND tenant_id = $2", PRODUCT_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(product_from_row).transpose()
    }

    async fn list_products(
        &self,
        tenant_id: Uuid,
        status: Option<ProductStatus>,
    ) -> Result<Vec<Product>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM products WHERE tenant_id = $1 AND ($2::text IS NULL OR status = $2) \
             ORDER BY name ASC",
            PRODUCT_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(tenant_id)
            .bind(status.map(|s| s.as_str()))
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(product_from_row).collect()
    }

    async fn update_product(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        update: ProductUpdate,
    ) -> Result<Product, DatabaseError> {
        let sql = format!(
            "UPDATE products SET \
                name = COALESCE($3, name), \
                description = COALESCE($4, description), \
                sku = COALESCE($5, sku), \
                price = COALESCE($6, price), \
                status = COALESCE($7, status), \
                updated_at = now() \
             WHERE id = $1 AND tenant_id = $2 RETURNING {}",
            PRODUCT_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(tenant_id)
            .bind(update.name)
            .bind(update.description)
            .bind(update.sku)
            .bind(update.price)
            .bind(update.status.map(|s| s.as_str()))
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Product {} not found", id)))?;
        product_from_row(&row)
    }

    async fn create_variant(
        &self,
        tenant_id: Uuid,
        product_id: Uuid,
        new: NewVariant,
    ) -> Result<ProductVariant, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let parent = sqlx::query("SELECT id FROM products WHERE id = $1 AND tenant_id = $2 FOR UPDATE")
            .bind(product_id)
            .bind(tenant_id)
            .fetch_optional(&mut *tx)
            .await?;
        if parent.is_none() {
            return Err(DatabaseError::NotFound(format!("Product {} not found", product_id)));
        }

        let sql = format!(
            "INSERT INTO product_variants (id, tenant_id, product_id, name, sku, price, stock_quantity) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
            VARIANT_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(Uuid::new_v4())
            .bind(tenant_id)
            .bind(product_id)
            .bind(&new.name)
            .bind(&new.sku)
            .bind(new.price)
            .bind(new.stock_quantity)
            .fetch_one(&mut *tx)
            .await?;
        let variant = variant_from_row(&row)?;

        let total = inventory::total_stock(variant_stocks(&mut tx, tenant_id, product_id).await?).ok_or_else(|| {
            DatabaseError::OutOfRange(format!(
                "Combined variant stock of product {} would exceed {}",
                product_id,
                inventory::MAX_STOCK
            ))
        })?;
        sqlx::query("UPDATE products SET stock_quantity = $1, updated_at = now() WHERE id = $2 AND tenant_id = $3")
            .bind(total)
            .bind(product_id)
            .bind(tenant_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(variant)
    }

    async fn get_variant(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<ProductVariant>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM product_variants WHERE id = $1 AND tenant_id = $2",
            VARIANT_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(variant_from_row).transpose()
    }

    async fn list_variants(&self, tenant_id: Uuid, product_id: Uuid) -> Result<Vec<ProductVariant>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM product_variants WHERE product_id = $1 AND tenant_id = $2 ORDER BY created_at ASC",
            VARIANT_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(product_id)
            .bind(tenant_id)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(variant_from_row).collect()
    }

    async fn apply_adjustments(
        &self,
        tenant_id: Uuid,
        items: &[AdjustmentRequest],
        actor: Option<Uuid>,
    ) -> Result<BatchResult, InventoryError> {
        let tx = self.pool.begin().await.map_err(DatabaseError::from)?;
        let mut ledger = PgLedger { tx };

        // Dropping the ledger on error rolls the transaction back
        let result = inventory::apply_batch(&mut ledger, tenant_id, items, actor).await?;

        ledger.tx.commit().await.map_err(DatabaseError::from)?;
        Ok(result)
    }

    async fn list_history(
        &self,
        tenant_id: Uuid,
        product_id: Option<Uuid>,
        limit: i64,
    ) -> Result<Vec<InventoryHistory>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM inventory_history \
             WHERE tenant_id = $1 AND ($2::uuid IS NULL OR product_id = $2) \
             ORDER BY created_at DESC LIMIT $3",
            HISTORY_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(tenant_id)
            .bind(product_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(history_from_row).collect()
    }

    async fn low_stock(&self, tenant_id: Uuid, threshold: i32) -> Result<Vec<Product>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM products WHERE tenant_id = $1 AND status = 'active' AND stock_quantity <= $2 \
             ORDER BY stock_quantity ASC, name ASC",
            PRODUCT_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(tenant_id)
            .bind(threshold)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(product_from_row).collect()
    }
}
