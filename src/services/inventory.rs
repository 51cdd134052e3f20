//! Bulk stock adjustment.
//!
//! The arithmetic and the batch walk live here; storage backends only
//! provide a [`StockLedger`] over their own transaction so the rules are
//! applied identically everywhere.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::models::InventoryHistory;
use crate::database::DatabaseError;
use crate::types::AdjustmentType;

/// One line of a bulk adjustment request.
#[derive(Debug, Clone, Deserialize)]
pub struct AdjustmentRequest {
    pub product_id: Option<Uuid>,
    pub variant_id: Option<Uuid>,
    pub adjustment_type: AdjustmentType,
    pub quantity: i32,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum StockTarget {
    Product(Uuid),
    Variant(Uuid),
}

impl AdjustmentRequest {
    /// Variant wins when both ids are given
    pub fn target(&self) -> Option<StockTarget> {
        match (self.variant_id, self.product_id) {
            (Some(variant), _) => Some(StockTarget::Variant(variant)),
            (None, Some(product)) => Some(StockTarget::Product(product)),
            (None, None) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StockChange {
    pub before: i32,
    pub after: i32,
    pub change: i32,
}

/// Upper bound for any stock count, product totals included
pub const MAX_STOCK: i32 = 1_000_000_000;

/// Stock arithmetic for a single adjustment. Decreases floor at zero;
/// increases stop at [`MAX_STOCK`].
pub fn compute_change(kind: AdjustmentType, before: i32, quantity: i32) -> StockChange {
    let after = match kind {
        AdjustmentType::Increase => before.saturating_add(quantity).min(MAX_STOCK.max(before)),
        AdjustmentType::Decrease => before.saturating_sub(quantity).max(0),
        AdjustmentType::Set => quantity,
    };
    StockChange {
        before,
        after,
        change: after - before,
    }
}

/// Sum of variant stocks, or `None` when it would pass [`MAX_STOCK`]
pub fn total_stock<I: IntoIterator<Item = i32>>(stocks: I) -> Option<i32> {
    stocks
        .into_iter()
        .try_fold(0i32, |total, stock| total.checked_add(stock))
        .filter(|total| *total <= MAX_STOCK)
}

/// Whether a stock move takes an item from above the threshold to at or below it
pub fn crossed_low_stock(before: i32, after: i32, threshold: i32) -> bool {
    before > threshold && after <= threshold
}

#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("At least one adjustment is required")]
    EmptyBatch,

    #[error("Too many adjustments in one request (max {0})")]
    TooManyItems(usize),

    #[error("Adjustment {0}: product_id or variant_id is required")]
    MissingTarget(usize),

    #[error("Adjustment {0}: quantity must not be negative")]
    NegativeQuantity(usize),

    #[error("Adjustment {0}: quantity must not exceed {MAX_STOCK}")]
    QuantityTooLarge(usize),

    #[error("Combined variant stock of product {0} would exceed {MAX_STOCK}")]
    StockOverflow(Uuid),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Checks request shape before anything touches storage.
pub fn validate_batch(items: &[AdjustmentRequest], max_items: usize) -> Result<(), InventoryError> {
    if items.is_empty() {
        return Err(InventoryError::EmptyBatch);
    }
    if items.len() > max_items {
        return Err(InventoryError::TooManyItems(max_items));
    }
    for (index, item) in items.iter().enumerate() {
        if item.target().is_none() {
            return Err(InventoryError::MissingTarget(index));
        }
        if item.quantity < 0 {
            return Err(InventoryError::NegativeQuantity(index));
        }
        if item.quantity > MAX_STOCK {
            return Err(InventoryError::QuantityTooLarge(index));
        }
    }
    Ok(())
}

/// Current stock of a product or variant, as read under the ledger's lock
#[derive(Debug, Clone, Copy)]
pub struct StockRow {
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub stock_quantity: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdjustmentOutcome {
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub adjustment_type: AdjustmentType,
    pub quantity_before: i32,
    pub quantity_after: i32,
    pub quantity_change: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncedProduct {
    pub product_id: Uuid,
    pub previous_stock: i32,
    pub stock_quantity: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    pub adjustments: Vec<AdjustmentOutcome>,
    pub synced_products: Vec<SyncedProduct>,
}

/// Storage operations a batch needs. Implementations run inside a single
/// transaction (or an equivalent exclusive section) for the whole batch.
#[async_trait]
pub trait StockLedger: Send {
    async fn load(&mut self, tenant_id: Uuid, target: StockTarget) -> Result<Option<StockRow>, DatabaseError>;

    async fn store(&mut self, tenant_id: Uuid, target: StockTarget, quantity: i32) -> Result<(), DatabaseError>;

    async fn record(&mut self, entry: &InventoryHistory) -> Result<(), DatabaseError>;

    /// Stock of every variant of a product
    async fn variant_stocks(&mut self, tenant_id: Uuid, product_id: Uuid) -> Result<Vec<i32>, DatabaseError>;
}

/// Walks the batch in order, writing stock and history per item, then
/// re-syncs every product whose variants were touched.
pub async fn apply_batch<L: StockLedger + ?Sized>(
    ledger: &mut L,
    tenant_id: Uuid,
    items: &[AdjustmentRequest],
    actor: Option<Uuid>,
) -> Result<BatchResult, InventoryError> {
    let mut adjustments = Vec::with_capacity(items.len());
    let mut touched_parents = BTreeSet::new();

    for (index, item) in items.iter().enumerate() {
        let target = item.target().ok_or(InventoryError::MissingTarget(index))?;

        let row = ledger.load(tenant_id, target).await?.ok_or_else(|| {
            InventoryError::NotFound(match target {
                StockTarget::Product(id) => format!("Product {} not found", id),
                StockTarget::Variant(id) => format!("Variant {} not found", id),
            })
        })?;

        let change = compute_change(item.adjustment_type, row.stock_quantity, item.quantity);
        ledger.store(tenant_id, target, change.after).await?;

        let entry = InventoryHistory {
            id: Uuid::new_v4(),
            tenant_id,
            product_id: row.product_id,
            variant_id: row.variant_id,
            adjustment_type: item.adjustment_type,
            quantity_before: change.before,
            quantity_after: change.after,
            quantity_change: change.change,
            reason: item.reason.clone(),
            created_by: actor,
            created_at: Utc::now(),
        };
        ledger.record(&entry).await?;

        if row.variant_id.is_some() {
            touched_parents.insert(row.product_id);
        }

        adjustments.push(AdjustmentOutcome {
            product_id: row.product_id,
            variant_id: row.variant_id,
            adjustment_type: item.adjustment_type,
            quantity_before: change.before,
            quantity_after: change.after,
            quantity_change: change.change,
        });
    }

    let mut synced_products = Vec::with_capacity(touched_parents.len());
    for product_id in touched_parents {
        let parent = StockTarget::Product(product_id);
        let previous_stock = ledger
            .load(tenant_id, parent)
            .await?
            .map_or(0, |row| row.stock_quantity);
        let stocks = ledger.variant_stocks(tenant_id, product_id).await?;
        let stock_quantity = total_stock(stocks).ok_or(InventoryError::StockOverflow(product_id))?;
        ledger.store(tenant_id, parent, stock_quantity).await?;
        synced_products.push(SyncedProduct {
            product_id,
            previous_stock,
            stock_quantity,
        });
    }

    Ok(BatchResult {
        adjustments,
        synced_products,
    })
}

impl BatchResult {
    /// Products that went from above the threshold to at or below it,
    /// counting direct product adjustments and re-synced parents alike
    pub fn low_stock_crossings(&self, threshold: i32) -> usize {
        let direct = self
            .adjustments
            .iter()
            .filter(|a| a.variant_id.is_none())
            .filter(|a| crossed_low_stock(a.quantity_before, a.quantity_after, threshold))
            .count();
        let synced = self
            .synced_products
            .iter()
            .filter(|p| crossed_low_stock(p.previous_stock, p.stock_quantity, threshold))
            .count();
        direct + synced
    }
}
