// handlers/protected/inventory.rs - /api/inventory handlers

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::app::AppState;
use crate::database::models::{InventoryHistory, Product};
use crate::middleware::{ApiResponse, ApiResult, AuthUser, TenantContext};
use crate::services::inventory::{self, AdjustmentRequest, BatchResult};
use crate::services::notifications;

const DEFAULT_HISTORY_LIMIT: i64 = 50;
const MAX_HISTORY_LIMIT: i64 = 200;

#[derive(Debug, Deserialize)]
pub struct AdjustBatch {
    pub items: Vec<AdjustmentRequest>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub product_id: Option<Uuid>,
    pub limit: Option<i64>,
}

/**
 * POST /api/inventory/adjust - apply a batch of stock adjustments
 *
 * Expected Input:
 * ```json
 * {
 *   "items": [
 *     { "product_id": "...", "adjustment_type": "increase", "quantity": 10, "reason": "restock" },
 *     { "variant_id": "...", "adjustment_type": "set", "quantity": 4 }
 *   ]
 * }
 * ```
 *
 * The batch is all or nothing: an unknown product or variant fails the
 * whole request with 404 and no stock moves.
 */
pub async fn adjust(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Extension(TenantContext(tenant)): Extension<TenantContext>,
    Json(batch): Json<AdjustBatch>,
) -> ApiResult<BatchResult> {
    inventory::validate_batch(&batch.items, state.config.inventory.max_bulk_items)?;

    let result = state
        .stores
        .catalog
        .apply_adjustments(tenant.id, &batch.items, Some(auth.id()))
        .await?;
    tracing::info!(
        "Applied {} inventory adjustment(s) for {} by {}",
        result.adjustments.len(),
        tenant.subdomain,
        auth.0.email
    );

    let threshold = state.config.inventory.low_stock_threshold;
    let now_low = result.low_stock_crossings(threshold);
    if now_low > 0 {
        notifications::post(
            &state.stores,
            tenant.id,
            None,
            "inventory",
            "Low stock".to_string(),
            format!("{} product(s) at or below {} units", now_low, threshold),
            Some("/api/inventory/low-stock".to_string()),
        )
        .await;
    }

    Ok(ApiResponse::success(result))
}

/// GET /api/inventory/history?product_id=&limit= - newest first, limit ≤ 200
pub async fn history(
    State(state): State<AppState>,
    Extension(TenantContext(tenant)): Extension<TenantContext>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Vec<InventoryHistory>> {
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT).clamp(1, MAX_HISTORY_LIMIT);
    let rows = state
        .stores
        .catalog
        .list_history(tenant.id, query.product_id, limit)
        .await?;
    Ok(ApiResponse::success(rows))
}

/// GET /api/inventory/low-stock
pub async fn low_stock(
    State(state): State<AppState>,
    Extension(TenantContext(tenant)): Extension<TenantContext>,
) -> ApiResult<Vec<Product>> {
    let products = state
        .stores
        .catalog
        .low_stock(tenant.id, state.config.inventory.low_stock_threshold)
        .await?;
    Ok(ApiResponse::success(products))
}
