// handlers/protected/orders.rs - /api/orders handlers

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::app::AppState;
use crate::database::models::{Order, OrderWithItems};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, TenantContext};
use crate::services::orders;
use crate::types::OrderStatus;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<OrderStatus>,
}

#[derive(Debug, Deserialize)]
pub struct StatusChange {
    pub status: OrderStatus,
}

/// GET /api/orders?status=
pub async fn list(
    State(state): State<AppState>,
    Extension(TenantContext(tenant)): Extension<TenantContext>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Vec<Order>> {
    Ok(ApiResponse::success(state.stores.orders.list(tenant.id, query.status).await?))
}

/// GET /api/orders/:id - with line items
pub async fn show(
    State(state): State<AppState>,
    Extension(TenantContext(tenant)): Extension<TenantContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<OrderWithItems> {
    let order = state
        .stores
        .orders
        .get(tenant.id, id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Order {} not found", id)))?;
    Ok(ApiResponse::success(order))
}

/// PUT /api/orders/:id/status - invalid transitions are 400
pub async fn update_status(
    State(state): State<AppState>,
    Extension(TenantContext(tenant)): Extension<TenantContext>,
    Path(id): Path<Uuid>,
    Json(change): Json<StatusChange>,
) -> ApiResult<Order> {
    let order = orders::update_status(&state.stores, &state.emails, &tenant, id, change.status).await?;
    Ok(ApiResponse::success(order))
}
