// handlers/protected/notifications.rs - /api/notifications handlers

use axum::{
    extract::{Path, Query, State},
    Extension,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app::AppState;
use crate::database::models::Notification;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, TenantContext};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub unread: bool,
}

#[derive(Debug, Serialize)]
pub struct MarkedRead {
    pub updated: u64,
}

/// GET /api/notifications?unread=true
pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Extension(TenantContext(tenant)): Extension<TenantContext>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Vec<Notification>> {
    let rows = state
        .stores
        .notifications
        .list(tenant.id, auth.id(), query.unread)
        .await?;
    Ok(ApiResponse::success(rows))
}

/// POST /api/notifications/:id/read
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Extension(TenantContext(tenant)): Extension<TenantContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<()> {
    let found = state
        .stores
        .notifications
        .mark_read(tenant.id, auth.id(), id)
        .await?;
    if !found {
        return Err(ApiError::not_found(format!("Notification {} not found", id)));
    }
    Ok(ApiResponse::no_content())
}

/// POST /api/notifications/read-all
pub async fn mark_all_read(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Extension(TenantContext(tenant)): Extension<TenantContext>,
) -> ApiResult<MarkedRead> {
    let updated = state
        .stores
        .notifications
        .mark_all_read(tenant.id, auth.id())
        .await?;
    Ok(ApiResponse::success(MarkedRead { updated }))
}
