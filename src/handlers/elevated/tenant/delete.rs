// handlers/elevated/tenant/delete.rs - DELETE /api/admin/tenants/:id handler

use axum::extract::{Path, State};
use uuid::Uuid;

use super::load_tenant;
use crate::app::AppState;
use crate::database::models::{Tenant, TenantUpdate};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::types::TenantStatus;

/// Soft delete: the row and its data stay, the storefront and dashboard go
/// offline.
pub async fn tenant_delete(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Tenant> {
    let tenant = load_tenant(&state, id).await?;
    if tenant.status == TenantStatus::Deleted {
        return Err(ApiError::conflict(format!("Tenant '{}' is already deleted", tenant.subdomain)));
    }

    let tenant = state
        .stores
        .tenants
        .update(
            id,
            TenantUpdate {
                status: Some(TenantStatus::Deleted),
                ..Default::default()
            },
        )
        .await?;
    tracing::warn!("Tenant {} soft-deleted", tenant.subdomain);
    Ok(ApiResponse::success(tenant))
}
