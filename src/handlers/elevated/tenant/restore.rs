// handlers/elevated/tenant/restore.rs - POST /api/admin/tenants/:id/restore handler

use axum::extract::{Path, State};
use chrono::Utc;
use uuid::Uuid;

use super::load_tenant;
use crate::app::AppState;
use crate::database::models::{Tenant, TenantUpdate};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::tenant_service::restored_status;
use crate::types::TenantStatus;

/// Brings a deleted tenant back as active, expired or pending depending on
/// its subscription.
pub async fn tenant_restore(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Tenant> {
    let tenant = load_tenant(&state, id).await?;
    if tenant.status != TenantStatus::Deleted {
        return Err(ApiError::conflict(format!("Tenant '{}' is not deleted", tenant.subdomain)));
    }

    let status = restored_status(&tenant, Utc::now());
    let tenant = state
        .stores
        .tenants
        .update(
            id,
            TenantUpdate {
                status: Some(status),
                ..Default::default()
            },
        )
        .await?;
    tracing::info!("Tenant {} restored as {}", tenant.subdomain, status);
    Ok(ApiResponse::success(tenant))
}
