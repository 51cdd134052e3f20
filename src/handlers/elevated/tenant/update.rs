// handlers/elevated/tenant/update.rs - PUT /api/admin/tenants/:id handler

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use super::load_tenant;
use crate::app::AppState;
use crate::database::models::{Tenant, TenantUpdate};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::accounts::normalize_email;
use crate::types::TenantStatus;

#[derive(Debug, Deserialize)]
pub struct UpdateTenant {
    pub name: Option<String>,
    pub contact_email: Option<String>,
    pub status: Option<TenantStatus>,
}

/// Name, contact email and status. Deletion and restore have their own
/// endpoints.
pub async fn tenant_update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateTenant>,
) -> ApiResult<Tenant> {
    let current = load_tenant(&state, id).await?;
    if current.status == TenantStatus::Deleted {
        return Err(ApiError::conflict("Restore the tenant before editing it"));
    }
    if request.status == Some(TenantStatus::Deleted) {
        return Err(ApiError::field("status", "use DELETE to remove a tenant"));
    }

    let name = request.name.map(|n| n.trim().to_string());
    if name.as_deref() == Some("") {
        return Err(ApiError::field("name", "must not be empty"));
    }
    let contact_email = request.contact_email.as_deref().map(normalize_email).transpose()?;

    let tenant = state
        .stores
        .tenants
        .update(
            id,
            TenantUpdate {
                name,
                contact_email,
                status: request.status,
                ..Default::default()
            },
        )
        .await?;
    tracing::info!("Tenant {} updated (status {})", tenant.subdomain, tenant.status);
    Ok(ApiResponse::success(tenant))
}
