// handlers/elevated/tenant/create.rs - POST /api/admin/tenants handler

use axum::{extract::State, Json};

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::tenant_service::{self, CreateTenantRequest, ProvisionedTenant};

/**
 * POST /api/admin/tenants - Provision a new store
 *
 * Creates the tenant and its first tenant_admin account, optionally starts
 * a subscription, then sends the welcome email.
 *
 * Expected Input:
 * ```json
 * {
 *   "name": "Acme Goods",              // Required
 *   "subdomain": "acme",               // Required: 3-63 chars, a-z 0-9 and inner hyphens
 *   "contact_email": "owner@acme.io",  // Required
 *   "admin_email": "admin@acme.io",    // Optional: defaults to contact_email
 *   "admin_name": "Ada",               // Optional
 *   "admin_password": "...",           // Required: at least 8 characters
 *   "plan_id": "uuid"                  // Optional: activates the plan right away
 * }
 * ```
 *
 * Without a plan the tenant stays `pending` and its storefront is offline.
 */
pub async fn tenant_create(
    State(state): State<AppState>,
    Json(request): Json<CreateTenantRequest>,
) -> ApiResult<ProvisionedTenant> {
    let provisioned =
        tenant_service::provision(&state.stores, &state.emails, &state.config.server.root_domain, request).await?;
    Ok(ApiResponse::created(provisioned))
}
