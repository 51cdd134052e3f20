use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use super::auth::AuthUser;
use crate::app::AppState;
use crate::database::models::Tenant;
use crate::error::ApiError;
use crate::types::TenantStatus;

/// Tenant of the signed-in store user, injected by [`validate_tenant_middleware`]
#[derive(Clone, Debug)]
pub struct TenantContext(pub Tenant);

/// Protected tier gate. Requires a tenant role and a tenant that is not
/// deleted or suspended. Expired and pending tenants keep dashboard access
/// so they can see their subscription.
pub async fn validate_tenant_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or_else(|| ApiError::unauthorized("JWT authentication required before tenant validation"))?;

    if !auth_user.role().is_tenant_role() {
        return Err(ApiError::forbidden("Store account required"));
    }
    let tenant_id = auth_user.tenant_id()?;

    let tenant = state
        .stores
        .tenants
        .get(tenant_id)
        .await?
        .ok_or_else(|| ApiError::forbidden("Tenant does not exist"))?;

    match tenant.status {
        TenantStatus::Deleted => {
            tracing::warn!("Blocked request for deleted tenant {}", tenant.subdomain);
            return Err(ApiError::forbidden(format!("Tenant '{}' has been deleted", tenant.subdomain)));
        }
        TenantStatus::Suspended => {
            return Err(ApiError::forbidden(format!("Tenant '{}' is suspended", tenant.subdomain)));
        }
        _ => {}
    }

    request.extensions_mut().insert(TenantContext(tenant));
    Ok(next.run(request).await)
}
