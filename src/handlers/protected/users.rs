// handlers/protected/users.rs - /api/users handlers (store admins only)

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::app::AppState;
use crate::database::models::{User, UserUpdate};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, TenantContext};
use crate::services::accounts::{self, CreateUser};
use crate::types::Role;

#[derive(Debug, Deserialize)]
pub struct TeamMemberUpdate {
    pub name: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

fn check_role(role: Role) -> Result<(), ApiError> {
    if !role.is_tenant_role() {
        return Err(ApiError::field("role", "must be tenant_admin or tenant_staff"));
    }
    Ok(())
}

async fn team_member(state: &AppState, tenant_id: Uuid, id: Uuid) -> Result<User, ApiError> {
    state
        .stores
        .users
        .get(id)
        .await?
        .filter(|u| u.tenant_id == Some(tenant_id))
        .ok_or_else(|| ApiError::not_found(format!("User {} not found", id)))
}

pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Extension(TenantContext(tenant)): Extension<TenantContext>,
) -> ApiResult<Vec<User>> {
    auth.require_tenant_admin()?;
    Ok(ApiResponse::success(state.stores.users.list(Some(tenant.id)).await?))
}

/// POST /api/users - { email, name, password, role }
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Extension(TenantContext(tenant)): Extension<TenantContext>,
    Json(request): Json<CreateUser>,
) -> ApiResult<User> {
    auth.require_tenant_admin()?;
    check_role(request.role)?;
    if request.name.trim().is_empty() {
        return Err(ApiError::field("name", "is required"));
    }

    let user = accounts::create_user(&state.stores, Some(tenant.id), request).await?;
    tracing::info!("User {} added to {} as {}", user.email, tenant.subdomain, user.role);
    Ok(ApiResponse::created(user))
}

/// PUT /api/users/:id - name, role, is_active
pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Extension(TenantContext(tenant)): Extension<TenantContext>,
    Path(id): Path<Uuid>,
    Json(change): Json<TeamMemberUpdate>,
) -> ApiResult<User> {
    auth.require_tenant_admin()?;
    team_member(&state, tenant.id, id).await?;

    if let Some(role) = change.role {
        check_role(role)?;
    }
    if id == auth.id() && (change.is_active == Some(false) || change.role == Some(Role::TenantStaff)) {
        return Err(ApiError::bad_request("You cannot demote or deactivate yourself"));
    }
    let name = change.name.map(|n| n.trim().to_string());
    if name.as_deref() == Some("") {
        return Err(ApiError::field("name", "must not be empty"));
    }

    let user = state
        .stores
        .users
        .update(
            id,
            UserUpdate {
                name,
                role: change.role,
                is_active: change.is_active,
                password_hash: None,
            },
        )
        .await?;
    Ok(ApiResponse::success(user))
}

/// DELETE /api/users/:id - deactivates; the row stays for audit history
pub async fn deactivate(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Extension(TenantContext(tenant)): Extension<TenantContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<User> {
    auth.require_tenant_admin()?;
    if id == auth.id() {
        return Err(ApiError::bad_request("You cannot deactivate yourself"));
    }
    team_member(&state, tenant.id, id).await?;

    let user = state
        .stores
        .users
        .update(
            id,
            UserUpdate {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await?;
    tracing::info!("User {} deactivated in {}", user.email, tenant.subdomain);
    Ok(ApiResponse::success(user))
}
