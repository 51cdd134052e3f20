// handlers/elevated/users.rs - /api/admin/users handlers

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::app::AppState;
use crate::database::models::{User, UserUpdate};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::types::Role;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub tenant_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct AccountChange {
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

/// GET /api/admin/users?tenant_id=
pub async fn list(State(state): State<AppState>, Query(query): Query<ListQuery>) -> ApiResult<Vec<User>> {
    Ok(ApiResponse::success(state.stores.users.list(query.tenant_id).await?))
}

/// PUT /api/admin/users/:id - toggle activity or move between store roles
pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(change): Json<AccountChange>,
) -> ApiResult<User> {
    if id == auth.id() {
        return Err(ApiError::bad_request("Landlords cannot change their own account here"));
    }
    let target = state
        .stores
        .users
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("User {} not found", id)))?;

    if let Some(role) = change.role {
        // Store users stay store users; landlords are created by the CLI
        if target.tenant_id.is_none() || !role.is_tenant_role() {
            return Err(ApiError::field("role", "only store accounts can switch between store roles"));
        }
    }

    let user = state
        .stores
        .users
        .update(
            id,
            UserUpdate {
                role: change.role,
                is_active: change.is_active,
                ..Default::default()
            },
        )
        .await?;
    tracing::info!("Landlord {} updated account {}", auth.0.email, user.email);
    Ok(ApiResponse::success(user))
}
