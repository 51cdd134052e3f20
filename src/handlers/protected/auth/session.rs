// handlers/protected/auth/session.rs - /api/auth/* handlers
//
// Available to every signed-in account, landlords included.

use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::database::models::{Tenant, User};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::accounts;

#[derive(Debug, Serialize)]
pub struct Whoami {
    pub user: User,
    pub tenant: Option<Tenant>,
}

#[derive(Debug, Deserialize)]
pub struct ChangePassword {
    pub current_password: String,
    pub new_password: String,
}

/// GET /api/auth/whoami - current user and, for store users, their tenant
pub async fn whoami(State(state): State<AppState>, Extension(AuthUser(user)): Extension<AuthUser>) -> ApiResult<Whoami> {
    let tenant = match user.tenant_id {
        Some(id) => state.stores.tenants.get(id).await?,
        None => None,
    };
    Ok(ApiResponse::success(Whoami { user, tenant }))
}

/// PUT /api/auth/password - change own password
pub async fn change_password(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Json(request): Json<ChangePassword>,
) -> ApiResult<()> {
    accounts::change_password(&state.stores, &user, &request.current_password, &request.new_password).await?;
    tracing::info!("User {} changed their password", user.email);
    Ok(ApiResponse::no_content())
}
