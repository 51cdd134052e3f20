// handlers/protected/dashboard.rs - GET /api/dashboard handler

use axum::{extract::State, Extension};

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, TenantContext};
use crate::services::dashboard::{self, Dashboard};

pub async fn show(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Extension(TenantContext(tenant)): Extension<TenantContext>,
) -> ApiResult<Dashboard> {
    let dashboard = dashboard::build(
        &state.stores,
        &tenant,
        auth.id(),
        state.config.inventory.low_stock_threshold,
    )
    .await?;
    Ok(ApiResponse::success(dashboard))
}
