// handlers/protected/subscription.rs - GET /api/subscription handler

use axum::{extract::State, Extension};

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult, TenantContext};
use crate::services::subscription::{self, SubscriptionSummary};

/// Plan, status, expiry and days remaining for the caller's store
pub async fn show(
    State(state): State<AppState>,
    Extension(TenantContext(tenant)): Extension<TenantContext>,
) -> ApiResult<SubscriptionSummary> {
    Ok(ApiResponse::success(subscription::summary(&state.stores, &tenant).await?))
}
