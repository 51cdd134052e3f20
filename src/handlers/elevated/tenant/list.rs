// handlers/elevated/tenant/list.rs - GET /api/admin/tenants handler

use axum::extract::{Query, State};
use serde::Deserialize;

use crate::app::AppState;
use crate::database::models::Tenant;
use crate::middleware::{ApiResponse, ApiResult};
use crate::types::TenantStatus;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<TenantStatus>,
}

pub async fn tenant_list(State(state): State<AppState>, Query(query): Query<ListQuery>) -> ApiResult<Vec<Tenant>> {
    Ok(ApiResponse::success(state.stores.tenants.list(query.status).await?))
}
