// handlers/elevated/tenant/show.rs - GET /api/admin/tenants/:id handler

use axum::extract::{Path, State};
use serde::Serialize;
use uuid::Uuid;

use super::load_tenant;
use crate::app::AppState;
use crate::database::models::{Tenant, User};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::subscription::{self, SubscriptionSummary};

#[derive(Debug, Serialize)]
pub struct TenantDetail {
    pub tenant: Tenant,
    pub subscription: SubscriptionSummary,
    pub users: Vec<User>,
}

pub async fn tenant_show(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<TenantDetail> {
    let tenant = load_tenant(&state, id).await?;
    let (subscription, users) = futures::try_join!(
        subscription::summary(&state.stores, &tenant),
        state.stores.users.list(Some(tenant.id)),
    )?;
    Ok(ApiResponse::success(TenantDetail {
        tenant,
        subscription,
        users,
    }))
}
