// handlers/elevated/tenant/subscription.rs - POST /api/admin/tenants/:id/subscription handler

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::subscription::{self, Activation};

#[derive(Debug, Deserialize)]
pub struct Subscribe {
    pub plan_id: Uuid,
}

/// Starts a trial, a new term or a renewal on the given plan
pub async fn tenant_subscribe(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<Subscribe>,
) -> ApiResult<Activation> {
    let activation = subscription::activate(&state.stores, &state.emails, id, request.plan_id).await?;
    Ok(ApiResponse::success(activation))
}
