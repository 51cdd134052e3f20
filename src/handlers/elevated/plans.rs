// handlers/elevated/plans.rs - /api/admin/plans handlers

use axum::{
    extract::{Path, State},
    Json,
};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::app::AppState;
use crate::database::models::{NewPlan, PlanUpdate, PricePlan};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::types::PlanStatus;

fn check_terms(price: Option<Decimal>, duration_months: Option<i32>, trial_days: Option<i32>) -> Result<(), ApiError> {
    if price.map_or(false, |p| p.is_sign_negative()) {
        return Err(ApiError::field("price", "must not be negative"));
    }
    if duration_months.map_or(false, |m| m < 1) {
        return Err(ApiError::field("duration_months", "must be at least 1"));
    }
    if trial_days.map_or(false, |d| d < 0) {
        return Err(ApiError::field("trial_days", "must not be negative"));
    }
    Ok(())
}

/// GET /api/admin/plans - every plan, inactive included
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<PricePlan>> {
    Ok(ApiResponse::success(state.stores.plans.list(false).await?))
}

pub async fn create(State(state): State<AppState>, Json(mut new): Json<NewPlan>) -> ApiResult<PricePlan> {
    new.name = new.name.trim().to_string();
    if new.name.is_empty() {
        return Err(ApiError::field("name", "is required"));
    }
    check_terms(Some(new.price), Some(new.duration_months), Some(new.trial_days))?;

    let plan = state.stores.plans.create(new).await?;
    tracing::info!("Plan {} created ({} / {} months)", plan.name, plan.price, plan.duration_months);
    Ok(ApiResponse::created(plan))
}

pub async fn show(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<PricePlan> {
    let plan = state
        .stores
        .plans
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Plan {} not found", id)))?;
    Ok(ApiResponse::success(plan))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(update): Json<PlanUpdate>,
) -> ApiResult<PricePlan> {
    if update.name.as_deref().map_or(false, |n| n.trim().is_empty()) {
        return Err(ApiError::field("name", "must not be empty"));
    }
    check_terms(update.price, update.duration_months, update.trial_days)?;
    Ok(ApiResponse::success(state.stores.plans.update(id, update).await?))
}

/// DELETE /api/admin/plans/:id - deactivates; subscribed tenants keep
/// their current term
pub async fn deactivate(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<PricePlan> {
    let update = PlanUpdate {
        status: Some(PlanStatus::Inactive),
        ..Default::default()
    };
    let plan = state.stores.plans.update(id, update).await?;
    tracing::info!("Plan {} deactivated", plan.name);
    Ok(ApiResponse::success(plan))
}
