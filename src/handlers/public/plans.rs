// handlers/public/plans.rs - GET /plans handler

use axum::extract::State;

use crate::app::AppState;
use crate::database::models::PricePlan;
use crate::middleware::{ApiResponse, ApiResult};

/// GET /plans - active plans, cheapest first
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<PricePlan>> {
    let mut plans = state.stores.plans.list(true).await?;
    plans.sort_by(|a, b| a.price.cmp(&b.price).then_with(|| a.name.cmp(&b.name)));
    Ok(ApiResponse::success(plans))
}
