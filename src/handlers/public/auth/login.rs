// handlers/public/auth/login.rs - POST /auth/login handler

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::accounts::{self, Session};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/**
 * POST /auth/login - Authenticate by email and password
 *
 * Works for landlords and store users alike; the token's claims carry the
 * role and tenant. Unknown email and wrong password both answer 401 with
 * the same message.
 *
 * Expected Input:
 * ```json
 * { "email": "owner@acme.test", "password": "..." }
 * ```
 *
 * Expected Output:
 * ```json
 * {
 *   "success": true,
 *   "data": { "token": "eyJ...", "expires_in_hours": 24, "user": { ... } }
 * }
 * ```
 */
pub async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> ApiResult<Session> {
    let session = accounts::login(&state.stores, &state.config.security, &request.email, &request.password).await?;
    Ok(ApiResponse::success(session))
}
