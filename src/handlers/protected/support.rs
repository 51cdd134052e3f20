// handlers/protected/support.rs - /api/support handlers
//
// Tickets from the caller's store to the platform operator.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use uuid::Uuid;

use super::tickets::{ListQuery, Reply};
use crate::app::AppState;
use crate::database::models::{Ticket, TicketMessage, TicketThread, User};
use crate::middleware::{ApiResponse, ApiResult, AuthUser, TenantContext};
use crate::services::tickets::{self, Author, OpenTicket};
use crate::types::TicketScope;

fn requester(user: User) -> Author {
    Author {
        id: Some(user.id),
        name: user.name,
        email: user.email,
        is_staff: false,
    }
}

pub async fn list(
    State(state): State<AppState>,
    Extension(TenantContext(tenant)): Extension<TenantContext>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Vec<Ticket>> {
    let tickets = state
        .stores
        .tickets
        .list(TicketScope::Platform, Some(tenant.id), query.status)
        .await?;
    Ok(ApiResponse::success(tickets))
}

/// POST /api/support - open a ticket; the platform address is emailed
pub async fn open(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Extension(TenantContext(tenant)): Extension<TenantContext>,
    Json(request): Json<OpenTicket>,
) -> ApiResult<TicketThread> {
    let thread = tickets::open_platform_ticket(
        &state.stores,
        &state.emails,
        &state.config.email.platform_address,
        &tenant,
        &requester(user),
        request,
    )
    .await?;
    Ok(ApiResponse::created(thread))
}

pub async fn show(
    State(state): State<AppState>,
    Extension(TenantContext(tenant)): Extension<TenantContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<TicketThread> {
    let thread = tickets::load(&state.stores, TicketScope::Platform, id, Some(tenant.id)).await?;
    Ok(ApiResponse::success(thread))
}

pub async fn reply(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Extension(TenantContext(tenant)): Extension<TenantContext>,
    Path(id): Path<Uuid>,
    Json(reply): Json<Reply>,
) -> ApiResult<TicketMessage> {
    let (_, message) = tickets::reply(
        &state.stores,
        &state.emails,
        TicketScope::Platform,
        id,
        Some(tenant.id),
        &requester(user),
        &reply.message,
        &tenant.name,
        Some(&state.config.email.platform_address),
    )
    .await?;
    Ok(ApiResponse::created(message))
}
