// handlers/protected/tickets.rs - /api/tickets handlers
//
// Customer tickets addressed to the caller's store. Store users act as
// staff on these.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::app::AppState;
use crate::database::models::{Ticket, TicketMessage, TicketThread};
use crate::middleware::{ApiResponse, ApiResult, AuthUser, TenantContext};
use crate::services::tickets::{self, Author};
use crate::types::{TicketPriority, TicketScope, TicketStatus};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<TicketStatus>,
}

#[derive(Debug, Deserialize)]
pub struct TicketChange {
    pub status: Option<TicketStatus>,
    pub priority: Option<TicketPriority>,
}

#[derive(Debug, Deserialize)]
pub struct Reply {
    pub message: String,
}

pub async fn list(
    State(state): State<AppState>,
    Extension(TenantContext(tenant)): Extension<TenantContext>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Vec<Ticket>> {
    let tickets = state
        .stores
        .tickets
        .list(TicketScope::Store, Some(tenant.id), query.status)
        .await?;
    Ok(ApiResponse::success(tickets))
}

pub async fn show(
    State(state): State<AppState>,
    Extension(TenantContext(tenant)): Extension<TenantContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<TicketThread> {
    let thread = tickets::load(&state.stores, TicketScope::Store, id, Some(tenant.id)).await?;
    Ok(ApiResponse::success(thread))
}

/// PUT /api/tickets/:id - status and/or priority
pub async fn update(
    State(state): State<AppState>,
    Extension(TenantContext(tenant)): Extension<TenantContext>,
    Path(id): Path<Uuid>,
    Json(change): Json<TicketChange>,
) -> ApiResult<Ticket> {
    let ticket = tickets::update(
        &state.stores,
        TicketScope::Store,
        id,
        Some(tenant.id),
        change.status,
        change.priority,
    )
    .await?;
    Ok(ApiResponse::success(ticket))
}

/// POST /api/tickets/:id/messages - staff reply, emailed to the customer
pub async fn reply(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Extension(TenantContext(tenant)): Extension<TenantContext>,
    Path(id): Path<Uuid>,
    Json(reply): Json<Reply>,
) -> ApiResult<TicketMessage> {
    let author = Author {
        id: Some(user.id),
        name: user.name,
        email: user.email,
        is_staff: true,
    };
    let (_, message) = tickets::reply(
        &state.stores,
        &state.emails,
        TicketScope::Store,
        id,
        Some(tenant.id),
        &author,
        &reply.message,
        &tenant.name,
        None,
    )
    .await?;
    Ok(ApiResponse::created(message))
}
