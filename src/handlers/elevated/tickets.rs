// handlers/elevated/tickets.rs - /api/admin/tickets handlers
//
// Platform tickets across every tenant. The landlord answers as staff.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::app::AppState;
use crate::database::models::{Ticket, TicketMessage, TicketThread};
use crate::handlers::protected::tickets::{Reply, TicketChange};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::tickets::{self, Author};
use crate::types::{TicketScope, TicketStatus};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<TicketStatus>,
    pub tenant_id: Option<Uuid>,
}

pub async fn list(State(state): State<AppState>, Query(query): Query<ListQuery>) -> ApiResult<Vec<Ticket>> {
    let tickets = state
        .stores
        .tickets
        .list(TicketScope::Platform, query.tenant_id, query.status)
        .await?;
    Ok(ApiResponse::success(tickets))
}

pub async fn show(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<TicketThread> {
    Ok(ApiResponse::success(
        tickets::load(&state.stores, TicketScope::Platform, id, None).await?,
    ))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(change): Json<TicketChange>,
) -> ApiResult<Ticket> {
    let ticket = tickets::update(&state.stores, TicketScope::Platform, id, None, change.status, change.priority).await?;
    Ok(ApiResponse::success(ticket))
}

/// POST /api/admin/tickets/:id/messages - emailed to the requester
pub async fn reply(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
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
        TicketScope::Platform,
        id,
        None,
        &author,
        &reply.message,
        &state.config.email.from_name,
        None,
    )
    .await?;
    Ok(ApiResponse::created(message))
}
