use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{TicketPriority, TicketScope, TicketStatus};

/// A support ticket. Store tickets are opened by storefront customers,
/// platform tickets by tenant users towards the landlord.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: Uuid,
    pub scope: TicketScope,
    pub tenant_id: Uuid,
    pub requester_id: Option<Uuid>,
    pub requester_email: String,
    pub requester_name: String,
    pub subject: String,
    pub status: TicketStatus,
    pub priority: TicketPriority,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketMessage {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub author_id: Option<Uuid>,
    pub author_name: String,
    /// Written by the side handling the ticket (store staff or landlord)
    pub is_staff: bool,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TicketThread {
    #[serde(flatten)]
    pub ticket: Ticket,
    pub messages: Vec<TicketMessage>,
}

#[derive(Debug, Clone)]
pub struct NewTicket {
    pub tenant_id: Uuid,
    pub requester_id: Option<Uuid>,
    pub requester_email: String,
    pub requester_name: String,
    pub subject: String,
    pub priority: TicketPriority,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct NewTicketMessage {
    pub author_id: Option<Uuid>,
    pub author_name: String,
    pub is_staff: bool,
    pub body: String,
}
