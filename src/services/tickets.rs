//! Support tickets: customers to stores, and tenants to the platform.

use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use super::email::Emails;
use super::notifications;
use crate::database::models::{NewTicket, NewTicketMessage, Tenant, Ticket, TicketMessage, TicketThread};
use crate::database::{DatabaseError, Stores};
use crate::types::{TicketPriority, TicketScope, TicketStatus};

const MAX_SUBJECT: usize = 200;
const MAX_BODY: usize = 10_000;

#[derive(Debug, thiserror::Error)]
pub enum TicketError {
    #[error("Ticket {0} not found")]
    NotFound(Uuid),

    #[error("Ticket is closed")]
    Closed,

    #[error("{field} {problem}")]
    Invalid { field: &'static str, problem: &'static str },

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenTicket {
    pub subject: String,
    pub message: String,
    /// Storefront tickets only; dashboard tickets use the signed-in user
    pub email: Option<String>,
    pub name: Option<String>,
    #[serde(default)]
    pub priority: TicketPriority,
}

/// Who is writing a message
#[derive(Debug, Clone)]
pub struct Author {
    pub id: Option<Uuid>,
    pub name: String,
    pub email: String,
    /// Store staff on store tickets, the landlord on platform tickets
    pub is_staff: bool,
}

fn check_text(field: &'static str, value: &str, max: usize) -> Result<(), TicketError> {
    let len = value.trim().chars().count();
    if len == 0 {
        return Err(TicketError::Invalid { field, problem: "is required" });
    }
    if len > max {
        return Err(TicketError::Invalid { field, problem: "is too long" });
    }
    Ok(())
}

fn check_email(email: &str) -> Result<(), TicketError> {
    let ok = email
        .split_once('@')
        .map_or(false, |(local, domain)| !local.is_empty() && domain.contains('.'));
    if !ok {
        return Err(TicketError::Invalid { field: "email", problem: "is not a valid address" });
    }
    Ok(())
}

/// Storefront customer opens a ticket with the store
pub async fn open_store_ticket(
    stores: &Stores,
    emails: &Emails,
    tenant: &Tenant,
    request: OpenTicket,
) -> Result<TicketThread, TicketError> {
    check_text("subject", &request.subject, MAX_SUBJECT)?;
    check_text("message", &request.message, MAX_BODY)?;
    let email = request.email.unwrap_or_default().trim().to_lowercase();
    check_email(&email)?;
    let name = request
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| email.clone());

    let thread = stores
        .tickets
        .create(
            TicketScope::Store,
            NewTicket {
                tenant_id: tenant.id,
                requester_id: None,
                requester_email: email,
                requester_name: name,
                subject: request.subject.trim().to_string(),
                priority: request.priority,
                message: request.message.clone(),
            },
        )
        .await?;

    info!("Store ticket {} opened for {}", thread.ticket.id, tenant.subdomain);
    notifications::post(
        stores,
        tenant.id,
        None,
        "ticket",
        format!("New ticket: {}", thread.ticket.subject),
        format!("From {}", thread.ticket.requester_name),
        Some(format!("/api/tickets/{}", thread.ticket.id)),
    )
    .await;
    emails
        .ticket_opened(&tenant.contact_email, &tenant.name, &thread.ticket, &request.message)
        .await;

    Ok(thread)
}

/// Tenant user opens a ticket with the platform
pub async fn open_platform_ticket(
    stores: &Stores,
    emails: &Emails,
    platform_address: &str,
    tenant: &Tenant,
    author: &Author,
    request: OpenTicket,
) -> Result<TicketThread, TicketError> {
    check_text("subject", &request.subject, MAX_SUBJECT)?;
    check_text("message", &request.message, MAX_BODY)?;

    let thread = stores
        .tickets
        .create(
            TicketScope::Platform,
            NewTicket {
                tenant_id: tenant.id,
                requester_id: author.id,
                requester_email: author.email.clone(),
                requester_name: author.name.clone(),
                subject: request.subject.trim().to_string(),
                priority: request.priority,
                message: request.message.clone(),
            },
        )
        .await?;

    info!("Platform ticket {} opened by {}", thread.ticket.id, tenant.subdomain);
    emails
        .ticket_opened(platform_address, &tenant.name, &thread.ticket, &request.message)
        .await;
    Ok(thread)
}

/// Loads a ticket, enforcing tenant ownership when `tenant_id` is given
pub async fn load(
    stores: &Stores,
    scope: TicketScope,
    id: Uuid,
    tenant_id: Option<Uuid>,
) -> Result<TicketThread, TicketError> {
    stores
        .tickets
        .get(scope, id)
        .await?
        .filter(|t| tenant_id.map_or(true, |tenant| t.ticket.tenant_id == tenant))
        .ok_or(TicketError::NotFound(id))
}

/// Adds a message. Closed tickets take no replies; a staff reply to an
/// open ticket moves it to in_progress. Staff replies are emailed to the
/// requester, requester replies on platform tickets to `notify_address`.
pub async fn reply(
    stores: &Stores,
    emails: &Emails,
    scope: TicketScope,
    id: Uuid,
    tenant_id: Option<Uuid>,
    author: &Author,
    body: &str,
    sender_name: &str,
    notify_address: Option<&str>,
) -> Result<(Ticket, TicketMessage), TicketError> {
    check_text("message", body, MAX_BODY)?;
    let thread = load(stores, scope, id, tenant_id).await?;
    if thread.ticket.status == TicketStatus::Closed {
        return Err(TicketError::Closed);
    }

    let message = stores
        .tickets
        .add_message(
            scope,
            id,
            NewTicketMessage {
                author_id: author.id,
                author_name: author.name.clone(),
                is_staff: author.is_staff,
                body: body.to_string(),
            },
        )
        .await?;

    let ticket = if author.is_staff && thread.ticket.status == TicketStatus::Open {
        stores
            .tickets
            .update(scope, id, Some(TicketStatus::InProgress), None)
            .await?
    } else {
        thread.ticket
    };

    if author.is_staff {
        emails.ticket_reply(sender_name, &ticket, &author.name, body).await;
    } else if let Some(to) = notify_address {
        emails.ticket_opened(to, sender_name, &ticket, body).await;
    }

    Ok((ticket, message))
}

pub async fn update(
    stores: &Stores,
    scope: TicketScope,
    id: Uuid,
    tenant_id: Option<Uuid>,
    status: Option<TicketStatus>,
    priority: Option<TicketPriority>,
) -> Result<Ticket, TicketError> {
    load(stores, scope, id, tenant_id).await?;
    Ok(stores.tickets.update(scope, id, status, priority).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::NewTenant;
    use crate::services::mailer::OutboxMailer;
    use std::sync::Arc;

    async fn setup() -> (Stores, Emails, Arc<OutboxMailer>, Tenant) {
        let stores = Stores::memory();
        let outbox = Arc::new(OutboxMailer::default());
        let emails = Emails::new(outbox.clone()).unwrap();
        let tenant = stores
            .tenants
            .create(NewTenant {
                name: "Acme".into(),
                subdomain: "acme".into(),
                contact_email: "owner@acme.test".into(),
            })
            .await
            .unwrap();
        (stores, emails, outbox, tenant)
    }

    fn staff() -> Author {
        Author {
            id: Some(Uuid::new_v4()),
            name: "Sam".into(),
            email: "sam@acme.test".into(),
            is_staff: true,
        }
    }

    fn customer_ticket() -> OpenTicket {
        OpenTicket {
            subject: "Where is my parcel?".into(),
            message: "Ordered last week".into(),
            email: Some("Buyer@Example.test".into()),
            name: None,
            priority: TicketPriority::default(),
        }
    }

    #[tokio::test]
    async fn opening_notifies_and_emails_the_store() {
        let (stores, emails, outbox, tenant) = setup().await;
        let thread = open_store_ticket(&stores, &emails, &tenant, customer_ticket()).await.unwrap();

        assert_eq!(thread.ticket.requester_email, "buyer@example.test");
        assert_eq!(thread.messages.len(), 1);
        assert_eq!(outbox.messages()[0].to, "owner@acme.test");
        let notes = stores.notifications.list(tenant.id, Uuid::new_v4(), true).await.unwrap();
        assert_eq!(notes.len(), 1);
    }

    #[tokio::test]
    async fn staff_reply_moves_open_ticket_to_in_progress() {
        let (stores, emails, outbox, tenant) = setup().await;
        let thread = open_store_ticket(&stores, &emails, &tenant, customer_ticket()).await.unwrap();

        let (ticket, _) = reply(
            &stores,
            &emails,
            TicketScope::Store,
            thread.ticket.id,
            Some(tenant.id),
            &staff(),
            "Shipped today",
            &tenant.name,
            None,
        )
        .await
        .unwrap();

        assert_eq!(ticket.status, TicketStatus::InProgress);
        assert_eq!(outbox.messages().last().unwrap().to, "buyer@example.test");
    }

    #[tokio::test]
    async fn closed_tickets_reject_replies() {
        let (stores, emails, _, tenant) = setup().await;
        let thread = open_store_ticket(&stores, &emails, &tenant, customer_ticket()).await.unwrap();
        update(&stores, TicketScope::Store, thread.ticket.id, Some(tenant.id), Some(TicketStatus::Closed), None)
            .await
            .unwrap();

        let err = reply(
            &stores,
            &emails,
            TicketScope::Store,
            thread.ticket.id,
            Some(tenant.id),
            &staff(),
            "hello?",
            &tenant.name,
            None,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, TicketError::Closed));
    }

    #[tokio::test]
    async fn other_tenants_cannot_see_ticket() {
        let (stores, emails, _, tenant) = setup().await;
        let thread = open_store_ticket(&stores, &emails, &tenant, customer_ticket()).await.unwrap();
        let err = load(&stores, TicketScope::Store, thread.ticket.id, Some(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert!(matches!(err, TicketError::NotFound(_)));
    }

    #[tokio::test]
    async fn storefront_ticket_needs_valid_email() {
        let (stores, emails, _, tenant) = setup().await;
        let mut request = customer_ticket();
        request.email = Some("nope".into());
        let err = open_store_ticket(&stores, &emails, &tenant, request).await.unwrap_err();
        assert!(matches!(err, TicketError::Invalid { field: "email", .. }));
    }
}
