use async_trait::async_trait;
use sqlx::{postgres::PgRow, Row};
use uuid::Uuid;

use super::{text_column, PgStore};
use crate::database::manager::DatabaseError;
use crate::database::models::{NewTicket, NewTicketMessage, Ticket, TicketMessage, TicketThread};
use crate::database::store::TicketStore;
use crate::types::{TicketPriority, TicketScope, TicketStatus};

const TICKET_COLUMNS: &str = "id, tenant_id, requester_id, requester_email, requester_name, subject, \
                              status, priority, created_at, updated_at";
const MESSAGE_COLUMNS: &str = "id, ticket_id, author_id, author_name, is_staff, body, created_at";

/// (tickets table, messages table) for a scope
fn tables(scope: TicketScope) -> (&'static str, &'static str) {
    match scope {
        TicketScope::Store => ("support_tickets", "support_ticket_messages"),
        TicketScope::Platform => ("landlord_support_tickets", "landlord_support_ticket_messages"),
    }
}

fn ticket_from_row(scope: TicketScope, row: &PgRow) -> Result<Ticket, DatabaseError> {
    Ok(Ticket {
        id: row.try_get("id")?,
        scope,
        tenant_id: row.try_get("tenant_id")?,
        requester_id: row.try_get("requester_id")?,
        requester_email: row.try_get("requester_email")?,
        requester_name: row.try_get("requester_name")?,
        subject: row.try_get("subject")?,
        status: text_column(row, "status")?,
        priority: text_column(row, "priority")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn message_from_row(row: &PgRow) -> Result<TicketMessage, DatabaseError> {
    Ok(TicketMessage {
        id: row.try_get("id")?,
        ticket_id: row.try_get("ticket_id")?,
        author_id: row.try_get("author_id")?,
        author_name: row.try_get("author_name")?,
        is_staff: row.try_get("is_staff")?,
        body: row.try_get("body")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl TicketStore for PgStore {
    async fn create(&self, scope: TicketScope, new: NewTicket) -> Result<TicketThread, DatabaseError> {
        let (ticket_table, message_table) = tables(scope);
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "INSERT INTO {} (id, tenant_id, requester_id, requester_email, requester_name, subject, status, priority) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {}",
            ticket_table, TICKET_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(Uuid::new_v4())
            .bind(new.tenant_id)
            .bind(new.requester_id)
            .bind(&new.requester_email)
            .bind(&new.requester_name)
            .bind(&new.subject)
            .bind(TicketStatus::Open.as_str())
            .bind(new.priority.as_str())
            .fetch_one(&mut *tx)
            .await?;
        let ticket = ticket_from_row(scope, &row)?;

        let sql = format!(
            "INSERT INTO {} (id, ticket_id, author_id, author_name, is_staff, body) \
             VALUES ($1, $2, $3, $4, false, $5) RETURNING {}",
            message_table, MESSAGE_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(Uuid::new_v4())
            .bind(ticket.id)
            .bind(new.requester_id)
            .bind(&new.requester_name)
            .bind(&new.message)
            .fetch_one(&mut *tx)
            .await?;
        let message = message_from_row(&row)?;

        tx.commit().await?;
        Ok(TicketThread {
            ticket,
            messages: vec![message],
        })
    }

    async fn get(&self, scope: TicketScope, id: Uuid) -> Result<Option<TicketThread>, DatabaseError> {
        let (ticket_table, message_table) = tables(scope);

        let sql = format!("SELECT {} FROM {} WHERE id = $1", TICKET_COLUMNS, ticket_table);
        let Some(row) = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await? else {
            return Ok(None);
        };
        let ticket = ticket_from_row(scope, &row)?;

        let sql = format!(
            "SELECT {} FROM {} WHERE ticket_id = $1 ORDER BY created_at ASC",
            MESSAGE_COLUMNS, message_table
        );
        let rows = sqlx::query(&sql).bind(id).fetch_all(&self.pool).await?;
        let messages = rows.iter().map(message_from_row).collect::<Result<Vec<_>, _>>()?;

        Ok(Some(TicketThread { ticket, messages }))
    }

    async fn list(
        &self,
        scope: TicketScope,
        tenant_id: Option<Uuid>,
        status: Option<TicketStatus>,
    ) -> Result<Vec<Ticket>, DatabaseError> {
        let (ticket_table, _) = tables(scope);
        let sql = format!(
            "SELECT {} FROM {} WHERE ($1::uuid IS NULL OR tenant_id = $1) AND ($2::text IS NULL OR status = $2) \
             ORDER BY updated_at DESC",
            TICKET_COLUMNS, ticket_table
        );
        let rows = sqlx::query(&sql)
            .bind(tenant_id)
            .bind(status.map(|s| s.as_str()))
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(|row| ticket_from_row(scope, row)).collect()
    }

    async fn add_message(
        &self,
        scope: TicketScope,
        ticket_id: Uuid,
        message: NewTicketMessage,
    ) -> Result<TicketMessage, DatabaseError> {
        let (ticket_table, message_table) = tables(scope);
        let mut tx = self.pool.begin().await?;

        let touched = sqlx::query(&format!("UPDATE {} SET updated_at = now() WHERE id = $1", ticket_table))
            .bind(ticket_id)
            .execute(&mut *tx)
            .await?;
        if touched.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Ticket {} not found", ticket_id)));
        }

        let sql = format!(
            "INSERT INTO {} (id, ticket_id, author_id, author_name, is_staff, body) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            message_table, MESSAGE_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(Uuid::new_v4())
            .bind(ticket_id)
            .bind(message.author_id)
            .bind(&message.author_name)
            .bind(message.is_staff)
            .bind(&message.body)
            .fetch_one(&mut *tx)
            .await?;
        let message = message_from_row(&row)?;

        tx.commit().await?;
        Ok(message)
    }

    async fn update(
        &self,
        scope: TicketScope,
        id: Uuid,
        status: Option<TicketStatus>,
        priority: Option<TicketPriority>,
    ) -> Result<Ticket, DatabaseError> {
        let (ticket_table, _) = tables(scope);
        let sql = format!(
            "UPDATE {} SET status = COALESCE($2, status), priority = COALESCE($3, priority), updated_at = now() \
             WHERE id = $1 RETURNING {}",
            ticket_table, TICKET_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(status.map(|s| s.as_str()))
            .bind(priority.map(|p| p.as_str()))
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Ticket {} not found", id)))?;
        ticket_from_row(scope, &row)
    }
}
