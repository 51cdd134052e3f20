use async_trait::async_trait;
use sqlx::{postgres::PgRow, Row};
use uuid::Uuid;

use super::PgStore;
use crate::database::manager::DatabaseError;
use crate::database::models::{NewNotification, Notification};
use crate::database::store::NotificationStore;

const COLUMNS: &str = "id, tenant_id, user_id, kind, title, message, link, read_at, created_at";

fn notification_from_row(row: &PgRow) -> Result<Notification, DatabaseError> {
    Ok(Notification {
        id: row.try_get("id")?,
        tenant_id: row.try_get("tenant_id")?,
        user_id: row.try_get("user_id")?,
        kind: row.try_get("kind")?,
        title: row.try_get("title")?,
        message: row.try_get("message")?,
        link: row.try_get("link")?,
        read_at: row.try_get("read_at")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl NotificationStore for PgStore {
    async fn create(&self, new: NewNotification) -> Result<Notification, DatabaseError> {
        let sql = format!(
            "INSERT INTO notifications (id, tenant_id, user_id, kind, title, message, link) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
            COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(Uuid::new_v4())
            .bind(new.tenant_id)
            .bind(new.user_id)
            .bind(&new.kind)
            .bind(&new.title)
            .bind(&new.message)
            .bind(&new.link)
            .fetch_one(&self.pool)
            .await?;
        notification_from_row(&row)
    }

    async fn list(&self, tenant_id: Uuid, user_id: Uuid, unread_only: bool) -> Result<Vec<Notification>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM notifications \
             WHERE tenant_id = $1 AND (user_id IS NULL OR user_id = $2) AND (NOT $3 OR read_at IS NULL) \
             ORDER BY created_at DESC LIMIT 200",
            COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(tenant_id)
            .bind(user_id)
            .bind(unread_only)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(notification_from_row).collect()
    }

    async fn mark_read(&self, tenant_id: Uuid, user_id: Uuid, id: Uuid) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "UPDATE notifications SET read_at = COALESCE(read_at, now()) \
             WHERE id = $1 AND tenant_id = $2 AND (user_id IS NULL OR user_id = $3)",
        )
        .bind(id)
        .bind(tenant_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn mark_all_read(&self, tenant_id: Uuid, user_id: Uuid) -> Result<u64, DatabaseError> {
        let result = sqlx::query(
            "UPDATE notifications SET read_at = now() \
             WHERE tenant_id = $1 AND (user_id IS NULL OR user_id = $2) AND read_at IS NULL",
        )
        .bind(tenant_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
