use async_trait::async_trait;
use sqlx::{postgres::PgRow, Row};
use uuid::Uuid;

use super::{text_column, PgStore};
use crate::database::manager::DatabaseError;
use crate::database::models::{NewUser, User, UserUpdate};
use crate::database::store::UserStore;

const COLUMNS: &str = "id, tenant_id, email, name, password_hash, role, is_active, created_at, updated_at";

fn user_from_row(row: &PgRow) -> Result<User, DatabaseError> {
    Ok(User {
        id: row.try_get("id")?,
        tenant_id: row.try_get("tenant_id")?,
        email: row.try_get("email")?,
        name: row.try_get("name")?,
        password_hash: row.try_get("password_hash")?,
        role: text_column(row, "role")?,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl UserStore for PgStore {
    async fn create(&self, new: NewUser) -> Result<User, DatabaseError> {
        let sql = format!(
            "INSERT INTO users (id, tenant_id, email, name, password_hash, role) \
             VALUES ($1, $2, lower($3), $4, $5, $6) RETURNING {}",
            COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(Uuid::new_v4())
            .bind(new.tenant_id)
            .bind(&new.email)
            .bind(&new.name)
            .bind(&new.password_hash)
            .bind(new.role.as_str())
            .fetch_one(&self.pool)
            .await?;
        user_from_row(&row)
    }

    async fn get(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", COLUMNS);
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let sql = format!("SELECT {} FROM users WHERE email = lower($1)", COLUMNS);
        let row = sqlx::query(&sql).bind(email).fetch_optional(&self.pool).await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn list(&self, tenant_id: Option<Uuid>) -> Result<Vec<User>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM users WHERE ($1::uuid IS NULL OR tenant_id = $1) ORDER BY created_at ASC",
            COLUMNS
        );
        let rows = sqlx::query(&sql).bind(tenant_id).fetch_all(&self.pool).await?;
        rows.iter().map(user_from_row).collect()
    }

    async fn update(&self, id: Uuid, update: UserUpdate) -> Result<User, DatabaseError> {
        let sql = format!(
            "UPDATE users SET \
                name = COALESCE($2, name), \
                role = COALESCE($3, role), \
                is_active = COALESCE($4, is_active), \
                password_hash = COALESCE($5, password_hash), \
                updated_at = now() \
             WHERE id = $1 RETURNING {}",
            COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(update.name)
            .bind(update.role.map(|r| r.as_str()))
            .bind(update.is_active)
            .bind(update.password_hash)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("User {} not found", id)))?;
        user_from_row(&row)
    }
}
