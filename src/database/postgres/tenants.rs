use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, Row};
use uuid::Uuid;

use super::{text_column, PgStore};
use crate::database::manager::DatabaseError;
use crate::database::models::{NewTenant, Tenant, TenantUpdate};
use crate::database::store::TenantStore;
use crate::types::TenantStatus;

const COLUMNS: &str = "id, name, subdomain, custom_domain, domain_verified, contact_email, \
                       plan_id, status, expire_date, created_at, updated_at";

fn tenant_from_row(row: &PgRow) -> Result<Tenant, DatabaseError> {
    Ok(Tenant {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        subdomain: row.try_get("subdomain")?,
        custom_domain: row.try_get("custom_domain")?,
        domain_verified: row.try_get("domain_verified")?,
        contact_email: row.try_get("contact_email")?,
        plan_id: row.try_get("plan_id")?,
        status: text_column(row, "status")?,
        expire_date: row.try_get("expire_date")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl TenantStore for PgStore {
    async fn create(&self, new: NewTenant) -> Result<Tenant, DatabaseError> {
        let sql = format!(
            "INSERT INTO tenants (id, name, subdomain, contact_email, status) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(Uuid::new_v4())
            .bind(&new.name)
            .bind(&new.subdomain)
            .bind(&new.contact_email)
            .bind(TenantStatus::Pending.as_str())
            .fetch_one(&self.pool)
            .await?;
        tenant_from_row(&row)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Tenant>, DatabaseError> {
        let sql = format!("SELECT {} FROM tenants WHERE id = $1", COLUMNS);
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.as_ref().map(tenant_from_row).transpose()
    }

    async fn find_by_subdomain(&self, subdomain: &str) -> Result<Option<Tenant>, DatabaseError> {
        let sql = format!("SELECT {} FROM tenants WHERE subdomain = $1", COLUMNS);
        let row = sqlx::query(&sql).bind(subdomain).fetch_optional(&self.pool).await?;
        row.as_ref().map(tenant_from_row).transpose()
    }

    async fn find_by_domain(&self, domain: &str) -> Result<Option<Tenant>, DatabaseError> {
        let sql = format!("SELECT {} FROM tenants WHERE custom_domain = $1", COLUMNS);
        let row = sqlx::query(&sql).bind(domain).fetch_optional(&self.pool).await?;
        row.as_ref().map(tenant_from_row).transpose()
    }

    async fn list(&self, status: Option<TenantStatus>) -> Result<Vec<Tenant>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM tenants WHERE ($1::text IS NULL OR status = $1) ORDER BY created_at DESC",
            COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(status.map(|s| s.as_str()))
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(tenant_from_row).collect()
    }

    async fn update(&self, id: Uuid, update: TenantUpdate) -> Result<Tenant, DatabaseError> {
        // custom_domain uses a separate flag so it can be cleared to NULL
        let sql = format!(
            "UPDATE tenants SET \
                name = COALESCE($2, name), \
                contact_email = COALESCE($3, contact_email), \
                status = COALESCE($4, status), \
                custom_domain = CASE WHEN $5 THEN $6 ELSE custom_domain END, \
                domain_verified = COALESCE($7, domain_verified), \
                updated_at = now() \
             WHERE id = $1 RETURNING {}",
            COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(update.name)
            .bind(update.contact_email)
            .bind(update.status.map(|s| s.as_str()))
            .bind(update.custom_domain.is_some())
            .bind(update.custom_domain.flatten())
            .bind(update.domain_verified)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Tenant {} not found", id)))?;
        tenant_from_row(&row)
    }

    async fn set_subscription(
        &self,
        id: Uuid,
        plan_id: Uuid,
        expire_date: DateTime<Utc>,
    ) -> Result<Tenant, DatabaseError> {
        let sql = format!(
            "UPDATE tenants SET plan_id = $2, expire_date = $3, status = $4, updated_at = now() \
             WHERE id = $1 RETURNING {}",
            COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(plan_id)
            .bind(expire_date)
            .bind(TenantStatus::Active.as_str())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Tenant {} not found", id)))?;
        tenant_from_row(&row)
    }

    async fn expire_overdue(&self, now: DateTime<Utc>) -> Result<Vec<Tenant>, DatabaseError> {
        let sql = format!(
            "UPDATE tenants SET status = $1, updated_at = now() \
             WHERE status = $2 AND expire_date IS NOT NULL AND expire_date <= $3 RETURNING {}",
            COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(TenantStatus::Expired.as_str())
            .bind(TenantStatus::Active.as_str())
            .bind(now)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(tenant_from_row).collect()
    }
}
