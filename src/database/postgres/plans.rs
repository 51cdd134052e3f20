use async_trait::async_trait;
use sqlx::{postgres::PgRow, Row};
use uuid::Uuid;

use super::{text_column, PgStore};
use crate::database::manager::DatabaseError;
use crate::database::models::{NewPlan, PlanUpdate, PricePlan};
use crate::database::store::PlanStore;
use crate::types::PlanStatus;

const COLUMNS: &str =
    "id, name, description, price, duration_months, trial_days, features, status, created_at, updated_at";

fn plan_from_row(row: &PgRow) -> Result<PricePlan, DatabaseError> {
    Ok(PricePlan {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        price: row.try_get("price")?,
        duration_months: row.try_get("duration_months")?,
        trial_days: row.try_get("trial_days")?,
        features: row.try_get("features")?,
        status: text_column(row, "status")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl PlanStore for PgStore {
    async fn create(&self, new: NewPlan) -> Result<PricePlan, DatabaseError> {
        let sql = format!(
            "INSERT INTO price_plans (id, name, description, price, duration_months, trial_days, features, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {}",
            COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(Uuid::new_v4())
            .bind(&new.name)
            .bind(&new.description)
            .bind(new.price)
            .bind(new.duration_months)
            .bind(new.trial_days)
            .bind(&new.features)
            .bind(PlanStatus::Active.as_str())
            .fetch_one(&self.pool)
            .await?;
        plan_from_row(&row)
    }

    async fn get(&self, id: Uuid) -> Result<Option<PricePlan>, DatabaseError> {
        let sql = format!("SELECT {} FROM price_plans WHERE id = $1", COLUMNS);
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.as_ref().map(plan_from_row).transpose()
    }

    async fn list(&self, active_only: bool) -> Result<Vec<PricePlan>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM price_plans WHERE (NOT $1 OR status = 'active') ORDER BY price ASC, name ASC",
            COLUMNS
        );
        let rows = sqlx::query(&sql).bind(active_only).fetch_all(&self.pool).await?;
        rows.iter().map(plan_from_row).collect()
    }

    async fn update(&self, id: Uuid, update: PlanUpdate) -> Result<PricePlan, DatabaseError> {
        let sql = format!(
            "UPDATE price_plans SET \
                name = COALESCE($2, name), \
                description = COALESCE($3, description), \
                price = COALESCE($4, price), \
                duration_months = COALESCE($5, duration_months), \
                trial_days = COALESCE($6, trial_days), \
                features = COALESCE($7, features), \
                status = COALESCE($8, status), \
                updated_at = now() \
             WHERE id = $1 RETURNING {}",
            COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(update.name)
            .bind(update.description)
            .bind(update.price)
            .bind(update.duration_months)
            .bind(update.trial_days)
            .bind(update.features)
            .bind(update.status.map(|s| s.as_str()))
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Plan {} not found", id)))?;
        plan_from_row(&row)
    }
}
