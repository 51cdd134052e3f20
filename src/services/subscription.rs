//! Plan activation and renewal.

use chrono::{DateTime, Duration, Months, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use super::email::Emails;
use super::notifications;
use crate::database::models::{PricePlan, Tenant};
use crate::database::{DatabaseError, Stores};
use crate::types::{PlanStatus, TenantStatus};

#[derive(Debug, Error)]
pub enum SubscriptionError {
    #[error("Plan {0} not found")]
    PlanNotFound(Uuid),

    #[error("Plan {0} is not active")]
    PlanInactive(String),

    #[error("Tenant {0} not found")]
    TenantNotFound(Uuid),

    #[error("Tenant {0} is deleted; restore it first")]
    TenantDeleted(String),

    #[error("Plan duration must be at least one month")]
    InvalidDuration,

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationKind {
    /// First subscription on a plan with trial days
    Trial,
    /// Starts from now
    New,
    /// Extends an unexpired subscription
    Renewal,
}

/// Adds calendar months, clamping to the last day of the target month
pub fn add_months(from: DateTime<Utc>, months: u32) -> DateTime<Utc> {
    from.checked_add_months(Months::new(months))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

pub fn compute_expiry(
    current_expiry: Option<DateTime<Utc>>,
    plan: &PricePlan,
    now: DateTime<Utc>,
) -> Result<(ActivationKind, DateTime<Utc>), SubscriptionError> {
    let months = u32::try_from(plan.duration_months)
        .ok()
        .filter(|m| *m > 0)
        .ok_or(SubscriptionError::InvalidDuration)?;

    Ok(match current_expiry {
        Some(expiry) if expiry > now => (ActivationKind::Renewal, add_months(expiry, months)),
        None if plan.trial_days > 0 => (
            ActivationKind::Trial,
            now + Duration::days(i64::from(plan.trial_days)),
        ),
        _ => (ActivationKind::New, add_months(now, months)),
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct Activation {
    pub kind: ActivationKind,
    pub tenant: Tenant,
    pub plan: PricePlan,
}

/// Validates the plan, moves the tenant's expiry, then emails and notifies
pub async fn activate(
    stores: &Stores,
    emails: &Emails,
    tenant_id: Uuid,
    plan_id: Uuid,
) -> Result<Activation, SubscriptionError> {
    let plan = stores
        .plans
        .get(plan_id)
        .await?
        .ok_or(SubscriptionError::PlanNotFound(plan_id))?;
    if plan.status != PlanStatus::Active {
        return Err(SubscriptionError::PlanInactive(plan.name));
    }

    let tenant = stores
        .tenants
        .get(tenant_id)
        .await?
        .ok_or(SubscriptionError::TenantNotFound(tenant_id))?;
    if tenant.status == TenantStatus::Deleted {
        return Err(SubscriptionError::TenantDeleted(tenant.subdomain));
    }

    let (kind, expire_date) = compute_expiry(tenant.expire_date, &plan, Utc::now())?;
    let tenant = stores
        .tenants
        .set_subscription(tenant.id, plan.id, expire_date)
        .await?;

    info!(
        "Subscription {:?} for tenant {} on plan {} until {}",
        kind, tenant.subdomain, plan.name, expire_date
    );

    emails
        .subscription_activated(&tenant, &plan, kind == ActivationKind::Trial)
        .await;
    notifications::post(
        stores,
        tenant.id,
        None,
        "subscription",
        format!("{} plan active", plan.name),
        format!("Your subscription runs until {}", expire_date.format("%Y-%m-%d")),
        Some("/api/subscription".to_string()),
    )
    .await;

    Ok(Activation { kind, tenant, plan })
}

#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionSummary {
    pub status: TenantStatus,
    pub plan: Option<PricePlan>,
    pub expire_date: Option<DateTime<Utc>>,
    pub days_remaining: Option<i64>,
}

/// Whole days left, rounded up; zero once expired
pub fn days_remaining(expire_date: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let seconds = (expire_date - now).num_seconds();
    if seconds <= 0 {
        0
    } else {
        (seconds + 86_399) / 86_400
    }
}

pub async fn summary(stores: &Stores, tenant: &Tenant) -> Result<SubscriptionSummary, DatabaseError> {
    let plan = match tenant.plan_id {
        Some(id) => stores.plans.get(id).await?,
        None => None,
    };
    Ok(SubscriptionSummary {
        status: tenant.status,
        plan,
        expire_date: tenant.expire_date,
        days_remaining: tenant.expire_date.map(|d| days_remaining(d, Utc::now())),
    })
}

/// Marks overdue tenants expired and tells each one
pub async fn expire_overdue(stores: &Stores) -> Result<usize, DatabaseError> {
    let expired = stores.tenants.expire_overdue(Utc::now()).await?;
    for tenant in &expired {
        info!("Tenant {} subscription expired", tenant.subdomain);
        notifications::post(
            stores,
            tenant.id,
            None,
            "subscription",
            "Subscription expired".to_string(),
            "Renew your plan to keep your store online".to_string(),
            Some("/api/subscription".to_string()),
        )
        .await;
    }
    Ok(expired.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal::Decimal;
    use serde_json::json;

    fn plan(months: i32, trial_days: i32) -> PricePlan {
        let now = Utc::now();
        PricePlan {
            id: Uuid::new_v4(),
            name: "Pro".into(),
            description: None,
            price: Decimal::new(2900, 2),
            duration_months: months,
            trial_days,
            features: json!({}),
            status: PlanStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn month_addition_clamps_to_month_end() {
        assert_eq!(add_months(at(2024, 1, 31), 1), at(2024, 2, 29));
        assert_eq!(add_months(at(2023, 1, 31), 1), at(2023, 2, 28));
        assert_eq!(add_months(at(2024, 3, 15), 12), at(2025, 3, 15));
    }

    #[test]
    fn unexpired_subscription_renews_from_expiry() {
        let now = at(2024, 5, 1);
        let (kind, expiry) = compute_expiry(Some(at(2024, 5, 20)), &plan(1, 14), now).unwrap();
        assert_eq!(kind, ActivationKind::Renewal);
        assert_eq!(expiry, at(2024, 6, 20));
    }

    #[test]
    fn first_subscription_uses_trial_days() {
        let now = at(2024, 5, 1);
        let (kind, expiry) = compute_expiry(None, &plan(1, 14), now).unwrap();
        assert_eq!(kind, ActivationKind::Trial);
        assert_eq!(expiry, at(2024, 5, 15));
    }

    #[test]
    fn lapsed_subscription_starts_fresh_without_trial() {
        let now = at(2024, 5, 1);
        let (kind, expiry) = compute_expiry(Some(at(2024, 4, 1)), &plan(3, 14), now).unwrap();
        assert_eq!(kind, ActivationKind::New);
        assert_eq!(expiry, at(2024, 8, 1));
    }

    #[test]
    fn no_trial_plan_starts_new() {
        let now = at(2024, 5, 1);
        let (kind, _) = compute_expiry(None, &plan(1, 0), now).unwrap();
        assert_eq!(kind, ActivationKind::New);
    }

    #[test]
    fn zero_duration_is_rejected() {
        assert!(matches!(
            compute_expiry(None, &plan(0, 0), Utc::now()),
            Err(SubscriptionError::InvalidDuration)
        ));
    }

    #[test]
    fn days_remaining_rounds_up_and_floors_at_zero() {
        let now = at(2024, 5, 1);
        assert_eq!(days_remaining(now + Duration::hours(1), now), 1);
        assert_eq!(days_remaining(now + Duration::days(3), now), 3);
        assert_eq!(days_remaining(now - Duration::days(3), now), 0);
    }
}
