use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::TenantStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: Uuid,
    pub name: String,
    pub subdomain: String,
    pub custom_domain: Option<String>,
    pub domain_verified: bool,
    pub contact_email: String,
    pub plan_id: Option<Uuid>,
    pub status: TenantStatus,
    pub expire_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tenant {
    /// Tenants that may serve a storefront and use the dashboard
    pub fn is_operational(&self) -> bool {
        self.status == TenantStatus::Active
    }
}

#[derive(Debug, Clone)]
pub struct NewTenant {
    pub name: String,
    pub subdomain: String,
    pub contact_email: String,
}

/// Partial update; `None` leaves the column untouched.
/// `custom_domain: Some(None)` clears the domain.
#[derive(Debug, Clone, Default)]
pub struct TenantUpdate {
    pub name: Option<String>,
    pub contact_email: Option<String>,
    pub status: Option<TenantStatus>,
    pub custom_domain: Option<Option<String>>,
    pub domain_verified: Option<bool>,
}
