use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use super::email::Emails;
use super::subscription::{self, Activation, SubscriptionError};
use crate::auth::{self, AuthError};
use crate::database::models::{NewTenant, NewUser, Tenant, User};
use crate::database::{DatabaseError, Stores};
use crate::types::{Role, TenantStatus};

/// Subdomains that route to platform services rather than stores
pub const RESERVED_SUBDOMAINS: &[&str] = &[
    "www", "api", "app", "admin", "dashboard", "mail", "smtp", "ftp", "static", "assets", "cdn", "status",
    "support", "help", "docs", "blog", "billing", "landlord", "store", "shop",
];

#[derive(Debug, thiserror::Error)]
pub enum TenantError {
    #[error("Invalid subdomain: {0}")]
    InvalidSubdomain(String),

    #[error("Subdomain '{0}' is reserved")]
    ReservedSubdomain(String),

    #[error("Subdomain '{0}' is already taken")]
    SubdomainTaken(String),

    #[error("Email '{0}' is already registered")]
    EmailTaken(String),

    #[error("Tenant name must be between 1 and 100 characters")]
    InvalidName,

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Subscription(#[from] SubscriptionError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// 3-63 chars of lowercase letters, digits and inner hyphens, not reserved
pub fn validate_subdomain(subdomain: &str) -> Result<(), TenantError> {
    let invalid = |why: &str| TenantError::InvalidSubdomain(format!("'{}' {}", subdomain, why));

    if subdomain.len() < 3 || subdomain.len() > 63 {
        return Err(invalid("must be between 3 and 63 characters"));
    }
    if !subdomain
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(invalid("may only contain lowercase letters, digits and hyphens"));
    }
    if subdomain.starts_with('-') || subdomain.ends_with('-') {
        return Err(invalid("must not start or end with a hyphen"));
    }
    if RESERVED_SUBDOMAINS.contains(&subdomain) {
        return Err(TenantError::ReservedSubdomain(subdomain.to_string()));
    }
    Ok(())
}

fn validate_name(name: &str) -> Result<(), TenantError> {
    let len = name.trim().chars().count();
    if len == 0 || len > 100 {
        return Err(TenantError::InvalidName);
    }
    Ok(())
}

/// Status a soft-deleted tenant returns to
pub fn restored_status(tenant: &Tenant, now: DateTime<Utc>) -> TenantStatus {
    match tenant.expire_date {
        Some(expiry) if expiry > now => TenantStatus::Active,
        Some(_) => TenantStatus::Expired,
        None => TenantStatus::Pending,
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTenantRequest {
    pub name: String,
    pub subdomain: String,
    pub contact_email: String,
    /// Defaults to the contact email
    pub admin_email: Option<String>,
    pub admin_name: Option<String>,
    pub admin_password: String,
    pub plan_id: Option<Uuid>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ProvisionedTenant {
    pub tenant: Tenant,
    pub admin: User,
    pub activation: Option<Activation>,
}

pub fn store_url(subdomain: &str, root_domain: &str) -> String {
    format!("https://{}.{}", subdomain, root_domain)
}

/// Creates the tenant and its first admin, optionally subscribes it, then
/// sends the welcome email.
pub async fn provision(
    stores: &Stores,
    emails: &Emails,
    root_domain: &str,
    request: CreateTenantRequest,
) -> Result<ProvisionedTenant, TenantError> {
    let subdomain = request.subdomain.trim().to_string();
    validate_subdomain(&subdomain)?;
    validate_name(&request.name)?;

    let admin_email = request
        .admin_email
        .unwrap_or_else(|| request.contact_email.clone())
        .trim()
        .to_lowercase();

    if stores.tenants.find_by_subdomain(&subdomain).await?.is_some() {
        return Err(TenantError::SubdomainTaken(subdomain));
    }
    if stores.users.find_by_email(&admin_email).await?.is_some() {
        return Err(TenantError::EmailTaken(admin_email));
    }
    let password_hash = auth::hash_password(&request.admin_password)?;

    let tenant = stores
        .tenants
        .create(NewTenant {
            name: request.name.trim().to_string(),
            subdomain,
            contact_email: request.contact_email.trim().to_lowercase(),
        })
        .await?;

    let admin = stores
        .users
        .create(NewUser {
            tenant_id: Some(tenant.id),
            email: admin_email.clone(),
            name: request.admin_name.unwrap_or_else(|| tenant.name.clone()),
            password_hash,
            role: Role::TenantAdmin,
        })
        .await?;

    info!("Provisioned tenant {} ({})", tenant.subdomain, tenant.id);

    let activation = match request.plan_id {
        Some(plan_id) => Some(subscription::activate(stores, emails, tenant.id, plan_id).await?),
        None => None,
    };
    let tenant = match &activation {
        Some(a) => a.tenant.clone(),
        None => tenant,
    };

    emails
        .tenant_welcome(&tenant, &admin_email, &store_url(&tenant.subdomain, root_domain))
        .await;

    Ok(ProvisionedTenant {
        tenant,
        admin,
        activation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn tenant(expire_date: Option<DateTime<Utc>>) -> Tenant {
        let now = Utc::now();
        Tenant {
            id: Uuid::new_v4(),
            name: "Acme".into(),
            subdomain: "acme".into(),
            custom_domain: None,
            domain_verified: false,
            contact_email: "owner@acme.test".into(),
            plan_id: None,
            status: TenantStatus::Deleted,
            expire_date,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn accepts_valid_subdomains() {
        for ok in ["abc", "my-store", "store42", "a".repeat(63).as_str()] {
            assert!(validate_subdomain(ok).is_ok(), "{ok}");
        }
    }

    #[test]
    fn rejects_bad_subdomains() {
        for bad in ["ab", "-store", "store-", "My-Store", "my_store", "my.store", "a".repeat(64).as_str()] {
            assert!(
                matches!(validate_subdomain(bad), Err(TenantError::InvalidSubdomain(_))),
                "{bad}"
            );
        }
        assert!(matches!(validate_subdomain("admin"), Err(TenantError::ReservedSubdomain(_))));
    }

    #[test]
    fn restore_picks_status_from_expiry() {
        let now = Utc::now();
        assert_eq!(restored_status(&tenant(None), now), TenantStatus::Pending);
        assert_eq!(
            restored_status(&tenant(Some(now + Duration::days(3))), now),
            TenantStatus::Active
        );
        assert_eq!(
            restored_status(&tenant(Some(now - Duration::days(3))), now),
            TenantStatus::Expired
        );
    }
}
