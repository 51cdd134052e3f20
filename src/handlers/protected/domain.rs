// handlers/protected/domain.rs - /api/domain handlers
//
// One custom domain per store, attached to the hosting project through the
// configured DomainProvider. Storefront traffic on the domain is served
// only once the provider reports it verified.

use std::sync::Arc;

use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::database::models::TenantUpdate;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, TenantContext};
use crate::services::domains::{normalize_domain, DnsConfig, DomainProvider, VerificationRecord};
use crate::services::notifications;

#[derive(Debug, Deserialize)]
pub struct SetDomain {
    pub domain: String,
}

#[derive(Debug, Default, Serialize)]
pub struct DomainStatus {
    pub domain: Option<String>,
    pub verified: bool,
    /// DNS records the provider still wants to see
    pub verification: Vec<VerificationRecord>,
    pub dns: Option<DnsConfig>,
}

fn provider(state: &AppState) -> Result<Arc<dyn DomainProvider>, ApiError> {
    state
        .domains
        .clone()
        .ok_or_else(|| ApiError::service_unavailable("Custom domains are not configured on this server"))
}

/// GET /api/domain - current domain with live DNS status
pub async fn show(
    State(state): State<AppState>,
    Extension(TenantContext(tenant)): Extension<TenantContext>,
) -> ApiResult<DomainStatus> {
    let Some(domain) = tenant.custom_domain else {
        return Ok(ApiResponse::success(DomainStatus::default()));
    };
    let dns = provider(&state)?.dns_config(&domain).await?;
    Ok(ApiResponse::success(DomainStatus {
        domain: Some(domain),
        verified: tenant.domain_verified,
        verification: Vec::new(),
        dns: Some(dns),
    }))
}

/// PUT /api/domain - attach a domain, replacing any previous one
pub async fn set(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Extension(TenantContext(tenant)): Extension<TenantContext>,
    Json(request): Json<SetDomain>,
) -> ApiResult<DomainStatus> {
    auth.require_tenant_admin()?;
    let domain = normalize_domain(&request.domain)?;
    if domain.ends_with(&format!(".{}", state.config.server.root_domain)) || domain == state.config.server.root_domain {
        return Err(ApiError::field("domain", "must not be under the platform domain"));
    }
    let provider = provider(&state)?;

    if let Some(owner) = state.stores.tenants.find_by_domain(&domain).await? {
        if owner.id != tenant.id {
            return Err(ApiError::conflict(format!("Domain '{}' is used by another store", domain)));
        }
    }

    if let Some(previous) = tenant.custom_domain.as_deref().filter(|d| *d != domain) {
        if let Err(e) = provider.remove_domain(previous).await {
            tracing::warn!("Failed to detach old domain {} from {}: {}", previous, tenant.subdomain, e);
        }
    }

    let attached = provider.add_domain(&domain).await?;
    state
        .stores
        .tenants
        .update(
            tenant.id,
            TenantUpdate {
                custom_domain: Some(Some(domain.clone())),
                domain_verified: Some(attached.verified),
                ..Default::default()
            },
        )
        .await?;
    tracing::info!("Domain {} attached to {} (verified: {})", domain, tenant.subdomain, attached.verified);

    Ok(ApiResponse::success(DomainStatus {
        domain: Some(domain),
        verified: attached.verified,
        verification: attached.verification,
        dns: None,
    }))
}

/// POST /api/domain/verify - ask the provider to re-check DNS
pub async fn verify(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Extension(TenantContext(tenant)): Extension<TenantContext>,
) -> ApiResult<DomainStatus> {
    auth.require_tenant_admin()?;
    let domain = tenant
        .custom_domain
        .clone()
        .ok_or_else(|| ApiError::not_found("No custom domain is set"))?;

    let checked = provider(&state)?.verify_domain(&domain).await?;
    if checked.verified != tenant.domain_verified {
        state
            .stores
            .tenants
            .update(
                tenant.id,
                TenantUpdate {
                    domain_verified: Some(checked.verified),
                    ..Default::default()
                },
            )
            .await?;
    }
    if checked.verified && !tenant.domain_verified {
        notifications::post(
            &state.stores,
            tenant.id,
            None,
            "domain",
            "Domain verified".to_string(),
            format!("Your store is now live at {}", domain),
            Some("/api/domain".to_string()),
        )
        .await;
    }

    Ok(ApiResponse::success(DomainStatus {
        domain: Some(domain),
        verified: checked.verified,
        verification: checked.verification,
        dns: None,
    }))
}

/// DELETE /api/domain
pub async fn remove(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Extension(TenantContext(tenant)): Extension<TenantContext>,
) -> ApiResult<()> {
    auth.require_tenant_admin()?;
    let domain = tenant
        .custom_domain
        .as_deref()
        .ok_or_else(|| ApiError::not_found("No custom domain is set"))?;

    provider(&state)?.remove_domain(domain).await?;
    state
        .stores
        .tenants
        .update(
            tenant.id,
            TenantUpdate {
                custom_domain: Some(None),
                domain_verified: Some(false),
                ..Default::default()
            },
        )
        .await?;
    tracing::info!("Domain {} detached from {}", domain, tenant.subdomain);
    Ok(ApiResponse::no_content())
}
