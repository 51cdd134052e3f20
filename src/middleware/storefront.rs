use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::app::AppState;
use crate::database::models::Tenant;
use crate::error::ApiError;

/// Lets local clients and tests pick a store without DNS
pub const TENANT_HEADER: &str = "x-tenant-subdomain";

/// Store a storefront request was routed to
#[derive(Clone, Debug)]
pub struct Storefront(pub Tenant);

/// Where the store name came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreHost {
    Subdomain(String),
    CustomDomain(String),
}

/// Maps a request host onto a store: `<sub>.<root_domain>` is a subdomain,
/// any other host except the root domain itself is a custom domain.
pub fn classify_host(host: &str, root_domain: &str) -> Option<StoreHost> {
    let host = host.split(':').next().unwrap_or_default().trim_end_matches('.').to_ascii_lowercase();
    let root = root_domain.to_ascii_lowercase();
    if host.is_empty() || host == root {
        return None;
    }
    match host.strip_suffix(&format!(".{}", root)) {
        Some(sub) if !sub.contains('.') => Some(StoreHost::Subdomain(sub.to_string())),
        Some(_) => None,
        None => Some(StoreHost::CustomDomain(host)),
    }
}

fn requested_store(headers: &HeaderMap, root_domain: &str) -> Option<StoreHost> {
    if let Some(sub) = headers.get(TENANT_HEADER).and_then(|v| v.to_str().ok()) {
        return Some(StoreHost::Subdomain(sub.trim().to_ascii_lowercase()));
    }
    let host = headers.get(header::HOST).and_then(|v| v.to_str().ok())?;
    classify_host(host, root_domain)
}

/// Public storefront gate: resolves the store from the Host header and only
/// lets requests through to operational (active) stores.
pub async fn resolve_storefront_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let store = requested_store(&headers, &state.config.server.root_domain)
        .ok_or_else(|| ApiError::not_found("No store for this host"))?;

    let tenant = match &store {
        StoreHost::Subdomain(sub) => state.stores.tenants.find_by_subdomain(sub).await?,
        StoreHost::CustomDomain(domain) => state
            .stores
            .tenants
            .find_by_domain(domain)
            .await?
            .filter(|t| t.domain_verified),
    }
    .ok_or_else(|| ApiError::not_found("Store not found"))?;

    if !tenant.is_operational() {
        tracing::debug!("Storefront {} unavailable ({})", tenant.subdomain, tenant.status);
        return Err(ApiError::service_unavailable("This store is currently unavailable"));
    }

    request.extensions_mut().insert(Storefront(tenant));
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_hosts() {
        assert_eq!(
            classify_host("acme.storeflow.app", "storeflow.app"),
            Some(StoreHost::Subdomain("acme".into()))
        );
        assert_eq!(
            classify_host("ACME.localhost:3000", "localhost"),
            Some(StoreHost::Subdomain("acme".into()))
        );
        assert_eq!(
            classify_host("shop.example.com", "storeflow.app"),
            Some(StoreHost::CustomDomain("shop.example.com".into()))
        );
        assert_eq!(classify_host("storeflow.app", "storeflow.app"), None);
        assert_eq!(classify_host("a.b.storeflow.app", "storeflow.app"), None);
    }

    #[test]
    fn header_overrides_host() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, "shop.example.com".parse().unwrap());
        headers.insert(TENANT_HEADER, "Acme".parse().unwrap());
        assert_eq!(
            requested_store(&headers, "storeflow.app"),
            Some(StoreHost::Subdomain("acme".into()))
        );
    }
}
