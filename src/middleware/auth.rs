use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::app::AppState;
use crate::auth;
use crate::database::models::User;
use crate::error::ApiError;
use crate::types::Role;

/// Authenticated user context, loaded fresh from storage on every request
#[derive(Clone, Debug)]
pub struct AuthUser(pub User);

impl AuthUser {
    pub fn id(&self) -> Uuid {
        self.0.id
    }

    pub fn role(&self) -> Role {
        self.0.role
    }

    pub fn is_landlord(&self) -> bool {
        self.0.role == Role::Landlord
    }

    /// The user's tenant; landlords have none
    pub fn tenant_id(&self) -> Result<Uuid, ApiError> {
        self.0
            .tenant_id
            .ok_or_else(|| ApiError::forbidden("This endpoint is for store accounts"))
    }

    pub fn require_tenant_admin(&self) -> Result<(), ApiError> {
        match self.0.role {
            Role::TenantAdmin => Ok(()),
            _ => Err(ApiError::forbidden("Store administrator role required")),
        }
    }
}

/// JWT authentication middleware: validates the bearer token, loads the
/// user and injects [`AuthUser`]. Deactivated users are rejected even with
/// an unexpired token.
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_jwt_from_headers(&headers).map_err(ApiError::unauthorized)?;
    let claims = auth::validate_jwt(&token, &state.config.security)?;

    let user = state
        .stores
        .users
        .get(claims.sub)
        .await?
        .ok_or_else(|| ApiError::unauthorized("User no longer exists"))?;
    if !user.is_active {
        return Err(ApiError::unauthorized("Account is inactive"));
    }

    tracing::debug!("Authenticated {} as {}", user.email, user.role);
    request.extensions_mut().insert(AuthUser(user));

    Ok(next.run(request).await)
}

/// Elevated tier gate; runs after [`jwt_auth_middleware`]
pub async fn require_landlord(request: Request, next: Next) -> Result<Response, ApiError> {
    let auth_user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;
    if !auth_user.is_landlord() {
        return Err(ApiError::forbidden("Landlord role required"));
    }
    Ok(next.run(request).await)
}

/// Extract JWT token from Authorization header
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        if token.trim().is_empty() {
            return Err("Empty JWT token".to_string());
        }
        Ok(token.trim().to_string())
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(axum::http::header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn extracts_bearer_tokens() {
        assert_eq!(extract_jwt_from_headers(&headers("Bearer abc.def")).unwrap(), "abc.def");
        assert!(extract_jwt_from_headers(&headers("Basic abc")).is_err());
        assert!(extract_jwt_from_headers(&headers("Bearer  ")).is_err());
        assert!(extract_jwt_from_headers(&HeaderMap::new()).is_err());
    }
}
