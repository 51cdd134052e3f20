// HTTP API Error Types
use axum::{response::IntoResponse, http::StatusCode, Json};
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::auth::AuthError;
use crate::database::DatabaseError;
use crate::services::accounts::AccountError;
use crate::services::cart::CartError;
use crate::services::domains::DomainError;
use crate::services::inventory::InventoryError;
use crate::services::orders::OrderError;
use crate::services::subscription::SubscriptionError;
use crate::services::tenant_service::TenantError;
use crate::services::tickets::TicketError;
use crate::types::ParseEnumError;

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    ValidationError {
        message: String,
        field_errors: Option<HashMap<String, String>>,
    },

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 502 Bad Gateway (external service issues)
    BadGateway(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::ValidationError { .. } => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict(_) => 409,
            ApiError::InternalServerError(_) => 500,
            ApiError::BadGateway(_) => 502,
            ApiError::ServiceUnavailable(_) => 503,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::ValidationError { message, .. } => message,
            ApiError::Unauthorized(msg) => msg,
            ApiError::Forbidden(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::Conflict(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
            ApiError::BadGateway(msg) => msg,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        match self {
            ApiError::ValidationError { message, field_errors } => {
                let mut response = json!({
                    "error": true,
                    "message": message,
                    "code": "VALIDATION_ERROR"
                });

                if let Some(field_errors) = field_errors {
                    response["field_errors"] = json!(field_errors);
                }

                response
            }
            _ => {
                json!({
                    "error": true,
                    "message": self.message(),
                    "code": self.error_code()
                })
            }
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::ValidationError { .. } => "VALIDATION_ERROR",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::BadGateway(_) => "BAD_GATEWAY",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn validation_error(
        message: impl Into<String>,
        field_errors: Option<HashMap<String, String>>,
    ) -> Self {
        ApiError::ValidationError {
            message: message.into(),
            field_errors,
        }
    }

    /// Single-field validation failure
    pub fn field(field: &str, problem: impl Into<String>) -> Self {
        let mut field_errors = HashMap::new();
        field_errors.insert(field.to_string(), problem.into());
        ApiError::validation_error("Invalid input", Some(field_errors))
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        ApiError::BadGateway(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

// Convert other error types to ApiError
impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(msg) => ApiError::not_found(msg),
            DatabaseError::Conflict(msg) => ApiError::conflict(msg),
            DatabaseError::OutOfRange(msg) => ApiError::bad_request(msg),
            DatabaseError::ConfigMissing(_) | DatabaseError::InvalidDatabaseUrl => {
                tracing::error!("Database configuration error: {}", err);
                ApiError::service_unavailable("Database temporarily unavailable")
            }
            DatabaseError::Migrate(e) => {
                tracing::error!("Migration error: {}", e);
                ApiError::service_unavailable("Service is being updated, please try again later")
            }
            DatabaseError::Decode(msg) => {
                tracing::error!("Corrupt row: {}", msg);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
            DatabaseError::Sqlx(sqlx_err) => {
                // Log the real error but return generic message
                tracing::error!("SQLx error: {}", sqlx_err);
                ApiError::internal_server_error("Database error occurred")
            }
        }
    }
}

impl From<InventoryError> for ApiError {
    fn from(err: InventoryError) -> Self {
        match err {
            InventoryError::NotFound(msg) => ApiError::not_found(msg),
            InventoryError::Database(e) => e.into(),
            other => ApiError::validation_error(other.to_string(), None),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials | AuthError::InvalidToken(_) | AuthError::Inactive => {
                ApiError::unauthorized(err.to_string())
            }
            AuthError::WeakPassword(_) => ApiError::field("password", err.to_string()),
            AuthError::MissingSecret | AuthError::Hashing(_) | AuthError::TokenGeneration(_) => {
                tracing::error!("Authentication failure: {}", err);
                ApiError::internal_server_error("Authentication is unavailable")
            }
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotConfigured => ApiError::service_unavailable(err.to_string()),
            DomainError::InvalidDomain(_) => ApiError::field("domain", err.to_string()),
            DomainError::Rejected { status, ref message } if status == 409 => {
                ApiError::conflict(message.clone())
            }
            DomainError::Rejected { .. } | DomainError::Transport(_) => {
                tracing::warn!("Domain provider error: {}", err);
                ApiError::bad_gateway("Domain provider request failed")
            }
        }
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::EmailTaken(_) => ApiError::conflict(err.to_string()),
            AccountError::InvalidEmail => ApiError::field("email", err.to_string()),
            AccountError::Auth(e) => e.into(),
            AccountError::Database(e) => e.into(),
        }
    }
}

impl From<SubscriptionError> for ApiError {
    fn from(err: SubscriptionError) -> Self {
        match err {
            SubscriptionError::PlanNotFound(_) | SubscriptionError::TenantNotFound(_) => {
                ApiError::not_found(err.to_string())
            }
            SubscriptionError::PlanInactive(_)
            | SubscriptionError::TenantDeleted(_)
            | SubscriptionError::InvalidDuration => ApiError::bad_request(err.to_string()),
            SubscriptionError::Database(e) => e.into(),
        }
    }
}

impl From<TenantError> for ApiError {
    fn from(err: TenantError) -> Self {
        match err {
            TenantError::InvalidSubdomain(_) | TenantError::ReservedSubdomain(_) => {
                ApiError::field("subdomain", err.to_string())
            }
            TenantError::InvalidName => ApiError::field("name", err.to_string()),
            TenantError::SubdomainTaken(_) | TenantError::EmailTaken(_) => ApiError::conflict(err.to_string()),
            TenantError::Auth(e) => e.into(),
            TenantError::Subscription(e) => e.into(),
            TenantError::Database(e) => e.into(),
        }
    }
}

impl From<CartError> for ApiError {
    fn from(err: CartError) -> Self {
        match err {
            CartError::LineNotFound(_) => ApiError::not_found(err.to_string()),
            CartError::Database(e) => e.into(),
            other => ApiError::bad_request(other.to_string()),
        }
    }
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::NotFound(_) => ApiError::not_found(err.to_string()),
            OrderError::InvalidTransition { .. } => ApiError::bad_request(err.to_string()),
            OrderError::Database(e) => e.into(),
        }
    }
}

impl From<TicketError> for ApiError {
    fn from(err: TicketError) -> Self {
        match err {
            TicketError::NotFound(_) => ApiError::not_found(err.to_string()),
            TicketError::Closed => ApiError::bad_request(err.to_string()),
            TicketError::Invalid { field, .. } => ApiError::field(field, err.to_string()),
            TicketError::Database(e) => e.into(),
        }
    }
}

impl From<ParseEnumError> for ApiError {
    fn from(err: ParseEnumError) -> Self {
        ApiError::field(err.kind, err.to_string())
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_maps_to_409() {
        let err: ApiError = DatabaseError::Conflict("duplicate value violates users_email_key".into()).into();
        assert_eq!(err.status_code(), 409);
        assert_eq!(err.to_json()["code"], "CONFLICT");
    }

    #[test]
    fn inventory_validation_is_400_and_lookup_is_404() {
        let err: ApiError = InventoryError::MissingTarget(2).into();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.to_json()["code"], "VALIDATION_ERROR");

        let err: ApiError = InventoryError::NotFound("Variant x not found".into()).into();
        assert_eq!(err.status_code(), 404);
    }

    #[test]
    fn field_errors_are_included() {
        let body = ApiError::field("subdomain", "too short").to_json();
        assert_eq!(body["error"], true);
        assert_eq!(body["field_errors"]["subdomain"], "too short");
    }

    #[test]
    fn stock_limits_are_client_errors() {
        let err: ApiError = DatabaseError::OutOfRange("too much stock".into()).into();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.to_json()["code"], "BAD_REQUEST");

        let err: ApiError = InventoryError::StockOverflow(uuid::Uuid::nil()).into();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.to_json()["code"], "VALIDATION_ERROR");
    }

    #[test]
    fn unconfigured_domains_are_unavailable() {
        let err: ApiError = DomainError::NotConfigured.into();
        assert_eq!(err.status_code(), 503);
    }
}
