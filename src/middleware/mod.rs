pub mod auth;
pub mod response;
pub mod storefront;
pub mod validate_tenant;

pub use auth::{jwt_auth_middleware, require_landlord, AuthUser};
pub use response::{ApiResponse, ApiResult};
pub use storefront::{resolve_storefront_middleware, Storefront};
pub use validate_tenant::{validate_tenant_middleware, TenantContext};
