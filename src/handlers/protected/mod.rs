// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Everything except `auth` also runs behind the tenant gate and receives a
// `TenantContext` for the signed-in user's store.
pub mod auth;
pub mod dashboard;
pub mod domain;
pub mod inventory;
pub mod notifications;
pub mod orders;
pub mod products;
pub mod subscription;
pub mod support;
pub mod tickets;
pub mod users;
