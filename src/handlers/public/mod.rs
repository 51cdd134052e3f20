// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Token acquisition, the plan catalog and the storefront. Storefront
// handlers run behind the store resolver and receive a `Storefront`.
pub mod auth;
pub mod plans;
pub mod storefront;
