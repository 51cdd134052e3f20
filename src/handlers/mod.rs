// handlers/mod.rs - 3-tier handler layout
//
// Public (no auth, storefront resolved from Host) → Protected (store JWT)
// → Elevated (landlord JWT). Each tier's middleware is applied in app.rs.
pub mod elevated; // /api/admin/*
pub mod protected; // /api/*
pub mod public; // /, /auth/*, /plans, /store/*
