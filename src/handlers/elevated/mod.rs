// handlers/elevated/mod.rs - Elevated handlers (landlord JWT required)
//
// Platform administration across tenants.
pub mod plans;
pub mod tenant;
pub mod tickets;
pub mod users;
