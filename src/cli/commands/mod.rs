pub mod landlord;
pub mod migrate;
pub mod plan;
pub mod tenant;
