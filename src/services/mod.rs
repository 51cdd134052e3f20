pub mod accounts;
pub mod cart;
pub mod dashboard;
pub mod domains;
pub mod email;
pub mod inventory;
pub mod mailer;
pub mod notifications;
pub mod orders;
pub mod subscription;
pub mod tenant_service;
pub mod tickets;
