//! Repository traits, one per resource family.
//!
//! Handlers and services only see these traits; `postgres` implements them
//! over sqlx and `memory` over in-process maps.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::manager::DatabaseError;
use super::memory::MemoryStore;
use super::models::*;
use super::postgres::PgStore;
use crate::services::inventory::{AdjustmentRequest, BatchResult, InventoryError};
use crate::types::{OrderStatus, ProductStatus, TenantStatus, TicketPriority, TicketScope, TicketStatus};

#[async_trait]
pub trait TenantStore: Send + Sync {
    async fn create(&self, new: NewTenant) -> Result<Tenant, DatabaseError>;
    async fn get(&self, id: Uuid) -> Result<Option<Tenant>, DatabaseError>;
    async fn find_by_subdomain(&self, subdomain: &str) -> Result<Option<Tenant>, DatabaseError>;
    async fn find_by_domain(&self, domain: &str) -> Result<Option<Tenant>, DatabaseError>;
    async fn list(&self, status: Option<TenantStatus>) -> Result<Vec<Tenant>, DatabaseError>;
    async fn update(&self, id: Uuid, update: TenantUpdate) -> Result<Tenant, DatabaseError>;
    async fn set_subscription(
        &self,
        id: Uuid,
        plan_id: Uuid,
        expire_date: DateTime<Utc>,
    ) -> Result<Tenant, DatabaseError>;
    /// Marks active tenants past their expire date as expired, returning them
    async fn expire_overdue(&self, now: DateTime<Utc>) -> Result<Vec<Tenant>, DatabaseError>;
}

#[async_trait]
pub trait PlanStore: Send + Sync {
    async fn create(&self, new: NewPlan) -> Result<PricePlan, DatabaseError>;
    async fn get(&self, id: Uuid) -> Result<Option<PricePlan>, DatabaseError>;
    async fn list(&self, active_only: bool) -> Result<Vec<PricePlan>, DatabaseError>;
    async fn update(&self, id: Uuid, update: PlanUpdate) -> Result<PricePlan, DatabaseError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, new: NewUser) -> Result<User, DatabaseError>;
    async fn get(&self, id: Uuid) -> Result<Option<User>, DatabaseError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError>;
    /// `None` lists every account, landlords included
    async fn list(&self, tenant_id: Option<Uuid>) -> Result<Vec<User>, DatabaseError>;
    async fn update(&self, id: Uuid, update: UserUpdate) -> Result<User, DatabaseError>;
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn create_product(&self, tenant_id: Uuid, new: NewProduct) -> Result<Product, DatabaseError>;
    async fn get_product(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Product>, DatabaseError>;
    async fn list_products(
        &self,
        tenant_id: Uuid,
        status: Option<ProductStatus>,
    ) -> Result<Vec<Product>, DatabaseError>;
    async fn update_product(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        update: ProductUpdate,
    ) -> Result<Product, DatabaseError>;
    /// Adds a variant and re-syncs the parent's stock to the variant sum
    async fn create_variant(
        &self,
        tenant_id: Uuid,
        product_id: Uuid,
        new: NewVariant,
    ) -> Result<ProductVariant, DatabaseError>;
    async fn get_variant(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<ProductVariant>, DatabaseError>;
    async fn list_variants(&self, tenant_id: Uuid, product_id: Uuid) -> Result<Vec<ProductVariant>, DatabaseError>;
    /// Runs a whole adjustment batch atomically
    async fn apply_adjustments(
        &self,
        tenant_id: Uuid,
        items: &[AdjustmentRequest],
        actor: Option<Uuid>,
    ) -> Result<BatchResult, InventoryError>;
    async fn list_history(
        &self,
        tenant_id: Uuid,
        product_id: Option<Uuid>,
        limit: i64,
    ) -> Result<Vec<InventoryHistory>, DatabaseError>;
    async fn low_stock(&self, tenant_id: Uuid, threshold: i32) -> Result<Vec<Product>, DatabaseError>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn create(&self, new: NewOrder) -> Result<OrderWithItems, DatabaseError>;
    async fn get(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<OrderWithItems>, DatabaseError>;
    async fn list(&self, tenant_id: Uuid, status: Option<OrderStatus>) -> Result<Vec<Order>, DatabaseError>;
    async fn update_status(&self, tenant_id: Uuid, id: Uuid, status: OrderStatus) -> Result<Order, DatabaseError>;
    async fn summary(&self, tenant_id: Uuid) -> Result<OrderSummary, DatabaseError>;
}

#[async_trait]
pub trait TicketStore: Send + Sync {
    async fn create(&self, scope: TicketScope, new: NewTicket) -> Result<TicketThread, DatabaseError>;
    async fn get(&self, scope: TicketScope, id: Uuid) -> Result<Option<TicketThread>, DatabaseError>;
    /// `tenant_id: None` lists across tenants (landlord view of platform tickets)
    async fn list(
        &self,
        scope: TicketScope,
        tenant_id: Option<Uuid>,
        status: Option<TicketStatus>,
    ) -> Result<Vec<Ticket>, DatabaseError>;
    async fn add_message(
        &self,
        scope: TicketScope,
        ticket_id: Uuid,
        message: NewTicketMessage,
    ) -> Result<TicketMessage, DatabaseError>;
    async fn update(
        &self,
        scope: TicketScope,
        id: Uuid,
        status: Option<TicketStatus>,
        priority: Option<TicketPriority>,
    ) -> Result<Ticket, DatabaseError>;
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn create(&self, new: NewNotification) -> Result<Notification, DatabaseError>;
    /// Rows addressed to the user or to the whole tenant, newest first
    async fn list(&self, tenant_id: Uuid, user_id: Uuid, unread_only: bool) -> Result<Vec<Notification>, DatabaseError>;
    async fn mark_read(&self, tenant_id: Uuid, user_id: Uuid, id: Uuid) -> Result<bool, DatabaseError>;
    async fn mark_all_read(&self, tenant_id: Uuid, user_id: Uuid) -> Result<u64, DatabaseError>;
}

/// All repositories behind one cheap-to-clone handle
#[derive(Clone)]
pub struct Stores {
    pub tenants: Arc<dyn TenantStore>,
    pub plans: Arc<dyn PlanStore>,
    pub users: Arc<dyn UserStore>,
    pub catalog: Arc<dyn CatalogStore>,
    pub orders: Arc<dyn OrderStore>,
    pub tickets: Arc<dyn TicketStore>,
    pub notifications: Arc<dyn NotificationStore>,
    pub pool: Option<PgPool>,
}

impl Stores {
    pub fn postgres(pool: PgPool) -> Self {
        let store = Arc::new(PgStore::new(pool.clone()));
        Self {
            tenants: store.clone(),
            plans: store.clone(),
            users: store.clone(),
            catalog: store.clone(),
            orders: store.clone(),
            tickets: store.clone(),
            notifications: store,
            pool: Some(pool),
        }
    }

    pub fn memory() -> Self {
        let store = Arc::new(MemoryStore::default());
        Self {
            tenants: store.clone(),
            plans: store.clone(),
            users: store.clone(),
            catalog: store.clone(),
            orders: store.clone(),
            tickets: store.clone(),
            notifications: store,
            pool: None,
        }
    }
}
