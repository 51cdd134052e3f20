//! In-process implementation of the repository traits.
//!
//! Backs `STOREFLOW_STORAGE=memory` (local development, demos) and the
//! router tests. Data lives for the life of the process.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::manager::DatabaseError;
use super::models::*;
use super::store::*;
use crate::services::inventory::{
    self, AdjustmentRequest, BatchResult, InventoryError, StockLedger, StockRow, StockTarget,
};
use crate::types::{
    OrderStatus, PlanStatus, ProductStatus, TenantStatus, TicketPriority, TicketScope, TicketStatus,
};

#[derive(Debug, Clone, Default)]
struct MemoryData {
    tenants: HashMap<Uuid, Tenant>,
    plans: HashMap<Uuid, PricePlan>,
    users: HashMap<Uuid, User>,
    products: HashMap<Uuid, Product>,
    variants: HashMap<Uuid, ProductVariant>,
    history: Vec<InventoryHistory>,
    orders: HashMap<Uuid, Order>,
    order_items: Vec<OrderItem>,
    tickets: HashMap<(TicketScope, Uuid), Ticket>,
    ticket_messages: Vec<(TicketScope, TicketMessage)>,
    notifications: Vec<Notification>,
}

#[derive(Default)]
pub struct MemoryStore {
    data: RwLock<MemoryData>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn not_found(what: &str, id: Uuid) -> DatabaseError {
    DatabaseError::NotFound(format!("{} {} not found", what, id))
}

fn stock_limit(product_id: Uuid) -> DatabaseError {
    DatabaseError::OutOfRange(format!(
        "Combined variant stock of product {} would exceed {}",
        product_id,
        inventory::MAX_STOCK
    ))
}

impl MemoryData {
    fn tenant_mut(&mut self, id: Uuid) -> Result<&mut Tenant, DatabaseError> {
        self.tenants.get_mut(&id).ok_or_else(|| not_found("Tenant", id))
    }

    fn variant_stocks(&self, tenant_id: Uuid, product_id: Uuid) -> Vec<i32> {
        self.variants
            .values()
            .filter(|v| v.tenant_id == tenant_id && v.product_id == product_id)
            .map(|v| v.stock_quantity)
            .collect()
    }

    fn resync_product(&mut self, tenant_id: Uuid, product_id: Uuid) -> Result<i32, DatabaseError> {
        let total = inventory::total_stock(self.variant_stocks(tenant_id, product_id))
            .ok_or_else(|| stock_limit(product_id))?;
        let product = self
            .products
            .get_mut(&product_id)
            .filter(|p| p.tenant_id == tenant_id)
            .ok_or_else(|| not_found("Product", product_id))?;
        product.stock_quantity = total;
        product.updated_at = Utc::now();
        Ok(total)
    }
}

// ---------------------------------------------------------------------------
// Tenants
// ---------------------------------------------------------------------------

#[async_trait]
impl TenantStore for MemoryStore {
    async fn create(&self, new: NewTenant) -> Result<Tenant, DatabaseError> {
        let mut data = self.data.write().await;
        if data.tenants.values().any(|t| t.subdomain == new.subdomain) {
            return Err(DatabaseError::Conflict("duplicate value violates tenants_subdomain_key".into()));
        }
        let now = Utc::now();
        let tenant = Tenant {
            id: Uuid::new_v4(),
            name: new.name,
            subdomain: new.subdomain,
            custom_domain: None,
            domain_verified: false,
            contact_email: new.contact_email,
            plan_id: None,
            status: TenantStatus::Pending,
            expire_date: None,
            created_at: now,
            updated_at: now,
        };
        data.tenants.insert(tenant.id, tenant.clone());
        Ok(tenant)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Tenant>, DatabaseError> {
        Ok(self.data.read().await.tenants.get(&id).cloned())
    }

    async fn find_by_subdomain(&self, subdomain: &str) -> Result<Option<Tenant>, DatabaseError> {
        let data = self.data.read().await;
        Ok(data.tenants.values().find(|t| t.subdomain == subdomain).cloned())
    }

    async fn find_by_domain(&self, domain: &str) -> Result<Option<Tenant>, DatabaseError> {
        let data = self.data.read().await;
        Ok(data
            .tenants
            .values()
            .find(|t| t.custom_domain.as_deref() == Some(domain))
            .cloned())
    }

    async fn list(&self, status: Option<TenantStatus>) -> Result<Vec<Tenant>, DatabaseError> {
        let data = self.data.read().await;
        let mut tenants: Vec<Tenant> = data
            .tenants
            .values()
            .filter(|t| status.map_or(true, |s| t.status == s))
            .cloned()
            .collect();
        tenants.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tenants)
    }

    async fn update(&self, id: Uuid, update: TenantUpdate) -> Result<Tenant, DatabaseError> {
        let mut data = self.data.write().await;
        if let Some(Some(domain)) = &update.custom_domain {
            let taken = data
                .tenants
                .values()
                .any(|t| t.id != id && t.custom_domain.as_deref() == Some(domain.as_str()));
            if taken {
                return Err(DatabaseError::Conflict("duplicate value violates tenants_custom_domain_key".into()));
            }
        }

        let tenant = data.tenant_mut(id)?;
        if let Some(name) = update.name {
            tenant.name = name;
        }
        if let Some(email) = update.contact_email {
            tenant.contact_email = email;
        }
        if let Some(status) = update.status {
            tenant.status = status;
        }
        if let Some(domain) = update.custom_domain {
            tenant.custom_domain = domain;
        }
        if let Some(verified) = update.domain_verified {
            tenant.domain_verified = verified;
        }
        tenant.updated_at = Utc::now();
        Ok(tenant.clone())
    }

    async fn set_subscription(
        &self,
        id: Uuid,
        plan_id: Uuid,
        expire_date: DateTime<Utc>,
    ) -> Result<Tenant, DatabaseError> {
        let mut data = self.data.write().await;
        let tenant = data.tenant_mut(id)?;
        tenant.plan_id = Some(plan_id);
        tenant.expire_date = Some(expire_date);
        tenant.status = TenantStatus::Active;
        tenant.updated_at = Utc::now();
        Ok(tenant.clone())
    }

    async fn expire_overdue(&self, now: DateTime<Utc>) -> Result<Vec<Tenant>, DatabaseError> {
        let mut data = self.data.write().await;
        let mut expired = Vec::new();
        for tenant in data.tenants.values_mut() {
            let overdue = tenant.expire_date.map_or(false, |d| d <= now);
            if tenant.status == TenantStatus::Active && overdue {
                tenant.status = TenantStatus::Expired;
                tenant.updated_at = now;
                expired.push(tenant.clone());
            }
        }
        Ok(expired)
    }
}

// ---------------------------------------------------------------------------
// Plans
// ---------------------------------------------------------------------------

#[async_trait]
impl PlanStore for MemoryStore {
    async fn create(&self, new: NewPlan) -> Result<PricePlan, DatabaseError> {
        let now = Utc::now();
        let plan = PricePlan {
            id: Uuid::new_v4(),
            name: new.name,
            description: new.description,
            price: new.price,
            duration_months: new.duration_months,
            trial_days: new.trial_days,
            features: new.features,
            status: PlanStatus::Active,
            created_at: now,
            updated_at: now,
        };
        self.data.write().await.plans.insert(plan.id, plan.clone());
        Ok(plan)
    }

    async fn get(&self, id: Uuid) -> Result<Option<PricePlan>, DatabaseError> {
        Ok(self.data.read().await.plans.get(&id).cloned())
    }

    async fn list(&self, active_only: bool) -> Result<Vec<PricePlan>, DatabaseError> {
        let data = self.data.read().await;
        let mut plans: Vec<PricePlan> = data
            .plans
            .values()
            .filter(|p| !active_only || p.status == PlanStatus::Active)
            .cloned()
            .collect();
        plans.sort_by(|a, b| a.price.cmp(&b.price).then_with(|| a.name.cmp(&b.name)));
        Ok(plans)
    }

    async fn update(&self, id: Uuid, update: PlanUpdate) -> Result<PricePlan, DatabaseError> {
        let mut data = self.data.write().await;
        let plan = data.plans.get_mut(&id).ok_or_else(|| not_found("Plan", id))?;
        if let Some(v) = update.name {
            plan.name = v;
        }
        if let Some(v) = update.description {
            plan.description = Some(v);
        }
        if let Some(v) = update.price {
            plan.price = v;
        }
        if let Some(v) = update.duration_months {
            plan.duration_months = v;
        }
        if let Some(v) = update.trial_days {
            plan.trial_days = v;
        }
        if let Some(v) = update.features {
            plan.features = v;
        }
        if let Some(v) = update.status {
            plan.status = v;
        }
        plan.updated_at = Utc::now();
        Ok(plan.clone())
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[async_trait]
impl UserStore for MemoryStore {
    async fn create(&self, new: NewUser) -> Result<User, DatabaseError> {
        let mut data = self.data.write().await;
        let email = new.email.to_lowercase();
        if data.users.values().any(|u| u.email == email) {
            return Err(DatabaseError::Conflict("duplicate value violates users_email_key".into()));
        }
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            tenant_id: new.tenant_id,
            email,
            name: new.name,
            password_hash: new.password_hash,
            role: new.role,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        data.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        Ok(self.data.read().await.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let email = email.to_lowercase();
        let data = self.data.read().await;
        Ok(data.users.values().find(|u| u.email == email).cloned())
    }

    async fn list(&self, tenant_id: Option<Uuid>) -> Result<Vec<User>, DatabaseError> {
        let data = self.data.read().await;
        let mut users: Vec<User> = data
            .users
            .values()
            .filter(|u| tenant_id.is_none() || u.tenant_id == tenant_id)
            .cloned()
            .collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(users)
    }

    async fn update(&self, id: Uuid, update: UserUpdate) -> Result<User, DatabaseError> {
        let mut data = self.data.write().await;
        let user = data.users.get_mut(&id).ok_or_else(|| not_found("User", id))?;
        if let Some(v) = update.name {
            user.name = v;
        }
        if let Some(v) = update.role {
            user.role = v;
        }
        if let Some(v) = update.is_active {
            user.is_active = v;
        }
        if let Some(v) = update.password_hash {
            user.password_hash = v;
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }
}

// ---------------------------------------------------------------------------
// Catalog and inventory
// ---------------------------------------------------------------------------

/// Ledger over a scratch copy; the caller swaps it in only on success
struct MemoryLedger<'a> {
    data: &'a mut MemoryData,
}

#[async_trait]
impl<'a> StockLedger for MemoryLedger<'a> {
    async fn load(&mut self, tenant_id: Uuid, target: StockTarget) -> Result<Option<StockRow>, DatabaseError> {
        Ok(match target {
            StockTarget::Product(id) => self
                .data
                .products
                .get(&id)
                .filter(|p| p.tenant_id == tenant_id)
                .map(|p| StockRow {
                    product_id: p.id,
                    variant_id: None,
                    stock_quantity: p.stock_quantity,
                }),
            StockTarget::Variant(id) => self
                .data
                .variants
                .get(&id)
                .filter(|v| v.tenant_id == tenant_id)
                .map(|v| StockRow {
                    product_id: v.product_id,
                    variant_id: Some(v.id),
                    stock_quantity: v.stock_quantity,
                }),
        })
    }

    async fn store(&mut self, _tenant_id: Uuid, target: StockTarget, quantity: i32) -> Result<(), DatabaseError> {
        let now = Utc::now();
        match target {
            StockTarget::Product(id) => {
                let product = self.data.products.get_mut(&id).ok_or_else(|| not_found("Product", id))?;
                product.stock_quantity = quantity;
                product.updated_at = now;
            }
            StockTarget::Variant(id) => {
                let variant = self.data.variants.get_mut(&id).ok_or_else(|| not_found("Variant", id))?;
                variant.stock_quantity = quantity;
                variant.updated_at = now;
            }
        }
        Ok(())
    }

    async fn record(&mut self, entry: &InventoryHistory) -> Result<(), DatabaseError> {
        self.data.history.push(entry.clone());
        Ok(())
    }

    async fn variant_stocks(&mut self, tenant_id: Uuid, product_id: Uuid) -> Result<Vec<i32>, DatabaseError> {
        Ok(self.data.variant_stocks(tenant_id, product_id))
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn create_product(&self, tenant_id: Uuid, new: NewProduct) -> Result<Product, DatabaseError> {
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4(),
            tenant_id,
            name: new.name,
            description: new.description,
            sku: new.sku,
            price: new.price,
            stock_quantity: new.stock_quantity,
            status: new.status,
            created_at: now,
            updated_at: now,
        };
        self.data.write().await.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn get_product(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Product>, DatabaseError> {
        let data = self.data.read().await;
        Ok(data.products.get(&id).filter(|p| p.tenant_id == tenant_id).cloned())
    }

    async fn list_products(
        &self,
        tenant_id: Uuid,
        status: Option<ProductStatus>,
    ) -> Result<Vec<Product>, DatabaseError> {
        let data = self.data.read().await;
        let mut products: Vec<Product> = data
            .products
            .values()
            .filter(|p| p.tenant_id == tenant_id && status.map_or(true, |s| p.status == s))
            .cloned()
            .collect();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(products)
    }

    async fn update_product(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        update: ProductUpdate,
    ) -> Result<Product, DatabaseError> {
        let mut data = self.data.write().await;
        let product = data
            .products
            .get_mut(&id)
            .filter(|p| p.tenant_id == tenant_id)
            .ok_or_else(|| not_found("Product", id))?;
        if let Some(v) = update.name {
            product.name = v;
        }
        if let Some(v) = update.description {
            product.description = Some(v);
        }
        if let Some(v) = update.sku {
            product.sku = Some(v);
        }
        if let Some(v) = update.price {
            product.price = v;
        }
        if let Some(v) = update.status {
            product.status = v;
        }
        product.updated_at = Utc::now();
        Ok(product.clone())
    }

    async fn create_variant(
        &self,
        tenant_id: Uuid,
        product_id: Uuid,
        new: NewVariant,
    ) -> Result<ProductVariant, DatabaseError> {
        let mut data = self.data.write().await;
        let owned = data.products.get(&product_id).map_or(false, |p| p.tenant_id == tenant_id);
        if !owned {
            return Err(not_found("Product", product_id));
        }
        let mut stocks = data.variant_stocks(tenant_id, product_id);
        stocks.push(new.stock_quantity);
        if inventory::total_stock(stocks).is_none() {
            return Err(stock_limit(product_id));
        }
        let now = Utc::now();
        let variant = ProductVariant {
            id: Uuid::new_v4(),
            tenant_id,
            product_id,
            name: new.name,
            sku: new.sku,
            price: new.price,
            stock_quantity: new.stock_quantity,
            created_at: now,
            updated_at: now,
        };
        data.variants.insert(variant.id, variant.clone());
        data.resync_product(tenant_id, product_id)?;
        Ok(variant)
    }

    async fn get_variant(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<ProductVariant>, DatabaseError> {
        let data = self.data.read().await;
        Ok(data.variants.get(&id).filter(|v| v.tenant_id == tenant_id).cloned())
    }

    async fn list_variants(&self, tenant_id: Uuid, product_id: Uuid) -> Result<Vec<ProductVariant>, DatabaseError> {
        let data = self.data.read().await;
        let mut variants: Vec<ProductVariant> = data
            .variants
            .values()
            .filter(|v| v.tenant_id == tenant_id && v.product_id == product_id)
            .cloned()
            .collect();
        variants.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(variants)
    }

    async fn apply_adjustments(
        &self,
        tenant_id: Uuid,
        items: &[AdjustmentRequest],
        actor: Option<Uuid>,
    ) -> Result<BatchResult, InventoryError> {
        let mut data = self.data.write().await;
        let mut scratch = data.clone();
        let result = {
            let mut ledger = MemoryLedger { data: &mut scratch };
            inventory::apply_batch(&mut ledger, tenant_id, items, actor).await?
        };
        *data = scratch;
        Ok(result)
    }

    async fn list_history(
        &self,
        tenant_id: Uuid,
        product_id: Option<Uuid>,
        limit: i64,
    ) -> Result<Vec<InventoryHistory>, DatabaseError> {
        let data = self.data.read().await;
        Ok(data
            .history
            .iter()
            .rev()
            .filter(|h| h.tenant_id == tenant_id && product_id.map_or(true, |p| h.product_id == p))
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn low_stock(&self, tenant_id: Uuid, threshold: i32) -> Result<Vec<Product>, DatabaseError> {
        let data = self.data.read().await;
        let mut products: Vec<Product> = data
            .products
            .values()
            .filter(|p| {
                p.tenant_id == tenant_id && p.status == ProductStatus::Active && p.stock_quantity <= threshold
            })
            .cloned()
            .collect();
        products.sort_by(|a, b| a.stock_quantity.cmp(&b.stock_quantity).then_with(|| a.name.cmp(&b.name)));
        Ok(products)
    }
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

#[async_trait]
impl OrderStore for MemoryStore {
    async fn create(&self, new: NewOrder) -> Result<OrderWithItems, DatabaseError> {
        let mut data = self.data.write().await;
        if data.orders.values().any(|o| o.order_number == new.order_number) {
            return Err(DatabaseError::Conflict("duplicate value violates orders_order_number_key".into()));
        }
        let now = Utc::now();
        let subtotal = new.subtotal();
        let order = Order {
            id: Uuid::new_v4(),
            tenant_id: new.tenant_id,
            order_number: new.order_number.clone(),
            customer_email: new.customer_email.clone(),
            customer_name: new.customer_name.clone(),
            status: OrderStatus::Pending,
            subtotal,
            total: subtotal,
            shipping_address: new.shipping_address.clone(),
            notes: new.notes.clone(),
            created_at: now,
            updated_at: now,
        };
        let items: Vec<OrderItem> = new
            .items
            .iter()
            .map(|item| OrderItem {
                id: Uuid::new_v4(),
                order_id: order.id,
                product_id: item.product_id,
                variant_id: item.variant_id,
                name: item.name.clone(),
                sku: item.sku.clone(),
                unit_price: item.unit_price,
                quantity: item.quantity,
                line_total: item.line_total(),
            })
            .collect();

        data.orders.insert(order.id, order.clone());
        data.order_items.extend(items.iter().cloned());
        Ok(OrderWithItems { order, items })
    }

    async fn get(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<OrderWithItems>, DatabaseError> {
        let data = self.data.read().await;
        let Some(order) = data.orders.get(&id).filter(|o| o.tenant_id == tenant_id) else {
            return Ok(None);
        };
        let mut items: Vec<OrderItem> = data.order_items.iter().filter(|i| i.order_id == id).cloned().collect();
        items.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(Some(OrderWithItems {
            order: order.clone(),
            items,
        }))
    }

    async fn list(&self, tenant_id: Uuid, status: Option<OrderStatus>) -> Result<Vec<Order>, DatabaseError> {
        let data = self.data.read().await;
        let mut orders: Vec<Order> = data
            .orders
            .values()
            .filter(|o| o.tenant_id == tenant_id && status.map_or(true, |s| o.status == s))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn update_status(&self, tenant_id: Uuid, id: Uuid, status: OrderStatus) -> Result<Order, DatabaseError> {
        let mut data = self.data.write().await;
        let order = data
            .orders
            .get_mut(&id)
            .filter(|o| o.tenant_id == tenant_id)
            .ok_or_else(|| not_found("Order", id))?;
        order.status = status;
        order.updated_at = Utc::now();
        Ok(order.clone())
    }

    async fn summary(&self, tenant_id: Uuid) -> Result<OrderSummary, DatabaseError> {
        let data = self.data.read().await;
        let mut summary = OrderSummary {
            order_count: 0,
            revenue: Decimal::ZERO,
            by_status: BTreeMap::new(),
        };
        for order in data.orders.values().filter(|o| o.tenant_id == tenant_id) {
            summary.order_count += 1;
            if order.status != OrderStatus::Cancelled {
                summary.revenue += order.total;
            }
            *summary.by_status.entry(order.status.as_str().to_string()).or_insert(0) += 1;
        }
        Ok(summary)
    }
}

// ---------------------------------------------------------------------------
// Tickets
// ---------------------------------------------------------------------------

#[async_trait]
impl TicketStore for MemoryStore {
    async fn create(&self, scope: TicketScope, new: NewTicket) -> Result<TicketThread, DatabaseError> {
        let now = Utc::now();
        let ticket = Ticket {
            id: Uuid::new_v4(),
            scope,
            tenant_id: new.tenant_id,
            requester_id: new.requester_id,
            requester_email: new.requester_email,
            requester_name: new.requester_name.clone(),
            subject: new.subject,
            status: TicketStatus::Open,
            priority: new.priority,
            created_at: now,
            updated_at: now,
        };
        let message = TicketMessage {
            id: Uuid::new_v4(),
            ticket_id: ticket.id,
            author_id: new.requester_id,
            author_name: new.requester_name,
            is_staff: false,
            body: new.message,
            created_at: now,
        };

        let mut data = self.data.write().await;
        data.tickets.insert((scope, ticket.id), ticket.clone());
        data.ticket_messages.push((scope, message.clone()));
        Ok(TicketThread {
            ticket,
            messages: vec![message],
        })
    }

    async fn get(&self, scope: TicketScope, id: Uuid) -> Result<Option<TicketThread>, DatabaseError> {
        let data = self.data.read().await;
        let Some(ticket) = data.tickets.get(&(scope, id)) else {
            return Ok(None);
        };
        let messages = data
            .ticket_messages
            .iter()
            .filter(|(s, m)| *s == scope && m.ticket_id == id)
            .map(|(_, m)| m.clone())
            .collect();
        Ok(Some(TicketThread {
            ticket: ticket.clone(),
            messages,
        }))
    }

    async fn list(
        &self,
        scope: TicketScope,
        tenant_id: Option<Uuid>,
        status: Option<TicketStatus>,
    ) -> Result<Vec<Ticket>, DatabaseError> {
        let data = self.data.read().await;
        let mut tickets: Vec<Ticket> = data
            .tickets
            .values()
            .filter(|t| {
                t.scope == scope
                    && tenant_id.map_or(true, |id| t.tenant_id == id)
                    && status.map_or(true, |s| t.status == s)
            })
            .cloned()
            .collect();
        tickets.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(tickets)
    }

    async fn add_message(
        &self,
        scope: TicketScope,
        ticket_id: Uuid,
        message: NewTicketMessage,
    ) -> Result<TicketMessage, DatabaseError> {
        let mut data = self.data.write().await;
        let now = Utc::now();
        let ticket = data
            .tickets
            .get_mut(&(scope, ticket_id))
            .ok_or_else(|| not_found("Ticket", ticket_id))?;
        ticket.updated_at = now;

        let message = TicketMessage {
            id: Uuid::new_v4(),
            ticket_id,
            author_id: message.author_id,
            author_name: message.author_name,
            is_staff: message.is_staff,
            body: message.body,
            created_at: now,
        };
        data.ticket_messages.push((scope, message.clone()));
        Ok(message)
    }

    async fn update(
        &self,
        scope: TicketScope,
        id: Uuid,
        status: Option<TicketStatus>,
        priority: Option<TicketPriority>,
    ) -> Result<Ticket, DatabaseError> {
        let mut data = self.data.write().await;
        let ticket = data.tickets.get_mut(&(scope, id)).ok_or_else(|| not_found("Ticket", id))?;
        if let Some(s) = status {
            ticket.status = s;
        }
        if let Some(p) = priority {
            ticket.priority = p;
        }
        ticket.updated_at = Utc::now();
        Ok(ticket.clone())
    }
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

fn visible_to(n: &Notification, tenant_id: Uuid, user_id: Uuid) -> bool {
    n.tenant_id == tenant_id && n.user_id.map_or(true, |u| u == user_id)
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn create(&self, new: NewNotification) -> Result<Notification, DatabaseError> {
        let notification = Notification {
            id: Uuid::new_v4(),
            tenant_id: new.tenant_id,
            user_id: new.user_id,
            kind: new.kind,
            title: new.title,
            message: new.message,
            link: new.link,
            read_at: None,
            created_at: Utc::now(),
        };
        self.data.write().await.notifications.push(notification.clone());
        Ok(notification)
    }

    async fn list(&self, tenant_id: Uuid, user_id: Uuid, unread_only: bool) -> Result<Vec<Notification>, DatabaseError> {
        let data = self.data.read().await;
        Ok(data
            .notifications
            .iter()
            .rev()
            .filter(|n| visible_to(n, tenant_id, user_id) && (!unread_only || n.read_at.is_none()))
            .take(200)
            .cloned()
            .collect())
    }

    async fn mark_read(&self, tenant_id: Uuid, user_id: Uuid, id: Uuid) -> Result<bool, DatabaseError> {
        let mut data = self.data.write().await;
        match data
            .notifications
            .iter_mut()
            .find(|n| n.id == id && visible_to(n, tenant_id, user_id))
        {
            Some(n) => {
                n.read_at.get_or_insert_with(Utc::now);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_all_read(&self, tenant_id: Uuid, user_id: Uuid) -> Result<u64, DatabaseError> {
        let mut data = self.data.write().await;
        let now = Utc::now();
        let mut count = 0;
        for n in data
            .notifications
            .iter_mut()
            .filter(|n| n.read_at.is_none() && visible_to(n, tenant_id, user_id))
        {
            n.read_at = Some(now);
            count += 1;
        }
        Ok(count)
    }
}
