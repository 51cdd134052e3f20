//! Storefront carts.
//!
//! Carts live in process memory, keyed by a server-issued session id and
//! scoped to the tenant that issued it. Idle carts expire after the
//! configured TTL; they are dropped on access and by the periodic purge.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::models::{Product, ProductVariant};
use crate::database::{DatabaseError, Stores};
use crate::types::ProductStatus;

pub const SESSION_HEADER: &str = "x-cart-session";

/// Most units of one item a single cart line may hold
pub const MAX_LINE_QUANTITY: i32 = 10_000;

#[derive(Debug, thiserror::Error)]
pub enum CartError {
    #[error("Quantity must be between 1 and {MAX_LINE_QUANTITY}")]
    InvalidQuantity,

    #[error("Cart line {0} not found")]
    LineNotFound(Uuid),

    #[error("{0} is not available")]
    Unavailable(String),

    #[error("Only {available} of {name} in stock")]
    InsufficientStock { name: String, available: i32 },

    #[error("Cart is empty")]
    Empty,

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

#[derive(Debug, Clone, Serialize)]
pub struct CartLine {
    pub line_id: Uuid,
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub name: String,
    pub sku: Option<String>,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub line_total: Decimal,
}

fn line_total(unit_price: Decimal, quantity: i32) -> Result<Decimal, CartError> {
    unit_price
        .checked_mul(Decimal::from(quantity))
        .ok_or(CartError::InvalidQuantity)
}

impl CartLine {
    fn set_quantity(&mut self, quantity: i32) -> Result<(), CartError> {
        self.line_total = line_total(self.unit_price, quantity)?;
        self.quantity = quantity;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Cart {
    pub session_id: Uuid,
    #[serde(skip)]
    pub tenant_id: Uuid,
    pub lines: Vec<CartLine>,
    pub subtotal: Decimal,
    pub item_count: i32,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    fn new(tenant_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            tenant_id,
            lines: Vec::new(),
            subtotal: Decimal::ZERO,
            item_count: 0,
            updated_at: now,
        }
    }

    fn recompute(&mut self, now: DateTime<Utc>) -> Result<(), CartError> {
        let mut subtotal = Decimal::ZERO;
        let mut item_count = 0i32;
        for line in &self.lines {
            subtotal = subtotal.checked_add(line.line_total).ok_or(CartError::InvalidQuantity)?;
            item_count = item_count.checked_add(line.quantity).ok_or(CartError::InvalidQuantity)?;
        }
        self.subtotal = subtotal;
        self.item_count = item_count;
        self.updated_at = now;
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// What an add resolves to after the catalog lookup
#[derive(Debug, Clone)]
pub struct PricedItem {
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub name: String,
    pub sku: Option<String>,
    pub unit_price: Decimal,
    pub available: i32,
}

impl PricedItem {
    pub fn new(product: &Product, variant: Option<&ProductVariant>) -> Self {
        match variant {
            Some(v) => Self {
                product_id: product.id,
                variant_id: Some(v.id),
                name: format!("{} - {}", product.name, v.name),
                sku: v.sku.clone().or_else(|| product.sku.clone()),
                unit_price: v.effective_price(product),
                available: v.stock_quantity,
            },
            None => Self {
                product_id: product.id,
                variant_id: None,
                name: product.name.clone(),
                sku: product.sku.clone(),
                unit_price: product.price,
                available: product.stock_quantity,
            },
        }
    }
}

/// Looks up an active product (and variant) for the storefront
pub async fn price_item(
    stores: &Stores,
    tenant_id: Uuid,
    product_id: Uuid,
    variant_id: Option<Uuid>,
) -> Result<PricedItem, CartError> {
    let product = stores
        .catalog
        .get_product(tenant_id, product_id)
        .await?
        .filter(|p| p.status == ProductStatus::Active)
        .ok_or_else(|| CartError::Unavailable(format!("Product {}", product_id)))?;

    let variant = match variant_id {
        Some(id) => Some(
            stores
                .catalog
                .get_variant(tenant_id, id)
                .await?
                .filter(|v| v.product_id == product.id)
                .ok_or_else(|| CartError::Unavailable(format!("Variant {}", id)))?,
        ),
        None => None,
    };
    Ok(PricedItem::new(&product, variant.as_ref()))
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddItem {
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    #[serde(default = "one")]
    pub quantity: i32,
}

fn one() -> i32 {
    1
}

pub struct CartStore {
    carts: RwLock<HashMap<Uuid, Cart>>,
    ttl: Duration,
}

impl CartStore {
    pub fn new(ttl_minutes: i64) -> Self {
        Self {
            carts: RwLock::new(HashMap::new()),
            ttl: Duration::minutes(ttl_minutes.max(1)),
        }
    }

    fn is_live(&self, cart: &Cart, tenant_id: Uuid, now: DateTime<Utc>) -> bool {
        cart.tenant_id == tenant_id && now - cart.updated_at < self.ttl
    }

    /// Existing cart for the session, if it belongs to this tenant and has not idled out
    pub async fn get(&self, tenant_id: Uuid, session_id: Uuid) -> Option<Cart> {
        let now = Utc::now();
        let carts = self.carts.read().await;
        carts
            .get(&session_id)
            .filter(|c| self.is_live(c, tenant_id, now))
            .cloned()
    }

    /// Session id of the live cart, creating one when needed; runs under
    /// the caller's write guard
    fn live_or_new(
        &self,
        carts: &mut HashMap<Uuid, Cart>,
        tenant_id: Uuid,
        session_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Uuid {
        if let Some(id) = session_id {
            match carts.get(&id) {
                Some(cart) if self.is_live(cart, tenant_id, now) => return id,
                Some(cart) if cart.tenant_id == tenant_id => {
                    carts.remove(&id);
                }
                _ => {}
            }
        }
        let cart = Cart::new(tenant_id, now);
        let id = cart.session_id;
        carts.insert(id, cart);
        id
    }

    /// Returns the session's cart, or a fresh empty one with a new session id
    pub async fn get_or_create(&self, tenant_id: Uuid, session_id: Option<Uuid>) -> Cart {
        let now = Utc::now();
        let mut carts = self.carts.write().await;
        let id = self.live_or_new(&mut carts, tenant_id, session_id, now);
        match carts.get(&id) {
            Some(cart) => cart.clone(),
            None => Cart::new(tenant_id, now),
        }
    }

    pub async fn add(
        &self,
        tenant_id: Uuid,
        session_id: Option<Uuid>,
        item: PricedItem,
        quantity: i32,
    ) -> Result<Cart, CartError> {
        if !(1..=MAX_LINE_QUANTITY).contains(&quantity) {
            return Err(CartError::InvalidQuantity);
        }

        let now = Utc::now();
        let mut carts = self.carts.write().await;
        let session_id = self.live_or_new(&mut carts, tenant_id, session_id, now);
        let cart = carts.get_mut(&session_id).ok_or(CartError::Empty)?;

        let mut next = cart.clone();
        let existing = next
            .lines
            .iter()
            .position(|l| l.product_id == item.product_id && l.variant_id == item.variant_id);
        let wanted = existing.map_or(0, |i| next.lines[i].quantity).saturating_add(quantity);
        if wanted > MAX_LINE_QUANTITY {
            return Err(CartError::InvalidQuantity);
        }
        if wanted > item.available {
            return Err(CartError::InsufficientStock {
                name: item.name,
                available: item.available,
            });
        }

        match existing {
            Some(i) => next.lines[i].set_quantity(wanted)?,
            None => next.lines.push(CartLine {
                line_id: Uuid::new_v4(),
                product_id: item.product_id,
                variant_id: item.variant_id,
                line_total: line_total(item.unit_price, quantity)?,
                name: item.name,
                sku: item.sku,
                unit_price: item.unit_price,
                quantity,
            }),
        }
        next.recompute(now)?;
        *cart = next.clone();
        Ok(next)
    }

    /// Line behind `line_id` in a live cart
    pub async fn line(&self, tenant_id: Uuid, session_id: Uuid, line_id: Uuid) -> Result<CartLine, CartError> {
        self.get(tenant_id, session_id)
            .await
            .and_then(|cart| cart.lines.into_iter().find(|l| l.line_id == line_id))
            .ok_or(CartError::LineNotFound(line_id))
    }

    /// Sets a line's quantity; `available` is the current stock of the
    /// line's product or variant. Quantity 0 removes the line.
    pub async fn update(
        &self,
        tenant_id: Uuid,
        session_id: Uuid,
        line_id: Uuid,
        quantity: i32,
        available: i32,
    ) -> Result<Cart, CartError> {
        if !(0..=MAX_LINE_QUANTITY).contains(&quantity) {
            return Err(CartError::InvalidQuantity);
        }
        let now = Utc::now();
        let mut carts = self.carts.write().await;
        let cart = carts
            .get_mut(&session_id)
            .filter(|c| self.is_live(c, tenant_id, now))
            .ok_or(CartError::LineNotFound(line_id))?;
        let index = cart
            .lines
            .iter()
            .position(|l| l.line_id == line_id)
            .ok_or(CartError::LineNotFound(line_id))?;

        let mut next = cart.clone();
        if quantity == 0 {
            next.lines.remove(index);
        } else {
            let line = &mut next.lines[index];
            if quantity > available {
                return Err(CartError::InsufficientStock {
                    name: line.name.clone(),
                    available,
                });
            }
            line.set_quantity(quantity)?;
        }
        next.recompute(now)?;
        *cart = next.clone();
        Ok(next)
    }

    pub async fn remove(&self, tenant_id: Uuid, session_id: Uuid, line_id: Uuid) -> Result<Cart, CartError> {
        self.update(tenant_id, session_id, line_id, 0, 0).await
    }

    /// Empties the cart but keeps the session
    pub async fn clear(&self, tenant_id: Uuid, session_id: Uuid) -> Option<Cart> {
        let now = Utc::now();
        let mut carts = self.carts.write().await;
        let cart = carts
            .get_mut(&session_id)
            .filter(|c| self.is_live(c, tenant_id, now))?;
        cart.lines.clear();
        cart.subtotal = Decimal::ZERO;
        cart.item_count = 0;
        cart.updated_at = now;
        Some(cart.clone())
    }

    /// Drops idle carts; returns how many were removed
    pub async fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut carts = self.carts.write().await;
        let before = carts.len();
        carts.retain(|_, c| now - c.updated_at < self.ttl);
        before - carts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(price: i64, available: i32) -> PricedItem {
        PricedItem {
            product_id: Uuid::new_v4(),
            variant_id: None,
            name: "Mug".into(),
            sku: None,
            unit_price: Decimal::new(price, 2),
            available,
        }
    }

    #[tokio::test]
    async fn adding_same_item_merges_lines() {
        let store = CartStore::new(60);
        let tenant = Uuid::new_v4();
        let mug = item(1250, 10);

        let cart = store.add(tenant, None, mug.clone(), 2).await.unwrap();
        let cart = store.add(tenant, Some(cart.session_id), mug, 3).await.unwrap();

        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.item_count, 5);
        assert_eq!(cart.subtotal, Decimal::new(6250, 2));
    }

    #[tokio::test]
    async fn cannot_add_more_than_stock() {
        let store = CartStore::new(60);
        let tenant = Uuid::new_v4();
        let mug = item(100, 3);
        let cart = store.add(tenant, None, mug.clone(), 2).await.unwrap();
        let err = store.add(tenant, Some(cart.session_id), mug, 2).await.unwrap_err();
        assert!(matches!(err, CartError::InsufficientStock { available: 3, .. }));
    }

    #[tokio::test]
    async fn cannot_update_past_stock() {
        let store = CartStore::new(60);
        let tenant = Uuid::new_v4();
        let cart = store.add(tenant, None, item(100, 2), 1).await.unwrap();
        let line = cart.lines[0].line_id;

        let err = store
            .update(tenant, cart.session_id, line, 1_000, 2)
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::InsufficientStock { available: 2, .. }));

        let cart = store.get(tenant, cart.session_id).await.unwrap();
        assert_eq!(cart.item_count, 1);
        let cart = store.update(tenant, cart.session_id, line, 2, 2).await.unwrap();
        assert_eq!(cart.item_count, 2);
    }

    #[tokio::test]
    async fn huge_quantities_are_rejected_without_touching_the_cart() {
        let store = CartStore::new(60);
        let tenant = Uuid::new_v4();
        let cart = store.add(tenant, None, item(100, i32::MAX), 1).await.unwrap();
        let cart = store.add(tenant, Some(cart.session_id), item(100, i32::MAX), 1).await.unwrap();

        for line in cart.lines.iter().map(|l| l.line_id) {
            let err = store
                .update(tenant, cart.session_id, line, i32::MAX, i32::MAX)
                .await
                .unwrap_err();
            assert!(matches!(err, CartError::InvalidQuantity));
        }
        let err = store
            .add(tenant, Some(cart.session_id), item(100, i32::MAX), MAX_LINE_QUANTITY + 1)
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::InvalidQuantity));

        let cart = store.get(tenant, cart.session_id).await.unwrap();
        assert_eq!(cart.item_count, 2);
    }

    #[tokio::test]
    async fn line_total_overflow_is_an_error() {
        let store = CartStore::new(60);
        let tenant = Uuid::new_v4();
        let mut pricey = item(1, 100);
        pricey.unit_price = Decimal::MAX;

        let err = store.add(tenant, None, pricey, 2).await.unwrap_err();
        assert!(matches!(err, CartError::InvalidQuantity));
    }

    #[tokio::test]
    async fn add_to_unknown_session_starts_a_new_cart() {
        let store = CartStore::new(60);
        let tenant = Uuid::new_v4();
        let stale = Uuid::new_v4();

        let cart = store.add(tenant, Some(stale), item(100, 5), 1).await.unwrap();
        assert_ne!(cart.session_id, stale);
        assert_eq!(store.get(tenant, cart.session_id).await.unwrap().item_count, 1);
    }

    #[tokio::test]
    async fn zero_quantity_update_removes_line() {
        let store = CartStore::new(60);
        let tenant = Uuid::new_v4();
        let cart = store.add(tenant, None, item(500, 5), 1).await.unwrap();
        let line = cart.lines[0].line_id;

        let cart = store.update(tenant, cart.session_id, line, 0, 5).await.unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.subtotal, Decimal::ZERO);
    }

    #[tokio::test]
    async fn sessions_are_tenant_scoped() {
        let store = CartStore::new(60);
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let cart = store.add(a, None, item(500, 5), 1).await.unwrap();

        assert!(store.get(b, cart.session_id).await.is_none());
        let other = store.get_or_create(b, Some(cart.session_id)).await;
        assert_ne!(other.session_id, cart.session_id);
        assert!(store.get(a, cart.session_id).await.is_some());
    }

    #[tokio::test]
    async fn zero_add_is_rejected() {
        let store = CartStore::new(60);
        let err = store.add(Uuid::new_v4(), None, item(1, 1), 0).await.unwrap_err();
        assert!(matches!(err, CartError::InvalidQuantity));
    }
}
