use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{AdjustmentType, ProductStatus};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub sku: Option<String>,
    pub price: Decimal,
    pub stock_quantity: i32,
    pub status: ProductStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductVariant {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub product_id: Uuid,
    pub name: String,
    pub sku: Option<String>,
    /// `None` inherits the product price
    pub price: Option<Decimal>,
    pub stock_quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductVariant {
    pub fn effective_price(&self, product: &Product) -> Decimal {
        self.price.unwrap_or(product.price)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductWithVariants {
    #[serde(flatten)]
    pub product: Product,
    pub variants: Vec<ProductVariant>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub sku: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub stock_quantity: i32,
    #[serde(default = "default_product_status")]
    pub status: ProductStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub sku: Option<String>,
    pub price: Option<Decimal>,
    pub status: Option<ProductStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewVariant {
    pub name: String,
    pub sku: Option<String>,
    pub price: Option<Decimal>,
    #[serde(default)]
    pub stock_quantity: i32,
}

/// Audit row written for every stock change
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryHistory {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub adjustment_type: AdjustmentType,
    pub quantity_before: i32,
    pub quantity_after: i32,
    pub quantity_change: i32,
    pub reason: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

fn default_product_status() -> ProductStatus {
    ProductStatus::Active
}
