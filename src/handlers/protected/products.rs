// handlers/protected/products.rs - /api/products handlers
//
// Catalog management for the signed-in store. Stock is not editable here;
// it moves through /api/inventory/adjust so every change lands in history.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::app::AppState;
use crate::database::models::{NewProduct, NewVariant, Product, ProductUpdate, ProductVariant, ProductWithVariants};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, TenantContext};
use crate::services::inventory::MAX_STOCK;
use crate::types::ProductStatus;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<ProductStatus>,
}

fn check_name(name: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::field("name", "is required"));
    }
    Ok(())
}

fn check_price(field: &str, price: Decimal) -> Result<(), ApiError> {
    if price.is_sign_negative() {
        return Err(ApiError::field(field, "must not be negative"));
    }
    Ok(())
}

fn check_stock(stock: i32) -> Result<(), ApiError> {
    if stock < 0 {
        return Err(ApiError::field("stock_quantity", "must not be negative"));
    }
    if stock > MAX_STOCK {
        return Err(ApiError::field("stock_quantity", format!("must not exceed {}", MAX_STOCK)));
    }
    Ok(())
}

/// GET /api/products?status=
pub async fn list(
    State(state): State<AppState>,
    Extension(TenantContext(tenant)): Extension<TenantContext>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Vec<Product>> {
    let products = state.stores.catalog.list_products(tenant.id, query.status).await?;
    Ok(ApiResponse::success(products))
}

/// POST /api/products
pub async fn create(
    State(state): State<AppState>,
    Extension(TenantContext(tenant)): Extension<TenantContext>,
    Json(mut new): Json<NewProduct>,
) -> ApiResult<Product> {
    check_name(&new.name)?;
    check_price("price", new.price)?;
    check_stock(new.stock_quantity)?;
    new.name = new.name.trim().to_string();

    let product = state.stores.catalog.create_product(tenant.id, new).await?;
    tracing::info!("Product {} created for {}", product.id, tenant.subdomain);
    Ok(ApiResponse::created(product))
}

/// GET /api/products/:id - with variants
pub async fn show(
    State(state): State<AppState>,
    Extension(TenantContext(tenant)): Extension<TenantContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<ProductWithVariants> {
    let catalog = &state.stores.catalog;
    let product = catalog
        .get_product(tenant.id, id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Product {} not found", id)))?;
    let variants = catalog.list_variants(tenant.id, id).await?;
    Ok(ApiResponse::success(ProductWithVariants { product, variants }))
}

/// PUT /api/products/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(TenantContext(tenant)): Extension<TenantContext>,
    Path(id): Path<Uuid>,
    Json(update): Json<ProductUpdate>,
) -> ApiResult<Product> {
    if let Some(name) = &update.name {
        check_name(name)?;
    }
    if let Some(price) = update.price {
        check_price("price", price)?;
    }
    let product = state.stores.catalog.update_product(tenant.id, id, update).await?;
    Ok(ApiResponse::success(product))
}

/// DELETE /api/products/:id - archives; order history keeps referencing it
pub async fn archive(
    State(state): State<AppState>,
    Extension(TenantContext(tenant)): Extension<TenantContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Product> {
    let update = ProductUpdate {
        status: Some(ProductStatus::Archived),
        ..Default::default()
    };
    let product = state.stores.catalog.update_product(tenant.id, id, update).await?;
    tracing::info!("Product {} archived for {}", product.id, tenant.subdomain);
    Ok(ApiResponse::success(product))
}

/// GET /api/products/:id/variants
pub async fn variants(
    State(state): State<AppState>,
    Extension(TenantContext(tenant)): Extension<TenantContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<ProductVariant>> {
    let catalog = &state.stores.catalog;
    catalog
        .get_product(tenant.id, id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Product {} not found", id)))?;
    Ok(ApiResponse::success(catalog.list_variants(tenant.id, id).await?))
}

/// POST /api/products/:id/variants - the parent's stock becomes the
/// variant sum
pub async fn create_variant(
    State(state): State<AppState>,
    Extension(TenantContext(tenant)): Extension<TenantContext>,
    Path(id): Path<Uuid>,
    Json(mut new): Json<NewVariant>,
) -> ApiResult<ProductVariant> {
    check_name(&new.name)?;
    if let Some(price) = new.price {
        check_price("price", price)?;
    }
    check_stock(new.stock_quantity)?;
    new.name = new.name.trim().to_string();

    let variant = state.stores.catalog.create_variant(tenant.id, id, new).await?;
    Ok(ApiResponse::created(variant))
}
