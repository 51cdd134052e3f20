// handlers/public/storefront.rs - /store/* handlers
//
// The store comes from the Host header (see middleware::storefront). Cart
// requests identify the cart with the x-cart-session header; every cart
// response echoes the session id back in that header.

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app::AppState;
use crate::database::models::{OrderWithItems, Product, ProductWithVariants, TicketThread};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, Storefront};
use crate::services::cart::{self, AddItem, Cart, SESSION_HEADER};
use crate::services::orders::{self, CheckoutRequest};
use crate::services::tickets::{self, OpenTicket};
use crate::types::ProductStatus;

#[derive(Debug, Serialize)]
pub struct StoreInfo {
    pub name: String,
    pub subdomain: String,
    pub custom_domain: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateLine {
    pub quantity: i32,
}

fn session_from(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v.trim()).ok())
}

fn require_session(headers: &HeaderMap) -> Result<Uuid, ApiError> {
    session_from(headers).ok_or_else(|| ApiError::bad_request(format!("Missing or invalid {} header", SESSION_HEADER)))
}

fn cart_response(cart: Cart) -> ApiResponse<Cart> {
    let session = cart.session_id.to_string();
    ApiResponse::success(cart).header(SESSION_HEADER, session)
}

/// GET /store - public store details
pub async fn info(Extension(Storefront(tenant)): Extension<Storefront>) -> ApiResult<StoreInfo> {
    Ok(ApiResponse::success(StoreInfo {
        name: tenant.name,
        subdomain: tenant.subdomain,
        custom_domain: tenant.custom_domain.filter(|_| tenant.domain_verified),
    }))
}

/// GET /store/products - active products only
pub async fn products(
    State(state): State<AppState>,
    Extension(Storefront(tenant)): Extension<Storefront>,
) -> ApiResult<Vec<Product>> {
    let products = state
        .stores
        .catalog
        .list_products(tenant.id, Some(ProductStatus::Active))
        .await?;
    Ok(ApiResponse::success(products))
}

/// GET /store/products/:id - product with its variants; drafts and archived
/// products are 404 here
pub async fn product(
    State(state): State<AppState>,
    Extension(Storefront(tenant)): Extension<Storefront>,
    Path(id): Path<Uuid>,
) -> ApiResult<ProductWithVariants> {
    let catalog = &state.stores.catalog;
    let product = catalog
        .get_product(tenant.id, id)
        .await?
        .filter(|p| p.status == ProductStatus::Active)
        .ok_or_else(|| ApiError::not_found(format!("Product {} not found", id)))?;
    let variants = catalog.list_variants(tenant.id, id).await?;
    Ok(ApiResponse::success(ProductWithVariants { product, variants }))
}

/// GET /store/cart - current cart, or a fresh one when the session is
/// missing or expired
pub async fn cart_get(
    State(state): State<AppState>,
    Extension(Storefront(tenant)): Extension<Storefront>,
    headers: HeaderMap,
) -> ApiResult<Cart> {
    let cart = state.carts.get_or_create(tenant.id, session_from(&headers)).await;
    Ok(cart_response(cart))
}

/// POST /store/cart/items - add a product or variant
pub async fn cart_add(
    State(state): State<AppState>,
    Extension(Storefront(tenant)): Extension<Storefront>,
    headers: HeaderMap,
    Json(request): Json<AddItem>,
) -> ApiResult<Cart> {
    let item = cart::price_item(&state.stores, tenant.id, request.product_id, request.variant_id).await?;
    let cart = state
        .carts
        .add(tenant.id, session_from(&headers), item, request.quantity)
        .await?;
    Ok(cart_response(cart))
}

/// PUT /store/cart/items/:line_id - set a line's quantity; 0 removes it.
/// The new quantity is checked against current stock.
pub async fn cart_update(
    State(state): State<AppState>,
    Extension(Storefront(tenant)): Extension<Storefront>,
    headers: HeaderMap,
    Path(line_id): Path<Uuid>,
    Json(request): Json<UpdateLine>,
) -> ApiResult<Cart> {
    let session = require_session(&headers)?;
    if request.quantity == 0 {
        let cart = state.carts.remove(tenant.id, session, line_id).await?;
        return Ok(cart_response(cart));
    }

    let line = state.carts.line(tenant.id, session, line_id).await?;
    let item = cart::price_item(&state.stores, tenant.id, line.product_id, line.variant_id).await?;
    let cart = state
        .carts
        .update(tenant.id, session, line_id, request.quantity, item.available)
        .await?;
    Ok(cart_response(cart))
}

/// DELETE /store/cart/items/:line_id
pub async fn cart_remove(
    State(state): State<AppState>,
    Extension(Storefront(tenant)): Extension<Storefront>,
    headers: HeaderMap,
    Path(line_id): Path<Uuid>,
) -> ApiResult<Cart> {
    let session = require_session(&headers)?;
    let cart = state.carts.remove(tenant.id, session, line_id).await?;
    Ok(cart_response(cart))
}

/// DELETE /store/cart - empty the cart, keeping the session
pub async fn cart_clear(
    State(state): State<AppState>,
    Extension(Storefront(tenant)): Extension<Storefront>,
    headers: HeaderMap,
) -> ApiResult<Cart> {
    let session = require_session(&headers)?;
    let cart = match state.carts.clear(tenant.id, session).await {
        Some(cart) => cart,
        None => state.carts.get_or_create(tenant.id, None).await,
    };
    Ok(cart_response(cart))
}

/// POST /store/checkout - turn the session's cart into an order
pub async fn checkout(
    State(state): State<AppState>,
    Extension(Storefront(tenant)): Extension<Storefront>,
    headers: HeaderMap,
    Json(request): Json<CheckoutRequest>,
) -> ApiResult<OrderWithItems> {
    let session = require_session(&headers)?;
    if request.customer_name.trim().is_empty() {
        return Err(ApiError::field("customer_name", "is required"));
    }
    if !request.customer_email.contains('@') {
        return Err(ApiError::field("customer_email", "is not a valid address"));
    }

    let order = orders::checkout(&state.stores, &state.emails, &state.carts, &tenant, session, request).await?;
    Ok(ApiResponse::created(order))
}

/// POST /store/tickets - a customer contacts the store
pub async fn open_ticket(
    State(state): State<AppState>,
    Extension(Storefront(tenant)): Extension<Storefront>,
    Json(request): Json<OpenTicket>,
) -> ApiResult<TicketThread> {
    let thread = tickets::open_store_ticket(&state.stores, &state.emails, &tenant, request).await?;
    Ok(ApiResponse::created(thread))
}
