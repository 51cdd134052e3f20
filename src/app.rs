//! Shared state, router assembly and background jobs.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{HeaderName, HeaderValue, StatusCode},
    middleware::{from_fn, from_fn_with_state},
    response::{IntoResponse, Json},
    routing::{get, post, put},
    Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};

use crate::config::{AppConfig, SecurityConfig, StorageBackend};
use crate::database::{DatabaseManager, Stores};
use crate::handlers::{elevated, protected, public};
use crate::middleware::{
    jwt_auth_middleware, require_landlord, resolve_storefront_middleware, validate_tenant_middleware,
};
use crate::services::cart::{CartStore, SESSION_HEADER};
use crate::services::domains::{DomainProvider, VercelClient};
use crate::services::email::Emails;
use crate::services::mailer::{LogMailer, Mailer, SmtpMailer};
use crate::services::subscription;

const CART_PURGE_INTERVAL: Duration = Duration::from_secs(300);

/// Per-request state; every field is cheap to clone
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub stores: Stores,
    pub emails: Emails,
    pub domains: Option<Arc<dyn DomainProvider>>,
    pub carts: Arc<CartStore>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        stores: Stores,
        mailer: Arc<dyn Mailer>,
        domains: Option<Arc<dyn DomainProvider>>,
    ) -> anyhow::Result<Self> {
        let carts = Arc::new(CartStore::new(config.cart.ttl_minutes));
        Ok(Self {
            config: Arc::new(config),
            stores,
            emails: Emails::new(mailer)?,
            domains,
            carts,
        })
    }

    /// Wires storage, mail and the domain provider from configuration
    pub async fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let stores = match config.database.storage {
            StorageBackend::Memory => {
                info!("Using in-memory storage; data is lost on restart");
                Stores::memory()
            }
            StorageBackend::Postgres => {
                let pool = DatabaseManager::connect(&config.database).await?;
                if config.database.run_migrations {
                    DatabaseManager::migrate(&pool).await?;
                }
                Stores::postgres(pool)
            }
        };

        let mailer: Arc<dyn Mailer> = match SmtpMailer::from_config(&config.email)? {
            Some(smtp) => Arc::new(smtp),
            None => {
                info!("SMTP not configured; emails will be logged only");
                Arc::new(LogMailer)
            }
        };

        let domains = VercelClient::from_config(&config.domains)?
            .map(|client| Arc::new(client) as Arc<dyn DomainProvider>);
        if domains.is_none() {
            info!("Domain provider not configured; custom domain endpoints will return 503");
        }

        Self::new(config, stores, mailer, domains)
    }
}

pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.security);

    let router = Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(public_routes())
        .merge(storefront_routes(state.clone()))
        // Protected
        .merge(session_routes(state.clone()))
        .merge(tenant_routes(state.clone()))
        // Elevated
        .merge(landlord_routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    match cors {
        Some(cors) => router.layer(cors),
        None => router,
    }
}

fn cors_layer(security: &SecurityConfig) -> Option<CorsLayer> {
    if !security.enable_cors {
        return None;
    }
    let layer = CorsLayer::new()
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([HeaderName::from_static(SESSION_HEADER)]);

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();
    Some(if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(origins))
    })
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(public::auth::login))
        .route("/plans", get(public::plans::list))
}

fn storefront_routes(state: AppState) -> Router<AppState> {
    use public::storefront as store;

    Router::new()
        .route("/store", get(store::info))
        .route("/store/products", get(store::products))
        .route("/store/products/:id", get(store::product))
        .route("/store/cart", get(store::cart_get).delete(store::cart_clear))
        .route("/store/cart/items", post(store::cart_add))
        .route(
            "/store/cart/items/:line_id",
            put(store::cart_update).delete(store::cart_remove),
        )
        .route("/store/checkout", post(store::checkout))
        .route("/store/tickets", post(store::open_ticket))
        .route_layer(from_fn_with_state(state, resolve_storefront_middleware))
}

/// Any signed-in account, landlord included
fn session_routes(state: AppState) -> Router<AppState> {
    use protected::auth;

    Router::new()
        .route("/api/auth/whoami", get(auth::whoami))
        .route("/api/auth/password", put(auth::change_password))
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}

fn tenant_routes(state: AppState) -> Router<AppState> {
    use protected::{
        dashboard, domain, inventory, notifications, orders, products, subscription, support, tickets, users,
    };

    Router::new()
        .route("/api/dashboard", get(dashboard::show))
        .route("/api/subscription", get(subscription::show))
        // Catalog
        .route("/api/products", get(products::list).post(products::create))
        .route(
            "/api/products/:id",
            get(products::show).put(products::update).delete(products::archive),
        )
        .route(
            "/api/products/:id/variants",
            get(products::variants).post(products::create_variant),
        )
        // Inventory
        .route("/api/inventory/adjust", post(inventory::adjust))
        .route("/api/inventory/history", get(inventory::history))
        .route("/api/inventory/low-stock", get(inventory::low_stock))
        // Orders
        .route("/api/orders", get(orders::list))
        .route("/api/orders/:id", get(orders::show))
        .route("/api/orders/:id/status", put(orders::update_status))
        // Customer tickets
        .route("/api/tickets", get(tickets::list))
        .route("/api/tickets/:id", get(tickets::show).put(tickets::update))
        .route("/api/tickets/:id/messages", post(tickets::reply))
        // Tickets to the platform
        .route("/api/support", get(support::list).post(support::open))
        .route("/api/support/:id", get(support::show))
        .route("/api/support/:id/messages", post(support::reply))
        // Notifications
        .route("/api/notifications", get(notifications::list))
        .route("/api/notifications/read-all", post(notifications::mark_all_read))
        .route("/api/notifications/:id/read", post(notifications::mark_read))
        // Team
        .route("/api/users", get(users::list).post(users::create))
        .route("/api/users/:id", put(users::update).delete(users::deactivate))
        // Custom domain
        .route("/api/domain", get(domain::show).put(domain::set).delete(domain::remove))
        .route("/api/domain/verify", post(domain::verify))
        .route_layer(from_fn_with_state(state.clone(), validate_tenant_middleware))
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}

fn landlord_routes(state: AppState) -> Router<AppState> {
    use elevated::{plans, tenant, tickets, users};

    Router::new()
        .route("/api/admin/tenants", get(tenant::tenant_list).post(tenant::tenant_create))
        .route(
            "/api/admin/tenants/:id",
            get(tenant::tenant_show)
                .put(tenant::tenant_update)
                .delete(tenant::tenant_delete),
        )
        .route("/api/admin/tenants/:id/restore", post(tenant::tenant_restore))
        .route("/api/admin/tenants/:id/subscription", post(tenant::tenant_subscribe))
        .route("/api/admin/plans", get(plans::list).post(plans::create))
        .route(
            "/api/admin/plans/:id",
            get(plans::show).put(plans::update).delete(plans::deactivate),
        )
        .route("/api/admin/users", get(users::list))
        .route("/api/admin/users/:id", put(users::update))
        .route("/api/admin/tickets", get(tickets::list))
        .route("/api/admin/tickets/:id", get(tickets::show).put(tickets::update))
        .route("/api/admin/tickets/:id/messages", post(tickets::reply))
        .route_layer(from_fn(require_landlord))
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}

async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "StoreFlow API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Multi-tenant e-commerce backend",
            "endpoints": {
                "auth": "/auth/login (public)",
                "plans": "/plans (public)",
                "store": "/store/* (public, store resolved from Host)",
                "session": "/api/auth/* (any signed-in account)",
                "dashboard": "/api/* (store accounts)",
                "admin": "/api/admin/* (landlord)",
            }
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    let Some(pool) = &state.stores.pool else {
        return (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": { "status": "ok", "timestamp": now, "database": "memory" }
            })),
        );
    };

    match DatabaseManager::health_check(pool).await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": { "status": "ok", "timestamp": now, "database": "ok" }
            })),
        ),
        Err(e) => {
            error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "error": true,
                    "message": "database unavailable",
                    "code": "SERVICE_UNAVAILABLE",
                    "data": { "status": "degraded", "timestamp": now }
                })),
            )
        }
    }
}

/// Subscription expiry sweep and cart purge
pub fn spawn_background_tasks(state: &AppState) {
    let sweep_state = state.clone();
    let every = Duration::from_secs(state.config.subscription.expiry_sweep_secs.max(1));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            match subscription::expire_overdue(&sweep_state.stores).await {
                Ok(0) => {}
                Ok(n) => info!("Expired {} tenant subscription(s)", n),
                Err(e) => error!("Subscription sweep failed: {}", e),
            }
        }
    });

    let carts = state.carts.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CART_PURGE_INTERVAL);
        loop {
            interval.tick().await;
            let purged = carts.purge_expired().await;
            if purged > 0 {
                info!("Purged {} idle cart(s)", purged);
            }
        }
    });
}
