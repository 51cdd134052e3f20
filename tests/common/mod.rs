#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use storeflow::app::{self, AppState};
use storeflow::config::{AppConfig, StorageBackend};
use storeflow::database::Stores;
use storeflow::services::accounts;
use storeflow::services::mailer::OutboxMailer;

pub const LANDLORD_EMAIL: &str = "landlord@storeflow.test";
pub const LANDLORD_PASSWORD: &str = "landlord-password";

// ---------------------------------------------------------------------------
// Spawned binary (smoke tests)
// ---------------------------------------------------------------------------

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        // In-memory storage keeps the smoke tests free of a database
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_storeflow"));
        cmd.env("PORT", port.to_string())
            .env("APP_ENV", "development")
            .env("STOREFLOW_STORAGE", "memory")
            .env("LANDLORD_EMAIL", LANDLORD_EMAIL)
            .env("LANDLORD_PASSWORD", LANDLORD_PASSWORD)
            .env_remove("SMTP_HOST")
            .env_remove("VERCEL_TOKEN")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == reqwest::StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

// ---------------------------------------------------------------------------
// In-process router (oneshot tests)
// ---------------------------------------------------------------------------

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }

    pub fn header(&self, name: &str) -> Option<String> {
        self.headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string)
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub outbox: Arc<OutboxMailer>,
}

/// A provisioned store with an admin token
pub struct TestStore {
    pub tenant_id: String,
    pub subdomain: String,
    pub admin_token: String,
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.database.storage = StorageBackend::Memory;
    config.security.enable_cors = false;
    config.inventory.max_bulk_items = 10;
    config
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    pub async fn with_config(config: AppConfig) -> Self {
        let outbox = Arc::new(OutboxMailer::default());
        let state = AppState::new(config, Stores::memory(), outbox.clone(), None).expect("state");
        accounts::ensure_landlord(&state.stores, LANDLORD_EMAIL, LANDLORD_PASSWORD, "Root")
            .await
            .expect("landlord");
        Self {
            router: app::router(state.clone()),
            state,
            outbox,
        }
    }

    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        headers: &[(&str, &str)],
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
        };
        TestResponse { status, headers, body }
    }

    pub async fn get(&self, uri: &str, token: &str) -> TestResponse {
        self.call(Method::GET, uri, Some(token), &[], None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> TestResponse {
        self.call(Method::POST, uri, Some(token), &[], Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> TestResponse {
        self.call(Method::PUT, uri, Some(token), &[], Some(body)).await
    }

    pub async fn login(&self, email: &str, password: &str) -> TestResponse {
        self.call(
            Method::POST,
            "/auth/login",
            None,
            &[],
            Some(json!({ "email": email, "password": password })),
        )
        .await
    }

    pub async fn token(&self, email: &str, password: &str) -> String {
        let res = self.login(email, password).await;
        assert_eq!(res.status, StatusCode::OK, "login failed: {}", res.body);
        res.data()["token"].as_str().expect("token").to_string()
    }

    pub async fn landlord_token(&self) -> String {
        self.token(LANDLORD_EMAIL, LANDLORD_PASSWORD).await
    }

    pub async fn create_plan(&self, landlord: &str, name: &str, months: i32, trial_days: i32) -> String {
        let res = self
            .post(
                "/api/admin/plans",
                landlord,
                json!({ "name": name, "price": "29.00", "duration_months": months, "trial_days": trial_days }),
            )
            .await;
        assert_eq!(res.status, StatusCode::CREATED, "plan create failed: {}", res.body);
        res.data()["id"].as_str().unwrap().to_string()
    }

    /// Provisions an active store (subscribed to a fresh plan) and signs in
    /// its admin
    pub async fn active_store(&self, subdomain: &str) -> TestStore {
        let landlord = self.landlord_token().await;
        let plan_id = self.create_plan(&landlord, &format!("{} plan", subdomain), 1, 0).await;
        let admin_email = format!("admin@{}.test", subdomain);

        let res = self
            .post(
                "/api/admin/tenants",
                &landlord,
                json!({
                    "name": format!("{} store", subdomain),
                    "subdomain": subdomain,
                    "contact_email": format!("owner@{}.test", subdomain),
                    "admin_email": admin_email,
                    "admin_password": "admin-password",
                    "plan_id": plan_id,
                }),
            )
            .await;
        assert_eq!(res.status, StatusCode::CREATED, "tenant create failed: {}", res.body);
        let tenant_id = res.data()["tenant"]["id"].as_str().unwrap().to_string();

        TestStore {
            tenant_id,
            subdomain: subdomain.to_string(),
            admin_token: self.token(&admin_email, "admin-password").await,
        }
    }

    pub async fn create_product(&self, token: &str, name: &str, price: &str, stock: i32) -> String {
        let res = self
            .post(
                "/api/products",
                token,
                json!({ "name": name, "price": price, "stock_quantity": stock }),
            )
            .await;
        assert_eq!(res.status, StatusCode::CREATED, "product create failed: {}", res.body);
        res.data()["id"].as_str().unwrap().to_string()
    }
}
