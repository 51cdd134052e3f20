use anyhow::Context;
use storeflow::app::{self, AppState};
use storeflow::services::accounts;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("storeflow=info,tower_http=info")),
        )
        .init();

    let config = storeflow::config::config().clone();
    info!("Starting StoreFlow API in {:?} mode", config.environment);
    let port = config.server.port;

    let state = AppState::from_config(config).await?;

    // First-run bootstrap; the CLI covers everything else
    if let (Ok(email), Ok(password)) = (std::env::var("LANDLORD_EMAIL"), std::env::var("LANDLORD_PASSWORD")) {
        match accounts::ensure_landlord(&state.stores, &email, &password, "Platform Admin").await {
            Ok(true) => info!("Seeded landlord account {}", email),
            Ok(false) => {}
            Err(e) => warn!("Could not seed landlord account {}: {}", email, e),
        }
    }

    app::spawn_background_tasks(&state);
    let router = app::router(state);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    info!("StoreFlow API listening on http://{}", bind_addr);
    axum::serve(listener, router).await.context("server error")?;
    Ok(())
}
