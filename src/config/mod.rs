use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub email: EmailConfig,
    pub domains: DomainsConfig,
    pub inventory: InventoryConfig,
    pub cart: CartConfig,
    pub subscription: SubscriptionConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    /// Storefronts live at `<subdomain>.<root_domain>`
    pub root_domain: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub storage: StorageBackend,
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    /// No SMTP host means emails are written to the log instead of sent
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub from_address: String,
    pub from_name: String,
    pub platform_address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainsConfig {
    pub api_base: String,
    pub vercel_token: Option<String>,
    pub vercel_project_id: Option<String>,
    pub vercel_team_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryConfig {
    pub max_bulk_items: usize,
    pub low_stock_threshold: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartConfig {
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionConfig {
    pub expiry_sweep_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Some(v) = env::var("STOREFLOW_PORT").ok().or_else(|| env::var("PORT").ok()) {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Ok(v) = env::var("ROOT_DOMAIN") {
            self.server.root_domain = v.trim().to_lowercase();
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Ok(v) = env::var("STOREFLOW_STORAGE") {
            self.database.storage = match v.as_str() {
                "memory" => StorageBackend::Memory,
                "postgres" => StorageBackend::Postgres,
                _ => self.database.storage,
            };
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Ok(v) = env::var("DATABASE_RUN_MIGRATIONS") {
            self.database.run_migrations = v.parse().unwrap_or(self.database.run_migrations);
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }

        // Email overrides
        if let Ok(v) = env::var("SMTP_HOST") {
            self.email.smtp_host = Some(v).filter(|h| !h.is_empty());
        }
        if let Ok(v) = env::var("SMTP_PORT") {
            self.email.smtp_port = v.parse().unwrap_or(self.email.smtp_port);
        }
        if let Ok(v) = env::var("SMTP_USERNAME") {
            self.email.smtp_username = Some(v);
        }
        if let Ok(v) = env::var("SMTP_PASSWORD") {
            self.email.smtp_password = Some(v);
        }
        if let Ok(v) = env::var("EMAIL_FROM_ADDRESS") {
            self.email.from_address = v;
        }
        if let Ok(v) = env::var("EMAIL_FROM_NAME") {
            self.email.from_name = v;
        }
        if let Ok(v) = env::var("EMAIL_PLATFORM_ADDRESS") {
            self.email.platform_address = v;
        }

        // Domain provider overrides
        if let Ok(v) = env::var("VERCEL_API_BASE") {
            self.domains.api_base = v.trim_end_matches('/').to_string();
        }
        if let Ok(v) = env::var("VERCEL_TOKEN") {
            self.domains.vercel_token = Some(v);
        }
        if let Ok(v) = env::var("VERCEL_PROJECT_ID") {
            self.domains.vercel_project_id = Some(v);
        }
        if let Ok(v) = env::var("VERCEL_TEAM_ID") {
            self.domains.vercel_team_id = Some(v);
        }

        // Business rule overrides
        if let Ok(v) = env::var("INVENTORY_MAX_BULK_ITEMS") {
            self.inventory.max_bulk_items = v.parse().unwrap_or(self.inventory.max_bulk_items);
        }
        if let Ok(v) = env::var("INVENTORY_LOW_STOCK_THRESHOLD") {
            self.inventory.low_stock_threshold = v.parse().unwrap_or(self.inventory.low_stock_threshold);
        }
        if let Ok(v) = env::var("CART_TTL_MINUTES") {
            self.cart.ttl_minutes = v.parse().unwrap_or(self.cart.ttl_minutes);
        }
        if let Ok(v) = env::var("SUBSCRIPTION_EXPIRY_SWEEP_SECS") {
            self.subscription.expiry_sweep_secs = v.parse().unwrap_or(self.subscription.expiry_sweep_secs);
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                port: 3000,
                root_domain: "localhost".to_string(),
            },
            database: DatabaseConfig {
                url: None,
                storage: StorageBackend::Postgres,
                max_connections: 10,
                connection_timeout: 30,
                run_migrations: true,
            },
            security: SecurityConfig {
                jwt_secret: "storeflow-development-secret".to_string(),
                jwt_expiry_hours: 24 * 7, // 1 week
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
            },
            email: EmailConfig {
                smtp_host: None,
                smtp_port: 1025,
                smtp_username: None,
                smtp_password: None,
                from_address: "no-reply@storeflow.localhost".to_string(),
                from_name: "StoreFlow".to_string(),
                platform_address: "support@storeflow.localhost".to_string(),
            },
            domains: DomainsConfig {
                api_base: "https://api.vercel.com".to_string(),
                vercel_token: None,
                vercel_project_id: None,
                vercel_team_id: None,
            },
            inventory: InventoryConfig {
                max_bulk_items: 500,
                low_stock_threshold: 5,
            },
            cart: CartConfig { ttl_minutes: 24 * 60 },
            subscription: SubscriptionConfig { expiry_sweep_secs: 60 },
        }
    }

    fn staging() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Staging;
        config.server.root_domain = "staging.storeflow.app".to_string();
        config.database.max_connections = 20;
        config.database.connection_timeout = 10;
        config.security.jwt_secret = String::new();
        config.security.jwt_expiry_hours = 24;
        config.security.cors_origins = vec!["https://staging.storeflow.app".to_string()];
        config.email.smtp_port = 587;
        config.email.from_address = "no-reply@staging.storeflow.app".to_string();
        config.email.platform_address = "support@staging.storeflow.app".to_string();
        config.inventory.max_bulk_items = 200;
        config.subscription.expiry_sweep_secs = 300;
        config
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                port: 3000,
                root_domain: "storeflow.app".to_string(),
            },
            database: DatabaseConfig {
                url: None,
                storage: StorageBackend::Postgres,
                max_connections: 50,
                connection_timeout: 5,
                run_migrations: false,
            },
            security: SecurityConfig {
                // Must come from JWT_SECRET; an empty secret refuses to sign tokens
                jwt_secret: String::new(),
                jwt_expiry_hours: 12,
                enable_cors: true,
                cors_origins: vec!["https://storeflow.app".to_string()],
            },
            email: EmailConfig {
                smtp_host: None,
                smtp_port: 587,
                smtp_username: None,
                smtp_password: None,
                from_address: "no-reply@storeflow.app".to_string(),
                from_name: "StoreFlow".to_string(),
                platform_address: "support@storeflow.app".to_string(),
            },
            domains: DomainsConfig {
                api_base: "https://api.vercel.com".to_string(),
                vercel_token: None,
                vercel_project_id: None,
                vercel_team_id: None,
            },
            inventory: InventoryConfig {
                max_bulk_items: 100,
                low_stock_threshold: 5,
            },
            cart: CartConfig { ttl_minutes: 24 * 60 },
            subscription: SubscriptionConfig { expiry_sweep_secs: 900 },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_development {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Development)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert!(!config.security.jwt_secret.is_empty());
        assert_eq!(config.server.root_domain, "localhost");
        assert_eq!(config.inventory.max_bulk_items, 500);
        assert!(config.email.smtp_host.is_none());
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert!(config.security.jwt_secret.is_empty());
        assert!(!config.database.run_migrations);
        assert_eq!(config.inventory.max_bulk_items, 100);
    }

    #[test]
    fn test_staging_inherits_development_shape() {
        let config = AppConfig::staging();
        assert_eq!(config.environment, Environment::Staging);
        assert_eq!(config.security.jwt_expiry_hours, 24);
        assert_eq!(config.database.storage, StorageBackend::Postgres);
    }
}
