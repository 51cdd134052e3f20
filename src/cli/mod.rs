pub mod commands;
pub mod utils;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::config::{config, StorageBackend};
use crate::database::{DatabaseManager, Stores};

#[derive(Parser)]
#[command(name = "storeflow-admin")]
#[command(about = "StoreFlow administration: migrations, landlord accounts, tenants and plans")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Apply pending database migrations")]
    Migrate,

    #[command(about = "Platform operator accounts")]
    Landlord {
        #[command(subcommand)]
        cmd: commands::landlord::LandlordCommands,
    },

    #[command(about = "Inspect tenant stores")]
    Tenant {
        #[command(subcommand)]
        cmd: commands::tenant::TenantCommands,
    },

    #[command(about = "Price plan catalog")]
    Plan {
        #[command(subcommand)]
        cmd: commands::plan::PlanCommands,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let config = config();

    if config.database.storage != StorageBackend::Postgres {
        bail!("storeflow-admin works against Postgres; unset STOREFLOW_STORAGE or set it to postgres");
    }
    let pool = DatabaseManager::connect(&config.database)
        .await
        .context("failed to connect to the database")?;

    match cli.command {
        Commands::Migrate => commands::migrate::handle(&pool, output_format).await,
        Commands::Landlord { cmd } => commands::landlord::handle(cmd, &Stores::postgres(pool), output_format).await,
        Commands::Tenant { cmd } => commands::tenant::handle(cmd, &Stores::postgres(pool), output_format).await,
        Commands::Plan { cmd } => commands::plan::handle(cmd, &Stores::postgres(pool), output_format).await,
    }
}
