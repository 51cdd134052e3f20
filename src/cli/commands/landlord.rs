use anyhow::Context;
use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::database::Stores;
use crate::services::accounts;

#[derive(Subcommand)]
pub enum LandlordCommands {
    #[command(about = "Create a landlord account (no-op if the email exists)")]
    Create {
        #[arg(help = "Login email")]
        email: String,

        #[arg(long, default_value = "Platform Admin", help = "Display name")]
        name: String,

        #[arg(long, env = "LANDLORD_PASSWORD", help = "Password (or LANDLORD_PASSWORD)")]
        password: String,
    },
}

pub async fn handle(cmd: LandlordCommands, stores: &Stores, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        LandlordCommands::Create { email, name, password } => {
            let created = accounts::ensure_landlord(stores, &email, &password, &name)
                .await
                .context("failed to create landlord")?;
            let message = if created {
                format!("Landlord '{}' created", email)
            } else {
                format!("An account for '{}' already exists", email)
            };
            output_success(&output_format, &message, Some(json!({ "created": created })))
        }
    }
}
