use clap::Subcommand;

use crate::cli::utils::{output_collection, output_empty_collection};
use crate::cli::OutputFormat;
use crate::database::Stores;
use crate::types::TenantStatus;

#[derive(Subcommand)]
pub enum TenantCommands {
    #[command(about = "List tenants")]
    List {
        #[arg(long, help = "Only tenants with this status (pending, active, suspended, expired, deleted)")]
        status: Option<String>,
    },
}

pub async fn handle(cmd: TenantCommands, stores: &Stores, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        TenantCommands::List { status } => {
            let status = status.as_deref().map(str::parse::<TenantStatus>).transpose()?;
            let tenants = stores.tenants.list(status).await?;

            if tenants.is_empty() {
                return output_empty_collection(&output_format, "tenants", "No tenants found");
            }

            match output_format {
                OutputFormat::Json => output_collection("tenants", &tenants)?,
                OutputFormat::Text => {
                    println!("{:<20} {:<25} {:<10} {:<12} {}", "SUBDOMAIN", "NAME", "STATUS", "EXPIRES", "DOMAIN");
                    println!("{}", "-".repeat(90));

                    for tenant in &tenants {
                        let expires = tenant
                            .expire_date
                            .map(|d| d.format("%Y-%m-%d").to_string())
                            .unwrap_or_else(|| "-".to_string());
                        let domain = match (&tenant.custom_domain, tenant.domain_verified) {
                            (Some(d), true) => d.clone(),
                            (Some(d), false) => format!("{} (unverified)", d),
                            (None, _) => String::new(),
                        };
                        println!(
                            "{:<20} {:<25} {:<10} {:<12} {}",
                            tenant.subdomain, tenant.name, tenant.status, expires, domain
                        );
                    }
                }
            }
            Ok(())
        }
    }
}
