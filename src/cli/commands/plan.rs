use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::Subcommand;
use serde::Deserialize;
use serde_json::json;

use crate::cli::utils::{output_collection, output_empty_collection, output_success};
use crate::cli::OutputFormat;
use crate::database::models::{NewPlan, PlanUpdate};
use crate::database::Stores;
use crate::types::PlanStatus;

#[derive(Subcommand)]
pub enum PlanCommands {
    #[command(about = "List price plans")]
    List {
        #[arg(long, help = "Include inactive plans")]
        all: bool,
    },

    #[command(about = "Create or update plans from a YAML file, matched by name")]
    Import {
        #[arg(help = "YAML file with a top-level `plans:` list")]
        file: PathBuf,
    },
}

/// ```yaml
/// plans:
///   - name: Starter
///     price: 19.00
///     duration_months: 1
///     trial_days: 14
///     features: { products: 100 }
/// ```
#[derive(Debug, Deserialize)]
struct PlanFile {
    plans: Vec<NewPlan>,
}

fn read_plan_file(path: &Path) -> anyhow::Result<Vec<NewPlan>> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let file: PlanFile = serde_yaml::from_str(&raw).with_context(|| format!("invalid plan file {}", path.display()))?;

    for plan in &file.plans {
        if plan.name.trim().is_empty() {
            bail!("every plan needs a name");
        }
        if plan.duration_months < 1 {
            bail!("plan '{}': duration_months must be at least 1", plan.name);
        }
        if plan.price.is_sign_negative() || plan.trial_days < 0 {
            bail!("plan '{}': price and trial_days must not be negative", plan.name);
        }
    }
    Ok(file.plans)
}

pub async fn handle(cmd: PlanCommands, stores: &Stores, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        PlanCommands::List { all } => {
            let plans = stores.plans.list(!all).await?;
            if plans.is_empty() {
                return output_empty_collection(&output_format, "plans", "No plans found");
            }

            match output_format {
                OutputFormat::Json => output_collection("plans", &plans)?,
                OutputFormat::Text => {
                    println!("{:<20} {:>10} {:>8} {:>7} {:<9} {}", "NAME", "PRICE", "MONTHS", "TRIAL", "STATUS", "ID");
                    println!("{}", "-".repeat(95));
                    for plan in &plans {
                        println!(
                            "{:<20} {:>10} {:>8} {:>7} {:<9} {}",
                            plan.name, plan.price, plan.duration_months, plan.trial_days, plan.status, plan.id
                        );
                    }
                }
            }
            Ok(())
        }
        PlanCommands::Import { file } => {
            let incoming = read_plan_file(&file)?;
            let existing = stores.plans.list(false).await?;
            let (mut created, mut updated) = (0, 0);

            for plan in incoming {
                match existing.iter().find(|p| p.name.eq_ignore_ascii_case(plan.name.trim())) {
                    Some(current) => {
                        stores
                            .plans
                            .update(
                                current.id,
                                PlanUpdate {
                                    name: None,
                                    description: plan.description,
                                    price: Some(plan.price),
                                    duration_months: Some(plan.duration_months),
                                    trial_days: Some(plan.trial_days),
                                    features: Some(plan.features),
                                    status: Some(PlanStatus::Active),
                                },
                            )
                            .await?;
                        updated += 1;
                    }
                    None => {
                        stores.plans.create(plan).await?;
                        created += 1;
                    }
                }
            }

            output_success(
                &output_format,
                &format!("Imported plans: {} created, {} updated", created, updated),
                Some(json!({ "created": created, "updated": updated })),
            )
        }
    }
}
