use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::types::PlanStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricePlan {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub duration_months: i32,
    pub trial_days: i32,
    pub features: Value,
    pub status: PlanStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPlan {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub duration_months: i32,
    #[serde(default)]
    pub trial_days: i32,
    #[serde(default = "empty_features")]
    pub features: Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlanUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub duration_months: Option<i32>,
    pub trial_days: Option<i32>,
    pub features: Option<Value>,
    pub status: Option<PlanStatus>,
}

fn empty_features() -> Value {
    Value::Object(Default::default())
}
