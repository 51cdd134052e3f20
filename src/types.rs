/// Shared enums used across the codebase.
///
/// All of them are stored as TEXT columns and travel as snake_case strings
/// in JSON, so each one gets the same `as_str`/`FromStr` pair.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind} value: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident, $kind:literal { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(ParseEnumError { kind: $kind, value: other.to_string() }),
                }
            }
        }
    };
}

text_enum!(
    /// Account roles. Landlords have no tenant.
    Role, "role" {
        Landlord => "landlord",
        TenantAdmin => "tenant_admin",
        TenantStaff => "tenant_staff",
    }
);

text_enum!(TenantStatus, "tenant status" {
    Pending => "pending",
    Active => "active",
    Suspended => "suspended",
    Expired => "expired",
    Deleted => "deleted",
});

text_enum!(PlanStatus, "plan status" {
    Active => "active",
    Inactive => "inactive",
});

text_enum!(ProductStatus, "product status" {
    Active => "active",
    Draft => "draft",
    Archived => "archived",
});

text_enum!(AdjustmentType, "adjustment type" {
    Increase => "increase",
    Decrease => "decrease",
    Set => "set",
});

text_enum!(OrderStatus, "order status" {
    Pending => "pending",
    Processing => "processing",
    Shipped => "shipped",
    Delivered => "delivered",
    Cancelled => "cancelled",
});

text_enum!(TicketStatus, "ticket status" {
    Open => "open",
    InProgress => "in_progress",
    Resolved => "resolved",
    Closed => "closed",
});

text_enum!(TicketPriority, "ticket priority" {
    Low => "low",
    Medium => "medium",
    High => "high",
    Urgent => "urgent",
});

impl Role {
    pub fn is_tenant_role(&self) -> bool {
        matches!(self, Role::TenantAdmin | Role::TenantStaff)
    }
}

impl OrderStatus {
    /// Allowed forward moves in the fulfilment flow
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Processing)
                | (Pending, Cancelled)
                | (Processing, Shipped)
                | (Processing, Cancelled)
                | (Shipped, Delivered)
        )
    }
}

/// Which ticket system a ticket belongs to: customer → store, or tenant → landlord
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketScope {
    Store,
    Platform,
}

impl Default for TicketPriority {
    fn default() -> Self {
        TicketPriority::Medium
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_prints_snake_case() {
        assert_eq!("tenant_admin".parse::<Role>().unwrap(), Role::TenantAdmin);
        assert_eq!(TicketStatus::InProgress.as_str(), "in_progress");
        assert_eq!(
            serde_json::to_value(TenantStatus::Suspended).unwrap(),
            serde_json::json!("suspended")
        );
    }

    #[test]
    fn rejects_unknown_values() {
        let err = "superuser".parse::<Role>().unwrap_err();
        assert_eq!(err.kind, "role");
        assert_eq!(err.value, "superuser");
    }

    #[test]
    fn order_transitions_follow_fulfilment_flow() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Processing));
        assert!(OrderStatus::Processing.can_transition_to(OrderStatus::Cancelled));
        assert!(OrderStatus::Shipped.can_transition_to(OrderStatus::Delivered));
        assert!(!OrderStatus::Shipped.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Pending));
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Pending));
    }
}
