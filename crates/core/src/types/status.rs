//! Roles and order lifecycle status.

use serde::{Deserialize, Serialize};

/// Access-control role stored on a directory profile.
///
/// Decides which role-gated views a session may reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "sejuk.user_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Creates service orders and assigns technicians.
    Admin,
    /// Completes the orders assigned to them.
    Technician,
}

impl Role {
    /// Path of the landing view for this role.
    #[must_use]
    pub const fn home_path(self) -> &'static str {
        match self {
            Self::Admin => "/admin",
            Self::Technician => "/technician",
        }
    }

    /// Human-facing label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Admin => "Admin",
            Self::Technician => "Technician",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::Technician => write!(f, "technician"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "admin" => Ok(Self::Admin),
            "technician" => Ok(Self::Technician),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}

/// Lifecycle status of a service order.
///
/// The only legal transition is `Pending -> JobDone`, taken once by the
/// completion workflow. Serialized with the human labels the orders have
/// always carried (`"Pending"`, `"Job Done"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "sejuk.order_status", rename_all = "snake_case")
)]
pub enum OrderStatus {
    #[default]
    #[serde(rename = "Pending")]
    Pending,
    #[serde(rename = "Job Done")]
    JobDone,
}

/// Attempted a transition the order lifecycle does not define.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("order is already {0}")]
pub struct InvalidTransition(pub OrderStatus);

impl OrderStatus {
    /// Whether the order still shows up in a technician's active list.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Take the completion transition.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` if the order is already `JobDone`.
    pub const fn complete(self) -> Result<Self, InvalidTransition> {
        match self {
            Self::Pending => Ok(Self::JobDone),
            Self::JobDone => Err(InvalidTransition(self)),
        }
    }

    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::JobDone => "Job Done",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trips_through_text() {
        for role in [Role::Admin, Role::Technician] {
            assert_eq!(role.to_string().parse::<Role>().unwrap(), role);
        }
        assert!("viewer".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_home_paths() {
        assert_eq!(Role::Admin.home_path(), "/admin");
        assert_eq!(Role::Technician.home_path(), "/technician");
    }

    #[test]
    fn test_single_legal_transition() {
        assert_eq!(OrderStatus::Pending.complete(), Ok(OrderStatus::JobDone));
        assert_eq!(
            OrderStatus::JobDone.complete(),
            Err(InvalidTransition(OrderStatus::JobDone))
        );
    }

    #[test]
    fn test_status_labels_in_json() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::JobDone).unwrap(),
            "\"Job Done\""
        );
        let parsed: OrderStatus = serde_json::from_str("\"Pending\"").unwrap();
        assert_eq!(parsed, OrderStatus::Pending);
        assert!(parsed.is_active());
        assert!(!OrderStatus::JobDone.is_active());
    }
}
