//! Role types for platform access control.
//!
//! Every account carries exactly one role. The set of roles is closed:
//! a role string the backend sends that is not in this enumeration is a
//! decode failure, never a silent default.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Account role, one per user.
///
/// `Client` is the customer-facing role; everything else is staff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Customer with a loyalty-point balance.
    Client,
    /// Front-desk cashier.
    Cashier,
    /// Front-desk helper.
    Helper,
    /// Kitchen cook.
    Cook,
    /// Kitchen barista.
    Barista,
    /// Shop manager.
    Manager,
    /// Shop owner.
    Owner,
}

/// Every known role, used for totality checks over role-indexed tables.
pub const ALL_ROLES: [Role; 7] = [
    Role::Client,
    Role::Cashier,
    Role::Helper,
    Role::Cook,
    Role::Barista,
    Role::Manager,
    Role::Owner,
];

/// Roles allowed into the admin dashboards.
pub const STAFF_ROLES: [Role; 6] = [
    Role::Cashier,
    Role::Helper,
    Role::Cook,
    Role::Barista,
    Role::Manager,
    Role::Owner,
];

/// Roles working the kitchen dashboard.
pub const KITCHEN_ROLES: [Role; 2] = [Role::Cook, Role::Barista];

/// Roles working the front-desk dashboard.
pub const FRONT_DESK_ROLES: [Role; 2] = [Role::Cashier, Role::Helper];

/// Roles with access to the management dashboard.
pub const MANAGEMENT_ROLES: [Role; 2] = [Role::Manager, Role::Owner];

impl Role {
    /// Returns the lowercase canonical name of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Cashier => "cashier",
            Self::Helper => "helper",
            Self::Cook => "cook",
            Self::Barista => "barista",
            Self::Manager => "manager",
            Self::Owner => "owner",
        }
    }

    /// Returns true for any role other than `Client`.
    #[must_use]
    pub const fn is_staff(&self) -> bool {
        !matches!(self, Self::Client)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a role string is not in the enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRoleError {
    /// The rejected role string, as received.
    pub value: String,
}

impl fmt::Display for UnknownRoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role: {}", self.value)
    }
}

impl std::error::Error for UnknownRoleError {}

impl FromStr for Role {
    type Err = UnknownRoleError;

    /// Parses a role case-insensitively; the backend sends uppercase names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "client" => Ok(Self::Client),
            "cashier" => Ok(Self::Cashier),
            "helper" => Ok(Self::Helper),
            "cook" => Ok(Self::Cook),
            "barista" => Ok(Self::Barista),
            "manager" => Ok(Self::Manager),
            "owner" => Ok(Self::Owner),
            _ => Err(UnknownRoleError {
                value: s.to_string(),
            }),
        }
    }
}
