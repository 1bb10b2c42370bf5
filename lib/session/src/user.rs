//! The resolved user identity.

use astroneko_core::UserId;
use serde::{Deserialize, Serialize};

use crate::role::Role;

/// Identity of the current user as resolved from the backend.
///
/// This is the internal model; the wire shape the identity endpoint
/// sends is mapped into it by the session resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Stable backend identifier.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Account role.
    pub role: Role,
    /// Loyalty-point balance. Present only for the `client` role.
    pub loyalty_points: Option<u32>,
    /// Whether the account is active. The backend may omit this, in
    /// which case the account is treated as active.
    pub is_active: bool,
    /// Reference to the user's avatar image, if any.
    pub avatar: Option<String>,
}

impl User {
    /// Returns true if this user may enter the admin dashboards.
    #[must_use]
    pub fn is_staff(&self) -> bool {
        self.role.is_staff()
    }
}
