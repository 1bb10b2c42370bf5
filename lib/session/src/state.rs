//! Session state, the single value every consumer reads.

use serde::{Deserialize, Serialize};

use crate::user::User;

/// The current session, as published by the provider.
///
/// Exactly one variant holds at any instant. Transitions are owned
/// exclusively by [`SessionProvider`](crate::provider::SessionProvider);
/// consumers receive whole values through a watch channel and can never
/// observe a partial update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// The provider exists but has not started its first resolution.
    Uninitialized,
    /// The first resolution after startup is in flight.
    Loading,
    /// A verified user is signed in.
    Authenticated(User),
    /// No valid session exists.
    Anonymous,
}

impl SessionState {
    /// Returns the signed-in user, if any.
    #[must_use]
    pub fn user(&self) -> Option<&User> {
        match self {
            Self::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    /// Returns true if a verified user is signed in.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    /// Returns true while the initial resolution has not finished.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Uninitialized | Self::Loading)
    }
}
