//! Role-scoped access gate for protected subtrees.
//!
//! A guard wraps a protected area of the application with a declared
//! set of permitted roles. It never sees errors, only
//! [`SessionState`], and its one invariant is that the protected
//! content is shown if and only if the state is `Authenticated` with a
//! permitted role. Everything else is a placeholder, possibly paired
//! with a navigation request.

use std::sync::Arc;

use tokio::sync::watch;

use crate::role::Role;
use crate::routes::{Navigator, SIGN_IN_PATH, route_for};
use crate::state::SessionState;

/// Outcome of evaluating a guard against the current session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    /// The session is still resolving; show a neutral placeholder and
    /// take no navigation action.
    Pending,
    /// Show the protected content.
    Granted,
    /// Never show the protected content; navigation to `redirect` has
    /// been requested and a placeholder covers the gap.
    Denied {
        /// Where the visitor is being sent instead.
        redirect: String,
    },
}

/// Guard around a role-restricted subtree.
///
/// Holds a subscription to the session provider and re-evaluates on
/// every state change; no decision is ever cached across transitions.
pub struct RoleGuard {
    allowed: Vec<Role>,
    redirect_override: Option<String>,
    navigator: Arc<dyn Navigator>,
    states: watch::Receiver<SessionState>,
}

impl RoleGuard {
    /// Creates a guard for the given permitted roles.
    ///
    /// `states` usually comes from
    /// [`SessionProvider::subscribe`](crate::provider::SessionProvider::subscribe).
    #[must_use]
    pub fn new(
        states: watch::Receiver<SessionState>,
        allowed: impl IntoIterator<Item = Role>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            allowed: allowed.into_iter().collect(),
            redirect_override: None,
            navigator,
            states,
        }
    }

    /// Overrides the denial redirect for authenticated users whose role
    /// is not permitted. Without this, denials go to the role's own
    /// landing path.
    #[must_use]
    pub fn with_redirect(mut self, path: impl Into<String>) -> Self {
        self.redirect_override = Some(path.into());
        self
    }

    /// Pure decision table over a session state.
    #[must_use]
    pub fn decide(&self, state: &SessionState) -> Access {
        match state {
            SessionState::Uninitialized | SessionState::Loading => Access::Pending,
            SessionState::Anonymous => Access::Denied {
                redirect: SIGN_IN_PATH.to_string(),
            },
            SessionState::Authenticated(user) => {
                if self.allowed.contains(&user.role) {
                    Access::Granted
                } else {
                    let redirect = self
                        .redirect_override
                        .clone()
                        .unwrap_or_else(|| route_for(user.role).to_string());
                    Access::Denied { redirect }
                }
            }
        }
    }

    /// Evaluates the latest state and performs the navigation side
    /// effect of a denial.
    pub fn evaluate(&mut self) -> Access {
        let state = self.states.borrow_and_update().clone();
        let access = self.decide(&state);
        if let Access::Denied { redirect } = &access {
            self.navigator.navigate(redirect);
        }
        access
    }

    /// Drives the guard until the provider goes away, re-evaluating on
    /// every state transition.
    pub async fn watch(&mut self) {
        loop {
            self.evaluate();
            if self.states.changed().await.is_err() {
                return;
            }
        }
    }
}
