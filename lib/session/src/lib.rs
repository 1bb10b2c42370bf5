//! Session and role-authorization core for the Astroneko coffee-shop
//! platform.
//!
//! This crate provides:
//! - Credential persistence (`CredentialStore` with file-backed and
//!   in-memory implementations)
//! - Session resolution against the identity endpoint
//!   (`SessionResolver` / `HttpSessionResolver`)
//! - The session provider, single owner of `SessionState`
//!   (`SessionProvider`)
//! - Role-scoped gating of protected subtrees (`RoleGuard`)
//! - The role-to-route table (`route_for`) and the sign-in flow
//!   (`SignInFlow`)
//!
//! # Access Control Model
//!
//! Every account carries exactly one [`Role`]. Staff roles land on the
//! admin dashboards (front desk, kitchen, managers); clients land on
//! the customer dashboard. A protected subtree declares the roles it
//! permits via a [`RoleGuard`]; the guard renders the subtree if and
//! only if the current session is authenticated with a permitted role,
//! and otherwise requests a redirect while showing a placeholder.
//!
//! # Example
//!
//! ```
//! use astroneko_session::{Access, MANAGEMENT_ROLES, Role, RoleGuard, SessionState, route_for};
//! use std::sync::Arc;
//! use tokio::sync::watch;
//!
//! // A gate around the managers dashboard.
//! let (state, states) = watch::channel(SessionState::Loading);
//! let guard = RoleGuard::new(states, MANAGEMENT_ROLES, Arc::new(|_path: &str| {}));
//!
//! // Nothing renders while the first resolution is in flight.
//! assert_eq!(guard.decide(&SessionState::Loading), Access::Pending);
//!
//! // Anonymous visitors are sent to the sign-in page.
//! assert!(matches!(
//!     guard.decide(&SessionState::Anonymous),
//!     Access::Denied { .. }
//! ));
//!
//! // Denied staff land on their own dashboard.
//! assert_eq!(route_for(Role::Barista), "/admin/dashboard/kitchen");
//! # drop(state);
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod gate;
pub mod provider;
pub mod resolver;
pub mod role;
pub mod routes;
pub mod state;
pub mod store;
pub mod user;

// Re-export main types at crate root
pub use auth::{
    AuthResponse, Authenticator, HttpAuthClient, LoginRequest, SignInFlow, SignUpRequest,
};
pub use config::SessionConfig;
pub use error::SessionError;
pub use gate::{Access, RoleGuard};
pub use provider::SessionProvider;
pub use resolver::{HttpSessionResolver, SessionResolver};
pub use role::{
    ALL_ROLES, FRONT_DESK_ROLES, KITCHEN_ROLES, MANAGEMENT_ROLES, Role, STAFF_ROLES,
    UnknownRoleError,
};
pub use routes::{Navigator, SIGN_IN_PATH, route_for};
pub use state::SessionState;
pub use store::{Credential, CredentialStore, FileCredentialStore, InMemoryCredentialStore};
pub use user::User;
