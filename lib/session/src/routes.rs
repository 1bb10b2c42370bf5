//! Role-to-route table and the navigation seam.
//!
//! Each role has exactly one canonical landing path. The table is a
//! total `match`, so adding a role without a route is a compile error
//! rather than a runtime fallback.

use crate::role::Role;

/// Application path of the sign-in page.
///
/// Anonymous visitors and fresh logouts land here.
pub const SIGN_IN_PATH: &str = "/authentication";

/// Returns the canonical landing path for a role.
///
/// Used for denial redirects by [`RoleGuard`](crate::gate::RoleGuard)
/// and for the success redirect of the sign-in flow.
#[must_use]
pub const fn route_for(role: Role) -> &'static str {
    match role {
        Role::Client => "/dashboard",
        Role::Cashier | Role::Helper => "/admin/dashboard/front-desk",
        Role::Cook | Role::Barista => "/admin/dashboard/kitchen",
        Role::Manager | Role::Owner => "/admin/dashboard/managers",
    }
}

/// Sink for navigation requests issued by the session core.
///
/// The application shell decides what "navigate" means (push a browser
/// location, swap a view, record in a test). Implemented for closures so
/// tests and small embeddings can pass `|path| ...` directly.
pub trait Navigator: Send + Sync {
    /// Requests navigation to an application path.
    fn navigate(&self, path: &str);
}

impl<F> Navigator for F
where
    F: Fn(&str) + Send + Sync,
{
    fn navigate(&self, path: &str) {
        self(path);
    }
}
