//! Well-known role names carried in access-token claims.
//!
//! Roles are derived from the `is_admin` / `is_runner` flags on the
//! `users` row, see [`role_for`].

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_RUNNER: &str = "runner";
pub const ROLE_USER: &str = "user";

/// Resolve the role name for a user's flag combination.
///
/// Admin wins over runner; runner accounts are never admins in practice.
pub fn role_for(is_admin: bool, is_runner: bool) -> &'static str {
    if is_admin {
        ROLE_ADMIN
    } else if is_runner {
        ROLE_RUNNER
    } else {
        ROLE_USER
    }
}
