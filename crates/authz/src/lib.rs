//! Token issuance, bearer authentication, and role guards.

pub mod guard;
pub mod token;

pub use guard::{require_auth, require_role, AuthState, RoleGate};
pub use token::{Claims, TokenError, TokenService};
