//! Shared identifier and principal types.

use serde::{Deserialize, Serialize};

/// The anonymous principal used when no identity is bound to the session.
pub const GUEST: &str = "guest";

/// The resolved principal for a request: a named, authenticated user, or
/// the fixed anonymous principal [`GUEST`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Identity {
    User(SessionUser),
    Guest,
}

/// The identity bound into a session by a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub user_name: String,
    pub is_admin: bool,
}

impl Identity {
    /// The principal name used for rule-file matching and graph scoping.
    pub fn principal(&self) -> &str {
        match self {
            Identity::User(user) => &user.user_name,
            Identity::Guest => GUEST,
        }
    }

    /// The bound user name, if any.
    pub fn user_name(&self) -> Option<&str> {
        match self {
            Identity::User(user) => Some(&user.user_name),
            Identity::Guest => None,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Identity::User(user) if user.is_admin)
    }
}
