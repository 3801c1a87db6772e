//! Roles and per-route access requirements.

#[cfg(test)]
#[path = "role_test.rs"]
mod role_test;

use std::fmt;

use serde::{Deserialize, Serialize};

/// Closed set of account roles. Every resolved profile carries exactly one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Admin,
}

impl Role {
    /// Wire name used by the profile store and activity log.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Admin => "admin",
        }
    }

    /// Parse a wire role name. Unknown names are not a role.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "student" => Some(Self::Student),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a protected route demands of the current session.
///
/// There is no "public" variant: every guarded route needs a session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RouteAccess {
    /// Any signed-in user with a resolvable role.
    #[default]
    Authenticated,
    /// Only users holding this role.
    Role(Role),
    /// Admins carrying the super-admin flag.
    SuperAdmin,
}

impl RouteAccess {
    pub const STUDENT_ONLY: Self = Self::Role(Role::Student);
    pub const ADMIN_ONLY: Self = Self::Role(Role::Admin);

    /// Whether a user with `role` (and the given super-admin flag) satisfies this requirement.
    #[must_use]
    pub fn permits(self, role: Role, super_admin: bool) -> bool {
        match self {
            Self::Authenticated => true,
            Self::Role(required) => role == required,
            Self::SuperAdmin => role == Role::Admin && super_admin,
        }
    }
}
