//! Route guard: turn the current session snapshot into a render-or-redirect
//! decision for one protected route.
//!
//! The decision is a pure function of the snapshot so the client can
//! re-evaluate it on every state change without side effects.

#[cfg(test)]
#[path = "guard_test.rs"]
mod guard_test;

use std::fmt::Write as _;

use crate::role::RouteAccess;
use crate::store::SessionSnapshot;

pub const LOGIN_PATH: &str = "/login";
pub const UNAUTHORIZED_PATH: &str = "/401-unauthorized";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardDecision {
    /// Identity still being determined; show a loading indicator.
    Pending,
    Render,
    /// Not signed in. `to` carries the requested location for the return trip.
    RedirectLogin { to: String },
    /// Signed in, but the role does not satisfy the route.
    RedirectUnauthorized { to: String },
}

/// Decide what a protected route should do for `snapshot`.
///
/// `requested` is the in-app location the user asked for (path plus query).
#[must_use]
pub fn evaluate(snapshot: &SessionSnapshot, access: RouteAccess, requested: &str) -> GuardDecision {
    if snapshot.loading() {
        return GuardDecision::Pending;
    }
    let Some(profile) = snapshot.profile.as_ref().filter(|_| snapshot.is_authenticated()) else {
        return GuardDecision::RedirectLogin { to: login_redirect(requested) };
    };
    if access.permits(profile.role(), profile.is_super_admin()) {
        GuardDecision::Render
    } else {
        tracing::debug!(role = %profile.role(), ?access, requested, "route denied");
        GuardDecision::RedirectUnauthorized { to: UNAUTHORIZED_PATH.to_owned() }
    }
}

/// Login URL that remembers where the user was headed.
#[must_use]
pub fn login_redirect(requested: &str) -> String {
    if is_safe_path(requested) {
        format!("{LOGIN_PATH}?from={}", encode_component(requested))
    } else {
        LOGIN_PATH.to_owned()
    }
}

/// Where to go after a successful sign-in: the remembered location when it is
/// a safe in-app path, else the role landing route.
#[must_use]
pub fn post_login_target(from: Option<&str>, landing: &str) -> String {
    match from {
        Some(path) if is_safe_path(path) && !path.starts_with(LOGIN_PATH) => path.to_owned(),
        _ => landing.to_owned(),
    }
}

/// In-app absolute path: one leading slash, no scheme-relative `//` or `/\`.
fn is_safe_path(path: &str) -> bool {
    let bytes = path.as_bytes();
    matches!(bytes.first(), Some(b'/')) && !matches!(bytes.get(1), Some(b'/' | b'\\'))
}

/// Percent-encode everything outside the URI unreserved set.
fn encode_component(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~') {
            out.push(char::from(byte));
        } else {
            let _ = write!(out, "%{byte:02X}");
        }
    }
    out
}
