//! Error taxonomy for the session core.
//!
//! ERROR HANDLING
//! ==============
//! Four failure classes reach callers differently:
//! - authentication failures are recoverable and carry a remediation
//!   (`AuthError::EmailNotConfirmed` drives the resend-verification flow);
//! - profile-resolution failures end the session (fail closed);
//! - mutation failures surface to the calling view with local state untouched;
//! - change-feed failures are logged only, since the initial fetch stays
//!   authoritative.

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

use crate::role::Role;

/// Grepable error code and retryable flag for UI error banners.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

// =============================================================================
// COLLABORATOR ERRORS
// =============================================================================

/// Failures reported by the external identity provider.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// Wrong email or password.
    #[error("invalid email or password")]
    InvalidCredentials,
    /// The account exists but its email address has not been confirmed yet.
    #[error("email not confirmed")]
    EmailNotConfirmed,
    /// The provider rejected the request for another reason.
    #[error("auth provider error: {0}")]
    Provider(String),
    /// The provider could not be reached.
    #[error("auth transport error: {0}")]
    Transport(String),
}

impl ErrorCode for AuthError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "E_INVALID_CREDENTIALS",
            Self::EmailNotConfirmed => "E_EMAIL_NOT_CONFIRMED",
            Self::Provider(_) => "E_AUTH_PROVIDER",
            Self::Transport(_) => "E_AUTH_TRANSPORT",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// Failures from the remote-procedure layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RpcError {
    /// The request never produced a response.
    #[error("request to {procedure} failed: {message}")]
    Transport { procedure: String, message: String },
    /// The procedure answered with a non-success status.
    #[error("{procedure} returned status {status}: {message}")]
    Status { procedure: String, status: u16, message: String },
    /// The response body did not match the expected shape.
    #[error("{procedure} response could not be decoded: {message}")]
    Decode { procedure: String, message: String },
}

impl ErrorCode for RpcError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "E_RPC_TRANSPORT",
            Self::Status { .. } => "E_RPC_STATUS",
            Self::Decode { .. } => "E_RPC_DECODE",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Status { status: 429 | 500..=599, .. })
    }
}

/// Failures opening a realtime change feed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeedError {
    #[error("change feed connection failed: {0}")]
    Connect(String),
    #[error("change feed rejected subscription: {0}")]
    Rejected(String),
}

/// Failures mapping backend profile records into a typed profile.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProfileError {
    #[error("profile record has no role")]
    MissingRole,
    #[error("profile record has unknown role '{0}'")]
    UnknownRole(String),
    #[error("profile record is missing {0} role data")]
    MissingRoleData(Role),
    #[error("profile record is malformed: {0}")]
    Malformed(String),
}

/// Configuration loading failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required setting: env var {var} not set")]
    Missing { var: String },
    #[error("invalid setting {var}: {message}")]
    Invalid { var: String, message: String },
}

// =============================================================================
// STORE ERROR
// =============================================================================

/// Error returned by every [`crate::store::SessionStore`] action.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    /// The provider session is valid but no usable profile backs it.
    #[error("account profile could not be resolved: {0}")]
    ProfileResolution(String),
    #[error("not signed in")]
    NotSignedIn,
    #[error("this action requires the {0} role")]
    Forbidden(Role),
    #[error(transparent)]
    Remote(#[from] RpcError),
    #[error("invalid input: {0}")]
    Invalid(String),
    #[error("session store has been disposed")]
    Disposed,
}

impl From<ProfileError> for SessionError {
    fn from(err: ProfileError) -> Self {
        Self::ProfileResolution(err.to_string())
    }
}

impl ErrorCode for SessionError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Auth(e) => e.error_code(),
            Self::ProfileResolution(_) => "E_PROFILE_RESOLUTION",
            Self::NotSignedIn => "E_NOT_SIGNED_IN",
            Self::Forbidden(_) => "E_FORBIDDEN",
            Self::Remote(e) => e.error_code(),
            Self::Invalid(_) => "E_INVALID_INPUT",
            Self::Disposed => "E_DISPOSED",
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Auth(e) => e.retryable(),
            Self::Remote(e) => e.retryable(),
            _ => false,
        }
    }
}
