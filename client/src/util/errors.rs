//! User-facing wording for session and procedure errors.

#[cfg(test)]
#[path = "errors_test.rs"]
mod errors_test;

use session::error::{AuthError, ErrorCode, SessionError};

/// Banner text for `err`, suffixed with its grepable code.
pub fn describe(err: &SessionError) -> String {
    let message = match err {
        SessionError::Auth(AuthError::InvalidCredentials) => "Invalid email or password.".to_owned(),
        SessionError::Auth(AuthError::EmailNotConfirmed) => "Please verify your email first.".to_owned(),
        SessionError::Auth(AuthError::Transport(_)) | SessionError::Remote(session::error::RpcError::Transport { .. }) => {
            "The server could not be reached.".to_owned()
        }
        SessionError::ProfileResolution(_) => "Your account profile could not be loaded.".to_owned(),
        SessionError::NotSignedIn => "Your session has ended. Please log in again.".to_owned(),
        SessionError::Forbidden(_) => "You do not have access to this action.".to_owned(),
        SessionError::Invalid(message) => message.clone(),
        other => other.to_string(),
    };
    if err.retryable() {
        format!("{message} Please try again. [{}]", err.error_code())
    } else {
        format!("{message} [{}]", err.error_code())
    }
}
