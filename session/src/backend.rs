//! External collaborator contracts: identity provider, remote procedures,
//! and realtime change feeds.
//!
//! ARCHITECTURE
//! ============
//! The core never speaks a wire protocol itself. The browser client provides
//! HTTP/websocket implementations, tests provide in-memory mocks. All traits
//! are `?Send`: the client runs on a single cooperative event loop and its
//! futures hold browser handles that cannot cross threads.

#[cfg(test)]
#[path = "backend_test.rs"]
mod backend_test;

use std::fmt;
use std::rc::Rc;

use futures::stream::LocalBoxStream;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AuthError, FeedError, RpcError};

// =============================================================================
// IDENTITY PROVIDER
// =============================================================================

/// Provider-issued session. The store keeps a read-only cached copy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Provider subject identifier (the auth user id).
    pub subject: String,
    pub email: Option<String>,
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Seconds since the Unix epoch.
    pub issued_at: i64,
    /// Seconds since the Unix epoch.
    pub expires_at: i64,
}

impl Session {
    #[must_use]
    pub fn is_expired(&self, now_secs: i64) -> bool {
        now_secs >= self.expires_at
    }
}

/// Email + password sign-in credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self { email: email.into().trim().to_owned(), password: password.into() }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Session-change notification pushed by the provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(Session),
    TokenRefreshed(Session),
    UserUpdated(Session),
    /// The user followed a password-reset link; the session is scoped to
    /// setting a new password.
    PasswordRecovery(Session),
    SignedOut,
}

impl AuthEvent {
    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        match self {
            Self::SignedIn(s) | Self::TokenRefreshed(s) | Self::UserUpdated(s) | Self::PasswordRecovery(s) => Some(s),
            Self::SignedOut => None,
        }
    }
}

/// Managed identity provider.
#[async_trait::async_trait(?Send)]
pub trait AuthClient {
    /// The persisted session, if any. Refreshes an expired token when possible.
    async fn get_session(&self) -> Result<Option<Session>, AuthError>;

    /// Stream of session changes. Dropping the stream unsubscribes.
    fn session_changes(&self) -> LocalBoxStream<'static, AuthEvent>;

    async fn sign_in(&self, credentials: &Credentials) -> Result<Session, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Send a password-reset email whose link lands on `redirect_to`.
    async fn reset_password(&self, email: &str, redirect_to: &str) -> Result<(), AuthError>;

    async fn update_password(&self, new_password: &str) -> Result<(), AuthError>;
}

// =============================================================================
// REMOTE PROCEDURES
// =============================================================================

/// Managed serverless functions addressed by name with a JSON payload.
#[async_trait::async_trait(?Send)]
pub trait RemoteProcedureClient {
    async fn invoke(&self, procedure: &str, payload: Value) -> Result<Value, RpcError>;
}

/// Invoke a procedure and decode its JSON result.
///
/// A `null` body decodes to `None` so callers can substitute typed defaults.
///
/// # Errors
///
/// Propagates the transport error, or [`RpcError::Decode`] when the body does
/// not match `T`.
pub async fn invoke_as<T: DeserializeOwned>(
    rpc: &dyn RemoteProcedureClient,
    procedure: &str,
    payload: Value,
) -> Result<Option<T>, RpcError> {
    let value = rpc.invoke(procedure, payload).await?;
    decode_result(procedure, value)
}

pub(crate) fn decode_result<T: DeserializeOwned>(procedure: &str, value: Value) -> Result<Option<T>, RpcError> {
    if value.is_null() {
        return Ok(None);
    }
    serde_json::from_value(value)
        .map(Some)
        .map_err(|e| RpcError::Decode { procedure: procedure.to_owned(), message: e.to_string() })
}

// =============================================================================
// CHANGE FEEDS
// =============================================================================

/// Backend collections with realtime change notifications.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Activities,
    Feedback,
    Invitations,
    Resources,
    Users,
    Statistics,
}

impl Collection {
    pub const ALL: [Self; 6] =
        [Self::Activities, Self::Feedback, Self::Invitations, Self::Resources, Self::Users, Self::Statistics];

    /// Backing table in the `public` schema.
    #[must_use]
    pub fn table(self) -> &'static str {
        match self {
            Self::Activities => "activities",
            Self::Feedback => "feedback",
            Self::Invitations => "invitations",
            Self::Resources => "resources",
            Self::Users => "user",
            Self::Statistics => "statistics_history",
        }
    }

    /// Realtime channel name.
    #[must_use]
    pub fn channel(self) -> &'static str {
        match self {
            Self::Activities => "activities_changes",
            Self::Feedback => "feedbacks_changes",
            Self::Invitations => "invitations_changes",
            Self::Resources => "resources_changes",
            Self::Users => "user_changes",
            Self::Statistics => "statistics_changes",
        }
    }

    #[must_use]
    pub fn from_table(table: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.table() == table)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

impl ChangeKind {
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "INSERT" => Some(Self::Insert),
            "UPDATE" => Some(Self::Update),
            "DELETE" => Some(Self::Delete),
            _ => None,
        }
    }
}

/// One row-level change on a watched collection.
#[derive(Clone, Debug, PartialEq)]
pub struct ChangeEvent {
    pub collection: Collection,
    pub kind: ChangeKind,
    pub record: Value,
    pub old_record: Value,
}

pub type ChangeCallback = Rc<dyn Fn(ChangeEvent)>;

/// Teardown handle for an upstream subscription. Runs its teardown once, on
/// [`Unsubscribe::cancel`] or drop.
#[must_use = "dropping the handle tears the subscription down"]
pub struct Unsubscribe(Option<Box<dyn FnOnce()>>);

impl Unsubscribe {
    pub fn new(teardown: impl FnOnce() + 'static) -> Self {
        Self(Some(Box::new(teardown)))
    }

    pub fn noop() -> Self {
        Self(None)
    }

    pub fn cancel(mut self) {
        self.run();
    }

    fn run(&mut self) {
        if let Some(teardown) = self.0.take() {
            teardown();
        }
    }
}

impl Drop for Unsubscribe {
    fn drop(&mut self) {
        self.run();
    }
}

impl fmt::Debug for Unsubscribe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Unsubscribe").field(&self.0.is_some()).finish()
    }
}

/// Managed realtime change feed, one subscription per collection.
pub trait ChangeFeedClient {
    /// Start delivering changes on `collection` to `on_event`.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError`] when the feed cannot be opened.
    fn subscribe(&self, collection: Collection, on_event: ChangeCallback) -> Result<Unsubscribe, FeedError>;
}
