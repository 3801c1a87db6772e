//! Session store: the single source of truth for "who is signed in, and are
//! we still finding out".
//!
//! ARCHITECTURE
//! ============
//! One store is built at the application root and handed down by context.
//! It caches the provider [`Session`] and the typed [`UserProfile`] in a
//! [`SessionSnapshot`], exposes action methods, and notifies registered
//! observers after every committed change.
//!
//! INVARIANTS
//! ==========
//! - `Authenticated` always carries both a session and a profile. A session
//!   whose profile cannot be resolved is signed out upstream and cleared
//!   locally (fail closed).
//! - Initialization runs at most once; concurrent callers await the same
//!   shared future.
//! - After [`SessionStore::dispose`], late completions are dropped instead of
//!   mutating state.
//! - Updates are applied last-writer-wins on the local snapshot.
//! - One profile lookup per subject at a time. Provider events for a subject
//!   already being established are skipped.

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use futures::future::{AbortHandle, Abortable, LocalBoxFuture, Shared};
use futures::{FutureExt, StreamExt};
use serde::Serialize;
use serde_json::json;

use crate::backend::{AuthClient, AuthEvent, Credentials, RemoteProcedureClient, Session, invoke_as};
use crate::config::SessionConfig;
use crate::error::{AuthError, SessionError};
use crate::profile::{ProfilePatch, ProfileRecord, ProfileUpdate, UserProfile};
use crate::role::Role;

pub(crate) const GET_USER_PROFILE: &str = "get-user-profile";
pub(crate) const UPDATE_PROFILE: &str = "update-profile";

// =============================================================================
// STATE
// =============================================================================

/// Whether the current identity has been determined yet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SessionPhase {
    #[default]
    Unknown,
    Authenticated,
    Unauthenticated,
}

/// Cloneable view of the store state handed to observers and route guards.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub session: Option<Session>,
    pub profile: Option<UserProfile>,
}

impl SessionSnapshot {
    #[must_use]
    pub fn signed_out() -> Self {
        Self { phase: SessionPhase::Unauthenticated, session: None, profile: None }
    }

    /// True until the first identity check resolves.
    #[must_use]
    pub fn loading(&self) -> bool {
        self.phase == SessionPhase::Unknown
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.phase == SessionPhase::Authenticated && self.session.is_some() && self.profile.is_some()
    }

    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.profile.as_ref().map(UserProfile::role)
    }
}

/// Handle returned by [`SessionStore::on_change`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ListenerId(u64);

type Listener = Rc<dyn Fn(&SessionSnapshot)>;

// =============================================================================
// SIGN-IN OUTCOME
// =============================================================================

/// Structured "verify your email first" result; the view offers a resend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRequired {
    pub message: String,
    pub needs_verification: bool,
    pub email: String,
}

impl VerificationRequired {
    #[must_use]
    pub fn new(email: &str) -> Self {
        Self { message: "Please verify your email first.".to_owned(), needs_verification: true, email: email.to_owned() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SignInOutcome {
    SignedIn { profile: UserProfile, landing: &'static str },
    NeedsVerification(VerificationRequired),
}

// =============================================================================
// STORE
// =============================================================================

struct Inner {
    auth: Rc<dyn AuthClient>,
    rpc: Rc<dyn RemoteProcedureClient>,
    config: SessionConfig,
    state: RefCell<SessionSnapshot>,
    init: RefCell<Option<Shared<LocalBoxFuture<'static, SessionPhase>>>>,
    listeners: RefCell<Vec<(ListenerId, Listener)>>,
    next_listener: Cell<u64>,
    watching: Cell<bool>,
    watch_abort: RefCell<Option<AbortHandle>>,
    /// Subjects whose profile lookup is in flight.
    establishing: RefCell<Vec<String>>,
    disposed: Cell<bool>,
}

/// Marks a subject as being established until dropped.
struct EstablishGuard<'a> {
    slot: &'a RefCell<Vec<String>>,
    subject: String,
}

impl<'a> EstablishGuard<'a> {
    fn new(slot: &'a RefCell<Vec<String>>, subject: &str) -> Self {
        slot.borrow_mut().push(subject.to_owned());
        Self { slot, subject: subject.to_owned() }
    }
}

impl Drop for EstablishGuard<'_> {
    fn drop(&mut self) {
        let mut slot = self.slot.borrow_mut();
        if let Some(pos) = slot.iter().position(|s| *s == self.subject) {
            slot.remove(pos);
        }
    }
}

/// Process-wide session store. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct SessionStore {
    inner: Rc<Inner>,
}

impl SessionStore {
    #[must_use]
    pub fn new(auth: Rc<dyn AuthClient>, rpc: Rc<dyn RemoteProcedureClient>, config: SessionConfig) -> Self {
        Self {
            inner: Rc::new(Inner {
                auth,
                rpc,
                config,
                state: RefCell::new(SessionSnapshot::default()),
                init: RefCell::new(None),
                listeners: RefCell::new(Vec::new()),
                next_listener: Cell::new(0),
                watching: Cell::new(false),
                watch_abort: RefCell::new(None),
                establishing: RefCell::new(Vec::new()),
                disposed: Cell::new(false),
            }),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.state.borrow().clone()
    }

    #[must_use]
    pub fn profile(&self) -> Option<UserProfile> {
        self.inner.state.borrow().profile.clone()
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    pub(crate) fn auth(&self) -> &dyn AuthClient {
        self.inner.auth.as_ref()
    }

    pub(crate) fn rpc(&self) -> &dyn RemoteProcedureClient {
        self.inner.rpc.as_ref()
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }

    /// Register an observer called after every committed state change.
    pub fn on_change(&self, listener: impl Fn(&SessionSnapshot) + 'static) -> ListenerId {
        let id = ListenerId(self.inner.next_listener.get());
        self.inner.next_listener.set(id.0 + 1);
        self.inner.listeners.borrow_mut().push((id, Rc::new(listener)));
        id
    }

    pub fn remove_listener(&self, id: ListenerId) {
        self.inner.listeners.borrow_mut().retain(|(lid, _)| *lid != id);
    }

    /// Apply a state change and notify observers. Returns `false` when the
    /// store is disposed or nothing changed.
    fn commit(&self, mutate: impl FnOnce(&mut SessionSnapshot)) -> bool {
        if self.is_disposed() {
            tracing::debug!("dropping session update after dispose");
            return false;
        }
        let snapshot = {
            let mut state = self.inner.state.borrow_mut();
            let before = state.clone();
            mutate(&mut state);
            if *state == before {
                return false;
            }
            state.clone()
        };
        let listeners: Vec<Listener> = self.inner.listeners.borrow().iter().map(|(_, l)| l.clone()).collect();
        for listener in listeners {
            listener(&snapshot);
        }
        true
    }

    fn clear(&self) {
        self.commit(|s| *s = SessionSnapshot::signed_out());
    }

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Determine the initial identity. Runs once per store; concurrent and
    /// later callers await the same result.
    pub async fn initialize(&self) -> SessionPhase {
        let shared = {
            let mut slot = self.inner.init.borrow_mut();
            slot.get_or_insert_with(|| {
                let weak = Rc::downgrade(&self.inner);
                async move {
                    match weak.upgrade() {
                        Some(inner) => SessionStore { inner }.run_initialize().await,
                        None => SessionPhase::Unauthenticated,
                    }
                }
                .boxed_local()
                .shared()
            })
            .clone()
        };
        shared.await
    }

    async fn run_initialize(&self) -> SessionPhase {
        let existing = match self.auth().get_session().await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(error = %e, "session lookup failed; starting signed out");
                None
            }
        };

        let Some(session) = existing else {
            self.clear();
            return SessionPhase::Unauthenticated;
        };

        match self.establish(session).await {
            Ok(_) => SessionPhase::Authenticated,
            Err(_) => SessionPhase::Unauthenticated,
        }
    }

    /// Consume provider session-change notifications until [`Self::dispose`].
    ///
    /// Spawn this once at the application root. Later calls return at once.
    pub async fn watch_session_changes(&self) {
        if self.is_disposed() {
            return;
        }
        if self.inner.watching.replace(true) {
            tracing::warn!("session watcher already started for this store");
            return;
        }
        let (handle, registration) = AbortHandle::new_pair();
        *self.inner.watch_abort.borrow_mut() = Some(handle);

        let mut events = self.auth().session_changes();
        let store = self.clone();
        let run = async move {
            while let Some(event) = events.next().await {
                store.handle_auth_event(event).await;
            }
        };
        if Abortable::new(run, registration).await.is_err() {
            tracing::debug!("session watcher stopped by dispose");
        }
    }

    async fn handle_auth_event(&self, event: AuthEvent) {
        match event {
            AuthEvent::SignedOut => self.clear(),
            AuthEvent::PasswordRecovery(session) => {
                // Only the account already signed in stays authenticated.
                self.commit(|s| {
                    if s.profile.as_ref().is_none_or(|p| p.auth_id != session.subject) {
                        s.phase = SessionPhase::Unauthenticated;
                        s.profile = None;
                    }
                    s.session = Some(session);
                });
            }
            AuthEvent::SignedIn(session) | AuthEvent::TokenRefreshed(session) | AuthEvent::UserUpdated(session) => {
                let known = self
                    .inner
                    .state
                    .borrow()
                    .profile
                    .as_ref()
                    .is_some_and(|p| p.auth_id == session.subject);
                let in_flight = self.inner.establishing.borrow().contains(&session.subject);
                if known {
                    self.commit(|s| s.session = Some(session));
                } else if in_flight {
                    tracing::debug!(subject = %session.subject, "profile lookup already in flight");
                } else if let Err(e) = self.establish(session).await {
                    tracing::warn!(error = %e, "session change could not be established");
                }
            }
        }
    }

    /// Stop the session watcher, drop observers, and ignore late completions.
    pub fn dispose(&self) {
        if self.inner.disposed.replace(true) {
            return;
        }
        if let Some(handle) = self.inner.watch_abort.borrow_mut().take() {
            handle.abort();
        }
        self.inner.listeners.borrow_mut().clear();
        tracing::debug!("session store disposed");
    }

    // =========================================================================
    // IDENTITY
    // =========================================================================

    async fn resolve_profile(&self, session: &Session) -> Result<UserProfile, SessionError> {
        let record: ProfileRecord = invoke_as(self.rpc(), GET_USER_PROFILE, json!({ "user_id": session.subject }))
            .await?
            .ok_or_else(|| SessionError::ProfileResolution("no profile record for this account".to_owned()))?;
        Ok(UserProfile::from_record(&session.subject, record)?)
    }

    /// Resolve the profile for `session` and commit both, or fail closed.
    async fn establish(&self, session: Session) -> Result<UserProfile, SessionError> {
        let _guard = EstablishGuard::new(&self.inner.establishing, &session.subject);
        let profile = match self.resolve_profile(&session).await {
            Ok(profile) => profile,
            Err(e) => {
                tracing::warn!(subject = %session.subject, error = %e, "profile resolution failed; signing out");
                if let Err(sign_out_err) = self.auth().sign_out().await {
                    tracing::warn!(error = %sign_out_err, "upstream sign-out failed");
                }
                self.clear();
                return Err(match e {
                    SessionError::ProfileResolution(_) => e,
                    other => SessionError::ProfileResolution(other.to_string()),
                });
            }
        };

        if self.is_disposed() {
            return Err(SessionError::Disposed);
        }
        tracing::info!(subject = %session.subject, role = %profile.role(), "session established");
        let committed = profile.clone();
        self.commit(|s| {
            s.phase = SessionPhase::Authenticated;
            s.session = Some(session);
            s.profile = Some(committed);
        });
        Ok(profile)
    }

    /// Exchange credentials for a session and load its profile.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Auth`] for rejected credentials and
    /// [`SessionError::ProfileResolution`] when the account has no usable
    /// profile. An unverified email is not an error: it yields
    /// [`SignInOutcome::NeedsVerification`].
    pub async fn sign_in(&self, credentials: Credentials) -> Result<SignInOutcome, SessionError> {
        if self.is_disposed() {
            return Err(SessionError::Disposed);
        }
        match self.auth().sign_in(&credentials).await {
            Ok(session) => {
                let profile = self.establish(session).await?;
                let landing = profile.landing_route();
                Ok(SignInOutcome::SignedIn { profile, landing })
            }
            Err(AuthError::EmailNotConfirmed) => {
                tracing::info!(email = %credentials.email, "sign-in blocked until email is verified");
                Ok(SignInOutcome::NeedsVerification(VerificationRequired::new(&credentials.email)))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Invalidate the provider session and clear local identity.
    ///
    /// Local state is cleared even when the provider call fails.
    ///
    /// # Errors
    ///
    /// Returns the provider error after clearing local state.
    pub async fn sign_out(&self) -> Result<(), SessionError> {
        let remote = self.auth().sign_out().await;
        self.clear();
        if let Err(e) = &remote {
            tracing::warn!(error = %e, "provider sign-out failed; local session cleared anyway");
        }
        remote.map_err(SessionError::from)
    }

    // =========================================================================
    // PROFILE
    // =========================================================================

    pub(crate) fn require_profile(&self) -> Result<UserProfile, SessionError> {
        if self.is_disposed() {
            return Err(SessionError::Disposed);
        }
        let state = self.inner.state.borrow();
        match (&state.phase, &state.profile) {
            (SessionPhase::Authenticated, Some(profile)) => Ok(profile.clone()),
            _ => Err(SessionError::NotSignedIn),
        }
    }

    pub(crate) fn require_role(&self, role: Role) -> Result<UserProfile, SessionError> {
        let profile = self.require_profile()?;
        if profile.role() == role { Ok(profile) } else { Err(SessionError::Forbidden(role)) }
    }

    /// Replace the cached profile for `user_id`, if that user is still signed in.
    pub(crate) fn replace_profile(&self, user_id: &str, profile: UserProfile) -> bool {
        self.commit(|s| {
            if s.profile.as_ref().is_some_and(|p| p.user_id == user_id) {
                s.profile = Some(profile);
            }
        })
    }

    pub(crate) async fn refetch_profile(&self) -> Result<UserProfile, SessionError> {
        let session = self.inner.state.borrow().session.clone().ok_or(SessionError::NotSignedIn)?;
        let profile = self.resolve_profile(&session).await?;
        self.replace_profile(&profile.user_id.clone(), profile.clone());
        Ok(profile)
    }

    /// Update the signed-in user's own profile and merge the server's answer.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Invalid`] for a rejected update and
    /// [`SessionError::Remote`] when the backend call fails; the cached
    /// profile is left unchanged in both cases.
    pub async fn update_profile(&self, update: ProfileUpdate) -> Result<UserProfile, SessionError> {
        let update = update.validated().map_err(|m| SessionError::Invalid(m.to_owned()))?;
        let current = self.require_profile()?;

        let patch: ProfilePatch =
            invoke_as(self.rpc(), UPDATE_PROFILE, json!({ "updates": update, "id": current.user_id }))
                .await?
                .unwrap_or_default();

        // Merge into whatever is cached now, not the pre-call copy.
        let mut merged = self.profile().filter(|p| p.user_id == current.user_id).unwrap_or(current);
        merged.apply_patch(&patch);
        self.replace_profile(&merged.user_id.clone(), merged.clone());
        Ok(merged)
    }
}
