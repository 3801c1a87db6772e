//! HTTP implementation of the identity provider and remote procedure
//! contracts against the hosted backend.
//!
//! Client-side (hydrate): real HTTP calls via `gloo-net`, session persisted
//! in `localStorage`. Server-side and native tests only see the pure request
//! and response helpers.
//!
//! ERROR HANDLING
//! ==============
//! Provider error bodies are mapped onto [`AuthError`] variants so the login
//! page can branch on "email not confirmed" without string matching. Edge
//! function failures keep the procedure name and HTTP status in [`RpcError`].

#[cfg(test)]
#[path = "supabase_test.rs"]
mod supabase_test;

#[cfg(any(test, feature = "hydrate"))]
use serde::Deserialize;
#[cfg(any(test, feature = "hydrate"))]
use serde_json::Value;
#[cfg(any(test, feature = "hydrate"))]
use session::Session;
#[cfg(any(test, feature = "hydrate"))]
use session::backend::AuthEvent;
#[cfg(any(test, feature = "hydrate"))]
use session::error::{AuthError, RpcError};

#[cfg(feature = "hydrate")]
use std::cell::RefCell;
#[cfg(feature = "hydrate")]
use std::rc::{Rc, Weak};

#[cfg(feature = "hydrate")]
use futures::StreamExt;
#[cfg(feature = "hydrate")]
use futures::channel::mpsc;
#[cfg(feature = "hydrate")]
use futures::stream::LocalBoxStream;
#[cfg(feature = "hydrate")]
use session::Credentials;
#[cfg(feature = "hydrate")]
use session::backend::{AuthClient, RemoteProcedureClient};

#[cfg(feature = "hydrate")]
use super::config::BackendEnv;
#[cfg(feature = "hydrate")]
use crate::util::{clock, storage};

#[cfg(feature = "hydrate")]
const SESSION_STORAGE_KEY: &str = "mira.auth.session";

/// Refresh this many seconds before the provider's expiry.
#[cfg(any(test, feature = "hydrate"))]
const EXPIRY_MARGIN_SECS: i64 = 30;

#[cfg(any(test, feature = "hydrate"))]
const DEFAULT_TOKEN_TTL_SECS: i64 = 3600;

/// Longest sleep between session freshness checks.
#[cfg(any(test, feature = "hydrate"))]
const MAX_CHECK_INTERVAL_SECS: u64 = 60;

// =============================================================================
// WIRE HELPERS
// =============================================================================

#[cfg(any(test, feature = "hydrate"))]
fn auth_endpoint(project_url: &str, path: &str) -> String {
    format!("{project_url}/auth/v1/{path}")
}

#[cfg(any(test, feature = "hydrate"))]
fn function_endpoint(project_url: &str, procedure: &str) -> String {
    format!("{project_url}/functions/v1/{procedure}")
}

#[cfg(any(test, feature = "hydrate"))]
#[derive(Debug, Deserialize)]
struct TokenUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

#[cfg(any(test, feature = "hydrate"))]
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: TokenUser,
}

#[cfg(any(test, feature = "hydrate"))]
fn session_from_token(token: TokenResponse, now_secs: i64) -> Session {
    let expires_at = token
        .expires_at
        .unwrap_or_else(|| now_secs + token.expires_in.unwrap_or(DEFAULT_TOKEN_TTL_SECS));
    Session {
        subject: token.user.id,
        email: token.user.email,
        access_token: token.access_token,
        refresh_token: token.refresh_token,
        issued_at: now_secs,
        expires_at,
    }
}

#[cfg(any(test, feature = "hydrate"))]
fn needs_refresh(session: &Session, now_secs: i64) -> bool {
    session.is_expired(now_secs + EXPIRY_MARGIN_SECS)
}

/// What to do with the held session before its token is used.
#[cfg(any(test, feature = "hydrate"))]
#[derive(Debug, PartialEq, Eq)]
enum TokenStep {
    Use,
    Refresh(String),
    /// Close to expiry and nothing to refresh with.
    Expire,
}

#[cfg(any(test, feature = "hydrate"))]
fn token_step(session: &Session, now_secs: i64) -> TokenStep {
    if !needs_refresh(session, now_secs) {
        return TokenStep::Use;
    }
    match &session.refresh_token {
        Some(token) => TokenStep::Refresh(token.clone()),
        None => TokenStep::Expire,
    }
}

/// A rejected refresh ends the session. A transport failure keeps it until
/// the token has actually expired, so a brief outage does not sign anyone out.
#[cfg(any(test, feature = "hydrate"))]
fn ends_session(error: &AuthError, session: &Session, now_secs: i64) -> bool {
    !matches!(error, AuthError::Transport(_)) || session.is_expired(now_secs)
}

/// Seconds to sleep before the next freshness check.
#[cfg(any(test, feature = "hydrate"))]
fn refresh_delay_secs(session: Option<&Session>, now_secs: i64) -> u64 {
    let Some(session) = session else {
        return MAX_CHECK_INTERVAL_SECS;
    };
    let due = session.expires_at - EXPIRY_MARGIN_SECS - now_secs;
    u64::try_from(due).unwrap_or(0).clamp(1, MAX_CHECK_INTERVAL_SECS)
}

/// Error body shapes the provider uses across endpoints and versions.
#[cfg(any(test, feature = "hydrate"))]
#[derive(Debug, Default, Deserialize)]
struct ProviderFailure {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[cfg(any(test, feature = "hydrate"))]
fn auth_failure(status: u16, body: &str) -> AuthError {
    let failure: ProviderFailure = serde_json::from_str(body).unwrap_or_default();
    let text = failure
        .error_description
        .or(failure.msg)
        .or(failure.message)
        .unwrap_or_else(|| format!("status {status}"));
    let code = failure.error_code.as_deref().or(failure.error.as_deref()).unwrap_or_default();

    if code == "email_not_confirmed" || text.to_ascii_lowercase().contains("email not confirmed") {
        AuthError::EmailNotConfirmed
    } else if matches!(code, "invalid_grant" | "invalid_credentials") {
        AuthError::InvalidCredentials
    } else {
        AuthError::Provider(text)
    }
}

#[cfg(any(test, feature = "hydrate"))]
fn rpc_failure(procedure: &str, status: u16, body: &str) -> RpcError {
    #[derive(Default, Deserialize)]
    struct FunctionFailure {
        #[serde(default)]
        error: Option<Value>,
        #[serde(default)]
        message: Option<String>,
    }

    let failure: FunctionFailure = serde_json::from_str(body).unwrap_or_default();
    let message = match (failure.error, failure.message) {
        (Some(Value::String(text)), _) | (_, Some(text)) => text,
        (Some(other), None) => other.to_string(),
        (None, None) if body.trim().is_empty() => "no response body".to_owned(),
        (None, None) => body.trim().chars().take(200).collect(),
    };
    RpcError::Status { procedure: procedure.to_owned(), status, message }
}

/// Edge functions may answer with an empty body, which means `null`.
#[cfg(any(test, feature = "hydrate"))]
fn parse_rpc_body(procedure: &str, body: &str) -> Result<Value, RpcError> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(body)
        .map_err(|e| RpcError::Decode { procedure: procedure.to_owned(), message: e.to_string() })
}

/// Why the provider sent the browser back to us.
#[cfg(any(test, feature = "hydrate"))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RedirectKind {
    /// Email confirmation or magic link: a normal sign-in.
    SignIn,
    /// Password-reset link.
    Recovery,
}

/// Tokens carried in the URL fragment after an email link.
#[cfg(any(test, feature = "hydrate"))]
#[derive(Clone, Debug, PartialEq, Eq)]
struct RedirectTokens {
    access_token: String,
    refresh_token: Option<String>,
    expires_at: Option<i64>,
    expires_in: Option<i64>,
    kind: RedirectKind,
}

#[cfg(any(test, feature = "hydrate"))]
fn parse_redirect_fragment(fragment: &str) -> Option<RedirectTokens> {
    let mut access_token = None;
    let mut tokens = RedirectTokens {
        access_token: String::new(),
        refresh_token: None,
        expires_at: None,
        expires_in: None,
        kind: RedirectKind::SignIn,
    };
    for pair in fragment.trim_start_matches('#').split('&') {
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };
        match key {
            "access_token" if !value.is_empty() => access_token = Some(value.to_owned()),
            "refresh_token" if !value.is_empty() => tokens.refresh_token = Some(value.to_owned()),
            "expires_at" => tokens.expires_at = value.parse().ok(),
            "expires_in" => tokens.expires_in = value.parse().ok(),
            "type" if value == "recovery" => tokens.kind = RedirectKind::Recovery,
            _ => {}
        }
    }
    tokens.access_token = access_token?;
    Some(tokens)
}

#[cfg(any(test, feature = "hydrate"))]
impl RedirectTokens {
    fn into_event(self, user: TokenUser, now_secs: i64) -> AuthEvent {
        let kind = self.kind;
        let session = session_from_token(
            TokenResponse {
                access_token: self.access_token,
                refresh_token: self.refresh_token,
                expires_in: self.expires_in,
                expires_at: self.expires_at,
                user,
            },
            now_secs,
        );
        match kind {
            RedirectKind::SignIn => AuthEvent::SignedIn(session),
            RedirectKind::Recovery => AuthEvent::PasswordRecovery(session),
        }
    }
}

// =============================================================================
// BROWSER CLIENT
// =============================================================================

/// Response status and body of a finished request.
#[cfg(feature = "hydrate")]
struct Reply {
    ok: bool,
    status: u16,
    body: String,
}

/// Backend client shared by the session store (auth + procedures) and the
/// realtime feed (access token).
#[cfg(feature = "hydrate")]
pub struct BackendClient {
    env: BackendEnv,
    session: RefCell<Option<Session>>,
    listeners: RefCell<Vec<mpsc::UnboundedSender<AuthEvent>>>,
    /// Events raised before anyone watched, replayed to the first watcher.
    pending: RefCell<Vec<AuthEvent>>,
}

#[cfg(feature = "hydrate")]
impl BackendClient {
    pub fn new(env: BackendEnv) -> Rc<Self> {
        let session = storage::load_json::<Session>(SESSION_STORAGE_KEY);
        Rc::new(Self { env, session: RefCell::new(session), listeners: RefCell::default(), pending: RefCell::default() })
    }

    pub fn env(&self) -> &BackendEnv {
        &self.env
    }

    /// Bearer for API calls: the user's token when signed in, else the anon key.
    ///
    /// Reads the held token as is; [`Self::keep_fresh`] refreshes it ahead
    /// of expiry.
    pub fn bearer(&self) -> String {
        self.session
            .borrow()
            .as_ref()
            .map_or_else(|| self.env.anon_key.clone(), |s| s.access_token.clone())
    }

    fn set_session(&self, session: Option<Session>) {
        storage::save_json(SESSION_STORAGE_KEY, session.as_ref());
        *self.session.borrow_mut() = session;
    }

    /// Drop the held session and tell the store.
    fn expire(&self) {
        self.set_session(None);
        self.broadcast(AuthEvent::SignedOut);
    }

    /// True once the held session is no longer the one `started` describes.
    fn replaced(&self, started: &Session) -> bool {
        self.session.borrow().as_ref().is_none_or(|s| s.access_token != started.access_token)
    }

    /// The held session with a usable token, refreshed first when it is
    /// close to expiry.
    ///
    /// ERROR HANDLING
    /// ==============
    /// A session that cannot be refreshed is dropped and `SignedOut` is
    /// broadcast so the store clears. Transport failures are returned while
    /// the token is still valid.
    async fn fresh_session(&self) -> Result<Option<Session>, AuthError> {
        let Some(current) = self.session.borrow().clone() else {
            return Ok(None);
        };
        let refresh_token = match token_step(&current, clock::now_secs()) {
            TokenStep::Use => return Ok(Some(current)),
            TokenStep::Expire => {
                log::info!("session expired without a refresh token");
                self.expire();
                return Ok(None);
            }
            TokenStep::Refresh(token) => token,
        };

        let refreshed = self.token_request("refresh_token", serde_json::json!({ "refresh_token": refresh_token })).await;
        // A sign-out, sign-in, or concurrent refresh finished first.
        if self.replaced(&current) {
            return Ok(self.session.borrow().clone());
        }
        match refreshed {
            Ok(session) => {
                self.set_session(Some(session.clone()));
                self.broadcast(AuthEvent::TokenRefreshed(session.clone()));
                Ok(Some(session))
            }
            Err(e) if ends_session(&e, &current, clock::now_secs()) => {
                log::info!("session could not be refreshed: {e}");
                self.expire();
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Refresh the held session ahead of expiry for as long as the client
    /// lives. Spawn once at the application root.
    pub async fn keep_fresh(weak: Weak<Self>) {
        loop {
            let delay = {
                let Some(client) = weak.upgrade() else {
                    return;
                };
                let held = client.session.borrow().clone();
                refresh_delay_secs(held.as_ref(), clock::now_secs())
            };
            gloo_timers::future::sleep(std::time::Duration::from_secs(delay)).await;
            let Some(client) = weak.upgrade() else {
                return;
            };
            if let Err(e) = client.fresh_session().await {
                log::warn!("session refresh failed: {e}");
            }
        }
    }

    fn broadcast(&self, event: AuthEvent) {
        let mut listeners = self.listeners.borrow_mut();
        listeners.retain(|tx| tx.unbounded_send(event.clone()).is_ok());
        if listeners.is_empty() {
            self.pending.borrow_mut().push(event);
        }
    }

    async fn send(&self, request: Result<gloo_net::http::Request, gloo_net::Error>) -> Result<Reply, String> {
        let resp = request.map_err(|e| e.to_string())?.send().await.map_err(|e| e.to_string())?;
        let status = resp.status();
        let ok = resp.ok();
        let body = resp.text().await.map_err(|e| e.to_string())?;
        Ok(Reply { ok, status, body })
    }

    async fn token_request(&self, grant_type: &str, body: Value) -> Result<Session, AuthError> {
        let url = auth_endpoint(&self.env.project_url, "token");
        let request = gloo_net::http::Request::post(&url)
            .query([("grant_type", grant_type)])
            .header("apikey", &self.env.anon_key)
            .json(&body);
        let reply = self.send(request).await.map_err(AuthError::Transport)?;
        if !reply.ok {
            return Err(auth_failure(reply.status, &reply.body));
        }
        let token: TokenResponse =
            serde_json::from_str(&reply.body).map_err(|e| AuthError::Provider(format!("token response: {e}")))?;
        Ok(session_from_token(token, clock::now_secs()))
    }

    /// Complete a sign-in or password-recovery redirect carried in the URL
    /// fragment, then strip the tokens from the address bar.
    pub async fn absorb_redirect(&self) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let location = window.location();
        let Some(tokens) = location.hash().ok().as_deref().and_then(parse_redirect_fragment) else {
            return;
        };
        if let (Ok(path), Ok(history)) = (location.pathname(), window.history()) {
            let _ = history.replace_state_with_url(&wasm_bindgen::JsValue::NULL, "", Some(path.as_str()));
        }

        let url = auth_endpoint(&self.env.project_url, "user");
        let request = gloo_net::http::Request::get(&url)
            .header("apikey", &self.env.anon_key)
            .header("Authorization", &format!("Bearer {}", tokens.access_token))
            .build();
        let user = match self.send(request).await {
            Ok(reply) if reply.ok => serde_json::from_str::<TokenUser>(&reply.body).ok(),
            Ok(reply) => {
                log::warn!("redirect token rejected: {}", auth_failure(reply.status, &reply.body));
                None
            }
            Err(e) => {
                log::warn!("redirect token lookup failed: {e}");
                None
            }
        };
        let Some(user) = user else {
            return;
        };

        let event = tokens.into_event(user, clock::now_secs());
        self.set_session(event.session().cloned());
        self.broadcast(event);
    }
}

#[cfg(feature = "hydrate")]
#[async_trait::async_trait(?Send)]
impl AuthClient for BackendClient {
    async fn get_session(&self) -> Result<Option<Session>, AuthError> {
        self.fresh_session().await
    }

    fn session_changes(&self) -> LocalBoxStream<'static, AuthEvent> {
        let (tx, rx) = mpsc::unbounded();
        for event in self.pending.borrow_mut().drain(..) {
            let _ = tx.unbounded_send(event);
        }
        self.listeners.borrow_mut().push(tx);
        rx.boxed_local()
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        let body = serde_json::json!({ "email": credentials.email, "password": credentials.password });
        let session = self.token_request("password", body).await?;
        self.set_session(Some(session.clone()));
        self.broadcast(AuthEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let Some(current) = self.session.borrow_mut().take() else {
            return Ok(());
        };
        self.set_session(None);
        self.broadcast(AuthEvent::SignedOut);

        let url = auth_endpoint(&self.env.project_url, "logout");
        let request = gloo_net::http::Request::post(&url)
            .header("apikey", &self.env.anon_key)
            .header("Authorization", &format!("Bearer {}", current.access_token))
            .build();
        let reply = self.send(request).await.map_err(AuthError::Transport)?;
        // An already-revoked token is as good as a successful logout.
        if reply.ok || reply.status == 401 {
            Ok(())
        } else {
            Err(auth_failure(reply.status, &reply.body))
        }
    }

    async fn reset_password(&self, email: &str, redirect_to: &str) -> Result<(), AuthError> {
        let url = auth_endpoint(&self.env.project_url, "recover");
        let request = gloo_net::http::Request::post(&url)
            .query([("redirect_to", redirect_to)])
            .header("apikey", &self.env.anon_key)
            .json(&serde_json::json!({ "email": email }));
        let reply = self.send(request).await.map_err(AuthError::Transport)?;
        if reply.ok { Ok(()) } else { Err(auth_failure(reply.status, &reply.body)) }
    }

    async fn update_password(&self, new_password: &str) -> Result<(), AuthError> {
        let Some(current) = self.session.borrow().clone() else {
            return Err(AuthError::Provider("no active session".to_owned()));
        };
        let url = auth_endpoint(&self.env.project_url, "user");
        let request = gloo_net::http::Request::put(&url)
            .header("apikey", &self.env.anon_key)
            .header("Authorization", &format!("Bearer {}", current.access_token))
            .json(&serde_json::json!({ "password": new_password }));
        let reply = self.send(request).await.map_err(AuthError::Transport)?;
        if !reply.ok {
            return Err(auth_failure(reply.status, &reply.body));
        }
        self.broadcast(AuthEvent::UserUpdated(current));
        Ok(())
    }
}

#[cfg(feature = "hydrate")]
#[async_trait::async_trait(?Send)]
impl RemoteProcedureClient for BackendClient {
    async fn invoke(&self, procedure: &str, payload: Value) -> Result<Value, RpcError> {
        let bearer = match self.fresh_session().await {
            Ok(Some(session)) => session.access_token,
            Ok(None) => self.env.anon_key.clone(),
            Err(e) => return Err(RpcError::Transport { procedure: procedure.to_owned(), message: e.to_string() }),
        };
        let url = function_endpoint(&self.env.project_url, procedure);
        let request = gloo_net::http::Request::post(&url)
            .header("apikey", &self.env.anon_key)
            .header("Authorization", &format!("Bearer {bearer}"))
            .json(&payload);
        let reply = self
            .send(request)
            .await
            .map_err(|message| RpcError::Transport { procedure: procedure.to_owned(), message })?;
        if !reply.ok {
            return Err(rpc_failure(procedure, reply.status, &reply.body));
        }
        parse_rpc_body(procedure, &reply.body)
    }
}
