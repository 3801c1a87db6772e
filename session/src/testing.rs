//! In-memory collaborators for unit tests.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use futures::channel::mpsc;
use futures::stream::LocalBoxStream;
use futures::StreamExt;
use serde_json::{Value, json};

use crate::backend::{
    AuthClient, AuthEvent, ChangeCallback, ChangeEvent, ChangeFeedClient, ChangeKind, Collection, Credentials,
    RemoteProcedureClient, Session, Unsubscribe,
};
use crate::config::SessionConfig;
use crate::error::{AuthError, FeedError, RpcError};
use crate::store::SessionStore;

// =============================================================================
// FIXTURES
// =============================================================================

pub(crate) fn session_for(subject: &str) -> Session {
    Session {
        subject: subject.to_owned(),
        email: Some(format!("{subject}@uni.edu")),
        access_token: format!("token-{subject}"),
        refresh_token: Some(format!("refresh-{subject}")),
        issued_at: 1_700_000_000,
        expires_at: 1_700_003_600,
    }
}

pub(crate) fn student_record(user_id: &str) -> Value {
    json!({
        "userData": { "userID": user_id, "user_name": "Ana", "email": "ana@uni.edu", "role": "student" },
        "roleData": { "studentid": format!("S-{user_id}"), "birthday": "2001-04-02", "age": 23 }
    })
}

pub(crate) fn admin_record(user_id: &str, super_admin: bool, complete: bool) -> Value {
    json!({
        "userData": { "userID": user_id, "user_name": "Dr. Reyes", "email": "reyes@uni.edu", "role": "admin" },
        "roleData": {
            "adminid": format!("A-{user_id}"),
            "super_admin": if super_admin { "yes" } else { "no" },
            "isProfile_set": if complete { "set" } else { "unset" }
        }
    })
}

pub(crate) fn config() -> SessionConfig {
    SessionConfig::new("https://project.backend.test", "https://mira.test")
}

pub(crate) fn store(auth: &Rc<MockAuth>, rpc: &Rc<MockRpc>) -> SessionStore {
    SessionStore::new(auth.clone(), rpc.clone(), config())
}

/// Store already signed in as `record`, with the profile lookup answered.
pub(crate) async fn signed_in_store(record: Value) -> (SessionStore, Rc<MockAuth>, Rc<MockRpc>) {
    let auth = Rc::new(MockAuth::with_session(session_for("auth-1")));
    let rpc = Rc::new(MockRpc::new());
    rpc.respond("get-user-profile", Ok(record));
    let store = store(&auth, &rpc);
    store.initialize().await;
    (store, auth, rpc)
}

// =============================================================================
// AUTH
// =============================================================================

pub(crate) struct MockAuth {
    pub session: RefCell<Result<Option<Session>, AuthError>>,
    pub sign_in_result: RefCell<Result<Session, AuthError>>,
    pub sign_out_result: RefCell<Result<(), AuthError>>,
    pub get_session_calls: Cell<u32>,
    pub sign_out_calls: Cell<u32>,
    pub reset_requests: RefCell<Vec<(String, String)>>,
    pub password_updates: RefCell<Vec<String>>,
    senders: RefCell<Vec<mpsc::UnboundedSender<AuthEvent>>>,
}

impl MockAuth {
    pub fn new() -> Self {
        Self {
            session: RefCell::new(Ok(None)),
            sign_in_result: RefCell::new(Err(AuthError::InvalidCredentials)),
            sign_out_result: RefCell::new(Ok(())),
            get_session_calls: Cell::new(0),
            sign_out_calls: Cell::new(0),
            reset_requests: RefCell::new(Vec::new()),
            password_updates: RefCell::new(Vec::new()),
            senders: RefCell::new(Vec::new()),
        }
    }

    pub fn with_session(session: Session) -> Self {
        let auth = Self::new();
        *auth.session.borrow_mut() = Ok(Some(session));
        auth
    }

    /// Push a provider event to every open `session_changes` stream.
    pub fn emit(&self, event: AuthEvent) {
        self.senders.borrow_mut().retain(|tx| tx.unbounded_send(event.clone()).is_ok());
    }

    pub fn open_streams(&self) -> usize {
        self.senders.borrow_mut().retain(|tx| !tx.is_closed());
        self.senders.borrow().len()
    }
}

#[async_trait::async_trait(?Send)]
impl AuthClient for MockAuth {
    async fn get_session(&self) -> Result<Option<Session>, AuthError> {
        self.get_session_calls.set(self.get_session_calls.get() + 1);
        // Suspend once so concurrent callers overlap.
        tokio::task::yield_now().await;
        self.session.borrow().clone()
    }

    fn session_changes(&self) -> LocalBoxStream<'static, AuthEvent> {
        let (tx, rx) = mpsc::unbounded();
        self.senders.borrow_mut().push(tx);
        rx.boxed_local()
    }

    /// Like the provider, announces a successful sign-in before returning.
    async fn sign_in(&self, _credentials: &Credentials) -> Result<Session, AuthError> {
        let result = self.sign_in_result.borrow().clone();
        if let Ok(session) = &result {
            self.emit(AuthEvent::SignedIn(session.clone()));
        }
        result
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.sign_out_calls.set(self.sign_out_calls.get() + 1);
        self.sign_out_result.borrow().clone()
    }

    async fn reset_password(&self, email: &str, redirect_to: &str) -> Result<(), AuthError> {
        self.reset_requests.borrow_mut().push((email.to_owned(), redirect_to.to_owned()));
        Ok(())
    }

    async fn update_password(&self, new_password: &str) -> Result<(), AuthError> {
        self.password_updates.borrow_mut().push(new_password.to_owned());
        Ok(())
    }
}

// =============================================================================
// REMOTE PROCEDURES
// =============================================================================

/// Scripted procedure responses. Queued responses are served in order and the
/// last one is sticky; unscripted procedures answer with a 404.
pub(crate) struct MockRpc {
    responses: RefCell<HashMap<String, VecDeque<Result<Value, RpcError>>>>,
    calls: RefCell<Vec<(String, Value)>>,
    /// Suspend once per call so other tasks run mid-request.
    pub suspend: Cell<bool>,
}

impl MockRpc {
    pub fn new() -> Self {
        Self { responses: RefCell::new(HashMap::new()), calls: RefCell::new(Vec::new()), suspend: Cell::new(false) }
    }

    /// Answer every later call to `procedure` with `result`.
    pub fn respond(&self, procedure: &str, result: Result<Value, RpcError>) {
        self.responses.borrow_mut().insert(procedure.to_owned(), VecDeque::from([result]));
    }

    /// Queue `result` behind the responses already scripted for `procedure`.
    pub fn respond_then(&self, procedure: &str, result: Result<Value, RpcError>) {
        self.responses.borrow_mut().entry(procedure.to_owned()).or_default().push_back(result);
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.borrow().clone()
    }

    pub fn calls_to(&self, procedure: &str) -> Vec<Value> {
        self.calls.borrow().iter().filter(|(p, _)| p == procedure).map(|(_, v)| v.clone()).collect()
    }
}

#[async_trait::async_trait(?Send)]
impl RemoteProcedureClient for MockRpc {
    async fn invoke(&self, procedure: &str, payload: Value) -> Result<Value, RpcError> {
        self.calls.borrow_mut().push((procedure.to_owned(), payload));
        if self.suspend.get() {
            tokio::task::yield_now().await;
        }
        let mut responses = self.responses.borrow_mut();
        match responses.get_mut(procedure) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or(Ok(Value::Null)),
            Some(queue) => queue.front().cloned().unwrap_or(Ok(Value::Null)),
            None => Err(RpcError::Status {
                procedure: procedure.to_owned(),
                status: 404,
                message: "no such function".to_owned(),
            }),
        }
    }
}

// =============================================================================
// CHANGE FEED
// =============================================================================

type Subscribers = Rc<RefCell<HashMap<Collection, Vec<(u64, ChangeCallback)>>>>;

#[derive(Default)]
pub(crate) struct MockFeed {
    subscribers: Subscribers,
    next_id: Cell<u64>,
    pub opened: Cell<u32>,
    pub fail_next: Cell<bool>,
}

impl MockFeed {
    pub fn active(&self, collection: Collection) -> usize {
        self.subscribers.borrow().get(&collection).map_or(0, Vec::len)
    }

    pub fn emit(&self, collection: Collection, kind: ChangeKind, record: Value) {
        let callbacks: Vec<ChangeCallback> = self
            .subscribers
            .borrow()
            .get(&collection)
            .map(|subs| subs.iter().map(|(_, cb)| cb.clone()).collect())
            .unwrap_or_default();
        for callback in callbacks {
            callback(ChangeEvent { collection, kind, record: record.clone(), old_record: Value::Null });
        }
    }
}

impl ChangeFeedClient for MockFeed {
    fn subscribe(&self, collection: Collection, on_event: ChangeCallback) -> Result<Unsubscribe, FeedError> {
        if self.fail_next.replace(false) {
            return Err(FeedError::Connect("socket unavailable".to_owned()));
        }
        self.opened.set(self.opened.get() + 1);
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.subscribers.borrow_mut().entry(collection).or_default().push((id, on_event));

        let subscribers = self.subscribers.clone();
        Ok(Unsubscribe::new(move || {
            if let Some(subs) = subscribers.borrow_mut().get_mut(&collection) {
                subs.retain(|(sid, _)| *sid != id);
            }
        }))
    }
}
