use std::cell::RefCell;
use std::rc::Rc;

use serde_json::json;

use super::*;
use crate::error::{ErrorCode, RpcError};
use crate::testing::{MockAuth, MockRpc, admin_record, session_for, signed_in_store, store, student_record};

async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

fn recorder(store: &SessionStore) -> Rc<RefCell<Vec<SessionSnapshot>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    store.on_change(move |snap| sink.borrow_mut().push(snap.clone()));
    seen
}

// =============================================================
// initialize
// =============================================================

#[tokio::test]
async fn starts_loading_with_unknown_phase() {
    let store = store(&Rc::new(MockAuth::new()), &Rc::new(MockRpc::new()));
    let snap = store.snapshot();
    assert!(snap.loading());
    assert!(!snap.is_authenticated());
}

#[tokio::test]
async fn initialize_without_session_ends_signed_out() {
    let store = store(&Rc::new(MockAuth::new()), &Rc::new(MockRpc::new()));
    assert_eq!(store.initialize().await, SessionPhase::Unauthenticated);
    let snap = store.snapshot();
    assert!(!snap.loading());
    assert_eq!(snap, SessionSnapshot::signed_out());
}

#[tokio::test]
async fn initialize_with_session_resolves_profile() {
    let (store, _auth, rpc) = signed_in_store(student_record("u-1")).await;
    let snap = store.snapshot();
    assert!(!snap.loading());
    assert!(snap.is_authenticated());
    assert_eq!(snap.role(), Some(Role::Student));
    assert_eq!(snap.profile.unwrap().auth_id, "auth-1");
    assert_eq!(rpc.calls_to(GET_USER_PROFILE), vec![json!({ "user_id": "auth-1" })]);
}

#[tokio::test]
async fn concurrent_initialize_calls_share_one_lookup() {
    let auth = Rc::new(MockAuth::with_session(session_for("auth-1")));
    let rpc = Rc::new(MockRpc::new());
    rpc.respond(GET_USER_PROFILE, Ok(student_record("u-1")));
    let store = store(&auth, &rpc);

    let (a, b) = futures::join!(store.initialize(), store.initialize());
    assert_eq!(a, SessionPhase::Authenticated);
    assert_eq!(b, SessionPhase::Authenticated);
    assert_eq!(auth.get_session_calls.get(), 1);

    assert_eq!(store.initialize().await, SessionPhase::Authenticated);
    assert_eq!(auth.get_session_calls.get(), 1);
    assert_eq!(rpc.calls_to(GET_USER_PROFILE).len(), 1);
}

#[tokio::test]
async fn profile_failure_during_initialize_fails_closed() {
    let auth = Rc::new(MockAuth::with_session(session_for("auth-1")));
    let rpc = Rc::new(MockRpc::new());
    rpc.respond(
        GET_USER_PROFILE,
        Err(RpcError::Status { procedure: GET_USER_PROFILE.into(), status: 500, message: "boom".into() }),
    );
    let store = store(&auth, &rpc);

    assert_eq!(store.initialize().await, SessionPhase::Unauthenticated);
    assert_eq!(store.snapshot(), SessionSnapshot::signed_out());
    assert_eq!(auth.sign_out_calls.get(), 1);
}

#[tokio::test]
async fn profile_without_role_fails_closed() {
    let auth = Rc::new(MockAuth::with_session(session_for("auth-1")));
    let rpc = Rc::new(MockRpc::new());
    rpc.respond(GET_USER_PROFILE, Ok(json!({ "userData": { "userID": "u-1", "user_name": "x" } })));
    let store = store(&auth, &rpc);

    assert_eq!(store.initialize().await, SessionPhase::Unauthenticated);
    assert!(store.snapshot().session.is_none());
}

#[tokio::test]
async fn session_lookup_failure_starts_signed_out() {
    let auth = Rc::new(MockAuth::new());
    *auth.session.borrow_mut() = Err(AuthError::Transport("offline".into()));
    let store = store(&auth, &Rc::new(MockRpc::new()));

    assert_eq!(store.initialize().await, SessionPhase::Unauthenticated);
    assert!(!store.snapshot().loading());
}

#[tokio::test]
async fn dispose_drops_late_initialize_completion() {
    let auth = Rc::new(MockAuth::with_session(session_for("auth-1")));
    let rpc = Rc::new(MockRpc::new());
    rpc.respond(GET_USER_PROFILE, Ok(student_record("u-1")));
    let store = store(&auth, &rpc);
    let seen = recorder(&store);

    let (phase, ()) = futures::join!(store.initialize(), async { store.dispose() });

    assert_eq!(phase, SessionPhase::Unauthenticated);
    assert!(store.is_disposed());
    assert_eq!(store.snapshot(), SessionSnapshot::default());
    assert!(seen.borrow().is_empty());
}

// =============================================================
// sign in / sign out
// =============================================================

#[tokio::test]
async fn sign_in_returns_role_landing_route() {
    let auth = Rc::new(MockAuth::new());
    *auth.sign_in_result.borrow_mut() = Ok(session_for("auth-9"));
    let rpc = Rc::new(MockRpc::new());
    rpc.respond(GET_USER_PROFILE, Ok(admin_record("u-9", false, false)));
    let store = store(&auth, &rpc);
    store.initialize().await;

    let outcome = store.sign_in(Credentials::new(" reyes@uni.edu ", "pw")).await.unwrap();
    match outcome {
        SignInOutcome::SignedIn { profile, landing } => {
            assert_eq!(profile.role(), Role::Admin);
            assert_eq!(landing, "/complete-profile");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(store.snapshot().is_authenticated());
}

#[tokio::test]
async fn unverified_email_yields_structured_result() {
    let auth = Rc::new(MockAuth::new());
    *auth.sign_in_result.borrow_mut() = Err(AuthError::EmailNotConfirmed);
    let store = store(&auth, &Rc::new(MockRpc::new()));

    let outcome = store.sign_in(Credentials::new("new@uni.edu", "pw")).await.unwrap();
    let SignInOutcome::NeedsVerification(required) = outcome else {
        panic!("expected verification outcome");
    };
    assert_eq!(
        serde_json::to_value(&required).unwrap(),
        json!({ "message": "Please verify your email first.", "needsVerification": true, "email": "new@uni.edu" })
    );
    assert!(!store.snapshot().is_authenticated());
}

#[tokio::test]
async fn rejected_credentials_surface_auth_error() {
    let store = store(&Rc::new(MockAuth::new()), &Rc::new(MockRpc::new()));
    store.initialize().await;
    let err = store.sign_in(Credentials::new("x@uni.edu", "bad")).await.unwrap_err();
    assert_eq!(err, SessionError::Auth(AuthError::InvalidCredentials));
    assert_eq!(store.snapshot(), SessionSnapshot::signed_out());
}

#[tokio::test]
async fn sign_in_with_unresolvable_profile_fails_closed() {
    let auth = Rc::new(MockAuth::new());
    *auth.sign_in_result.borrow_mut() = Ok(session_for("auth-2"));
    let rpc = Rc::new(MockRpc::new());
    rpc.respond(GET_USER_PROFILE, Ok(json!({ "userData": { "userID": "u", "role": "counselor" } })));
    let store = store(&auth, &rpc);

    let err = store.sign_in(Credentials::new("x@uni.edu", "pw")).await.unwrap_err();
    assert!(matches!(err, SessionError::ProfileResolution(_)));
    assert_eq!(auth.sign_out_calls.get(), 1);
    assert!(store.snapshot().session.is_none());
}

#[tokio::test]
async fn sign_out_is_idempotent() {
    let (store, auth, _rpc) = signed_in_store(student_record("u-1")).await;
    let seen = recorder(&store);

    store.sign_out().await.unwrap();
    let first = store.snapshot();
    store.sign_out().await.unwrap();

    assert_eq!(first, SessionSnapshot::signed_out());
    assert_eq!(store.snapshot(), first);
    assert_eq!(seen.borrow().len(), 1);
    assert_eq!(auth.sign_out_calls.get(), 2);
}

#[tokio::test]
async fn sign_out_clears_locally_when_provider_fails() {
    let (store, auth, _rpc) = signed_in_store(student_record("u-1")).await;
    *auth.sign_out_result.borrow_mut() = Err(AuthError::Transport("offline".into()));

    let err = store.sign_out().await.unwrap_err();
    assert!(err.retryable());
    assert_eq!(store.snapshot(), SessionSnapshot::signed_out());
}

#[tokio::test]
async fn removed_listener_is_not_called() {
    let store = store(&Rc::new(MockAuth::new()), &Rc::new(MockRpc::new()));
    let calls = Rc::new(std::cell::Cell::new(0));
    let c = calls.clone();
    let id = store.on_change(move |_| c.set(c.get() + 1));
    store.remove_listener(id);
    store.initialize().await;
    assert_eq!(calls.get(), 0);
}

// =============================================================
// profile updates
// =============================================================

#[tokio::test]
async fn update_profile_merges_server_patch() {
    let (store, _auth, rpc) = signed_in_store(student_record("u-1")).await;
    rpc.respond(UPDATE_PROFILE, Ok(json!({ "user_name": "Ana B", "birthday": "2001-05-01", "age": 23 })));

    let update = ProfileUpdate { name: Some(" Ana B ".into()), birthday: Some("2001-05-01".into()), avatar: None };
    let profile = store.update_profile(update).await.unwrap();

    assert_eq!(profile.name, "Ana B");
    assert_eq!(profile.student().unwrap().birthday.as_deref(), Some("2001-05-01"));
    assert_eq!(store.profile(), Some(profile));
    assert_eq!(
        rpc.calls_to(UPDATE_PROFILE),
        vec![json!({ "updates": { "user_name": "Ana B", "birthday": "2001-05-01" }, "id": "u-1" })]
    );
}

#[tokio::test]
async fn failed_update_leaves_profile_unchanged() {
    let (store, _auth, rpc) = signed_in_store(student_record("u-1")).await;
    let before = store.profile();
    rpc.respond(
        UPDATE_PROFILE,
        Err(RpcError::Transport { procedure: UPDATE_PROFILE.into(), message: "reset".into() }),
    );

    let err = store
        .update_profile(ProfileUpdate { name: Some("New".into()), ..ProfileUpdate::default() })
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "E_RPC_TRANSPORT");
    assert_eq!(store.profile(), before);

    let err = store.update_profile(ProfileUpdate::default()).await.unwrap_err();
    assert_eq!(err, SessionError::Invalid("Nothing to update.".into()));
}

#[tokio::test]
async fn update_profile_requires_sign_in() {
    let store = store(&Rc::new(MockAuth::new()), &Rc::new(MockRpc::new()));
    store.initialize().await;
    let err = store
        .update_profile(ProfileUpdate { name: Some("x".into()), ..ProfileUpdate::default() })
        .await
        .unwrap_err();
    assert_eq!(err, SessionError::NotSignedIn);
}

// =============================================================
// session watcher
// =============================================================

#[tokio::test]
async fn watcher_applies_provider_events_until_disposed() {
    let (store, auth, rpc) = signed_in_store(student_record("u-1")).await;

    let driver = async {
        settle().await;
        assert_eq!(auth.open_streams(), 1);

        // Token refresh for the same subject keeps the cached profile.
        let mut refreshed = session_for("auth-1");
        refreshed.access_token = "token-2".into();
        auth.emit(AuthEvent::TokenRefreshed(refreshed));
        settle().await;
        assert_eq!(store.snapshot().session.unwrap().access_token, "token-2");
        assert_eq!(rpc.calls_to(GET_USER_PROFILE).len(), 1);

        auth.emit(AuthEvent::SignedOut);
        settle().await;
        assert_eq!(store.snapshot(), SessionSnapshot::signed_out());

        // A new sign-in from another tab resolves a fresh profile.
        auth.emit(AuthEvent::SignedIn(session_for("auth-1")));
        settle().await;
        assert!(store.snapshot().is_authenticated());
        assert_eq!(rpc.calls_to(GET_USER_PROFILE).len(), 2);

        store.dispose();
    };

    futures::join!(store.watch_session_changes(), driver);
    assert_eq!(auth.open_streams(), 0);
}

#[tokio::test]
async fn second_watcher_returns_immediately() {
    let (store, auth, _rpc) = signed_in_store(student_record("u-1")).await;

    let driver = async {
        settle().await;
        store.watch_session_changes().await;
        assert_eq!(auth.open_streams(), 1);
        store.dispose();
    };
    futures::join!(store.watch_session_changes(), driver);
}

#[tokio::test]
async fn recovery_for_another_account_drops_authentication() {
    let (store, auth, rpc) = signed_in_store(student_record("u-1")).await;

    let driver = async {
        settle().await;
        auth.emit(AuthEvent::PasswordRecovery(session_for("auth-other")));
        settle().await;

        let snap = store.snapshot();
        assert!(!snap.is_authenticated());
        assert_eq!(snap.phase, SessionPhase::Unauthenticated);
        assert_eq!(snap.profile, None);
        assert_eq!(snap.session.unwrap().subject, "auth-other");
        assert_eq!(rpc.calls_to(GET_USER_PROFILE).len(), 1);
        store.dispose();
    };
    futures::join!(store.watch_session_changes(), driver);
}

#[tokio::test]
async fn recovery_for_the_signed_in_account_keeps_profile() {
    let (store, auth, _rpc) = signed_in_store(student_record("u-1")).await;

    let driver = async {
        settle().await;
        let mut recovery = session_for("auth-1");
        recovery.access_token = "token-recovery".into();
        auth.emit(AuthEvent::PasswordRecovery(recovery));
        settle().await;

        let snap = store.snapshot();
        assert!(snap.is_authenticated());
        assert_eq!(snap.session.unwrap().access_token, "token-recovery");
        store.dispose();
    };
    futures::join!(store.watch_session_changes(), driver);
}

#[tokio::test]
async fn recovery_while_signed_out_keeps_session_without_profile_lookup() {
    let auth = Rc::new(MockAuth::new());
    let rpc = Rc::new(MockRpc::new());
    let store = store(&auth, &rpc);
    store.initialize().await;

    let driver = async {
        settle().await;
        auth.emit(AuthEvent::PasswordRecovery(session_for("auth-5")));
        settle().await;

        let snap = store.snapshot();
        assert_eq!(snap.phase, SessionPhase::Unauthenticated);
        assert_eq!(snap.session.unwrap().subject, "auth-5");
        assert!(rpc.calls_to(GET_USER_PROFILE).is_empty());
        store.dispose();
    };
    futures::join!(store.watch_session_changes(), driver);
}

#[tokio::test]
async fn user_update_for_same_subject_swaps_session_only() {
    let (store, auth, rpc) = signed_in_store(student_record("u-1")).await;
    let profile = store.profile();

    let driver = async {
        settle().await;
        let mut updated = session_for("auth-1");
        updated.access_token = "token-updated".into();
        auth.emit(AuthEvent::UserUpdated(updated));
        settle().await;

        let snap = store.snapshot();
        assert!(snap.is_authenticated());
        assert_eq!(snap.session.unwrap().access_token, "token-updated");
        assert_eq!(snap.profile, profile);
        assert_eq!(rpc.calls_to(GET_USER_PROFILE).len(), 1);
        store.dispose();
    };
    futures::join!(store.watch_session_changes(), driver);
}

#[tokio::test]
async fn sign_in_event_during_sign_in_resolves_profile_once() {
    let auth = Rc::new(MockAuth::new());
    *auth.sign_in_result.borrow_mut() = Ok(session_for("auth-3"));
    let rpc = Rc::new(MockRpc::new());
    rpc.respond(GET_USER_PROFILE, Ok(student_record("u-3")));
    rpc.suspend.set(true);
    let store = store(&auth, &rpc);
    store.initialize().await;

    let driver = async {
        settle().await;
        let outcome = store.sign_in(Credentials::new("ana@uni.edu", "pw")).await.unwrap();
        assert!(matches!(outcome, SignInOutcome::SignedIn { landing: "/chat", .. }));
        settle().await;

        assert!(store.snapshot().is_authenticated());
        assert_eq!(rpc.calls_to(GET_USER_PROFILE).len(), 1);
        store.dispose();
    };
    futures::join!(store.watch_session_changes(), driver);
}
