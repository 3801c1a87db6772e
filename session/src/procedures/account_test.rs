use std::rc::Rc;

use serde_json::{Value, json};
use time::macros::date;

use super::*;
use crate::store::GET_USER_PROFILE;
use crate::testing::{MockAuth, MockRpc, admin_record, signed_in_store, store, student_record};

fn registration(birthday: &str) -> StudentRegistration {
    StudentRegistration {
        email: " ana@uni.edu ".into(),
        password: "hunter22".into(),
        name: " Ana ".into(),
        birthday: birthday.into(),
    }
}

#[tokio::test]
async fn register_student_sends_computed_age() {
    let rpc = Rc::new(MockRpc::new());
    rpc.respond(REGISTER_STUDENT, Ok(json!({ "ok": true })));
    let store = store(&Rc::new(MockAuth::new()), &rpc);

    store.register_student(registration("2000-06-15"), date!(2024 - 06 - 14)).await.unwrap();

    assert_eq!(
        rpc.calls_to(REGISTER_STUDENT),
        vec![json!({
            "email": "ana@uni.edu",
            "password": "hunter22",
            "studentData": { "name": "Ana", "age": 23, "birthday": "2000-06-15" }
        })]
    );
}

#[tokio::test]
async fn register_student_rejects_minors_without_calling_out() {
    let rpc = Rc::new(MockRpc::new());
    let store = store(&Rc::new(MockAuth::new()), &rpc);

    let err = store.register_student(registration("2006-06-15"), date!(2024 - 06 - 14)).await.unwrap_err();
    assert_eq!(err, SessionError::Invalid("You must be at least 18 years old to register".into()));
    assert!(rpc.calls().is_empty());
}

#[tokio::test]
async fn register_student_validates_fields() {
    let store = store(&Rc::new(MockAuth::new()), &Rc::new(MockRpc::new()));
    let today = date!(2024 - 06 - 14);

    let mut bad_email = registration("2000-01-01");
    bad_email.email = "not-an-email".into();
    assert!(matches!(store.register_student(bad_email, today).await, Err(SessionError::Invalid(_))));

    let mut short = registration("2000-01-01");
    short.password = "abc".into();
    assert_eq!(
        store.register_student(short, today).await.unwrap_err(),
        SessionError::Invalid("Password must be at least 6 characters.".into())
    );

    assert!(matches!(store.register_student(registration("01/01/2000"), today).await, Err(SessionError::Invalid(_))));
}

#[tokio::test]
async fn resend_verification_redirects_to_login() {
    let rpc = Rc::new(MockRpc::new());
    rpc.respond(RESEND_VERIFICATION, Ok(Value::Null));
    let store = store(&Rc::new(MockAuth::new()), &rpc);

    store.resend_verification("new@uni.edu").await.unwrap();
    assert_eq!(
        rpc.calls_to(RESEND_VERIFICATION),
        vec![json!({ "email": "new@uni.edu", "redirectTo": "https://mira.test/login" })]
    );
}

#[tokio::test]
async fn reset_password_redirects_to_update_page() {
    let auth = Rc::new(MockAuth::new());
    let store = store(&auth, &Rc::new(MockRpc::new()));

    store.reset_password("ana@uni.edu").await.unwrap();
    assert_eq!(
        *auth.reset_requests.borrow(),
        vec![("ana@uni.edu".to_owned(), "https://mira.test/update-password".to_owned())]
    );
}

#[tokio::test]
async fn update_password_enforces_minimum_length() {
    let auth = Rc::new(MockAuth::new());
    let store = store(&auth, &Rc::new(MockRpc::new()));

    assert!(store.update_password("12345").await.is_err());
    store.update_password("123456").await.unwrap();
    assert_eq!(*auth.password_updates.borrow(), vec!["123456".to_owned()]);
}

#[tokio::test]
async fn complete_profile_reloads_the_admin_profile() {
    let (store, auth, rpc) = signed_in_store(admin_record("u-4", false, false)).await;
    rpc.respond(COMPLETE_PROFILE, Ok(Value::Null));
    rpc.respond(GET_USER_PROFILE, Ok(admin_record("u-4", false, true)));
    assert_eq!(store.profile().unwrap().landing_route(), "/complete-profile");

    let profile = store
        .complete_profile(ProfileCompletion {
            name: "Dr. Reyes".into(),
            age: 41,
            contact: "555-0100".into(),
            password: Some("new-secret".into()),
        })
        .await
        .unwrap();

    assert_eq!(profile.landing_route(), "/admin-dashboard");
    assert_eq!(store.profile(), Some(profile));
    assert_eq!(*auth.password_updates.borrow(), vec!["new-secret".to_owned()]);
    assert_eq!(
        rpc.calls_to(COMPLETE_PROFILE),
        vec![json!({ "data": { "name": "Dr. Reyes", "age": 41, "contact": "555-0100" }, "id": "u-4" })]
    );
}

#[tokio::test]
async fn complete_profile_is_admin_only() {
    let (store, _auth, rpc) = signed_in_store(student_record("u-1")).await;
    let err = store
        .complete_profile(ProfileCompletion { name: "x".into(), age: 30, contact: "1".into(), password: None })
        .await
        .unwrap_err();
    assert_eq!(err, SessionError::Forbidden(Role::Admin));
    assert!(rpc.calls_to(COMPLETE_PROFILE).is_empty());
}
