use serde_json::{Value, json};

use super::*;
use crate::procedures::activity::LOG_ACTIVITY;
use crate::testing::{admin_record, signed_in_store, student_record};

fn draft() -> ResourceDraft {
    ResourceDraft {
        resource_type: "consultant".into(),
        resource_name: " Campus Counseling ".into(),
        resource_details: "Walk-in sessions".into(),
        resource_contact: "555-0199".into(),
        resource_time: "Mon-Fri 9-5".into(),
    }
}

#[test]
fn draft_validation_trims_and_requires_name_and_type() {
    assert_eq!(draft().validated().unwrap().resource_name, "Campus Counseling");
    assert_eq!(
        ResourceDraft { resource_name: "  ".into(), ..draft() }.validated(),
        Err("Resource name is required.")
    );
    assert_eq!(
        ResourceDraft { resource_type: String::new(), ..draft() }.validated(),
        Err("Resource type is required.")
    );
}

#[test]
fn query_omits_absent_type() {
    let query = ResourceQuery { page: 2, resource_type: None, search_query: "sleep".into() };
    assert_eq!(serde_json::to_value(&query).unwrap(), json!({ "page": 2, "searchQuery": "sleep" }));
    let typed = ResourceQuery { resource_type: Some("consultant".into()), ..query };
    assert_eq!(serde_json::to_value(&typed).unwrap()["type"], "consultant");
}

#[test]
fn page_count_prefers_reported_pages() {
    let reported = ResourcePage { total_pages: Some(4), total_count: Some(100), ..ResourcePage::default() };
    assert_eq!(reported.pages(9), 4);
    let derived = ResourcePage { total_count: Some(19), ..ResourcePage::default() };
    assert_eq!(derived.pages(9), 3);
    assert_eq!(ResourcePage::default().pages(9), 1);
}

#[tokio::test]
async fn students_can_browse_resources() {
    let (store, _auth, rpc) = signed_in_store(student_record("u-1")).await;
    rpc.respond(
        GET_RESOURCES,
        Ok(json!({ "data": [{ "resource_id": 1, "resource_name": "Hotline", "resource_type": "assosiation" }], "totalPages": 1 })),
    );

    let page = store.resources(&ResourceQuery { page: 1, ..ResourceQuery::default() }).await.unwrap();
    assert_eq!(page.data[0].resource_id, "1");
    assert_eq!(page.data[0].fields.resource_name, "Hotline");
}

#[tokio::test]
async fn null_resource_page_is_empty() {
    let (store, _auth, rpc) = signed_in_store(student_record("u-1")).await;
    rpc.respond(GET_RESOURCES, Ok(Value::Null));
    assert_eq!(store.resources(&ResourceQuery::default()).await.unwrap(), ResourcePage::default());
}

#[tokio::test]
async fn missing_resource_is_an_error() {
    let (store, _auth, rpc) = signed_in_store(student_record("u-1")).await;
    rpc.respond(GET_RESOURCE_BY_ID, Ok(Value::Null));
    assert!(matches!(store.resource("404").await, Err(SessionError::Invalid(_))));
}

#[tokio::test]
async fn students_cannot_edit_resources() {
    let (store, _auth, rpc) = signed_in_store(student_record("u-1")).await;
    assert_eq!(store.add_resource(draft()).await.unwrap_err(), SessionError::Forbidden(Role::Admin));
    assert_eq!(store.delete_resource("1").await.unwrap_err(), SessionError::Forbidden(Role::Admin));
    assert!(rpc.calls_to(ADD_RESOURCE).is_empty());
}

#[tokio::test]
async fn admin_mutations_send_payloads_and_log() {
    let (store, _auth, rpc) = signed_in_store(admin_record("u-2", false, true)).await;
    let echo = Ok(json!({ "resourceId": 1, "resourceName": "Campus Counseling" }));
    rpc.respond(ADD_RESOURCE, echo.clone());
    rpc.respond(UPDATE_RESOURCE, echo.clone());
    rpc.respond(DELETE_RESOURCE, echo);
    rpc.respond(LOG_ACTIVITY, Ok(Value::Null));

    store.add_resource(draft()).await.unwrap();
    store.update_resource("1", draft()).await.unwrap();
    store.delete_resource("1").await.unwrap();

    assert_eq!(rpc.calls_to(ADD_RESOURCE)[0]["resourceData"]["resource_name"], "Campus Counseling");
    assert_eq!(rpc.calls_to(UPDATE_RESOURCE)[0]["resourceId"], "1");
    assert_eq!(rpc.calls_to(DELETE_RESOURCE), vec![json!({ "resourceId": "1" })]);

    let actions: Vec<Value> = rpc.calls_to(LOG_ACTIVITY).into_iter().map(|c| c["actionType"].clone()).collect();
    assert_eq!(actions, vec![json!("Added"), json!("Updated"), json!("Deleted")]);
}
