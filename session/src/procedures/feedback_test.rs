use serde_json::json;

use super::*;
use crate::procedures::activity::LOG_ACTIVITY;
use crate::testing::{admin_record, signed_in_store, student_record};

fn submission() -> FeedbackSubmission {
    FeedbackSubmission {
        title: " Great listener ".into(),
        message: "The bot helped me calm down.".into(),
        rating: 5,
        category: FeedbackCategory::Response,
    }
}

#[test]
fn submission_validation() {
    assert!(submission().validated().is_ok());
    assert_eq!(
        FeedbackSubmission { title: " ".into(), ..submission() }.validated(),
        Err("Title and message are required.")
    );
    assert_eq!(
        FeedbackSubmission { rating: 0, ..submission() }.validated(),
        Err("Please choose a rating from 1 to 5.")
    );
}

#[test]
fn default_query_sorts_newest_first() {
    let query = FeedbackQuery {
        filters: FeedbackFilters { category: Some(FeedbackCategory::Bug), ..FeedbackFilters::default() },
        ..FeedbackQuery::default()
    };
    assert_eq!(
        serde_json::to_value(&query).unwrap(),
        json!({
            "page": 1,
            "filters": { "category": "bug" },
            "sortField": "timestamp",
            "sortOrder": "desc",
            "searchQuery": ""
        })
    );
}

#[tokio::test]
async fn submit_feedback_sends_student_identity_and_logs() {
    let (store, _auth, rpc) = signed_in_store(student_record("u-1")).await;
    rpc.respond(UPLOAD_FEEDBACK, Ok(json!({ "feedbackId": 31, "feedbackName": "Great listener" })));
    rpc.respond(LOG_ACTIVITY, Ok(serde_json::Value::Null));

    store.submit_feedback(submission()).await.unwrap();

    assert_eq!(
        rpc.calls_to(UPLOAD_FEEDBACK),
        vec![json!({
            "feedback": {
                "title": "Great listener",
                "message": "The bot helped me calm down.",
                "rating": 5,
                "category": "response"
            },
            "studentid": "S-u-1",
            "name": "Ana"
        })]
    );
    let logged = rpc.calls_to(LOG_ACTIVITY);
    assert_eq!(logged.len(), 1);
    assert_eq!(logged[0]["actionType"], "Submitted");
    assert_eq!(logged[0]["entityId"], 31);
}

#[tokio::test]
async fn failed_upload_is_not_logged() {
    let (store, _auth, rpc) = signed_in_store(student_record("u-1")).await;
    // upload-feedback is unscripted, so the mock answers 404.
    assert!(matches!(store.submit_feedback(submission()).await, Err(SessionError::Remote(_))));
    assert!(rpc.calls_to(LOG_ACTIVITY).is_empty());
}

#[tokio::test]
async fn feedback_page_defaults_on_null_and_reads_rows() {
    let (store, _auth, rpc) = signed_in_store(admin_record("u-2", false, true)).await;
    rpc.respond(GET_FEEDBACKS, Ok(serde_json::Value::Null));
    assert_eq!(store.feedback_page(&FeedbackQuery::default()).await.unwrap(), FeedbackPage::default());

    rpc.respond(
        GET_FEEDBACKS,
        Ok(json!({
            "feedback": [{
                "feedback_id": 8,
                "feedback_message": "Slow replies",
                "feedback_rating": 2,
                "feedback_category": "improvement",
                "user": { "user": { "user_name": "Ana" } }
            }],
            "totalCount": 11,
            "totalPages": 2
        })),
    );
    let page = store.feedback_page(&FeedbackQuery::default()).await.unwrap();
    assert_eq!(page.total_pages, 2);
    assert_eq!(page.feedback[0].author(), "Ana");
    assert_eq!(page.feedback[0].category(), Some(FeedbackCategory::Improvement));
}

#[tokio::test]
async fn feedback_review_is_admin_only() {
    let (store, _auth, _rpc) = signed_in_store(student_record("u-1")).await;
    assert_eq!(
        store.feedback_page(&FeedbackQuery::default()).await.unwrap_err(),
        SessionError::Forbidden(Role::Admin)
    );
    assert_eq!(store.delete_feedback("8").await.unwrap_err(), SessionError::Forbidden(Role::Admin));
}

#[tokio::test]
async fn delete_feedback_logs_deletion() {
    let (store, _auth, rpc) = signed_in_store(admin_record("u-2", false, true)).await;
    rpc.respond(DELETE_FEEDBACK, Ok(json!({ "feedbackId": 8, "feedbackName": "Slow replies" })));
    rpc.respond(LOG_ACTIVITY, Ok(serde_json::Value::Null));

    store.delete_feedback("8").await.unwrap();
    assert_eq!(rpc.calls_to(DELETE_FEEDBACK), vec![json!({ "feedbackId": "8" })]);
    assert_eq!(rpc.calls_to(LOG_ACTIVITY)[0]["entityType"], "feedback");
}
