//! Student feedback submission and the admin feedback review table.

#[cfg(test)]
#[path = "feedback_test.rs"]
mod feedback_test;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::SessionError;
use crate::profile::id_string;
use crate::role::Role;
use crate::store::SessionStore;

use super::activity::{ActionKind, EntityKind};
use super::SortOrder;

pub(crate) const UPLOAD_FEEDBACK: &str = "upload-feedback";
pub(crate) const GET_FEEDBACKS: &str = "get-feedbacks";
pub(crate) const DELETE_FEEDBACK: &str = "delete-feedback";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackCategory {
    #[default]
    General,
    Bug,
    Feature,
    Improvement,
    Response,
}

impl FeedbackCategory {
    pub const ALL: [Self; 5] = [Self::General, Self::Bug, Self::Feature, Self::Improvement, Self::Response];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Bug => "bug",
            Self::Feature => "feature",
            Self::Improvement => "improvement",
            Self::Response => "response",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::General => "General Feedback",
            Self::Bug => "Bug Report",
            Self::Feature => "Feature Request",
            Self::Improvement => "Improvement Suggestion",
            Self::Response => "Response Quality",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == raw.trim())
    }
}

/// A student's feedback form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FeedbackSubmission {
    pub title: String,
    pub message: String,
    /// Star rating, 1 through 5.
    pub rating: u8,
    pub category: FeedbackCategory,
}

impl FeedbackSubmission {
    /// # Errors
    ///
    /// Returns a user-facing message for blank text or an out-of-range rating.
    pub fn validated(mut self) -> Result<Self, &'static str> {
        self.title = self.title.trim().to_owned();
        self.message = self.message.trim().to_owned();
        if self.title.is_empty() || self.message.is_empty() {
            return Err("Title and message are required.");
        }
        if !(1..=5).contains(&self.rating) {
            return Err("Please choose a rating from 1 to 5.");
        }
        Ok(self)
    }
}

/// Filters of the admin feedback table. Absent fields are not sent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<FeedbackCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackQuery {
    pub page: u32,
    pub filters: FeedbackFilters,
    pub sort_field: String,
    pub sort_order: SortOrder,
    pub search_query: String,
}

impl Default for FeedbackQuery {
    fn default() -> Self {
        Self {
            page: 1,
            filters: FeedbackFilters::default(),
            sort_field: "timestamp".to_owned(),
            sort_order: SortOrder::Desc,
            search_query: String::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct FeedbackRow {
    #[serde(deserialize_with = "id_string")]
    pub feedback_id: String,
    #[serde(default)]
    pub feedback_title: Option<String>,
    #[serde(default)]
    pub feedback_message: String,
    #[serde(default)]
    pub feedback_rating: u8,
    #[serde(default)]
    pub feedback_category: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    /// Joined author record, `{ user: { user_name } }`.
    #[serde(default)]
    pub user: Option<Value>,
}

impl FeedbackRow {
    #[must_use]
    pub fn author(&self) -> &str {
        self.user
            .as_ref()
            .and_then(|u| u.pointer("/user/user_name"))
            .and_then(Value::as_str)
            .unwrap_or("Unknown")
    }

    #[must_use]
    pub fn category(&self) -> Option<FeedbackCategory> {
        self.feedback_category.as_deref().and_then(FeedbackCategory::parse)
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackPage {
    #[serde(default)]
    pub feedback: Vec<FeedbackRow>,
    #[serde(default)]
    pub total_count: u64,
    #[serde(default = "one")]
    pub total_pages: u64,
}

fn one() -> u64 {
    1
}

impl Default for FeedbackPage {
    fn default() -> Self {
        Self { feedback: Vec::new(), total_count: 0, total_pages: 1 }
    }
}

impl SessionStore {
    /// Submit feedback as the signed-in student.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Forbidden`] for non-students,
    /// [`SessionError::Invalid`] for a rejected form, and
    /// [`SessionError::Remote`] when the upload fails.
    pub async fn submit_feedback(&self, submission: FeedbackSubmission) -> Result<(), SessionError> {
        let actor = self.require_role(Role::Student)?;
        let feedback = submission.validated().map_err(|m| SessionError::Invalid(m.to_owned()))?;
        let student_id = actor.student().map(|s| s.student_id.clone());

        let echo = self
            .mutate(UPLOAD_FEEDBACK, json!({ "feedback": feedback, "studentid": student_id, "name": actor.name }))
            .await?;
        self.log_activity(ActionKind::Submitted, EntityKind::Feedback, echo).await;
        Ok(())
    }

    /// One page of the admin feedback table.
    ///
    /// # Errors
    ///
    /// Fails with [`SessionError::Forbidden`] for non-admins and
    /// [`SessionError::Remote`] when the lookup fails.
    pub async fn feedback_page(&self, query: &FeedbackQuery) -> Result<FeedbackPage, SessionError> {
        self.require_role(Role::Admin)?;
        let payload = serde_json::to_value(query).map_err(|e| SessionError::Invalid(e.to_string()))?;
        self.call_or_default(GET_FEEDBACKS, payload).await
    }

    /// # Errors
    ///
    /// See [`Self::feedback_page`].
    pub async fn delete_feedback(&self, feedback_id: &str) -> Result<(), SessionError> {
        self.require_role(Role::Admin)?;
        let echo = self.mutate(DELETE_FEEDBACK, json!({ "feedbackId": feedback_id })).await?;
        self.log_activity(ActionKind::Deleted, EntityKind::Feedback, echo).await;
        Ok(())
    }
}
