//! Activity log: best-effort audit entries after mutations, and the admin
//! "recent activity" feed.

#[cfg(test)]
#[path = "activity_test.rs"]
mod activity_test;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};

use crate::error::SessionError;
use crate::profile::id_string;
use crate::role::Role;
use crate::store::SessionStore;

use super::MutationEcho;

pub(crate) const LOG_ACTIVITY: &str = "log-activity";
pub(crate) const GET_ACTIVITIES: &str = "get-activities";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    Added,
    Updated,
    Deleted,
    Submitted,
    Registered,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Resource,
    Student,
    Feedback,
}

/// Icon class shown next to an activity entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActivityIcon {
    ResourceAdded,
    ResourceUpdated,
    ResourceDeleted,
    StudentRegistered,
    StudentRemoved,
    FeedbackSubmitted,
    FeedbackRemoved,
    Other,
}

/// Classify an activity by its raw entity and action names.
#[must_use]
pub fn classify(entity_type: Option<&str>, action_type: Option<&str>) -> ActivityIcon {
    match (entity_type, action_type) {
        (Some("resource"), Some("Deleted")) => ActivityIcon::ResourceDeleted,
        (Some("resource"), Some("Updated")) => ActivityIcon::ResourceUpdated,
        (Some("resource"), _) => ActivityIcon::ResourceAdded,
        (Some("student"), Some("Registered")) => ActivityIcon::StudentRegistered,
        (Some("student"), _) => ActivityIcon::StudentRemoved,
        (Some("feedback"), Some("Submitted")) => ActivityIcon::FeedbackSubmitted,
        (Some("feedback"), _) => ActivityIcon::FeedbackRemoved,
        _ => ActivityIcon::Other,
    }
}

/// One row of the `activities` collection.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ActivityEntry {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub entity_type: Option<String>,
    #[serde(default)]
    pub action_type: Option<String>,
}

impl ActivityEntry {
    #[must_use]
    pub fn icon(&self) -> ActivityIcon {
        classify(self.entity_type.as_deref(), self.action_type.as_deref())
    }

    /// Relative age of the entry, or the raw timestamp when it cannot be parsed.
    #[must_use]
    pub fn age(&self, now: OffsetDateTime) -> String {
        parse_timestamp(&self.created_at).map_or_else(|| self.created_at.clone(), |at| time_ago(at, now))
    }
}

/// Backend timestamps are RFC 3339, or offset-less and implicitly UTC.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<OffsetDateTime> {
    let raw = raw.trim();
    if let Ok(at) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(at);
    }
    let naive = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]");
    PrimitiveDateTime::parse(raw, naive).ok().map(PrimitiveDateTime::assume_utc)
}

/// Coarse "N units ago" label. Future instants read as zero seconds.
#[must_use]
pub fn time_ago(at: OffsetDateTime, now: OffsetDateTime) -> String {
    let seconds = (now - at).whole_seconds().max(0);
    match seconds {
        s if s < 60 => format!("{s} seconds ago"),
        s if s < 3_600 => format!("{} minutes ago", s / 60),
        s if s < 86_400 => format!("{} hours ago", s / 3_600),
        s => format!("{} days ago", s / 86_400),
    }
}

impl SessionStore {
    /// Record an audit entry for a mutation the current user just made.
    ///
    /// Failures are logged and swallowed: the mutation already succeeded.
    pub(crate) async fn log_activity(&self, action: ActionKind, entity: EntityKind, echo: Option<MutationEcho>) {
        let Some(echo) = echo else {
            return;
        };
        let Ok(actor) = self.require_profile() else {
            return;
        };
        let payload = json!({
            "actionType": action,
            "entityType": entity,
            "entityId": echo.id.unwrap_or(Value::Null),
            "entityName": echo.name,
            "role": actor.role(),
            "userID": actor.user_id,
            "id": actor.auth_id,
        });
        if let Err(e) = self.rpc().invoke(LOG_ACTIVITY, payload).await {
            tracing::warn!(?action, ?entity, error = %e, "activity log entry dropped");
        }
    }

    /// Most recent activity entries for the admin dashboard.
    ///
    /// # Errors
    ///
    /// Fails with [`SessionError::Forbidden`] for non-admins and
    /// [`SessionError::Remote`] when the lookup fails.
    pub async fn recent_activities(&self) -> Result<Vec<ActivityEntry>, SessionError> {
        self.require_role(Role::Admin)?;
        let limit = self.config().recent_activity_limit;
        self.call_or_default(GET_ACTIVITIES, json!({ "limit": limit })).await
    }
}
