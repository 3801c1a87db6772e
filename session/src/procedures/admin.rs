//! Admin console operations: dashboard tiles, student management, and admin
//! invitations.

#[cfg(test)]
#[path = "admin_test.rs"]
mod admin_test;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::backend::invoke_as;
use crate::error::SessionError;
use crate::profile::id_string;
use crate::role::Role;
use crate::store::SessionStore;

use super::activity::{ActionKind, EntityKind};
use super::{SortOrder, page_count, page_range};

pub(crate) const GET_DASHBOARD_STATS: &str = "get-dashboard-stats";
pub(crate) const INVITE_ADMIN: &str = "invite-admin";
pub(crate) const GET_STUDENTS: &str = "get-students";
pub(crate) const DELETE_STUDENTS: &str = "delete-students";
pub(crate) const GET_INVITATIONS: &str = "get-invitations";

// =============================================================================
// DASHBOARD
// =============================================================================

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    #[default]
    #[serde(other)]
    Neutral,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct DashboardTile {
    pub title: String,
    #[serde(default)]
    pub value: f64,
    #[serde(default)]
    pub change: String,
    #[serde(default)]
    pub trend: Trend,
}

impl DashboardTile {
    fn zeroed(title: &str, change: &str) -> Self {
        Self { title: title.to_owned(), value: 0.0, change: change.to_owned(), trend: Trend::Neutral }
    }
}

/// Tiles shown when the backend has no statistics yet.
#[must_use]
pub fn empty_dashboard() -> Vec<DashboardTile> {
    vec![
        DashboardTile::zeroed("Total Users", "+0%"),
        DashboardTile::zeroed("New Feedback", "+0%"),
        DashboardTile::zeroed("Resources", "+0"),
        DashboardTile::zeroed("Students", "+0%"),
    ]
}

// =============================================================================
// STUDENTS
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct StudentStatus {
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct StudentAccount {
    #[serde(rename = "userID", deserialize_with = "id_string")]
    pub user_id: String,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub user_email: Option<String>,
    #[serde(default)]
    pub students: Vec<StudentStatus>,
}

impl StudentAccount {
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.user_name.as_deref().filter(|n| !n.is_empty()).unwrap_or("N/A")
    }

    #[must_use]
    pub fn status(&self) -> &str {
        self.students.first().and_then(|s| s.status.as_deref()).unwrap_or("N/A")
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status() == "active"
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentPage {
    #[serde(default)]
    pub students: Vec<StudentAccount>,
    #[serde(default)]
    pub total_count: u64,
    #[serde(default = "one")]
    pub total_pages: u64,
}

fn one() -> u64 {
    1
}

impl Default for StudentPage {
    fn default() -> Self {
        Self { students: Vec::new(), total_count: 0, total_pages: 1 }
    }
}

// =============================================================================
// INVITATIONS
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    Sent,
    Registered,
    Expired,
    #[serde(other)]
    Unknown,
}

impl InvitationStatus {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Sent => "Sent",
            Self::Registered => "Registered",
            Self::Expired => "Expired",
            Self::Unknown => "Unknown",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Invitation {
    #[serde(default)]
    pub email: String,
    pub status: InvitationStatus,
    #[serde(default)]
    pub sent_at: Option<String>,
    #[serde(default)]
    pub expires_at: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitationPage {
    #[serde(default)]
    pub invitations: Vec<Invitation>,
    #[serde(default)]
    pub total_count: u64,
}

impl InvitationPage {
    #[must_use]
    pub fn pages(&self, per_page: u32) -> u64 {
        page_count(self.total_count, per_page)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvitationQuery {
    pub page: u32,
    pub sort_field: String,
    pub sort_order: SortOrder,
}

impl Default for InvitationQuery {
    fn default() -> Self {
        Self { page: 1, sort_field: "sent_at".to_owned(), sort_order: SortOrder::Desc }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InvitationRange<'a> {
    sort_field: &'a str,
    sort_order: SortOrder,
    from: u64,
    to: u64,
}

// =============================================================================
// OPERATIONS
// =============================================================================

impl SessionStore {
    /// Headline tiles of the admin dashboard.
    ///
    /// # Errors
    ///
    /// Fails with [`SessionError::Forbidden`] for non-admins and
    /// [`SessionError::Remote`] when the lookup fails.
    pub async fn dashboard_stats(&self) -> Result<Vec<DashboardTile>, SessionError> {
        self.require_role(Role::Admin)?;
        let tiles: Option<Vec<DashboardTile>> = invoke_as(self.rpc(), GET_DASHBOARD_STATS, Value::Null).await?;
        Ok(tiles.unwrap_or_else(empty_dashboard))
    }

    /// Invite another admin by email. Only super admins may invite.
    ///
    /// # Errors
    ///
    /// Fails with [`SessionError::Forbidden`] for anyone but a super admin,
    /// [`SessionError::Invalid`] for a malformed address, and
    /// [`SessionError::Remote`] when the backend refuses.
    pub async fn invite_admin(&self, email: &str) -> Result<(), SessionError> {
        let actor = self.require_role(Role::Admin)?;
        if !actor.is_super_admin() {
            return Err(SessionError::Forbidden(Role::Admin));
        }
        let email = email.trim();
        if !email.contains('@') {
            return Err(SessionError::Invalid("Enter a valid email address.".to_owned()));
        }
        self.rpc().invoke(INVITE_ADMIN, json!({ "email": email, "inviterId": actor.auth_id })).await?;
        tracing::info!(%email, "admin invitation sent");
        Ok(())
    }

    /// # Errors
    ///
    /// See [`Self::dashboard_stats`].
    pub async fn students(&self, page: u32, search_term: &str) -> Result<StudentPage, SessionError> {
        self.require_role(Role::Admin)?;
        self.call_or_default(GET_STUDENTS, json!({ "page": page.max(1), "searchTerm": search_term.trim() })).await
    }

    /// Remove a student account.
    ///
    /// # Errors
    ///
    /// See [`Self::dashboard_stats`].
    pub async fn delete_student(&self, user_id: &str) -> Result<(), SessionError> {
        self.require_role(Role::Admin)?;
        let echo = self.mutate(DELETE_STUDENTS, json!({ "userId": user_id })).await?;
        self.log_activity(ActionKind::Deleted, EntityKind::Student, echo).await;
        Ok(())
    }

    /// One page of sent admin invitations, addressed by inclusive row range.
    ///
    /// # Errors
    ///
    /// See [`Self::dashboard_stats`].
    pub async fn invitations(&self, query: &InvitationQuery) -> Result<InvitationPage, SessionError> {
        self.require_role(Role::Admin)?;
        let (from, to) = page_range(query.page, self.config().invitations_per_page);
        let range = InvitationRange { sort_field: &query.sort_field, sort_order: query.sort_order, from, to };
        let payload = serde_json::to_value(range).map_err(|e| SessionError::Invalid(e.to_string()))?;
        self.call_or_default(GET_INVITATIONS, payload).await
    }
}
