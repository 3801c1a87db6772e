//! Support resources directory: browsable by every signed-in user, edited by
//! admins.

#[cfg(test)]
#[path = "resources_test.rs"]
mod resources_test;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::SessionError;
use crate::profile::id_string;
use crate::role::Role;
use crate::store::SessionStore;

use super::activity::{ActionKind, EntityKind};
use super::page_count;

pub(crate) const GET_RESOURCES: &str = "get-resources";
pub(crate) const GET_RESOURCE_BY_ID: &str = "get-resourcebyid";
pub(crate) const ADD_RESOURCE: &str = "add-resource";
pub(crate) const UPDATE_RESOURCE: &str = "update-resource";
pub(crate) const DELETE_RESOURCE: &str = "delete-resource";

/// Resource kinds offered by the type filter.
pub const RESOURCE_TYPES: [&str; 2] = ["assosiation", "consultant"];

/// Editable resource fields, as sent to add and update.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDraft {
    #[serde(default)]
    pub resource_type: String,
    #[serde(default)]
    pub resource_name: String,
    #[serde(default)]
    pub resource_details: String,
    #[serde(default)]
    pub resource_contact: String,
    /// Free-form opening hours.
    #[serde(default)]
    pub resource_time: String,
}

impl ResourceDraft {
    /// # Errors
    ///
    /// Returns a user-facing message when the name or type is blank.
    pub fn validated(mut self) -> Result<Self, &'static str> {
        for field in [
            &mut self.resource_type,
            &mut self.resource_name,
            &mut self.resource_details,
            &mut self.resource_contact,
            &mut self.resource_time,
        ] {
            *field = field.trim().to_owned();
        }
        if self.resource_name.is_empty() {
            return Err("Resource name is required.");
        }
        if self.resource_type.is_empty() {
            return Err("Resource type is required.");
        }
        Ok(self)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Resource {
    #[serde(deserialize_with = "id_string")]
    pub resource_id: String,
    #[serde(flatten)]
    pub fields: ResourceDraft,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceQuery {
    pub page: u32,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    pub search_query: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourcePage {
    #[serde(default)]
    pub data: Vec<Resource>,
    #[serde(default)]
    pub total_count: Option<u64>,
    #[serde(default)]
    pub total_pages: Option<u64>,
}

impl ResourcePage {
    /// Page count as reported, else derived from the total, never below one.
    #[must_use]
    pub fn pages(&self, per_page: u32) -> u64 {
        match (self.total_pages, self.total_count) {
            (Some(pages), _) => pages.max(1),
            (None, Some(total)) => page_count(total, per_page),
            (None, None) => 1,
        }
    }
}

impl SessionStore {
    /// One page of the resources directory.
    ///
    /// # Errors
    ///
    /// Fails with [`SessionError::NotSignedIn`] without a session and
    /// [`SessionError::Remote`] when the lookup fails.
    pub async fn resources(&self, query: &ResourceQuery) -> Result<ResourcePage, SessionError> {
        self.require_profile()?;
        let payload = serde_json::to_value(query).map_err(|e| SessionError::Invalid(e.to_string()))?;
        self.call_or_default(GET_RESOURCES, payload).await
    }

    /// # Errors
    ///
    /// See [`Self::resources`]; an unknown id is [`SessionError::Invalid`].
    pub async fn resource(&self, resource_id: &str) -> Result<Resource, SessionError> {
        self.require_profile()?;
        self.call_required(GET_RESOURCE_BY_ID, json!({ "resourceId": resource_id })).await
    }

    /// # Errors
    ///
    /// Fails with [`SessionError::Forbidden`] for non-admins,
    /// [`SessionError::Invalid`] for a rejected draft, and
    /// [`SessionError::Remote`] when the call fails.
    pub async fn add_resource(&self, draft: ResourceDraft) -> Result<(), SessionError> {
        self.require_role(Role::Admin)?;
        let draft = draft.validated().map_err(|m| SessionError::Invalid(m.to_owned()))?;
        let echo = self.mutate(ADD_RESOURCE, json!({ "resourceData": draft })).await?;
        self.log_activity(ActionKind::Added, EntityKind::Resource, echo).await;
        Ok(())
    }

    /// # Errors
    ///
    /// See [`Self::add_resource`].
    pub async fn update_resource(&self, resource_id: &str, draft: ResourceDraft) -> Result<(), SessionError> {
        self.require_role(Role::Admin)?;
        let draft = draft.validated().map_err(|m| SessionError::Invalid(m.to_owned()))?;
        let echo = self
            .mutate(UPDATE_RESOURCE, json!({ "resourceId": resource_id, "updatedData": draft }))
            .await?;
        self.log_activity(ActionKind::Updated, EntityKind::Resource, echo).await;
        Ok(())
    }

    /// # Errors
    ///
    /// See [`Self::add_resource`].
    pub async fn delete_resource(&self, resource_id: &str) -> Result<(), SessionError> {
        self.require_role(Role::Admin)?;
        let echo = self.mutate(DELETE_RESOURCE, json!({ "resourceId": resource_id })).await?;
        self.log_activity(ActionKind::Deleted, EntityKind::Resource, echo).await;
        Ok(())
    }
}
