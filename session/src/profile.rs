//! Typed user profile assembled from backend records.
//!
//! DESIGN
//! ======
//! The profile procedure answers with two loosely shaped records: the shared
//! user row and a role-specific row. [`UserProfile::from_record`] maps them
//! field by field into a closed per-role union so a missing role or missing
//! role data is rejected at resolution time instead of surfacing later as an
//! absent field in some view.

#[cfg(test)]
#[path = "profile_test.rs"]
mod profile_test;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use time::Date;
use time::macros::format_description;

use crate::error::ProfileError;
use crate::role::Role;

/// Minimum age for student self-registration.
pub const MIN_STUDENT_AGE: u32 = 18;

// =============================================================================
// WIRE RECORDS
// =============================================================================

/// Response body of the `get-user-profile` procedure.
#[derive(Clone, Debug, Deserialize)]
pub struct ProfileRecord {
    #[serde(rename = "userData")]
    pub user: UserRow,
    #[serde(rename = "roleData", default)]
    pub role_data: Option<Value>,
}

/// Shared `user` table row.
#[derive(Clone, Debug, Deserialize)]
pub struct UserRow {
    #[serde(rename = "userID", deserialize_with = "id_string")]
    pub user_id: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default, alias = "user_email")]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub profile_pic: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
struct StudentRow {
    #[serde(deserialize_with = "id_string")]
    studentid: String,
    #[serde(default)]
    birthday: Option<String>,
    #[serde(default)]
    age: Option<u32>,
}

#[derive(Clone, Debug, Default, Deserialize)]
struct AdminRow {
    #[serde(default, deserialize_with = "opt_id_string")]
    adminid: Option<String>,
    #[serde(default)]
    super_admin: Option<Value>,
    #[serde(rename = "isProfile_set", default)]
    profile_set: Option<String>,
}

/// Accept ids stored either as strings or integers.
pub(crate) fn id_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("expected string or number id, got {other}"))),
    }
}

pub(crate) fn opt_id_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(serde::de::Error::custom(format!("expected string or number id, got {other}"))),
    }
}

/// Flags arrive as booleans or as `"yes"`/`"no"` strings.
fn truthy(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => matches!(s.trim().to_ascii_lowercase().as_str(), "yes" | "true" | "1"),
        Some(Value::Number(n)) => n.as_i64() == Some(1),
        _ => false,
    }
}

// =============================================================================
// TYPED PROFILE
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StudentProfile {
    pub student_id: String,
    /// ISO date, `YYYY-MM-DD`.
    pub birthday: Option<String>,
    pub age: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdminProfile {
    pub admin_id: Option<String>,
    pub super_admin: bool,
    /// Invited admins must finish their profile before using the dashboard.
    pub profile_complete: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RoleProfile {
    Student(StudentProfile),
    Admin(AdminProfile),
}

/// Application profile keyed by the provider session subject.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserProfile {
    /// Provider subject identifier of the owning session.
    pub auth_id: String,
    /// Application user id (`user.userID`).
    pub user_id: String,
    pub name: String,
    pub email: Option<String>,
    /// Storage path of the profile picture.
    pub avatar: Option<String>,
    pub role: RoleProfile,
}

impl UserProfile {
    /// Map backend records into a typed profile.
    ///
    /// # Errors
    ///
    /// Fails when the role is absent or unknown, or when the role-specific
    /// record is missing or malformed.
    pub fn from_record(auth_id: &str, record: ProfileRecord) -> Result<Self, ProfileError> {
        let ProfileRecord { user, role_data } = record;
        let raw_role = user.role.as_deref().ok_or(ProfileError::MissingRole)?;
        let role = Role::parse(raw_role).ok_or_else(|| ProfileError::UnknownRole(raw_role.to_owned()))?;

        let role = match role {
            Role::Student => {
                let data = role_data
                    .filter(|v| !v.is_null())
                    .ok_or(ProfileError::MissingRoleData(Role::Student))?;
                let row: StudentRow =
                    serde_json::from_value(data).map_err(|e| ProfileError::Malformed(e.to_string()))?;
                RoleProfile::Student(StudentProfile { student_id: row.studentid, birthday: row.birthday, age: row.age })
            }
            Role::Admin => {
                let row: AdminRow = match role_data.filter(|v| !v.is_null()) {
                    Some(data) => serde_json::from_value(data).map_err(|e| ProfileError::Malformed(e.to_string()))?,
                    None => AdminRow::default(),
                };
                RoleProfile::Admin(AdminProfile {
                    admin_id: row.adminid,
                    super_admin: truthy(row.super_admin.as_ref()),
                    profile_complete: row.profile_set.as_deref().is_some_and(|s| s.trim() == "set"),
                })
            }
        };

        Ok(Self {
            auth_id: auth_id.to_owned(),
            user_id: user.user_id,
            name: user.user_name,
            email: user.email,
            avatar: user.profile_pic,
            role,
        })
    }

    #[must_use]
    pub fn role(&self) -> Role {
        match self.role {
            RoleProfile::Student(_) => Role::Student,
            RoleProfile::Admin(_) => Role::Admin,
        }
    }

    #[must_use]
    pub fn is_super_admin(&self) -> bool {
        matches!(&self.role, RoleProfile::Admin(a) if a.super_admin)
    }

    #[must_use]
    pub fn student(&self) -> Option<&StudentProfile> {
        match &self.role {
            RoleProfile::Student(s) => Some(s),
            RoleProfile::Admin(_) => None,
        }
    }

    #[must_use]
    pub fn admin(&self) -> Option<&AdminProfile> {
        match &self.role {
            RoleProfile::Admin(a) => Some(a),
            RoleProfile::Student(_) => None,
        }
    }

    /// Default route after signing in.
    #[must_use]
    pub fn landing_route(&self) -> &'static str {
        match &self.role {
            RoleProfile::Admin(a) if a.profile_complete => "/admin-dashboard",
            RoleProfile::Admin(_) => "/complete-profile",
            RoleProfile::Student(_) => "/chat",
        }
    }

    /// Merge the server's authoritative answer to a profile update.
    pub fn apply_patch(&mut self, patch: &ProfilePatch) {
        if let Some(name) = &patch.user_name {
            self.name.clone_from(name);
        }
        if let Some(email) = &patch.email {
            self.email = Some(email.clone());
        }
        if let Some(pic) = &patch.profile_pic {
            self.avatar = Some(pic.clone());
        }
        if let RoleProfile::Student(student) = &mut self.role {
            if let Some(birthday) = &patch.birthday {
                student.birthday = Some(birthday.clone());
            }
            if let Some(age) = patch.age {
                student.age = Some(age);
            }
        }
    }
}

// =============================================================================
// UPDATES
// =============================================================================

/// Fields a user may change on their own profile.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
    #[serde(rename = "user_name", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "profile_pic", skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birthday: Option<String>,
}

impl ProfileUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.avatar.is_none() && self.birthday.is_none()
    }

    /// Trim and check the update before it is sent.
    ///
    /// # Errors
    ///
    /// Returns a user-facing message for an empty update, a blank name, or an
    /// unparseable birthday.
    pub fn validated(mut self) -> Result<Self, &'static str> {
        if self.is_empty() {
            return Err("Nothing to update.");
        }
        if let Some(name) = self.name.take() {
            let name = name.trim().to_owned();
            if name.is_empty() {
                return Err("Name cannot be empty.");
            }
            self.name = Some(name);
        }
        if let Some(birthday) = &self.birthday {
            if parse_birthday(birthday).is_none() {
                return Err("Birthday must be a valid YYYY-MM-DD date.");
            }
        }
        Ok(self)
    }
}

/// Server-returned fields after an update.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ProfilePatch {
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub profile_pic: Option<String>,
    #[serde(default)]
    pub birthday: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
}

// =============================================================================
// AGE
// =============================================================================

/// Parse an ISO `YYYY-MM-DD` birthday.
#[must_use]
pub fn parse_birthday(raw: &str) -> Option<Date> {
    Date::parse(raw.trim(), format_description!("[year]-[month]-[day]")).ok()
}

/// Completed years between `birthday` and `today`. Zero for future dates.
#[must_use]
pub fn age_on(birthday: Date, today: Date) -> u32 {
    if today < birthday {
        return 0;
    }
    let mut years = today.year() - birthday.year();
    if (u8::from(today.month()), today.day()) < (u8::from(birthday.month()), birthday.day()) {
        years -= 1;
    }
    u32::try_from(years).unwrap_or(0)
}
