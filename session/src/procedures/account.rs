//! Account lifecycle outside sign-in: student self-registration, email
//! verification, password reset, and admin profile completion.

#[cfg(test)]
#[path = "account_test.rs"]
mod account_test;

use serde::Serialize;
use serde_json::json;
use time::Date;

use crate::error::SessionError;
use crate::profile::{MIN_STUDENT_AGE, UserProfile, age_on, parse_birthday};
use crate::role::Role;
use crate::store::SessionStore;

pub(crate) const REGISTER_STUDENT: &str = "register-student";
pub(crate) const RESEND_VERIFICATION: &str = "resend-verification";
pub(crate) const COMPLETE_PROFILE: &str = "complete-profile";

/// Provider minimum password length.
pub const MIN_PASSWORD_LEN: usize = 6;

fn invalid(message: impl Into<String>) -> SessionError {
    SessionError::Invalid(message.into())
}

fn check_email(email: &str) -> Result<String, SessionError> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email.to_owned()),
        _ => Err(invalid("Enter a valid email address.")),
    }
}

fn check_password(password: &str) -> Result<(), SessionError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(invalid(format!("Password must be at least {MIN_PASSWORD_LEN} characters.")));
    }
    Ok(())
}

// =============================================================================
// REGISTRATION
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StudentRegistration {
    pub email: String,
    pub password: String,
    pub name: String,
    /// ISO date, `YYYY-MM-DD`.
    pub birthday: String,
}

#[derive(Debug, Serialize)]
struct StudentData<'a> {
    name: &'a str,
    age: u32,
    birthday: &'a str,
}

impl SessionStore {
    /// Create a student account. The provider emails a verification link.
    ///
    /// `today` anchors the age check.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Invalid`] for malformed input or an applicant
    /// under the minimum age, and [`SessionError::Remote`] when the backend
    /// rejects the registration.
    pub async fn register_student(&self, registration: StudentRegistration, today: Date) -> Result<(), SessionError> {
        let email = check_email(&registration.email)?;
        check_password(&registration.password)?;
        let name = registration.name.trim();
        if name.is_empty() {
            return Err(invalid("Name cannot be empty."));
        }
        let birthday = parse_birthday(&registration.birthday)
            .ok_or_else(|| invalid("Birthday must be a valid YYYY-MM-DD date."))?;
        let age = age_on(birthday, today);
        if age < MIN_STUDENT_AGE {
            return Err(invalid(format!("You must be at least {MIN_STUDENT_AGE} years old to register")));
        }

        let payload = json!({
            "email": email,
            "password": registration.password,
            "studentData": StudentData { name, age, birthday: registration.birthday.trim() },
        });
        self.rpc().invoke(REGISTER_STUDENT, payload).await?;
        tracing::info!(%email, "student registered; awaiting verification");
        Ok(())
    }

    /// Send the verification email again; its link lands on the login page.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Remote`] when the backend refuses.
    pub async fn resend_verification(&self, email: &str) -> Result<(), SessionError> {
        let email = check_email(email)?;
        let redirect_to = self.config().redirect_url("/login");
        self.rpc()
            .invoke(RESEND_VERIFICATION, json!({ "email": email, "redirectTo": redirect_to }))
            .await?;
        Ok(())
    }

    /// Email a password-reset link that lands on the update-password page.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Auth`] when the provider refuses.
    pub async fn reset_password(&self, email: &str) -> Result<(), SessionError> {
        let email = check_email(email)?;
        let redirect_to = self.config().redirect_url("/update-password");
        self.auth().reset_password(&email, &redirect_to).await?;
        Ok(())
    }

    /// Set a new password for the session opened by a reset link or invite.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Invalid`] for a too-short password and
    /// [`SessionError::Auth`] when the provider refuses.
    pub async fn update_password(&self, new_password: &str) -> Result<(), SessionError> {
        check_password(new_password)?;
        self.auth().update_password(new_password).await?;
        Ok(())
    }
}

// =============================================================================
// ADMIN PROFILE COMPLETION
// =============================================================================

/// First-login details an invited admin must provide.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProfileCompletion {
    pub name: String,
    pub age: u32,
    pub contact: String,
    /// Invited admins arrive without a chosen password.
    pub password: Option<String>,
}

impl SessionStore {
    /// Finish an invited admin's profile and reload it from the backend.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Forbidden`] for non-admins,
    /// [`SessionError::Invalid`] for rejected input, and the remote or
    /// provider error when a call fails.
    pub async fn complete_profile(&self, completion: ProfileCompletion) -> Result<UserProfile, SessionError> {
        let actor = self.require_role(Role::Admin)?;
        let name = completion.name.trim();
        let contact = completion.contact.trim();
        if name.is_empty() || contact.is_empty() {
            return Err(invalid("Name and contact number are required."));
        }
        if completion.age < MIN_STUDENT_AGE {
            return Err(invalid(format!("You must be at least {MIN_STUDENT_AGE} years old to register")));
        }
        if let Some(password) = &completion.password {
            check_password(password)?;
            self.auth().update_password(password).await?;
        }

        let data = json!({ "name": name, "age": completion.age, "contact": contact });
        self.rpc().invoke(COMPLETE_PROFILE, json!({ "data": data, "id": actor.user_id })).await?;
        self.refetch_profile().await
    }
}
