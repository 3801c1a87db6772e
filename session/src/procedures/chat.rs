//! Student chat sessions with the support assistant.

#[cfg(test)]
#[path = "chat_test.rs"]
mod chat_test;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::SessionError;
use crate::profile::{StudentProfile, id_string};
use crate::role::Role;
use crate::store::SessionStore;

pub(crate) const GET_CHAT_SESSION: &str = "get-chat-session";
pub(crate) const GET_CHAT_MESSAGES: &str = "get-chat-messages";
pub(crate) const CREATE_CHAT_SESSION: &str = "create-chat-session";
pub(crate) const SAVE_MESSAGE: &str = "save-message";
pub(crate) const UPDATE_CHAT_NAME: &str = "update-chat-name";
pub(crate) const DELETE_CHAT_SESSION: &str = "delete-chat-session";
pub(crate) const END_CHAT_SESSION: &str = "end-chat-session";

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ChatSession {
    #[serde(alias = "chat_id", alias = "chatId", deserialize_with = "id_string")]
    pub id: String,
    #[serde(default, alias = "chat_name")]
    pub name: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub ended_at: Option<String>,
}

impl ChatSession {
    #[must_use]
    pub fn title(&self) -> &str {
        self.name.as_deref().filter(|n| !n.trim().is_empty()).unwrap_or("New chat")
    }

    #[must_use]
    pub fn is_ended(&self) -> bool {
        self.ended_at.is_some()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub message: String,
    pub sender: Sender,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl SessionStore {
    fn require_student(&self) -> Result<StudentProfile, SessionError> {
        let profile = self.require_role(Role::Student)?;
        profile.student().cloned().ok_or(SessionError::Forbidden(Role::Student))
    }

    /// The signed-in student's chat sessions.
    ///
    /// # Errors
    ///
    /// Fails with [`SessionError::Forbidden`] for non-students and
    /// [`SessionError::Remote`] when the lookup fails.
    pub async fn chat_sessions(&self) -> Result<Vec<ChatSession>, SessionError> {
        let student = self.require_student()?;
        self.call_or_default(GET_CHAT_SESSION, json!({ "studentid": student.student_id })).await
    }

    /// Messages of one chat in send order.
    ///
    /// # Errors
    ///
    /// See [`Self::chat_sessions`].
    pub async fn chat_messages(&self, chat_id: &str) -> Result<Vec<ChatMessage>, SessionError> {
        self.require_student()?;
        self.call_or_default(GET_CHAT_MESSAGES, json!({ "chatId": chat_id })).await
    }

    /// Open a new chat session for the signed-in student.
    ///
    /// # Errors
    ///
    /// See [`Self::chat_sessions`]; an empty answer is [`SessionError::Invalid`].
    pub async fn create_chat_session(&self) -> Result<ChatSession, SessionError> {
        let student = self.require_student()?;
        self.call_required(CREATE_CHAT_SESSION, json!({ "studentid": student.student_id })).await
    }

    /// Persist one message of a chat.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Invalid`] for a blank message.
    pub async fn save_message(&self, chat_id: &str, message: &str, sender: Sender) -> Result<(), SessionError> {
        self.require_student()?;
        let message = message.trim();
        if message.is_empty() {
            return Err(SessionError::Invalid("Message cannot be empty.".to_owned()));
        }
        self.rpc()
            .invoke(SAVE_MESSAGE, json!({ "chatId": chat_id, "message": message, "sender": sender }))
            .await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`SessionError::Invalid`] for a blank name.
    pub async fn rename_chat(&self, chat_id: &str, new_name: &str) -> Result<(), SessionError> {
        self.require_student()?;
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(SessionError::Invalid("Chat name cannot be empty.".to_owned()));
        }
        self.rpc().invoke(UPDATE_CHAT_NAME, json!({ "chatId": chat_id, "newName": new_name })).await?;
        Ok(())
    }

    /// # Errors
    ///
    /// See [`Self::chat_sessions`].
    pub async fn delete_chat_session(&self, chat_id: &str) -> Result<(), SessionError> {
        self.require_student()?;
        self.rpc().invoke(DELETE_CHAT_SESSION, json!({ "chatId": chat_id })).await?;
        Ok(())
    }

    /// Close a chat so its duration is counted.
    ///
    /// # Errors
    ///
    /// See [`Self::chat_sessions`].
    pub async fn end_chat_session(&self, chat_id: &str) -> Result<(), SessionError> {
        self.require_student()?;
        self.rpc().invoke(END_CHAT_SESSION, json!({ "chatId": chat_id })).await?;
        Ok(())
    }
}
