//! Typed remote operations grouped by feature area.
//!
//! Each submodule adds action methods to [`SessionStore`]. They share three
//! rules:
//! - role-gated actions check the cached profile first and fail with
//!   [`SessionError::Forbidden`] without calling out;
//! - a `null` response becomes the typed empty default;
//! - transport and status failures propagate as [`SessionError::Remote`].

pub mod account;
pub mod activity;
pub mod admin;
pub mod chat;
pub mod feedback;
pub mod resources;


use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::backend::invoke_as;
use crate::error::SessionError;
use crate::store::SessionStore;

/// Sort direction accepted by the listing procedures.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    #[must_use]
    pub fn flipped(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

/// Identity of the row a mutation touched, echoed back for the activity log.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct MutationEcho {
    pub id: Option<Value>,
    pub name: Option<String>,
}

const ECHO_ID_KEYS: [&str; 4] = ["id", "feedbackId", "resourceId", "userId"];
const ECHO_NAME_KEYS: [&str; 4] = ["name", "feedbackName", "resourceName", "userName"];

impl MutationEcho {
    /// Read the echo from a mutation answer. Keys are tried in order, so an
    /// answer carrying both `id` and `userId` keeps `id`. Non-object answers
    /// yield no echo.
    pub(crate) fn from_answer(answer: &Value) -> Option<Self> {
        let fields = answer.as_object()?;
        let id = ECHO_ID_KEYS.iter().filter_map(|k| fields.get(*k)).find(|v| !v.is_null()).cloned();
        let name = ECHO_NAME_KEYS.iter().filter_map(|k| fields.get(*k)?.as_str()).next().map(str::to_owned);
        Some(Self { id, name })
    }
}

impl SessionStore {
    /// Invoke `procedure`, mapping a `null` answer to `T::default()`.
    pub(crate) async fn call_or_default<T: DeserializeOwned + Default>(
        &self,
        procedure: &str,
        payload: Value,
    ) -> Result<T, SessionError> {
        Ok(invoke_as(self.rpc(), procedure, payload).await?.unwrap_or_default())
    }

    /// Invoke a mutation and read back what it touched, if it says.
    ///
    /// Only the call itself can fail; an unexpected answer shape just
    /// yields no echo.
    pub(crate) async fn mutate(&self, procedure: &str, payload: Value) -> Result<Option<MutationEcho>, SessionError> {
        let answer = self.rpc().invoke(procedure, payload).await?;
        Ok(MutationEcho::from_answer(&answer))
    }

    /// Invoke `procedure` where an answer is mandatory.
    pub(crate) async fn call_required<T: DeserializeOwned>(
        &self,
        procedure: &str,
        payload: Value,
    ) -> Result<T, SessionError> {
        invoke_as(self.rpc(), procedure, payload)
            .await?
            .ok_or_else(|| SessionError::Invalid(format!("{procedure} returned no data")))
    }
}

/// Total page count for `total` items, never below one.
#[must_use]
pub fn page_count(total: u64, per_page: u32) -> u64 {
    if per_page == 0 {
        return 1;
    }
    total.div_ceil(u64::from(per_page)).max(1)
}

/// Inclusive row range `(from, to)` of a 1-based page.
#[must_use]
pub fn page_range(page: u32, per_page: u32) -> (u64, u64) {
    let from = u64::from(page.max(1) - 1) * u64::from(per_page);
    (from, (from + u64::from(per_page)).saturating_sub(1))
}
