//! Backend location baked in at build time.
//!
//! SYSTEM CONTEXT
//! ==============
//! The browser cannot read process environment, so the project URL and the
//! public anon key are captured with `option_env!` when the WASM bundle is
//! compiled. The site origin comes from `window.location` at runtime.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use session::SessionConfig;

const DEFAULT_SITE_ORIGIN: &str = "http://localhost:5173";

/// Failures resolving the compiled-in backend settings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendEnvError {
    #[error("{0} was not set when the client was built")]
    Missing(&'static str),
    #[error("MIRA_PROJECT_URL must be an http(s) URL, got '{0}'")]
    InvalidUrl(String),
}

/// Hosted backend project and its public (anon) API key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackendEnv {
    pub project_url: String,
    pub anon_key: String,
}

impl BackendEnv {
    /// Read `MIRA_PROJECT_URL` and `MIRA_ANON_KEY` captured at compile time.
    ///
    /// # Errors
    ///
    /// See [`BackendEnv::parse`].
    pub fn from_build_env() -> Result<Self, BackendEnvError> {
        Self::parse(option_env!("MIRA_PROJECT_URL"), option_env!("MIRA_ANON_KEY"))
    }

    /// # Errors
    ///
    /// Returns [`BackendEnvError::Missing`] for an absent or blank value and
    /// [`BackendEnvError::InvalidUrl`] when the project URL is not http(s).
    pub fn parse(project_url: Option<&str>, anon_key: Option<&str>) -> Result<Self, BackendEnvError> {
        let project_url = project_url
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or(BackendEnvError::Missing("MIRA_PROJECT_URL"))?;
        if !(project_url.starts_with("https://") || project_url.starts_with("http://")) {
            return Err(BackendEnvError::InvalidUrl(project_url.to_owned()));
        }
        let anon_key = anon_key
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or(BackendEnvError::Missing("MIRA_ANON_KEY"))?;
        Ok(Self { project_url: project_url.trim_end_matches('/').to_owned(), anon_key: anon_key.to_owned() })
    }

    /// Session-core config for this backend, served from `site_origin`.
    #[must_use]
    pub fn session_config(&self, site_origin: Option<&str>) -> SessionConfig {
        SessionConfig::new(&self.project_url, site_origin.unwrap_or(DEFAULT_SITE_ORIGIN))
    }
}

/// Origin of the page the client is running on.
pub fn site_origin() -> Option<String> {
    #[cfg(feature = "hydrate")]
    {
        web_sys::window().and_then(|w| w.location().origin().ok())
    }
    #[cfg(not(feature = "hydrate"))]
    {
        None
    }
}
