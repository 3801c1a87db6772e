//! Session-core configuration.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use crate::error::ConfigError;

pub const DEFAULT_SITE_ORIGIN: &str = "http://localhost:5173";
pub const DEFAULT_PROFILE_BUCKET: &str = "profile-picture";
pub const DEFAULT_RESOURCES_PER_PAGE: u32 = 9;
pub const DEFAULT_INVITATIONS_PER_PAGE: u32 = 10;
pub const DEFAULT_RECENT_ACTIVITY_LIMIT: u32 = 5;

/// Where the hosted backend lives and how the client pages through it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    /// Backend project base URL, without a trailing slash.
    pub project_url: String,
    /// Origin of this client, used for email redirect links.
    pub site_origin: String,
    /// Public storage bucket holding profile pictures.
    pub profile_bucket: String,
    pub resources_per_page: u32,
    pub invitations_per_page: u32,
    pub recent_activity_limit: u32,
}

impl SessionConfig {
    /// Config with default paging for the given project and site origin.
    #[must_use]
    pub fn new(project_url: &str, site_origin: &str) -> Self {
        Self {
            project_url: project_url.trim_end_matches('/').to_owned(),
            site_origin: site_origin.trim_end_matches('/').to_owned(),
            profile_bucket: DEFAULT_PROFILE_BUCKET.to_owned(),
            resources_per_page: DEFAULT_RESOURCES_PER_PAGE,
            invitations_per_page: DEFAULT_INVITATIONS_PER_PAGE,
            recent_activity_limit: DEFAULT_RECENT_ACTIVITY_LIMIT,
        }
    }

    /// Build config from environment variables.
    ///
    /// Required:
    /// - `MIRA_PROJECT_URL`
    ///
    /// Optional:
    /// - `MIRA_SITE_ORIGIN`: default `http://localhost:5173`
    /// - `MIRA_PROFILE_BUCKET`: default `profile-picture`
    /// - `MIRA_RESOURCES_PER_PAGE`: default 9
    /// - `MIRA_INVITATIONS_PER_PAGE`: default 10
    /// - `MIRA_RECENT_ACTIVITY_LIMIT`: default 5
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] when the project URL is absent and
    /// [`ConfigError::Invalid`] when it is not an http(s) URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        let project_url =
            std::env::var("MIRA_PROJECT_URL").map_err(|_| ConfigError::Missing { var: "MIRA_PROJECT_URL".into() })?;
        if !(project_url.starts_with("https://") || project_url.starts_with("http://")) {
            return Err(ConfigError::Invalid {
                var: "MIRA_PROJECT_URL".into(),
                message: format!("expected an http(s) URL, got '{project_url}'"),
            });
        }
        let site_origin = std::env::var("MIRA_SITE_ORIGIN").unwrap_or_else(|_| DEFAULT_SITE_ORIGIN.to_owned());

        let mut config = Self::new(&project_url, &site_origin);
        if let Ok(bucket) = std::env::var("MIRA_PROFILE_BUCKET") {
            config.profile_bucket = bucket;
        }
        config.resources_per_page = env_parse_u32("MIRA_RESOURCES_PER_PAGE", DEFAULT_RESOURCES_PER_PAGE);
        config.invitations_per_page = env_parse_u32("MIRA_INVITATIONS_PER_PAGE", DEFAULT_INVITATIONS_PER_PAGE);
        config.recent_activity_limit = env_parse_u32("MIRA_RECENT_ACTIVITY_LIMIT", DEFAULT_RECENT_ACTIVITY_LIMIT);
        Ok(config)
    }

    /// Absolute in-app URL for email links, e.g. `/update-password`.
    #[must_use]
    pub fn redirect_url(&self, path: &str) -> String {
        format!("{}/{}", self.site_origin, path.trim_start_matches('/'))
    }

    /// Public URL of an uploaded profile picture.
    #[must_use]
    pub fn profile_image_url(&self, path: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{}", self.project_url, self.profile_bucket, path)
    }
}

fn env_parse_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}
