//! # Run Configuration
//!
//! The backend location, credentials and the defaults applied to every payload
//! are gathered into one [`Settings`] value that is handed to the builder and
//! the backend client at construction time.

use crate::errors::ConfigError;
use url::Url;

/// The Directus instance used when nothing else is configured.
pub const DEFAULT_DIRECTUS_URL: &str = "http://localhost:8055";

/// The community every work order belongs to unless an entry says otherwise.
pub const DEFAULT_COMMUNITY_ID: &str = "2a5c769e-9909-4331-99b3-983c8b1175c6";

/// The submitter used by the upload workflow when an entry names none.
pub const DEFAULT_SUBMITTER_ID: &str = "1030a8c2-888e-4ff9-a9e8-d1b6a7c3d8ea";

/// The status a new work order starts in.
pub const DEFAULT_STATUS: &str = "submitted";

/// The media map read by `create` when `--media-map` is not given.
pub const DEFAULT_MEDIA_MAP: &str = "uploaded_pexels_media.csv";

/// The in-use id list read by `cleanup` when `--used-ids` is not given.
pub const DEFAULT_USED_IDS_FILE: &str = "used_files_ids.txt";

/// What to do with a priority that is not one of the known values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PriorityPolicy {
    /// Warn and substitute a random valid priority.
    #[default]
    Lenient,
    /// Reject the entry.
    Strict,
}

/// Resolved configuration for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub directus_url: String,
    pub token: String,
    pub community_id: String,
    pub default_submitter_id: String,
    pub default_status: String,
    pub priority_policy: PriorityPolicy,
}

impl Settings {
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder::new()
    }
}

/// A builder for [`Settings`].
///
/// Every field except the token has a default. `build` validates the URL and
/// rejects an empty token.
#[derive(Debug, Clone, Default)]
pub struct SettingsBuilder {
    directus_url: Option<String>,
    token: Option<String>,
    community_id: Option<String>,
    default_submitter_id: Option<String>,
    default_status: Option<String>,
    priority_policy: PriorityPolicy,
}

impl SettingsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn directus_url(mut self, url: impl Into<String>) -> Self {
        self.directus_url = Some(url.into());
        self
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn community_id(mut self, community_id: impl Into<String>) -> Self {
        self.community_id = Some(community_id.into());
        self
    }

    pub fn default_submitter_id(mut self, submitter_id: impl Into<String>) -> Self {
        self.default_submitter_id = Some(submitter_id.into());
        self
    }

    pub fn default_status(mut self, status: impl Into<String>) -> Self {
        self.default_status = Some(status.into());
        self
    }

    pub fn priority_policy(mut self, policy: PriorityPolicy) -> Self {
        self.priority_policy = policy;
        self
    }

    /// Builds the [`Settings`].
    ///
    /// A trailing slash on the URL is dropped so request paths can be appended
    /// directly.
    pub fn build(self) -> Result<Settings, ConfigError> {
        let token = self
            .token
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingToken)?;

        let directus_url = self
            .directus_url
            .unwrap_or_else(|| DEFAULT_DIRECTUS_URL.to_string());
        Url::parse(&directus_url).map_err(|e| ConfigError::InvalidUrl {
            url: directus_url.clone(),
            reason: e.to_string(),
        })?;

        Ok(Settings {
            directus_url: directus_url.trim_end_matches('/').to_string(),
            token,
            community_id: non_empty_or(self.community_id, DEFAULT_COMMUNITY_ID),
            default_submitter_id: non_empty_or(self.default_submitter_id, DEFAULT_SUBMITTER_ID),
            default_status: non_empty_or(self.default_status, DEFAULT_STATUS),
            priority_policy: self.priority_policy,
        })
    }
}

fn non_empty_or(value: Option<String>, fallback: &str) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string())
}
