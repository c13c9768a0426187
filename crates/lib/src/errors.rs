use thiserror::Error;

/// Fatal configuration problems detected while assembling [`crate::Settings`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("DIRECTUS_TOKEN is missing. Set it in the environment or pass --token")]
    MissingToken,
    #[error("Invalid Directus URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Fatal errors raised while reading the input files of a run.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("File not found: {0}")]
    NotFound(String),
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse JSON from '{path}': {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Malformed definition file: expected an array or an object with a workorders/items/data array")]
    UnexpectedShape,
    #[error("Failed to parse CSV from '{path}': {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },
    #[error("Media map '{0}' has no 'file_id' column")]
    MissingFileIdColumn(String),
    #[error("Media map '{0}' does not contain any file ids")]
    EmptyMediaMap(String),
}

/// Errors returned by a [`crate::providers::Backend`] call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("Request to Directus failed: {0}")]
    Transport(String),
    #[error("Directus responded with status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Directus returned an error: {0}")]
    Api(String),
    #[error("Unexpected response from Directus: {0}")]
    UnexpectedResponse(String),
    #[error("Failed to read local file '{path}': {reason}")]
    LocalFile { path: String, reason: String },
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        BackendError::Transport(err.to_string())
    }
}

/// Per-entry failures. The batch logs these and moves on to the next entry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("Work order entry must be a JSON object")]
    NotAnObject,
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
    #[error("Unknown building: {0}")]
    UnknownBuilding(String),
    #[error("Invalid attachments: {0}")]
    InvalidAttachments(String),
    #[error("Invalid priority '{0}'")]
    InvalidPriority(String),
    #[error("User not found: {0}")]
    UserNotFound(String),
    #[error("Media pool is empty, cannot pick random attachments")]
    EmptyMediaPool,
    #[error(transparent)]
    Backend(#[from] BackendError),
}
