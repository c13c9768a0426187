use crate::config::Settings;
use crate::errors::{BackendError, ConfigError};
use crate::providers::{Backend, ServerInfo};
use crate::types::WorkOrderPayload;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client as ReqwestClient, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

const LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);
const CREATE_TIMEOUT: Duration = Duration::from_secs(15);
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(30);

// --- Directus response structures ---

#[derive(Deserialize, Debug)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Deserialize, Debug)]
struct IdRow {
    id: Value,
}

#[derive(Deserialize, Debug, Default)]
struct ServerInfoData {
    #[serde(default)]
    project: Option<ProjectData>,
}

#[derive(Deserialize, Debug, Default)]
struct ProjectData {
    #[serde(default)]
    project_name: Option<String>,
}

// --- Directus Backend implementation ---

/// A [`Backend`] that talks to the Directus REST API with a static bearer token.
#[derive(Clone, Debug)]
pub struct DirectusBackend {
    client: ReqwestClient,
    base_url: String,
    token: String,
}

impl DirectusBackend {
    /// Creates a new `DirectusBackend` from the run settings.
    pub fn new(settings: &Settings) -> Result<Self, ConfigError> {
        let client = ReqwestClient::builder()
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        Ok(Self {
            client,
            base_url: settings.directus_url.clone(),
            token: settings.token.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.token)
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.token)
    }
}

/// Extracts the first message of a Directus `{"errors": [...]}` body.
fn directus_error_message(body: &Value) -> Option<String> {
    let first = body.get("errors")?.as_array()?.first()?;
    Some(
        first
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| first.to_string()),
    )
}

/// Reads a JSON response, turning Directus error bodies and non-2xx statuses
/// into [`BackendError`]s.
async fn read_json(response: Response) -> Result<Value, BackendError> {
    let status = response.status();
    let text = response.text().await?;
    let body: Option<Value> = serde_json::from_str(&text).ok();

    if let Some(message) = body.as_ref().and_then(directus_error_message) {
        return Err(BackendError::Api(message));
    }
    if !status.is_success() {
        return Err(BackendError::Status {
            status: status.as_u16(),
            message: text,
        });
    }
    body.ok_or_else(|| BackendError::UnexpectedResponse(format!("body is not JSON: {text}")))
}

/// Like [`read_json`] for endpoints that may answer with an empty body.
async fn expect_success(response: Response) -> Result<(), BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&text)
        .ok()
        .as_ref()
        .and_then(directus_error_message)
        .unwrap_or(text);
    Err(BackendError::Status {
        status: status.as_u16(),
        message,
    })
}

fn id_to_string(id: &Value) -> Option<String> {
    match id {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn data_id(body: &Value) -> Result<String, BackendError> {
    body.get("data")
        .and_then(|data| data.get("id"))
        .and_then(id_to_string)
        .ok_or_else(|| BackendError::UnexpectedResponse(format!("missing data.id in {body}")))
}

fn parse_data<T: for<'de> Deserialize<'de>>(body: Value) -> Result<T, BackendError> {
    serde_json::from_value::<DataEnvelope<T>>(body)
        .map(|envelope| envelope.data)
        .map_err(|e| BackendError::UnexpectedResponse(e.to_string()))
}

#[async_trait]
impl Backend for DirectusBackend {
    async fn server_info(&self) -> Result<ServerInfo, BackendError> {
        let response = self
            .get("/server/info")
            .timeout(LOOKUP_TIMEOUT)
            .send()
            .await?;
        let data: ServerInfoData = parse_data(read_json(response).await?)?;
        let project_name = data
            .project
            .and_then(|p| p.project_name)
            .unwrap_or_else(|| "Unknown Project".to_string());
        Ok(ServerInfo { project_name })
    }

    async fn find_user_id_by_email(&self, email: &str) -> Result<Option<String>, BackendError> {
        debug!("Looking up user by email: {email}");
        let response = self
            .get("/users")
            .query(&[
                ("limit", "1"),
                ("fields", "id"),
                ("filter[email][_eq]", email),
            ])
            .timeout(LOOKUP_TIMEOUT)
            .send()
            .await?;
        let rows: Vec<IdRow> = parse_data(read_json(response).await?)?;
        Ok(rows.first().and_then(|row| id_to_string(&row.id)))
    }

    async fn create_work_order(&self, payload: &WorkOrderPayload) -> Result<String, BackendError> {
        let response = self
            .post("/items/work_orders")
            .json(payload)
            .timeout(CREATE_TIMEOUT)
            .send()
            .await?;
        data_id(&read_json(response).await?)
    }

    async fn upload_file(&self, path: &Path) -> Result<String, BackendError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| BackendError::LocalFile {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        info!("Uploading '{}' ({} bytes)", path.display(), bytes.len());

        let form = Form::new().part("file", Part::bytes(bytes).file_name(file_name));
        let response = self
            .post("/files")
            .multipart(form)
            .timeout(UPLOAD_TIMEOUT)
            .send()
            .await?;
        data_id(&read_json(response).await?)
    }

    async fn set_file_type(&self, file_id: &str, mime_type: &str) -> Result<(), BackendError> {
        let response = self
            .client
            .patch(format!("{}/files/{}", self.base_url, file_id))
            .bearer_auth(&self.token)
            .json(&serde_json::json!({ "type": mime_type }))
            .timeout(LOOKUP_TIMEOUT)
            .send()
            .await?;
        read_json(response).await.map(|_| ())
    }

    async fn list_file_ids(&self) -> Result<BTreeSet<String>, BackendError> {
        let response = self
            .get("/files")
            .query(&[("fields", "id"), ("limit", "-1")])
            .send()
            .await?;
        let rows: Vec<IdRow> = parse_data(read_json(response).await?)?;
        Ok(rows.iter().filter_map(|row| id_to_string(&row.id)).collect())
    }

    async fn delete_file(&self, file_id: &str) -> Result<(), BackendError> {
        let response = self
            .client
            .delete(format!("{}/files/{}", self.base_url, file_id))
            .bearer_auth(&self.token)
            .send()
            .await?;
        expect_success(response).await
    }
}
