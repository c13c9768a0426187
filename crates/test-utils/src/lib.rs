use anyhow::Result;
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use workorder::errors::BackendError;
use workorder::providers::{Backend, ServerInfo};
use workorder::WorkOrderPayload;

// --- Mock Backend ---

/// A single call made against the [`MockBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    ServerInfo,
    FindUser(String),
    CreateWorkOrder(String),
    UploadFile(PathBuf),
    SetFileType(String, String),
    ListFiles,
    DeleteFile(String),
}

impl BackendCall {
    /// Whether the call would change state on a real backend.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            BackendCall::CreateWorkOrder(_)
                | BackendCall::UploadFile(_)
                | BackendCall::SetFileType(..)
                | BackendCall::DeleteFile(_)
        )
    }
}

#[derive(Debug, Default)]
struct MockState {
    users: HashMap<String, String>,
    files: BTreeSet<String>,
    failing_creates: HashSet<String>,
    failing_uploads: HashSet<String>,
    failing_deletes: HashSet<String>,
    failing_type_updates: bool,
    created: Vec<WorkOrderPayload>,
    calls: Vec<BackendCall>,
    next_id: usize,
}

/// An in-memory [`Backend`] that records every call for assertions.
#[derive(Clone, Debug, Default)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a user that `find_user_id_by_email` will return.
    pub fn with_user(self, email: &str, id: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .users
            .insert(email.to_string(), id.to_string());
        self
    }

    /// Seeds the ids returned by `list_file_ids`.
    pub fn with_files(self, ids: &[&str]) -> Self {
        self.state
            .lock()
            .unwrap()
            .files
            .extend(ids.iter().map(|id| id.to_string()));
        self
    }

    /// Makes `create_work_order` fail for payloads with this title.
    pub fn fail_create_for(self, title: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_creates
            .insert(title.to_string());
        self
    }

    /// Makes `upload_file` fail for paths ending in `file_name`.
    pub fn fail_upload_for(self, file_name: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_uploads
            .insert(file_name.to_string());
        self
    }

    pub fn fail_delete_for(self, id: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_deletes
            .insert(id.to_string());
        self
    }

    pub fn fail_type_updates(self) -> Self {
        self.state.lock().unwrap().failing_type_updates = true;
        self
    }

    /// Retrieves the recorded calls for assertion.
    pub fn calls(&self) -> Vec<BackendCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Whether any state-changing call was made.
    pub fn mutated(&self) -> bool {
        self.calls().iter().any(BackendCall::is_mutation)
    }

    /// The payloads of every work order created so far.
    pub fn created(&self) -> Vec<WorkOrderPayload> {
        self.state.lock().unwrap().created.clone()
    }

    /// The ids still stored after any deletions.
    pub fn remaining_files(&self) -> BTreeSet<String> {
        self.state.lock().unwrap().files.clone()
    }

    fn record(&self, call: BackendCall) {
        self.state.lock().unwrap().calls.push(call);
    }

    fn next_id(&self, prefix: &str) -> String {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        format!("{prefix}-{}", state.next_id)
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn server_info(&self) -> Result<ServerInfo, BackendError> {
        self.record(BackendCall::ServerInfo);
        Ok(ServerInfo {
            project_name: "Mock Project".to_string(),
        })
    }

    async fn find_user_id_by_email(&self, email: &str) -> Result<Option<String>, BackendError> {
        self.record(BackendCall::FindUser(email.to_string()));
        Ok(self.state.lock().unwrap().users.get(email).cloned())
    }

    async fn create_work_order(&self, payload: &WorkOrderPayload) -> Result<String, BackendError> {
        let title = payload.title().unwrap_or_default().to_string();
        self.record(BackendCall::CreateWorkOrder(title.clone()));
        if self.state.lock().unwrap().failing_creates.contains(&title) {
            return Err(BackendError::Api(format!("Rejected work order '{title}'")));
        }
        let id = self.next_id("wo");
        self.state.lock().unwrap().created.push(payload.clone());
        Ok(id)
    }

    async fn upload_file(&self, path: &Path) -> Result<String, BackendError> {
        self.record(BackendCall::UploadFile(path.to_path_buf()));
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if self.state.lock().unwrap().failing_uploads.contains(&name) {
            return Err(BackendError::Transport(format!("upload of {name} refused")));
        }
        let id = self.next_id("file");
        self.state.lock().unwrap().files.insert(id.clone());
        Ok(id)
    }

    async fn set_file_type(&self, file_id: &str, mime_type: &str) -> Result<(), BackendError> {
        self.record(BackendCall::SetFileType(
            file_id.to_string(),
            mime_type.to_string(),
        ));
        if self.state.lock().unwrap().failing_type_updates {
            return Err(BackendError::Api("You don't have permission".to_string()));
        }
        Ok(())
    }

    async fn list_file_ids(&self) -> Result<BTreeSet<String>, BackendError> {
        self.record(BackendCall::ListFiles);
        Ok(self.state.lock().unwrap().files.clone())
    }

    async fn delete_file(&self, file_id: &str) -> Result<(), BackendError> {
        self.record(BackendCall::DeleteFile(file_id.to_string()));
        let mut state = self.state.lock().unwrap();
        if state.failing_deletes.contains(file_id) {
            return Err(BackendError::Status {
                status: 403,
                message: "Forbidden".to_string(),
            });
        }
        state.files.remove(file_id);
        Ok(())
    }
}

// --- Fixture Helpers ---

/// Writes `content` to `dir/name` and returns the full path.
pub fn write_fixture(dir: &Path, name: &str, content: &str) -> Result<PathBuf> {
    let path = dir.join(name);
    fs::write(&path, content)?;
    Ok(path)
}

/// Writes a media map CSV with a `file_id` column holding `ids`.
pub fn write_media_map(dir: &Path, ids: &[&str]) -> Result<PathBuf> {
    let mut content = String::from("file_name,file_id\n");
    for (i, id) in ids.iter().enumerate() {
        content.push_str(&format!("media-{i}.jpg,{id}\n"));
    }
    write_fixture(dir, "media.csv", &content)
}

/// Creates a fresh temporary directory for fixtures.
pub fn fixture_dir() -> Result<tempfile::TempDir> {
    Ok(tempfile::tempdir()?)
}
