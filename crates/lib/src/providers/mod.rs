pub mod directus;

use crate::errors::BackendError;
use crate::types::WorkOrderPayload;
use async_trait::async_trait;
use dyn_clone::DynClone;
pub use directus::DirectusBackend;
use std::collections::BTreeSet;
use std::fmt::Debug;
use std::path::Path;

/// Details reported by the backend's server-info endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfo {
    pub project_name: String,
}

/// A trait for the remote content backend that stores work orders and files.
///
/// Every call is a single request/response round trip. Implementations do not
/// retry.
#[async_trait]
pub trait Backend: Send + Sync + Debug + DynClone {
    /// Verifies connectivity and credentials.
    async fn server_info(&self) -> Result<ServerInfo, BackendError>;

    /// Returns the id of the user whose email matches exactly, if any.
    async fn find_user_id_by_email(&self, email: &str) -> Result<Option<String>, BackendError>;

    /// Creates a work order and returns its id.
    async fn create_work_order(&self, payload: &WorkOrderPayload) -> Result<String, BackendError>;

    /// Uploads a local file and returns the id the backend assigned to it.
    async fn upload_file(&self, path: &Path) -> Result<String, BackendError>;

    /// Overwrites the stored content type of an uploaded file.
    async fn set_file_type(&self, file_id: &str, mime_type: &str) -> Result<(), BackendError>;

    /// Lists the ids of every stored file.
    async fn list_file_ids(&self) -> Result<BTreeSet<String>, BackendError>;

    async fn delete_file(&self, file_id: &str) -> Result<(), BackendError>;
}

dyn_clone::clone_trait_object!(Backend);
