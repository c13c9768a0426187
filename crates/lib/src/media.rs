//! Uploading an entry's local files before its work order is created.

use crate::providers::Backend;
use serde_json::Value;
use std::path::Path;
use tracing::{error, info, warn};

/// Content types for the video containers Directus tends to misclassify.
const VIDEO_MIME_TYPES: [(&str, &str); 5] = [
    ("mp4", "video/mp4"),
    ("mov", "video/quicktime"),
    ("avi", "video/x-msvideo"),
    ("mkv", "video/x-matroska"),
    ("webm", "video/webm"),
];

/// The video content type for `path`, judged by its extension.
pub fn video_mime_type(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_lowercase();
    VIDEO_MIME_TYPES
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, mime)| *mime)
}

/// The placeholder id reported for a file that a dry run would have uploaded.
pub fn dry_run_file_id(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("dry-run-id-for-{name}")
}

/// The `local_files` paths listed by an entry. Non-string items are ignored.
pub fn local_files(entry: &Value) -> Vec<String> {
    entry
        .get("local_files")
        .and_then(Value::as_array)
        .map(|paths| {
            paths
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Uploads each path and returns the ids of the files that made it.
///
/// Missing files and failed uploads are logged and skipped. After a
/// successful video upload the stored content type is corrected; a failed
/// correction is only a warning. A dry run touches nothing and returns
/// placeholder ids.
pub async fn upload_local_files(
    backend: &dyn Backend,
    paths: &[String],
    dry_run: bool,
) -> Vec<String> {
    let mut uploaded = Vec::new();
    for raw in paths {
        let path = Path::new(raw);
        if !path.exists() {
            warn!("Local file not found, skipping upload: {raw}");
            continue;
        }

        if dry_run {
            info!("[dry-run] Would upload file: {raw}");
            uploaded.push(dry_run_file_id(path));
            continue;
        }

        let file_id = match backend.upload_file(path).await {
            Ok(id) => id,
            Err(e) => {
                error!("Upload of '{raw}' failed: {e}");
                continue;
            }
        };
        info!("Uploaded '{raw}' as file {file_id}");

        if let Some(mime) = video_mime_type(path) {
            match backend.set_file_type(&file_id, mime).await {
                Ok(()) => info!("Set content type of {file_id} to {mime}"),
                Err(e) => warn!("Failed to set content type of {file_id} to {mime}: {e}"),
            }
        }
        uploaded.push(file_id);
    }
    uploaded
}
