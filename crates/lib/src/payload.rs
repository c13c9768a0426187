//! # Work Order Payload Builder
//!
//! Turns one loosely structured definition entry into the body posted to
//! `/items/work_orders`, plus a [`BuildMeta`] summary for log lines.
//!
//! Two flavours exist:
//!
//! 1.  [`PayloadBuilder::build`] normalizes an entry fully: synonym coalescing,
//!     building resolution, submitter lookup, priority normalization and
//!     attachment normalization (falling back to random media).
//! 2.  [`PayloadBuilder::build_for_uploads`] is used after an entry's local
//!     files were uploaded. It only checks the required text fields and
//!     attaches the freshly uploaded ids.

use crate::attachments::{normalize_attachments, MediaPool};
use crate::building::BuildingDirectory;
use crate::coalesce::{coalesce, coalesce_text, is_blank};
use crate::config::Settings;
use crate::errors::BuildError;
use crate::priority::{check_priority, normalize_priority};
use crate::providers::Backend;
use crate::submitter::resolve_submitter;
use crate::types::{BuildMeta, FileReference, Priority, WorkOrderPayload};
use rand::Rng;
use serde_json::{json, Map, Value};

/// Optional fields copied verbatim when present and non-null.
pub const PASS_THROUGH_FIELDS: [&str; 5] =
    ["deadline", "resolved_at", "assignee_id", "rating", "feedback"];

const DESCRIPTION_KEYS: [&str; 3] = ["description", "content", "detail"];
const BUILDING_KEYS: [&str; 3] = ["building", "building_id", "building_name"];
const EXTENSION_KEYS: [&str; 2] = ["payload", "extra"];
const UPLOAD_REQUIRED_FIELDS: [&str; 3] = ["title", "description", "category"];

/// A payload ready to be sent, with its log summary.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltWorkOrder {
    pub payload: WorkOrderPayload,
    pub meta: BuildMeta,
}

/// Builds work order payloads from definition entries.
///
/// Holds only read-only state, so one builder serves a whole batch.
#[derive(Debug, Clone)]
pub struct PayloadBuilder {
    settings: Settings,
    media: MediaPool,
    buildings: BuildingDirectory,
}

impl PayloadBuilder {
    pub fn new(settings: Settings, media: MediaPool) -> Self {
        Self {
            settings,
            media,
            buildings: BuildingDirectory::default(),
        }
    }

    /// Replaces the default building directory.
    pub fn with_buildings(mut self, buildings: BuildingDirectory) -> Self {
        self.buildings = buildings;
        self
    }

    /// Builds the payload for one entry.
    ///
    /// Fields are validated in a fixed order and the first failure is
    /// returned: title, category, description, building, submitter, priority,
    /// attachments. The submitter lookup is skipped when a `submitter_id` is
    /// given.
    pub async fn build<R: Rng + ?Sized>(
        &self,
        entry: &Value,
        backend: &dyn Backend,
        rng: &mut R,
    ) -> Result<BuiltWorkOrder, BuildError> {
        if !entry.is_object() {
            return Err(BuildError::NotAnObject);
        }

        let title = required_text(entry, &["title"], "title")?;
        let category = required_text(entry, &["category"], "category")?;
        let description = required_text(entry, &DESCRIPTION_KEYS, "description")?;

        let building = self
            .buildings
            .resolve(coalesce(entry, &BUILDING_KEYS).as_ref())?;

        let submitter = resolve_submitter(entry, backend).await?;

        let priority = normalize_priority(
            coalesce(entry, &["priority"]).as_ref(),
            None,
            self.settings.priority_policy,
            rng,
        )?;

        let status = coalesce_text(entry, &["status"])
            .unwrap_or_else(|| self.settings.default_status.clone());
        let community_id = coalesce_text(entry, &["community_id"])
            .unwrap_or_else(|| self.settings.community_id.clone());

        let files = normalize_attachments(entry, &self.media, rng)?;

        let mut fields = core_fields(
            &title,
            &description,
            &category,
            priority,
            &status,
            &submitter.id,
            &community_id,
        );

        for key in PASS_THROUGH_FIELDS {
            if let Some(value) = entry.get(key).filter(|v| !v.is_null()) {
                fields.insert(key.to_string(), value.clone());
            }
        }

        if !files.is_empty() {
            fields.insert("files".to_string(), files_value(&files));
        }

        let mut payload = WorkOrderPayload::from_map(fields);
        if let Some(extension) = extension_object(entry) {
            payload.merge(extension);
        }

        Ok(BuiltWorkOrder {
            payload,
            meta: BuildMeta {
                title,
                category,
                priority: Some(priority),
                building: Some(building.label),
                submitter_email: submitter.email,
            },
        })
    }

    /// Checks the fields [`Self::build_for_uploads`] requires without building,
    /// including the priority when the policy is strict.
    pub fn validate_upload_entry(&self, entry: &Value) -> Result<(), BuildError> {
        if !entry.is_object() {
            return Err(BuildError::NotAnObject);
        }
        for field in UPLOAD_REQUIRED_FIELDS {
            required_text(entry, &[field], field)?;
        }
        check_priority(
            coalesce(entry, &["priority"]).as_ref(),
            self.settings.priority_policy,
        )
    }

    /// Builds the payload for an entry whose local files were already uploaded.
    ///
    /// The priority defaults to `medium`, the submitter to the configured
    /// default submitter, and the community always comes from the settings.
    pub fn build_for_uploads<R: Rng + ?Sized>(
        &self,
        entry: &Value,
        uploaded_ids: &[String],
        rng: &mut R,
    ) -> Result<BuiltWorkOrder, BuildError> {
        if !entry.is_object() {
            return Err(BuildError::NotAnObject);
        }

        let title = required_text(entry, &["title"], "title")?;
        let description = required_text(entry, &["description"], "description")?;
        let category = required_text(entry, &["category"], "category")?;

        let status = coalesce_text(entry, &["status"])
            .unwrap_or_else(|| self.settings.default_status.clone());
        let priority = normalize_priority(
            coalesce(entry, &["priority"]).as_ref(),
            Some(Priority::Medium),
            self.settings.priority_policy,
            rng,
        )?;
        let submitter_id = coalesce_text(entry, &["submitter_id"])
            .unwrap_or_else(|| self.settings.default_submitter_id.clone());

        let mut fields = core_fields(
            &title,
            &description,
            &category,
            priority,
            &status,
            &submitter_id,
            &self.settings.community_id,
        );
        if !uploaded_ids.is_empty() {
            let files: Vec<FileReference> = uploaded_ids.iter().map(FileReference::new).collect();
            fields.insert("files".to_string(), files_value(&files));
        }

        Ok(BuiltWorkOrder {
            payload: WorkOrderPayload::from_map(fields),
            meta: BuildMeta {
                title,
                category,
                priority: Some(priority),
                building: None,
                submitter_email: coalesce_text(entry, &["email", "submitter_email"]),
            },
        })
    }
}

fn required_text(
    entry: &Value,
    keys: &[&str],
    field: &'static str,
) -> Result<String, BuildError> {
    coalesce_text(entry, keys).ok_or(BuildError::MissingField(field))
}

fn core_fields(
    title: &str,
    description: &str,
    category: &str,
    priority: Priority,
    status: &str,
    submitter_id: &str,
    community_id: &str,
) -> Map<String, Value> {
    let mut fields = Map::new();
    fields.insert("title".into(), json!(title));
    fields.insert("description".into(), json!(description));
    fields.insert("category".into(), json!(category));
    fields.insert("priority".into(), json!(priority));
    fields.insert("status".into(), json!(status));
    fields.insert("submitter_id".into(), json!(submitter_id));
    fields.insert("community_id".into(), json!(community_id));
    fields
}

fn files_value(files: &[FileReference]) -> Value {
    json!({ "create": files })
}

fn extension_object(entry: &Value) -> Option<&Map<String, Value>> {
    EXTENSION_KEYS
        .iter()
        .filter_map(|key| entry.get(*key))
        .find(|value| !is_blank(value))
        .and_then(Value::as_object)
}
