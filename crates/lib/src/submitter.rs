use crate::coalesce::coalesce_text;
use crate::errors::BuildError;
use crate::providers::Backend;
use crate::types::Submitter;
use serde_json::Value;
use tracing::debug;

/// Works out who submitted `entry`.
///
/// A `submitter_id` is used as is. Without one the entry's `email` (or
/// `submitter_email`) is looked up in the backend's user directory. This is
/// the only network call made while building a payload.
pub async fn resolve_submitter(
    entry: &Value,
    backend: &dyn Backend,
) -> Result<Submitter, BuildError> {
    let submitter_id = coalesce_text(entry, &["submitter_id"]);
    let email = coalesce_text(entry, &["email", "submitter_email"]);

    if let Some(id) = submitter_id {
        return Ok(Submitter { id, email });
    }

    let email = email.ok_or(BuildError::MissingField("email or submitter_id"))?;
    let id = backend
        .find_user_id_by_email(&email)
        .await?
        .ok_or_else(|| BuildError::UserNotFound(email.clone()))?;
    debug!("Resolved submitter {email} to {id}");

    Ok(Submitter {
        id,
        email: Some(email),
    })
}
