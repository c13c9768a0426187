//! Normalization of the `files` / `attachments` field of an entry.

use crate::coalesce::is_blank;
use crate::errors::BuildError;
use crate::types::FileReference;
use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::Value;

/// Most attachments picked at random for an entry without any.
pub const MAX_RANDOM_FILES: usize = 3;

/// Attachment ids available for random assignment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaPool {
    ids: Vec<String>,
}

impl MediaPool {
    /// Builds a pool from `ids`, dropping blanks and repeated ids while keeping
    /// the first occurrence's position.
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for id in ids {
            let id = id.into().trim().to_string();
            if !id.is_empty() && !unique.contains(&id) {
                unique.push(id);
            }
        }
        Self { ids: unique }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|known| known == id)
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Picks between 1 and `min(3, len)` distinct ids uniformly at random.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Vec<FileReference>, BuildError> {
        if self.ids.is_empty() {
            return Err(BuildError::EmptyMediaPool);
        }
        let count = rng.gen_range(1..=MAX_RANDOM_FILES.min(self.ids.len()));
        Ok(self
            .ids
            .choose_multiple(rng, count)
            .map(FileReference::new)
            .collect())
    }
}

/// Produces the attachment references for `entry`.
///
/// `files` is consulted first, then `attachments`; a blank value under `files`
/// falls through. When neither holds anything, ids are drawn from `pool`.
pub fn normalize_attachments<R: Rng + ?Sized>(
    entry: &Value,
    pool: &MediaPool,
    rng: &mut R,
) -> Result<Vec<FileReference>, BuildError> {
    let provided = ["files", "attachments"]
        .iter()
        .filter_map(|key| entry.get(*key))
        .find(|value| !is_blank(value));

    let Some(provided) = provided else {
        return pool.pick(rng);
    };

    let items = match provided {
        Value::Array(items) => items,
        Value::Object(wrapper) => match wrapper.get("create") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(BuildError::InvalidAttachments(
                    "files must be an array or an object with a 'create' array".into(),
                ))
            }
        },
        _ => {
            return Err(BuildError::InvalidAttachments(
                "files must be an array or an object with a 'create' array".into(),
            ))
        }
    };

    items.iter().map(normalize_item).collect()
}

fn normalize_item(item: &Value) -> Result<FileReference, BuildError> {
    let id = match item {
        Value::String(_) => file_id_text(item),
        Value::Object(fields) => match (fields.get("directus_files_id"), fields.get("id")) {
            (Some(Value::Object(nested)), _) => nested.get("id").and_then(file_id_text),
            (Some(id), _) => file_id_text(id),
            (None, Some(id)) => file_id_text(id),
            (None, None) => None,
        },
        _ => None,
    };

    id.map(FileReference::new).ok_or_else(|| {
        BuildError::InvalidAttachments(format!(
            "entries must be strings or objects with a directus_files_id/id, got {item}"
        ))
    })
}

/// A file id given as a non-blank string or as a number.
fn file_id_text(id: &Value) -> Option<String> {
    match id {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;

    fn ids(refs: &[FileReference]) -> Vec<&str> {
        refs.iter().map(|r| r.directus_files_id.as_str()).collect()
    }

    #[test]
    fn test_bare_strings_keep_order() {
        let mut rng = StdRng::seed_from_u64(1);
        let entry = json!({ "files": ["F3", "F1", "F2"] });
        let refs = normalize_attachments(&entry, &MediaPool::default(), &mut rng).unwrap();
        assert_eq!(ids(&refs), vec!["F3", "F1", "F2"]);
    }

    #[test]
    fn test_object_shapes_and_create_wrapper() {
        let mut rng = StdRng::seed_from_u64(1);
        let entry = json!({
            "attachments": {
                "create": [
                    { "directus_files_id": "A" },
                    { "directus_files_id": { "id": "B" } },
                    { "id": "C" }
                ]
            }
        });
        let refs = normalize_attachments(&entry, &MediaPool::default(), &mut rng).unwrap();
        assert_eq!(ids(&refs), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_numeric_object_ids_are_rendered_as_text() {
        let mut rng = StdRng::seed_from_u64(1);
        let entry = json!({
            "files": [{ "id": 42 }, { "directus_files_id": 7 }, { "directus_files_id": { "id": 9 } }]
        });
        let refs = normalize_attachments(&entry, &MediaPool::default(), &mut rng).unwrap();
        assert_eq!(ids(&refs), vec!["42", "7", "9"]);
    }

    #[test]
    fn test_one_bad_element_rejects_the_entry() {
        let mut rng = StdRng::seed_from_u64(1);
        let entry = json!({ "files": ["A", 42] });
        let err = normalize_attachments(&entry, &MediaPool::default(), &mut rng).unwrap_err();
        assert!(matches!(err, BuildError::InvalidAttachments(_)));

        let entry = json!({ "files": [{ "name": "photo.jpg" }] });
        assert!(normalize_attachments(&entry, &MediaPool::default(), &mut rng).is_err());

        let entry = json!({ "files": { "create": "A" } });
        assert!(normalize_attachments(&entry, &MediaPool::default(), &mut rng).is_err());

        let entry = json!({ "files": "A" });
        assert!(normalize_attachments(&entry, &MediaPool::default(), &mut rng).is_err());
    }

    #[test]
    fn test_absent_field_draws_from_pool() {
        let pool = MediaPool::new(["F1", "F2", "F3", "F4", "F5"]);
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let refs = normalize_attachments(&json!({}), &pool, &mut rng).unwrap();
            assert!((1..=3).contains(&refs.len()));
            let mut seen = ids(&refs);
            assert!(seen.iter().all(|id| pool.contains(id)));
            seen.sort();
            seen.dedup();
            assert_eq!(seen.len(), refs.len(), "picked ids must be distinct");
        }
    }

    #[test]
    fn test_empty_files_falls_back_to_pool() {
        let pool = MediaPool::new(["F1"]);
        let mut rng = StdRng::seed_from_u64(7);
        let refs = normalize_attachments(&json!({ "files": [] }), &pool, &mut rng).unwrap();
        assert_eq!(ids(&refs), vec!["F1"]);
    }

    #[test]
    fn test_explicit_empty_create_list_yields_nothing() {
        let mut rng = StdRng::seed_from_u64(7);
        let entry = json!({ "files": { "create": [] } });
        let refs = normalize_attachments(&entry, &MediaPool::new(["F1"]), &mut rng).unwrap();
        assert!(refs.is_empty());
    }

    #[test]
    fn test_empty_pool_is_an_error() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(
            normalize_attachments(&json!({}), &MediaPool::default(), &mut rng),
            Err(BuildError::EmptyMediaPool)
        );
    }

    #[test]
    fn test_pool_drops_duplicates_and_blanks() {
        let pool = MediaPool::new(["F1", " ", "F2", "F1"]);
        assert_eq!(pool.ids(), &["F1".to_string(), "F2".to_string()]);
    }
}
