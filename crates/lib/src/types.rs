use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Work order urgency as understood by the `work_orders` collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Low,
        Priority::Medium,
        Priority::High,
        Priority::Urgent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = ();

    /// Case-insensitive match against the known priorities.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        Priority::ALL
            .into_iter()
            .find(|p| p.as_str() == lowered)
            .ok_or(())
    }
}

/// One row of a Directus relational `create` for the `files` alias field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReference {
    pub directus_files_id: String,
}

impl FileReference {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            directus_files_id: id.into(),
        }
    }
}

/// The body posted to `/items/work_orders`.
///
/// Kept as a JSON object because caller-supplied extension fields may add or
/// replace arbitrary keys.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkOrderPayload(Map<String, Value>);

impl WorkOrderPayload {
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    /// Inserts every key of `extension`, replacing existing values.
    pub fn merge(&mut self, extension: &Map<String, Value>) {
        for (key, value) in extension {
            self.0.insert(key.clone(), value.clone());
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.get_str("title")
    }

    pub fn priority(&self) -> Option<Priority> {
        self.get_str("priority").and_then(|p| p.parse().ok())
    }

    /// The attachment ids listed under `files.create`, in order.
    pub fn file_ids(&self) -> Vec<&str> {
        self.0
            .get("files")
            .and_then(|files| files.get("create"))
            .and_then(Value::as_array)
            .map(|refs| {
                refs.iter()
                    .filter_map(|r| r.get("directus_files_id").and_then(Value::as_str))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

/// A short summary of a built payload, used only for log lines.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BuildMeta {
    pub title: String,
    pub category: String,
    pub priority: Option<Priority>,
    pub building: Option<String>,
    pub submitter_email: Option<String>,
}

impl BuildMeta {
    /// `title (category/priority)`, the form printed next to each entry.
    pub fn summary(&self) -> String {
        match self.priority {
            Some(priority) => format!("{} ({}/{})", self.title, self.category, priority),
            None => format!("{} ({})", self.title, self.category),
        }
    }
}

/// A resolved submitter and the email that was used to find it, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submitter {
    pub id: String,
    pub email: Option<String>,
}
