//! Building name resolution.

use crate::errors::BuildError;
use serde_json::Value;
use std::collections::HashMap;

const KNOWN_BUILDINGS: [(&str, &str); 4] = [
    ("咏兰阁", "69d4df83-b590-4cd9-8af9-db2e10d00ae8"),
    ("听竹轩", "e086bc8d-c777-4ba0-a6ff-714690a06cb8"),
    ("观松楼", "50be3933-f799-4cbd-82b0-df80a93cd03b"),
    ("邀月庭", "ceddcef1-0b04-4d63-9d27-8fa631a682d1"),
];

/// A building as referenced by an entry and the id it resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedBuilding {
    pub label: String,
    pub id: String,
}

/// Maps building display names to their Directus ids.
#[derive(Debug, Clone)]
pub struct BuildingDirectory {
    by_name: HashMap<String, String>,
}

impl Default for BuildingDirectory {
    fn default() -> Self {
        Self::from_entries(KNOWN_BUILDINGS)
    }
}

impl BuildingDirectory {
    pub fn from_entries<I, N, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (N, V)>,
        N: Into<String>,
        V: Into<String>,
    {
        Self {
            by_name: entries
                .into_iter()
                .map(|(name, id)| (name.into(), id.into()))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.by_name.get(name).map(String::as_str)
    }

    /// Resolves a raw building reference.
    ///
    /// Known display names map to their id. Anything else with exactly four
    /// hyphens is assumed to already be an id and passes through unchanged.
    pub fn resolve(&self, raw: Option<&Value>) -> Result<ResolvedBuilding, BuildError> {
        let value = match raw {
            None | Some(Value::Null) => return Err(BuildError::MissingField("building")),
            Some(Value::String(s)) if s.trim().is_empty() => {
                return Err(BuildError::MissingField("building"))
            }
            Some(value) => value,
        };

        let Value::String(name) = value else {
            return Err(BuildError::UnknownBuilding(value.to_string()));
        };

        if let Some(id) = self.get(name) {
            return Ok(ResolvedBuilding {
                label: name.clone(),
                id: id.to_string(),
            });
        }

        if looks_like_id(name) {
            return Ok(ResolvedBuilding {
                label: name.clone(),
                id: name.clone(),
            });
        }

        Err(BuildError::UnknownBuilding(name.clone()))
    }
}

fn looks_like_id(value: &str) -> bool {
    value.matches('-').count() == 4
}
