use crate::coalesce::value_to_text;
use crate::config::PriorityPolicy;
use crate::errors::BuildError;
use crate::types::Priority;
use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::Value;
use tracing::warn;

/// Uniformly random priority.
pub fn random_priority<R: Rng + ?Sized>(rng: &mut R) -> Priority {
    *Priority::ALL
        .choose(rng)
        .unwrap_or(&Priority::Medium)
}

/// Turns a raw priority into a [`Priority`].
///
/// `absent` decides the value when the entry has none: `None` draws one at
/// random. Unknown values are replaced by a random priority under
/// [`PriorityPolicy::Lenient`] and rejected under [`PriorityPolicy::Strict`].
pub fn normalize_priority<R: Rng + ?Sized>(
    raw: Option<&Value>,
    absent: Option<Priority>,
    policy: PriorityPolicy,
    rng: &mut R,
) -> Result<Priority, BuildError> {
    let Some(raw) = raw else {
        return Ok(absent.unwrap_or_else(|| random_priority(rng)));
    };

    let text = priority_text(raw);
    if let Ok(priority) = text.parse::<Priority>() {
        return Ok(priority);
    }

    match policy {
        PriorityPolicy::Strict => Err(BuildError::InvalidPriority(text)),
        PriorityPolicy::Lenient => {
            let substitute = random_priority(rng);
            warn!("Unrecognized priority '{text}', using '{substitute}' instead");
            Ok(substitute)
        }
    }
}

/// Rejects an unknown priority under [`PriorityPolicy::Strict`] without
/// drawing a substitute. Lenient policies and absent values always pass.
pub fn check_priority(raw: Option<&Value>, policy: PriorityPolicy) -> Result<(), BuildError> {
    match (raw, policy) {
        (Some(raw), PriorityPolicy::Strict) => {
            let text = priority_text(raw);
            match text.parse::<Priority>() {
                Ok(_) => Ok(()),
                Err(()) => Err(BuildError::InvalidPriority(text)),
            }
        }
        _ => Ok(()),
    }
}

fn priority_text(raw: &Value) -> String {
    value_to_text(raw).unwrap_or_else(|| raw.to_string())
}
