//! # Orphaned File Cleanup
//!
//! Finds backend files that nothing references any more and deletes them once
//! the operator confirms.

use crate::errors::BackendError;
use crate::providers::Backend;
use std::collections::BTreeSet;
use std::io::{self, BufRead, Write};
use tracing::{error, info};

pub const CONFIRMATION_PROMPT: &str = "Are you sure you want to delete these files? (yes/no): ";

/// The ids present in the backend but absent from the used set, sorted.
pub fn plan_cleanup(all_ids: &BTreeSet<String>, used_ids: &BTreeSet<String>) -> Vec<String> {
    all_ids.difference(used_ids).cloned().collect()
}

/// Writes the confirmation prompt and reads one answer line.
///
/// Only `yes` (any case, surrounding whitespace ignored) confirms; end of input
/// counts as a refusal.
pub fn confirm_deletion<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> io::Result<bool> {
    write!(output, "\n{CONFIRMATION_PROMPT}")?;
    output.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(answer.trim().eq_ignore_ascii_case("yes"))
}

/// Result of deleting a list of files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub deleted: Vec<String>,
    pub failed: Vec<(String, BackendError)>,
}

/// Deletes each id in turn. A failed delete is recorded and does not stop the
/// remaining deletions.
pub async fn delete_files(backend: &dyn Backend, ids: &[String]) -> CleanupReport {
    let mut report = CleanupReport::default();
    for id in ids {
        match backend.delete_file(id).await {
            Ok(()) => {
                info!("Deleted file {id}");
                report.deleted.push(id.clone());
            }
            Err(e) => {
                error!("Failed to delete file {id}: {e}");
                report.failed.push((id.clone(), e));
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn set(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_plan_is_sorted_difference() {
        let plan = plan_cleanup(&set(&["c", "a", "b", "d"]), &set(&["b", "x"]));
        assert_eq!(plan, vec!["a", "c", "d"]);
        assert!(plan_cleanup(&set(&["a"]), &set(&["a"])).is_empty());
    }

    #[test]
    fn test_confirmation_accepts_only_yes() {
        for (answer, expected) in [
            ("yes\n", true),
            ("  YES  \n", true),
            ("y\n", false),
            ("no\n", false),
            ("", false),
        ] {
            let mut input = Cursor::new(answer.as_bytes());
            let mut output = Vec::new();
            assert_eq!(
                confirm_deletion(&mut input, &mut output).unwrap(),
                expected,
                "answer {answer:?}"
            );
            assert!(String::from_utf8(output).unwrap().contains("(yes/no)"));
        }
    }
}
