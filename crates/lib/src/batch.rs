//! # Batch Runner
//!
//! Drives a definition file through the payload builder one entry at a time
//! and posts each payload to the backend. A failing entry is reported and the
//! run moves on; nothing already created is rolled back.

use crate::coalesce::coalesce_text;
use crate::errors::BuildError;
use crate::media::{local_files, upload_local_files};
use crate::payload::{BuiltWorkOrder, PayloadBuilder};
use crate::providers::Backend;
use crate::types::{BuildMeta, WorkOrderPayload};
use rand::Rng;
use serde_json::Value;
use tracing::{error, info};

/// How entries are turned into payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchMode {
    /// Full normalization with attachments picked from the media pool.
    #[default]
    Normalize,
    /// Upload each entry's `local_files` and attach the resulting ids.
    UploadLocalFiles,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchOptions {
    pub mode: BatchMode,
    /// Print payloads instead of creating anything.
    pub dry_run: bool,
}

/// What happened to one entry. `index` is 1-based.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryOutcome {
    Created {
        index: usize,
        id: String,
        meta: BuildMeta,
    },
    Planned {
        index: usize,
        payload: WorkOrderPayload,
        meta: BuildMeta,
    },
    Failed {
        index: usize,
        label: String,
        error: BuildError,
    },
}

impl EntryOutcome {
    pub fn index(&self) -> usize {
        match self {
            EntryOutcome::Created { index, .. }
            | EntryOutcome::Planned { index, .. }
            | EntryOutcome::Failed { index, .. } => *index,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, EntryOutcome::Failed { .. })
    }
}

/// Every outcome of a run, in entry order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub outcomes: Vec<EntryOutcome>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn created(&self) -> usize {
        self.count(|o| matches!(o, EntryOutcome::Created { .. }))
    }

    pub fn planned(&self) -> usize {
        self.count(|o| matches!(o, EntryOutcome::Planned { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(EntryOutcome::is_failure)
    }

    fn count(&self, predicate: impl Fn(&EntryOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| predicate(o)).count()
    }
}

/// The label used for an entry in log lines: its title, or its position.
pub fn entry_label(index: usize, entry: &Value) -> String {
    coalesce_text(entry, &["title"]).unwrap_or_else(|| format!("entry #{index}"))
}

/// Runs entries through a [`PayloadBuilder`] and a [`Backend`], strictly in order.
pub struct BatchRunner<'a> {
    builder: &'a PayloadBuilder,
    backend: &'a dyn Backend,
    options: BatchOptions,
}

impl<'a> BatchRunner<'a> {
    pub fn new(builder: &'a PayloadBuilder, backend: &'a dyn Backend, options: BatchOptions) -> Self {
        Self {
            builder,
            backend,
            options,
        }
    }

    /// Processes every entry, calling `observer` with each outcome as soon as
    /// it is known.
    pub async fn run<R, F>(&self, entries: &[Value], rng: &mut R, mut observer: F) -> BatchReport
    where
        R: Rng + ?Sized,
        F: FnMut(&EntryOutcome),
    {
        info!(
            "Processing {} work order entries (mode: {:?}, dry run: {})",
            entries.len(),
            self.options.mode,
            self.options.dry_run
        );
        let mut report = BatchReport::default();
        for (offset, entry) in entries.iter().enumerate() {
            let outcome = self.process(offset + 1, entry, rng).await;
            observer(&outcome);
            report.outcomes.push(outcome);
        }
        info!(
            "Batch finished: {} created, {} planned, {} failed",
            report.created(),
            report.planned(),
            report.failed()
        );
        report
    }

    /// Builds and dispatches a single entry.
    pub async fn process<R: Rng + ?Sized>(
        &self,
        index: usize,
        entry: &Value,
        rng: &mut R,
    ) -> EntryOutcome {
        let label = entry_label(index, entry);
        let built = match self.build(entry, rng).await {
            Ok(built) => built,
            Err(error) => {
                error!("{label}: {error}");
                return EntryOutcome::Failed {
                    index,
                    label,
                    error,
                };
            }
        };

        let BuiltWorkOrder { payload, meta } = built;
        if self.options.dry_run {
            info!("[dry-run] Skipping create for {}", meta.summary());
            return EntryOutcome::Planned {
                index,
                payload,
                meta,
            };
        }

        info!("Creating work order: {}", meta.summary());
        match self.backend.create_work_order(&payload).await {
            Ok(id) => {
                info!("Created work order {id} for {label}");
                EntryOutcome::Created { index, id, meta }
            }
            Err(e) => {
                error!("{label}: creating work order failed: {e}");
                EntryOutcome::Failed {
                    index,
                    label,
                    error: e.into(),
                }
            }
        }
    }

    async fn build<R: Rng + ?Sized>(
        &self,
        entry: &Value,
        rng: &mut R,
    ) -> Result<BuiltWorkOrder, BuildError> {
        match self.options.mode {
            BatchMode::Normalize => self.builder.build(entry, self.backend, rng).await,
            BatchMode::UploadLocalFiles => {
                // Invalid entries are rejected before anything is uploaded.
                self.builder.validate_upload_entry(entry)?;
                let paths = local_files(entry);
                let uploaded = if paths.is_empty() {
                    Vec::new()
                } else {
                    upload_local_files(self.backend, &paths, self.options.dry_run).await
                };
                self.builder.build_for_uploads(entry, &uploaded, rng)
            }
        }
    }
}
