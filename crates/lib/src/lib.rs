//! # Work Order Batch Tools
//!
//! This crate turns hand-written work order definition files into records in a
//! Directus backend. It provides the payload builder that normalizes loosely
//! structured entries, loaders for the definition file and media map, a
//! [`providers::Backend`] abstraction with a Directus implementation, the
//! sequential batch runner, and the orphaned-file cleanup planner.

pub mod attachments;
pub mod batch;
pub mod building;
pub mod cleanup;
pub mod coalesce;
pub mod config;
pub mod errors;
pub mod loader;
pub mod media;
pub mod payload;
pub mod priority;
pub mod providers;
pub mod submitter;
pub mod types;

pub use attachments::MediaPool;
pub use batch::{BatchMode, BatchOptions, BatchReport, BatchRunner, EntryOutcome};
pub use building::BuildingDirectory;
pub use config::{PriorityPolicy, Settings, SettingsBuilder};
pub use errors::{BackendError, BuildError, ConfigError, LoadError};
pub use payload::{BuiltWorkOrder, PayloadBuilder};
pub use providers::{Backend, DirectusBackend};
pub use types::{BuildMeta, FileReference, Priority, WorkOrderPayload};
