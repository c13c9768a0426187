use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::Value;
use std::path::PathBuf;
use tracing::info;
use workorder::config::DEFAULT_MEDIA_MAP;
use workorder::loader::{load_entries, load_media_pool};
use workorder::providers::Backend;
use workorder::{
    BatchMode, BatchOptions, BatchRunner, DirectusBackend, EntryOutcome, MediaPool,
    PayloadBuilder,
};

use crate::ConnectionArgs;

#[derive(Parser, Debug)]
pub struct CreateArgs {
    /// The JSON definition file holding the work order entries
    #[arg(required = true)]
    pub definition: PathBuf,
    /// CSV file with a `file_id` column used for random attachments
    #[arg(long, default_value = DEFAULT_MEDIA_MAP)]
    pub media_map: PathBuf,
    /// Print the payloads instead of creating anything
    #[arg(long)]
    pub dry_run: bool,
    /// Reject entries with an unknown priority instead of substituting one
    #[arg(long)]
    pub strict_priority: bool,
}

#[derive(Parser, Debug)]
pub struct UploadArgs {
    /// The JSON definition file holding the work order entries
    #[arg(required = true)]
    pub definition: PathBuf,
    /// Report what would be uploaded and created without touching the backend
    #[arg(long)]
    pub dry_run: bool,
    /// Reject entries with an unknown priority instead of substituting one
    #[arg(long)]
    pub strict_priority: bool,
}

pub async fn handle_create(connection: &ConnectionArgs, args: &CreateArgs) -> Result<()> {
    let settings = connection.settings(args.strict_priority)?;
    let entries = load_entries(&args.definition)?;
    if entries.is_empty() {
        println!(
            "⚠️ No work orders found in '{}'. Nothing to do.",
            args.definition.display()
        );
        return Ok(());
    }

    let media = load_media_pool(&args.media_map)?;
    println!(
        "📥 Loaded {} entries and {} media ids.",
        entries.len(),
        media.len()
    );

    let backend = DirectusBackend::new(&settings)?;
    if !args.dry_run {
        preflight(&backend).await?;
    }

    let builder = PayloadBuilder::new(settings, media);
    let options = BatchOptions {
        mode: BatchMode::Normalize,
        dry_run: args.dry_run,
    };
    run_batch(&builder, &backend, options, &entries).await;
    Ok(())
}

pub async fn handle_upload(connection: &ConnectionArgs, args: &UploadArgs) -> Result<()> {
    let settings = connection.settings(args.strict_priority)?;
    let entries = load_entries(&args.definition)?;
    if entries.is_empty() {
        println!(
            "⚠️ No work orders found in '{}'. Nothing to do.",
            args.definition.display()
        );
        return Ok(());
    }
    println!("📥 Loaded {} entries.", entries.len());

    let backend = DirectusBackend::new(&settings)?;
    if !args.dry_run {
        preflight(&backend).await?;
    }

    // Attachments come from the uploads, so the media pool stays empty.
    let builder = PayloadBuilder::new(settings, MediaPool::default());
    let options = BatchOptions {
        mode: BatchMode::UploadLocalFiles,
        dry_run: args.dry_run,
    };
    run_batch(&builder, &backend, options, &entries).await;
    Ok(())
}

/// Verifies the URL and token before anything is written.
async fn preflight(backend: &DirectusBackend) -> Result<()> {
    let server = backend
        .server_info()
        .await
        .with_context(|| format!("Could not connect to Directus at {}", backend.base_url()))?;
    info!("Connected to Directus project '{}'", server.project_name);
    println!(
        "🔗 Connected to '{}' at {}",
        server.project_name,
        backend.base_url()
    );
    Ok(())
}

async fn run_batch(
    builder: &PayloadBuilder,
    backend: &DirectusBackend,
    options: BatchOptions,
    entries: &[Value],
) {
    let total = entries.len();
    let mut rng = StdRng::from_entropy();
    let runner = BatchRunner::new(builder, backend, options);

    let report = runner
        .run(entries, &mut rng, |outcome| print_outcome(outcome, total))
        .await;

    if options.dry_run {
        println!(
            "\n🏁 Dry run finished: {} payloads prepared, {} failed (of {}).",
            report.planned(),
            report.failed(),
            report.total()
        );
    } else {
        println!(
            "\n🏁 Finished: {} created, {} failed (of {}).",
            report.created(),
            report.failed(),
            report.total()
        );
    }
}

fn print_outcome(outcome: &EntryOutcome, total: usize) {
    match outcome {
        EntryOutcome::Created { index, id, meta } => {
            println!("✅ [{index}/{total}] Created work order {id}: {}", meta.summary());
        }
        EntryOutcome::Planned {
            index,
            payload,
            meta,
        } => {
            let rendered = serde_json::to_string_pretty(payload)
                .unwrap_or_else(|e| format!("<payload could not be rendered: {e}>"));
            println!("📝 [{index}/{total}] [dry-run] {}", meta.summary());
            println!("{rendered}");
        }
        EntryOutcome::Failed {
            index,
            label,
            error,
        } => {
            eprintln!("❌ [{index}/{total}] {label}: {error}");
        }
    }
}
