use anyhow::{Context, Result};
use clap::Parser;
use std::io;
use std::path::PathBuf;
use tracing::info;
use workorder::cleanup::{confirm_deletion, delete_files, plan_cleanup};
use workorder::config::DEFAULT_USED_IDS_FILE;
use workorder::loader::load_used_ids;
use workorder::providers::Backend;
use workorder::DirectusBackend;

use crate::ConnectionArgs;

#[derive(Parser, Debug)]
pub struct CleanupArgs {
    /// Text file listing the file ids that are still in use, one per line
    #[arg(long, default_value = DEFAULT_USED_IDS_FILE)]
    pub used_ids: PathBuf,
}

pub async fn handle_cleanup(connection: &ConnectionArgs, args: &CleanupArgs) -> Result<()> {
    let settings = connection.settings(false)?;
    let backend = DirectusBackend::new(&settings)?;

    println!("🔎 Fetching all file ids from {}...", backend.base_url());
    let all_ids = backend
        .list_file_ids()
        .await
        .context("Could not list files")?;
    let used_ids = load_used_ids(&args.used_ids)?;
    info!(
        "{} files in Directus, {} listed as in use",
        all_ids.len(),
        used_ids.len()
    );

    let plan = plan_cleanup(&all_ids, &used_ids);
    if plan.is_empty() {
        println!("✅ No unused files found. Nothing to delete.");
        return Ok(());
    }

    println!("🗑️ Files that will be deleted:");
    for id in &plan {
        println!("  - {id}");
    }
    println!("Total: {} files", plan.len());

    let confirmed = confirm_deletion(&mut io::stdin().lock(), &mut io::stdout())?;
    if !confirmed {
        println!("Deletion cancelled.");
        return Ok(());
    }

    let report = delete_files(&backend, &plan).await;
    println!(
        "\n🏁 Deleted {} files, {} failed.",
        report.deleted.len(),
        report.failed.len()
    );
    for (id, error) in &report.failed {
        eprintln!("❌ {id}: {error}");
    }
    Ok(())
}
