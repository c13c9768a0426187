//! # workorder: batch tools for Directus work orders
//!
//! This is the entry point for the `workorder` command-line interface. It
//! creates work orders from a definition file, optionally uploading each
//! entry's local media first, and cleans up files nothing references.

mod cleanup;
mod create;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::process::ExitCode;
use tracing_subscriber::{fmt, EnvFilter};
use workorder::config::DEFAULT_DIRECTUS_URL;
use workorder::{PriorityPolicy, Settings};

use crate::cleanup::CleanupArgs;
use crate::create::{CreateArgs, UploadArgs};

// --- CLI Definition ---

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create work orders from a definition file, attaching media from the media map
    Create(CreateArgs),
    /// Upload each entry's local files, then create work orders referencing them
    Upload(UploadArgs),
    /// Delete backend files that are not listed as in use
    Cleanup(CleanupArgs),
}

/// Where the Directus instance lives and the defaults applied to payloads.
#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// Base URL of the Directus instance
    #[arg(long, global = true, env = "DIRECTUS_URL", default_value = DEFAULT_DIRECTUS_URL)]
    pub directus_url: String,
    /// Static access token used for every request
    #[arg(long, global = true, env = "DIRECTUS_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
    /// Community id applied when an entry does not name one
    #[arg(long, global = true, env = "COMMUNITY_ID")]
    pub community_id: Option<String>,
    /// Submitter id used by `upload` when an entry does not name one
    #[arg(long, global = true, env = "SUBMITTER_ID")]
    pub submitter_id: Option<String>,
}

impl ConnectionArgs {
    /// Turns the connection arguments into validated [`Settings`].
    pub fn settings(&self, strict_priority: bool) -> Result<Settings> {
        let mut builder = Settings::builder().directus_url(&self.directus_url);
        if let Some(token) = &self.token {
            builder = builder.token(token);
        }
        if let Some(community_id) = &self.community_id {
            builder = builder.community_id(community_id);
        }
        if let Some(submitter_id) = &self.submitter_id {
            builder = builder.default_submitter_id(submitter_id);
        }
        if strict_priority {
            builder = builder.priority_policy(PriorityPolicy::Strict);
        }
        Ok(builder.build()?)
    }
}

// --- Main Application Entry ---

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    // Logs go to stderr so that stdout only carries results and dry-run payloads.
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let (name, result) = match &cli.command {
        Commands::Create(args) => ("Create", create::handle_create(&cli.connection, args).await),
        Commands::Upload(args) => ("Upload", create::handle_upload(&cli.connection, args).await),
        Commands::Cleanup(args) => (
            "Cleanup",
            cleanup::handle_cleanup(&cli.connection, args).await,
        ),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ {name} failed: {e:#}");
            ExitCode::FAILURE
        }
    }
}
