//! mindsync-bridge CLI
//!
//! Command-line host for the Markdown to Notes bridge: one-shot editor
//! commands plus a `watch` mode that syncs Markdown files as they are saved.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Level;

use mindsync_bridge::{
    Bindings, ConsoleSink, Dispatcher, Document, ProcessInvoker, SettingsStore, watch,
};

mod commands;

#[derive(Parser)]
#[command(name = "mindsync-bridge")]
#[command(
    author,
    version,
    about = "Sync Markdown files into the notes app through MindSync"
)]
#[command(propagate_version = true)]
struct Cli {
    /// Settings file (default: search up for .mindsync/settings.toml or mindsync.toml)
    #[arg(long, global = true, env = "MINDSYNC_SETTINGS")]
    settings: Option<PathBuf>,

    /// Workspace root scanned for the MindSync tool (repeatable, default: current directory)
    #[arg(short, long = "root", global = true)]
    roots: Vec<PathBuf>,

    /// Show debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sync one Markdown file now
    Sync {
        /// File to sync
        file: PathBuf,
    },

    /// Turn automatic sync on save on or off
    ToggleAutoSync,

    /// Check that the MindSync tool and the notes app are reachable
    Status,

    /// Sync every Markdown file in the workspace
    SyncAll,

    /// Watch the workspace roots and sync Markdown files when they are saved
    Watch,

    /// Diagnose settings and tool discovery
    Doctor,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .init();

    let cwd = env::current_dir().context("Failed to determine current directory")?;
    let store = match cli.settings {
        Some(path) => SettingsStore::new(path),
        None => SettingsStore::discover(&cwd),
    };
    let roots = if cli.roots.is_empty() {
        vec![cwd]
    } else {
        cli.roots
    };
    tracing::debug!(settings = %store.path().display(), ?roots, "Starting");

    match cli.command {
        Commands::Sync { file } => {
            let document = Document::from_path(file);
            dispatcher(store, &roots).sync_current(Some(&document)).await;
        }
        Commands::ToggleAutoSync => {
            dispatcher(store, &roots).toggle_auto_sync()?;
        }
        Commands::Status => dispatcher(store, &roots).check_status().await,
        Commands::SyncAll => dispatcher(store, &roots).sync_all(),
        Commands::Watch => {
            let bindings = Bindings::activate(Arc::new(dispatcher(store, &roots)));
            println!("Press Ctrl+C to stop.");
            watch::run(bindings, &roots).await?;
        }
        Commands::Doctor => commands::doctor::run_doctor(&store, &roots)?,
    }

    Ok(())
}

type CliDispatcher = Dispatcher<SettingsStore, ProcessInvoker, ConsoleSink>;

fn dispatcher(store: SettingsStore, roots: &[PathBuf]) -> CliDispatcher {
    Dispatcher::new(store, ProcessInvoker::new(roots.to_vec()), ConsoleSink)
}
