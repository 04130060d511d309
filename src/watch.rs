//! Filesystem-backed save events
//!
//! Stands in for an editor's save notifications: writes to files under the
//! watched roots become [`EditorEvent::Saved`] events.

use anyhow::{Context, Result};
use notify::event::{CreateKind, ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::PathBuf;
use tokio::sync::mpsc;

use crate::bindings::{Bindings, Document, EditorEvent};
use crate::config::ConfigProvider;
use crate::invoker::Invoke;
use crate::notification::NotificationSink;

/// Documents that a filesystem event counts as saving
pub fn saved_documents(event: &Event) -> Vec<Document> {
    let is_save = matches!(
        event.kind,
        EventKind::Create(CreateKind::File | CreateKind::Any)
            | EventKind::Modify(
                ModifyKind::Data(_) | ModifyKind::Any | ModifyKind::Name(RenameMode::To)
            )
    );
    if !is_save {
        return Vec::new();
    }

    event
        .paths
        .iter()
        .filter(|path| !path.is_dir())
        .map(Document::from_path)
        .collect()
}

/// Watch `roots` and feed saves into `bindings` until Ctrl-C
pub async fn run<C, I, N>(mut bindings: Bindings<C, I, N>, roots: &[PathBuf]) -> Result<()>
where
    C: ConfigProvider + 'static,
    I: Invoke + 'static,
    N: NotificationSink + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut watcher: RecommendedWatcher =
        notify::recommended_watcher(move |res: notify::Result<Event>| {
            // The receiver only goes away on shutdown.
            let _ = tx.send(res);
        })
        .context("Failed to create file watcher")?;

    for root in roots {
        watcher
            .watch(root, RecursiveMode::Recursive)
            .with_context(|| format!("Failed to watch directory: {}", root.display()))?;
        tracing::info!(root = %root.display(), "Watching for Markdown saves");
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Stopping watch");
                bindings.deactivate();
                return Ok(());
            }
            received = rx.recv() => match received {
                Some(Ok(event)) => {
                    for document in saved_documents(&event) {
                        bindings.handle(EditorEvent::Saved(document)).await;
                    }
                }
                Some(Err(e)) => tracing::warn!(error = %e, "Watch error"),
                None => anyhow::bail!("File watcher disconnected"),
            },
        }
    }
}
