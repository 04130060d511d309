//! Editor event and command bindings
//!
//! Save events go through the debouncer into a background sync; commands
//! are forwarded to the dispatcher right away.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{ConfigProvider, DEFAULT_SYNC_DELAY_MS};
use crate::debounce::Debouncer;
use crate::dispatcher::Dispatcher;
use crate::invoker::Invoke;
use crate::notification::{Notification, NotificationSink};

/// Language id of documents that get synced
pub const MARKDOWN: &str = "markdown";

/// An open editor document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub path: PathBuf,
    pub language_id: String,
    /// Has unsaved changes
    pub is_dirty: bool,
}

impl Document {
    /// A saved document whose language is guessed from the file extension
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let language_id = language_for(&path).to_string();
        Self {
            path,
            language_id,
            is_dirty: false,
        }
    }

    pub fn is_markdown(&self) -> bool {
        self.language_id == MARKDOWN
    }
}

fn language_for(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("md") || ext.eq_ignore_ascii_case("markdown") => {
            MARKDOWN
        }
        _ => "plaintext",
    }
}

/// Commands the host exposes to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorCommand {
    SyncCurrent(Option<Document>),
    ToggleAutoSync,
    CheckStatus,
    SyncAll,
}

/// Everything the host can feed into the bindings
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEvent {
    Saved(Document),
    Command(EditorCommand),
}

/// Routes editor events to the dispatcher
pub struct Bindings<C, I, N> {
    dispatcher: Arc<Dispatcher<C, I, N>>,
    debouncer: Debouncer<PathBuf>,
}

impl<C, I, N> Bindings<C, I, N>
where
    C: ConfigProvider + 'static,
    I: Invoke + 'static,
    N: NotificationSink + 'static,
{
    /// Wire up the bindings.
    ///
    /// The debounce delay is read from `syncDelay` once, here. Shows the
    /// activation notice when notifications are enabled.
    pub fn activate(dispatcher: Arc<Dispatcher<C, I, N>>) -> Self {
        let settings = dispatcher.settings().unwrap_or_else(|e| {
            tracing::warn!(error = ?e, "Failed to read settings, using defaults");
            Default::default()
        });
        let delay = match settings.sync_delay {
            0 => std::time::Duration::from_millis(DEFAULT_SYNC_DELAY_MS),
            _ => settings.sync_delay(),
        };

        let target = Arc::clone(&dispatcher);
        let debouncer = Debouncer::new(delay, move |path: PathBuf| {
            let dispatcher = Arc::clone(&target);
            // The sync runs as its own task so a later rearm never cancels it.
            tokio::spawn(async move {
                dispatcher.sync_file(&path, false).await;
            });
        });

        tracing::info!(delay_ms = delay.as_millis() as u64, "MindSync bridge activated");
        if settings.show_notifications {
            dispatcher
                .sink()
                .notify(Notification::info("🧠 MindSync bridge is active"));
        }

        Self {
            dispatcher,
            debouncer,
        }
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher<C, I, N>> {
        &self.dispatcher
    }

    pub fn debouncer(&self) -> &Debouncer<PathBuf> {
        &self.debouncer
    }

    /// Drop any pending save-triggered sync. Syncs already running finish.
    pub fn deactivate(&mut self) {
        if self.debouncer.cancel() {
            tracing::debug!("Discarded pending sync");
        }
        tracing::info!("MindSync bridge deactivated");
    }

    /// Handle a document save. Returns whether a sync was scheduled.
    pub fn on_saved(&mut self, document: &Document) -> bool {
        if !document.is_markdown() {
            return false;
        }

        match self.dispatcher.settings() {
            Ok(settings) if settings.auto_sync => {
                tracing::debug!(path = %document.path.display(), "Scheduling sync");
                self.debouncer.arm(document.path.clone());
                true
            }
            Ok(_) => false,
            Err(e) => {
                tracing::error!(error = ?e, "Failed to read settings");
                false
            }
        }
    }

    /// Run a user command to completion
    pub async fn run_command(&self, command: EditorCommand) {
        match command {
            EditorCommand::SyncCurrent(document) => {
                self.dispatcher.sync_current(document.as_ref()).await;
            }
            EditorCommand::ToggleAutoSync => {
                if let Err(e) = self.dispatcher.toggle_auto_sync() {
                    let message = format!("{e:#}");
                    tracing::error!(error = %message, "Failed to toggle auto-sync");
                    self.dispatcher
                        .sink()
                        .notify(Notification::error(format!("Failed to toggle auto-sync: {message}")));
                }
            }
            EditorCommand::CheckStatus => self.dispatcher.check_status().await,
            EditorCommand::SyncAll => self.dispatcher.sync_all(),
        }
    }

    /// Handle any editor event
    pub async fn handle(&mut self, event: EditorEvent) {
        match event {
            EditorEvent::Saved(document) => {
                self.on_saved(&document);
            }
            EditorEvent::Command(command) => self.run_command(command).await,
        }
    }
}
