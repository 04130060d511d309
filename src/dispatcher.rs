//! Sync dispatcher
//!
//! Turns editor commands into tool invocations and reports the results
//! through the notification sink. Every operation takes a fresh settings
//! snapshot from the injected [`ConfigProvider`].

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::bindings::Document;
use crate::config::{ConfigProvider, Settings};
use crate::invoker::{Invoke, Payload, ToolCommand};
use crate::notification::{Notification, NotificationSink};

pub const MSG_AUTO_SYNC_DISABLED: &str = "Auto-sync is disabled";
pub const MSG_SYNCED: &str = "✅ Synced to Notes";
pub const MSG_OPEN_MARKDOWN: &str = "Open a Markdown file to sync";
pub const MSG_SAVE_FIRST: &str = "Save the file before syncing";
pub const MSG_SYNC_ALL_PENDING: &str = "Sync all is under development";

/// Coordinates configuration, tool invocation and notifications
#[derive(Debug)]
pub struct Dispatcher<C, I, N> {
    config: C,
    invoker: I,
    sink: N,
}

impl<C, I, N> Dispatcher<C, I, N>
where
    C: ConfigProvider,
    I: Invoke,
    N: NotificationSink,
{
    pub fn new(config: C, invoker: I, sink: N) -> Self {
        Self {
            config,
            invoker,
            sink,
        }
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    pub fn invoker(&self) -> &I {
        &self.invoker
    }

    pub fn sink(&self) -> &N {
        &self.sink
    }

    /// Fresh settings snapshot
    pub fn settings(&self) -> Result<Settings> {
        self.config.snapshot()
    }

    /// Sync one file into the notes app.
    ///
    /// `show_notification` separates user-initiated syncs from background
    /// ones: background syncs only log failures. A user-initiated sync is
    /// refused while auto-sync is disabled, a background one is not.
    pub async fn sync_file(&self, file: &Path, show_notification: bool) {
        let settings = match self.config.snapshot() {
            Ok(settings) => settings,
            Err(e) => {
                let message = format!("{e:#}");
                tracing::error!(file = %file.display(), error = %message, "Failed to read settings");
                if show_notification {
                    self.sink
                        .notify(Notification::error(format!("Sync failed: {message}")));
                }
                return;
            }
        };

        if !settings.auto_sync && show_notification {
            self.sink.notify(Notification::info(MSG_AUTO_SYNC_DISABLED));
            return;
        }

        let file = absolute(file);
        let notify = show_notification && settings.show_notifications;
        let command = ToolCommand::Sync { file: file.clone() };

        match self.invoker.invoke(&settings, &command).await {
            Err(e) => {
                tracing::error!(file = %file.display(), error = %e, "Sync failed");
                if notify {
                    self.sink
                        .notify(Notification::error(format!("Sync failed: {e}")));
                }
            }
            Ok(payload) if payload.is_success() => {
                tracing::info!(file = %file.display(), "Synced to notes");
                if notify {
                    self.sink.notify(Notification::info(MSG_SYNCED));
                }
            }
            Ok(payload) => {
                let message = payload_message(&payload);
                tracing::warn!(file = %file.display(), %message, "Tool reported a failed sync");
                if notify {
                    self.sink
                        .notify(Notification::error(format!("Sync failed: {message}")));
                }
            }
        }
    }

    /// Ask the tool for its health and report it
    pub async fn check_status(&self) {
        let settings = match self.config.snapshot() {
            Ok(settings) => settings,
            Err(e) => {
                self.sink
                    .notify(Notification::error(format!("Status check failed: {e:#}")));
                return;
            }
        };

        match self.invoker.invoke(&settings, &ToolCommand::Status).await {
            Err(e) => {
                tracing::error!(error = %e, "Status check failed");
                self.sink
                    .notify(Notification::error(format!("Status check failed: {e}")));
            }
            Ok(payload) if payload.is_success() => {
                self.sink.notify(Notification::info(status_report(&payload)));
            }
            Ok(payload) => {
                self.sink.notify(Notification::error(format!(
                    "Status check failed: {}",
                    payload_message(&payload)
                )));
            }
        }
    }

    /// Flip `autoSync`, persist it, and return the new value
    pub fn toggle_auto_sync(&self) -> Result<bool> {
        let enabled = !self.config.snapshot()?.auto_sync;
        self.config.update_auto_sync(enabled)?;

        tracing::info!(enabled, "Auto-sync toggled");
        self.sink.notify(Notification::info(if enabled {
            "Auto-sync enabled"
        } else {
            "Auto-sync disabled"
        }));
        Ok(enabled)
    }

    /// Manual sync of the active document, bypassing the debounce
    pub async fn sync_current(&self, document: Option<&Document>) {
        let Some(document) = document.filter(|doc| doc.is_markdown()) else {
            self.sink.notify(Notification::info(MSG_OPEN_MARKDOWN));
            return;
        };

        if document.is_dirty {
            self.sink.notify(Notification::warning(MSG_SAVE_FIRST));
            return;
        }

        self.sync_file(&document.path, true).await;
    }

    /// Batch sync is not implemented yet
    pub fn sync_all(&self) {
        self.sink.notify(Notification::info(MSG_SYNC_ALL_PENDING));
    }
}

fn absolute(file: &Path) -> PathBuf {
    std::path::absolute(file).unwrap_or_else(|_| file.to_path_buf())
}

fn payload_message(payload: &Payload) -> &str {
    payload.message().unwrap_or("unknown error")
}

fn flag(payload: &Payload, key: &str, yes: &str, no: &str) -> String {
    match payload.get(key).and_then(|v| v.as_bool()) {
        Some(true) => yes.to_string(),
        Some(false) => no.to_string(),
        None => "unknown".to_string(),
    }
}

/// Human-readable summary of an `api status` payload
pub fn status_report(payload: &Payload) -> String {
    let version = payload
        .get("version")
        .and_then(|v| v.as_str())
        .unwrap_or("unknown");

    let mut report = format!(
        "MindSync is healthy\nVersion: {}\nConfig: {}\nNotes: {}",
        version,
        flag(payload, "config_valid", "valid", "invalid"),
        flag(payload, "notes_accessible", "accessible", "not accessible"),
    );

    if let Some(issues) = payload.get("config_issues").and_then(|v| v.as_array()) {
        for issue in issues.iter().filter_map(|i| i.as_str()) {
            report.push_str("\n  - ");
            report.push_str(issue);
        }
    }

    report
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
