//! Notification sink
//!
//! Outcomes of user-facing operations are reported as notifications. The
//! host decides how to show them; the CLI prints them to the terminal.

use colored::Colorize;
use std::fmt;

/// Severity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warning,
    Error,
}

/// A message for the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: Level,
    pub message: String,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: Level::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: Level::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: Level::Error,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Where notifications are delivered
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Prints notifications to the terminal
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

impl NotificationSink for ConsoleSink {
    fn notify(&self, notification: Notification) {
        match notification.level {
            Level::Info => println!("{} {}", "ℹ".cyan(), notification.message),
            Level::Warning => println!("{} {}", "⚠".yellow(), notification.message.yellow()),
            Level::Error => eprintln!("{} {}", "✗".red(), notification.message.red()),
        }
    }
}
