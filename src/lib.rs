//! mindsync-bridge - Markdown to Notes sync from the editor
//!
//! Listens for Markdown saves, debounces them, and runs the MindSync
//! command-line tool to push the saved file into the notes app. Results are
//! reported through a notification sink supplied by the host.

pub mod bindings;
pub mod config;
pub mod debounce;
pub mod dispatcher;
pub mod invoker;
pub mod notification;
pub mod watch;

#[cfg(test)]
mod test_support;

pub use bindings::{Bindings, Document, EditorCommand, EditorEvent};
pub use config::{ConfigProvider, InMemoryConfig, Settings, SettingsStore};
pub use debounce::Debouncer;
pub use dispatcher::Dispatcher;
pub use invoker::{Invoke, InvokeError, Outcome, Payload, ProcessInvoker, ToolCommand};
pub use notification::{ConsoleSink, Level, Notification, NotificationSink};
