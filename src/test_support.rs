//! Fakes shared by unit tests

use serde_json::Value;
use std::sync::Mutex;

use crate::config::Settings;
use crate::invoker::{Invoke, InvokeError, Outcome, Payload, ToolCommand};
use crate::notification::{Level, Notification, NotificationSink};

/// Records every notification it receives
#[derive(Debug, Default)]
pub struct RecordingSink {
    seen: Mutex<Vec<Notification>>,
}

impl RecordingSink {
    pub fn notifications(&self) -> Vec<Notification> {
        self.seen.lock().unwrap().clone()
    }

    pub fn levels(&self) -> Vec<Level> {
        self.notifications().iter().map(|n| n.level).collect()
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, notification: Notification) {
        self.seen.lock().unwrap().push(notification);
    }
}

type Responder = Box<dyn Fn(&ToolCommand) -> Outcome + Send + Sync>;

/// Invoker that answers from a closure and counts calls
pub struct FakeInvoker {
    calls: Mutex<Vec<ToolCommand>>,
    respond: Responder,
}

impl FakeInvoker {
    pub fn new(respond: impl Fn(&ToolCommand) -> Outcome + Send + Sync + 'static) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            respond: Box::new(respond),
        }
    }

    /// Always answers with this JSON payload
    pub fn json(value: Value) -> Self {
        Self::new(move |_| Ok(Payload::Structured(value.clone())))
    }

    pub fn success() -> Self {
        Self::json(serde_json::json!({"status": "success"}))
    }

    pub fn not_found() -> Self {
        Self::new(|_| Err(InvokeError::ToolNotFound))
    }

    pub fn calls(&self) -> Vec<ToolCommand> {
        self.calls.lock().unwrap().clone()
    }
}

impl Invoke for FakeInvoker {
    async fn invoke(&self, _settings: &Settings, command: &ToolCommand) -> Outcome {
        self.calls.lock().unwrap().push(command.clone());
        (self.respond)(command)
    }
}
