//! Running the MindSync tool
//!
//! Builds the tool's command line, runs it from the resolved tool directory
//! with a fixed timeout, and normalizes its stdout into a [`Payload`].

use serde_json::Value;
use std::ffi::OsString;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

use crate::config::{MARKER_FILE, Settings, resolve_tool_location};

/// Upper bound on a single tool invocation
pub const TOOL_TIMEOUT: Duration = Duration::from_secs(30);

/// Status value the tool reports on success
pub const STATUS_SUCCESS: &str = "success";

/// A request to the tool's `api` surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCommand {
    /// `api sync --file <path> --format json`
    Sync { file: PathBuf },
    /// `api status --format json`
    Status,
}

impl ToolCommand {
    /// Arguments passed after the entry script
    pub fn args(&self) -> Vec<OsString> {
        match self {
            ToolCommand::Sync { file } => vec![
                "api".into(),
                "sync".into(),
                "--file".into(),
                file.clone().into_os_string(),
                "--format".into(),
                "json".into(),
            ],
            ToolCommand::Status => vec![
                "api".into(),
                "status".into(),
                "--format".into(),
                "json".into(),
            ],
        }
    }
}

/// Output of a successful tool run
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// stdout parsed as JSON
    Structured(Value),
    /// stdout that was not JSON, trimmed; treated as a successful result
    RawText(String),
}

impl Payload {
    /// Parse tool stdout, falling back to raw text
    pub fn parse(stdout: &str) -> Self {
        match serde_json::from_str::<Value>(stdout) {
            Ok(value) => Payload::Structured(value),
            Err(_) => Payload::RawText(stdout.trim().to_string()),
        }
    }

    /// The `status` field; raw text always reads as `"success"`
    pub fn status(&self) -> Option<&str> {
        match self {
            Payload::Structured(value) => value.get("status").and_then(Value::as_str),
            Payload::RawText(_) => Some(STATUS_SUCCESS),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status() == Some(STATUS_SUCCESS)
    }

    /// The `message` field; raw text is its own message
    pub fn message(&self) -> Option<&str> {
        match self {
            Payload::Structured(value) => value.get("message").and_then(Value::as_str),
            Payload::RawText(text) => Some(text),
        }
    }

    /// Look up a field of a structured payload
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Payload::Structured(value) => value.get(key),
            Payload::RawText(_) => None,
        }
    }

    /// JSON view of the payload, with raw text wrapped as `{status, message}`
    pub fn to_value(&self) -> Value {
        match self {
            Payload::Structured(value) => value.clone(),
            Payload::RawText(text) => serde_json::json!({
                "status": STATUS_SUCCESS,
                "message": text,
            }),
        }
    }
}

/// Why an invocation produced no payload
#[derive(Debug, Error)]
pub enum InvokeError {
    #[error("MindSync tool not found: set toolPath or open a workspace containing main.py")]
    ToolNotFound,

    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed while running the tool: {0}")]
    Io(#[source] io::Error),

    #[error("tool exited with {}: {stderr}", exit_label(.code))]
    Failed { code: Option<i32>, stderr: String },

    #[error("tool timed out after {0:?}")]
    Timeout(Duration),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "a signal".to_string(),
    }
}

/// Result of one tool invocation
pub type Outcome = Result<Payload, InvokeError>;

/// Something that can run a [`ToolCommand`]
pub trait Invoke: Send + Sync {
    fn invoke(
        &self,
        settings: &Settings,
        command: &ToolCommand,
    ) -> impl Future<Output = Outcome> + Send;
}

/// Runs the tool as a child process
#[derive(Debug, Clone)]
pub struct ProcessInvoker {
    roots: Vec<PathBuf>,
    timeout: Duration,
}

impl ProcessInvoker {
    /// Create an invoker that auto-detects the tool among `roots`
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self {
            roots,
            timeout: TOOL_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Open workspace roots scanned for the marker file
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    async fn run(&self, settings: &Settings, tool_dir: &Path, command: &ToolCommand) -> Outcome {
        let mut cmd = Command::new(&settings.interpreter);
        cmd.arg(MARKER_FILE)
            .args(command.args())
            .current_dir(tool_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(|source| InvokeError::Spawn {
            program: settings.interpreter.clone(),
            source,
        })?;

        // Dropping the wait future on timeout kills the child.
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(InvokeError::Io)?,
            Err(_) => return Err(InvokeError::Timeout(self.timeout)),
        };

        if !output.status.success() {
            return Err(InvokeError::Failed {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(Payload::parse(&String::from_utf8_lossy(&output.stdout)))
    }
}

impl Invoke for ProcessInvoker {
    async fn invoke(&self, settings: &Settings, command: &ToolCommand) -> Outcome {
        let Some(tool_dir) = resolve_tool_location(settings, &self.roots) else {
            tracing::debug!(roots = ?self.roots, "MindSync tool not found");
            return Err(InvokeError::ToolNotFound);
        };

        tracing::debug!(
            tool_dir = %tool_dir.display(),
            args = ?command.args(),
            "Running MindSync tool"
        );
        self.run(settings, &tool_dir, command).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sync_args() {
        let command = ToolCommand::Sync {
            file: PathBuf::from("/notes/my file.md"),
        };
        let args: Vec<String> = command
            .args()
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            ["api", "sync", "--file", "/notes/my file.md", "--format", "json"]
        );
    }

    #[test]
    fn test_status_args() {
        let args: Vec<String> = ToolCommand::Status
            .args()
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(args, ["api", "status", "--format", "json"]);
    }

    #[test]
    fn test_parse_structured_success() {
        let payload = Payload::parse("{\"status\":\"success\"}\n");
        assert_eq!(payload, Payload::Structured(json!({"status": "success"})));
        assert!(payload.is_success());
        assert_eq!(payload.message(), None);
    }

    #[test]
    fn test_parse_raw_text_is_success() {
        let payload = Payload::parse("  hello world\n");
        assert_eq!(payload, Payload::RawText("hello world".to_string()));
        assert!(payload.is_success());
        assert_eq!(payload.message(), Some("hello world"));
        assert_eq!(
            payload.to_value(),
            json!({"status": "success", "message": "hello world"})
        );
    }

    #[test]
    fn test_structured_error_payload() {
        let payload = Payload::parse(r#"{"status":"error","message":"file missing"}"#);
        assert!(!payload.is_success());
        assert_eq!(payload.status(), Some("error"));
        assert_eq!(payload.message(), Some("file missing"));
    }

    #[test]
    fn test_non_object_json_has_no_status() {
        let payload = Payload::parse("42");
        assert_eq!(payload, Payload::Structured(json!(42)));
        assert_eq!(payload.status(), None);
        assert!(!payload.is_success());
    }

    #[tokio::test]
    async fn test_tool_not_found_spawns_nothing() {
        let empty = tempfile::TempDir::new().unwrap();
        // An interpreter that cannot exist: reaching spawn would yield a Spawn error.
        let settings = Settings {
            interpreter: "mindsync-no-such-interpreter".to_string(),
            ..Settings::default()
        };
        let invoker = ProcessInvoker::new(vec![empty.path().to_path_buf()]);

        let outcome = invoker.invoke(&settings, &ToolCommand::Status).await;
        assert!(matches!(outcome, Err(InvokeError::ToolNotFound)));
        assert!(
            outcome
                .unwrap_err()
                .to_string()
                .contains("tool not found")
        );
    }

    #[test]
    fn test_failed_error_message() {
        let err = InvokeError::Failed {
            code: Some(1),
            stderr: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "tool exited with exit code 1: boom");
        assert_eq!(
            InvokeError::Timeout(TOOL_TIMEOUT).to_string(),
            "tool timed out after 30s"
        );
    }

    #[cfg(unix)]
    mod process {
        use super::*;
        use std::fs;
        use tempfile::TempDir;

        /// A tool directory whose `main.py` is a shell script run by `sh`
        fn fake_tool(script: &str) -> (TempDir, Settings) {
            let dir = TempDir::new().unwrap();
            fs::write(dir.path().join(MARKER_FILE), script).unwrap();
            let settings = Settings {
                tool_path: Some(dir.path().to_path_buf()),
                interpreter: "sh".to_string(),
                ..Settings::default()
            };
            (dir, settings)
        }

        #[tokio::test]
        async fn test_json_stdout_is_structured() {
            let (_dir, settings) = fake_tool("echo '{\"status\":\"success\"}'\n");
            let outcome = ProcessInvoker::new(Vec::new())
                .invoke(&settings, &ToolCommand::Status)
                .await
                .unwrap();
            assert_eq!(outcome, Payload::Structured(json!({"status": "success"})));
        }

        #[tokio::test]
        async fn test_plain_stdout_is_raw_text() {
            let (_dir, settings) = fake_tool("echo hello world\n");
            let outcome = ProcessInvoker::new(Vec::new())
                .invoke(&settings, &ToolCommand::Status)
                .await
                .unwrap();
            assert_eq!(
                outcome.to_value(),
                json!({"status": "success", "message": "hello world"})
            );
        }

        #[tokio::test]
        async fn test_nonzero_exit_fails_regardless_of_stdout() {
            let (_dir, settings) =
                fake_tool("echo '{\"status\":\"success\"}'\necho oops >&2\nexit 1\n");
            let outcome = ProcessInvoker::new(Vec::new())
                .invoke(&settings, &ToolCommand::Status)
                .await;
            match outcome {
                Err(InvokeError::Failed { code, stderr }) => {
                    assert_eq!(code, Some(1));
                    assert_eq!(stderr, "oops");
                }
                other => panic!("expected failure, got {other:?}"),
            }
        }

        #[tokio::test]
        async fn test_arguments_and_working_directory() {
            let (dir, settings) = fake_tool("echo \"$(pwd)|$*\"\n");
            let file = PathBuf::from("/tmp/with space.md");
            let outcome = ProcessInvoker::new(Vec::new())
                .invoke(&settings, &ToolCommand::Sync { file })
                .await
                .unwrap();

            let text = outcome.message().unwrap().to_string();
            let (cwd, args) = text.split_once('|').unwrap();
            assert_eq!(
                fs::canonicalize(cwd).unwrap(),
                fs::canonicalize(dir.path()).unwrap()
            );
            assert_eq!(args, "api sync --file /tmp/with space.md --format json");
        }

        #[tokio::test]
        async fn test_tool_detected_from_workspace_root() {
            let (dir, mut settings) = fake_tool("echo detected\n");
            settings.tool_path = None;
            let outcome = ProcessInvoker::new(vec![dir.path().to_path_buf()])
                .invoke(&settings, &ToolCommand::Status)
                .await
                .unwrap();
            assert_eq!(outcome, Payload::RawText("detected".to_string()));
        }

        #[tokio::test]
        async fn test_timeout_is_a_failure() {
            let (_dir, settings) = fake_tool("sleep 5\n");
            let timeout = Duration::from_millis(200);
            let outcome = ProcessInvoker::new(Vec::new())
                .with_timeout(timeout)
                .invoke(&settings, &ToolCommand::Status)
                .await;
            assert!(matches!(outcome, Err(InvokeError::Timeout(t)) if t == timeout));
        }

        #[tokio::test]
        async fn test_missing_interpreter_is_spawn_error() {
            let (_dir, mut settings) = fake_tool("echo unreachable\n");
            settings.interpreter = "mindsync-no-such-interpreter".to_string();
            let outcome = ProcessInvoker::new(Vec::new())
                .invoke(&settings, &ToolCommand::Status)
                .await;
            assert!(matches!(outcome, Err(InvokeError::Spawn { .. })));
        }
    }
}
