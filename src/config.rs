//! Configuration handling for mindsync-bridge
//!
//! Settings are stored in a small TOML file and read fresh for every
//! operation. The tool location is resolved from those settings plus the
//! currently open workspace roots.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

/// Default settings file name
pub const SETTINGS_FILE_NAME: &str = "settings.toml";

/// Directory holding the settings file inside a project
pub const SETTINGS_DIR: &str = ".mindsync";

/// Alternative settings file at the project root
pub const ROOT_SETTINGS_FILE_NAME: &str = "mindsync.toml";

/// Entry script whose presence marks a directory as the MindSync tool root
pub const MARKER_FILE: &str = "main.py";

/// Program used to run the entry script when none is configured
pub const DEFAULT_INTERPRETER: &str = "python3";

/// Default debounce delay for save-triggered syncs, in milliseconds
pub const DEFAULT_SYNC_DELAY_MS: u64 = 1000;

/// Snapshot of the user-facing settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Settings {
    /// Explicit tool directory; auto-detected from the workspace when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_path: Option<PathBuf>,

    /// Sync Markdown files automatically when they are saved
    #[serde(default = "default_true")]
    pub auto_sync: bool,

    /// Show notifications for sync results
    #[serde(default = "default_true")]
    pub show_notifications: bool,

    /// Quiet period before a save triggers a sync (milliseconds)
    #[serde(default = "default_sync_delay")]
    pub sync_delay: u64,

    /// Program used to run the tool's entry script
    #[serde(default = "default_interpreter")]
    pub interpreter: String,
}

fn default_true() -> bool {
    true
}

fn default_sync_delay() -> u64 {
    DEFAULT_SYNC_DELAY_MS
}

fn default_interpreter() -> String {
    DEFAULT_INTERPRETER.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tool_path: None,
            auto_sync: true,
            show_notifications: true,
            sync_delay: DEFAULT_SYNC_DELAY_MS,
            interpreter: default_interpreter(),
        }
    }
}

impl Settings {
    /// Debounce delay as a `Duration`
    pub fn sync_delay(&self) -> Duration {
        Duration::from_millis(self.sync_delay)
    }
}

/// Source of settings snapshots, injected into the dispatcher at startup
pub trait ConfigProvider: Send + Sync {
    /// Read the current settings
    fn snapshot(&self) -> Result<Settings>;

    /// Persist a new value for `autoSync`
    fn update_auto_sync(&self, enabled: bool) -> Result<()>;
}

/// Settings persisted to a TOML file
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// Use the settings file at `path` (it does not need to exist yet)
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Find the settings file by searching up from `start_dir`.
    ///
    /// Falls back to `<start_dir>/.mindsync/settings.toml` when nothing is
    /// found, so a later write creates it there.
    pub fn discover(start_dir: &Path) -> Self {
        match find_settings(start_dir) {
            Some(path) => Self::new(path),
            None => Self::new(start_dir.join(SETTINGS_DIR).join(SETTINGS_FILE_NAME)),
        }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load settings; a missing file yields defaults
    pub fn load(&self) -> Result<Settings> {
        if !self.path.exists() {
            return Ok(Settings::default());
        }

        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read settings file: {}", self.path.display()))?;

        let settings: Settings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse settings file: {}", self.path.display()))?;

        Ok(settings)
    }

    /// Write the whole settings document
    pub fn save(&self, settings: &Settings) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let content = toml::to_string_pretty(settings).context("Failed to serialize settings")?;
        fs::write(&self.path, content)
            .with_context(|| format!("Failed to write settings file: {}", self.path.display()))?;

        Ok(())
    }
}

impl ConfigProvider for SettingsStore {
    fn snapshot(&self) -> Result<Settings> {
        self.load()
    }

    fn update_auto_sync(&self, enabled: bool) -> Result<()> {
        let mut settings = self.load()?;
        settings.auto_sync = enabled;
        self.save(&settings)
    }
}

/// Settings held in memory, for embedding hosts that own their own storage
#[derive(Debug, Default)]
pub struct InMemoryConfig {
    settings: Mutex<Settings>,
}

impl InMemoryConfig {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: Mutex::new(settings),
        }
    }
}

impl ConfigProvider for InMemoryConfig {
    fn snapshot(&self) -> Result<Settings> {
        let settings = self
            .settings
            .lock()
            .map_err(|_| anyhow::anyhow!("settings lock poisoned"))?;
        Ok(settings.clone())
    }

    fn update_auto_sync(&self, enabled: bool) -> Result<()> {
        let mut settings = self
            .settings
            .lock()
            .map_err(|_| anyhow::anyhow!("settings lock poisoned"))?;
        settings.auto_sync = enabled;
        Ok(())
    }
}

/// Search up from `start_dir` for a settings file
pub fn find_settings(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();

    loop {
        // Check for .mindsync/settings.toml
        let nested = current.join(SETTINGS_DIR).join(SETTINGS_FILE_NAME);
        if nested.exists() {
            return Some(nested);
        }

        // Check for mindsync.toml in root
        let root_file = current.join(ROOT_SETTINGS_FILE_NAME);
        if root_file.exists() {
            return Some(root_file);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Resolve the directory the tool should run from.
///
/// A configured `toolPath` wins when it exists; otherwise the first root
/// containing [`MARKER_FILE`] is used. `None` means the tool was not found.
pub fn resolve_tool_location(settings: &Settings, roots: &[PathBuf]) -> Option<PathBuf> {
    if let Some(configured) = settings.tool_path.as_ref()
        && configured.exists()
    {
        return Some(configured.clone());
    }

    roots
        .iter()
        .find(|root| root.join(MARKER_FILE).exists())
        .cloned()
}
