use anyhow::Result;
use colored::Colorize;
use std::path::{Path, PathBuf};

use mindsync_bridge::config::{MARKER_FILE, Settings, SettingsStore, resolve_tool_location};

/// How the tool location was (or was not) found
#[derive(Debug, PartialEq, Eq)]
pub enum ToolCheck {
    /// `toolPath` is set and exists
    Configured(PathBuf),
    /// `toolPath` is set but does not exist
    ConfiguredMissing(PathBuf),
    /// A workspace root holds the marker file
    Detected(PathBuf),
    /// A workspace root without the marker file
    NoMarker(PathBuf),
}

pub fn run_doctor(store: &SettingsStore, roots: &[PathBuf]) -> Result<()> {
    println!("{}", "🩺 Running MindSync bridge diagnostic...".bold().cyan());

    let mut issues = 0;

    // 1. Settings file
    if store.path().exists() {
        println!(
            "  {} Settings file: {}",
            "✔".green(),
            store.path().display().to_string().dimmed()
        );
    } else {
        println!(
            "  {} No settings file at {} (using defaults)",
            "·".dimmed(),
            store.path().display()
        );
    }

    let settings = match store.load() {
        Ok(s) => {
            println!("  {} Settings loaded successfully", "✔".green());
            s
        }
        Err(e) => {
            println!("  {} Failed to parse settings: {:#}", "✗".red(), e);
            return Err(e);
        }
    };

    print_settings(&settings);

    // 2. Tool location
    for check in diagnose_tool(&settings, roots) {
        match check {
            ToolCheck::Configured(path) => println!(
                "  {} Configured tool path: {}",
                "✔".green(),
                path.display().to_string().dimmed()
            ),
            ToolCheck::ConfiguredMissing(path) => {
                println!(
                    "  {} Configured tool path does not exist: {}",
                    "⚠".yellow(),
                    path.display()
                );
                issues += 1;
            }
            ToolCheck::Detected(root) => println!(
                "  {} Found {} in workspace root: {}",
                "✔".green(),
                MARKER_FILE.bold(),
                root.display().to_string().dimmed()
            ),
            ToolCheck::NoMarker(root) => println!(
                "  {} No {} in workspace root: {}",
                "·".dimmed(),
                MARKER_FILE,
                root.display()
            ),
        }
    }

    match resolve_tool_location(&settings, roots) {
        Some(dir) => {
            println!(
                "  {} Tool will run from: {}",
                "✔".green(),
                dir.display().to_string().bold()
            );
            if !dir.join(MARKER_FILE).exists() {
                println!(
                    "  {} {} is missing from the tool directory",
                    "✗".red(),
                    MARKER_FILE.bold()
                );
                issues += 1;
            }
        }
        None => {
            println!(
                "  {} MindSync tool not found. Set {} or open a workspace containing {}",
                "✗".red(),
                "toolPath".bold(),
                MARKER_FILE.bold()
            );
            issues += 1;
        }
    }

    // 3. Interpreter
    if command_exists(&settings.interpreter) {
        println!(
            "  {} Interpreter found in PATH: {}",
            "✔".green(),
            settings.interpreter.dimmed()
        );
    } else {
        println!(
            "  {} Interpreter not found in PATH: {}",
            "✗".red(),
            settings.interpreter.bold()
        );
        issues += 1;
    }

    if issues == 0 {
        println!("\n{}", "✨ All systems go! No issues found.".green().bold());
    } else {
        println!(
            "\n{}",
            format!("✖ Found {} issues.", issues).red().bold()
        );
    }

    Ok(())
}

fn print_settings(settings: &Settings) {
    let on_off = |b: bool| if b { "on".green() } else { "off".yellow() };
    println!("    autoSync:          {}", on_off(settings.auto_sync));
    println!("    showNotifications: {}", on_off(settings.show_notifications));
    println!("    syncDelay:         {} ms", settings.sync_delay);
    println!("    interpreter:       {}", settings.interpreter);
    match &settings.tool_path {
        Some(path) => println!("    toolPath:          {}", path.display()),
        None => println!("    toolPath:          {}", "(auto-detect)".dimmed()),
    }
}

/// Report every place the tool could come from, in resolution order
pub fn diagnose_tool(settings: &Settings, roots: &[PathBuf]) -> Vec<ToolCheck> {
    let mut checks = Vec::new();

    if let Some(path) = &settings.tool_path {
        if path.exists() {
            checks.push(ToolCheck::Configured(path.clone()));
        } else {
            checks.push(ToolCheck::ConfiguredMissing(path.clone()));
        }
    }

    for root in roots {
        if root.join(MARKER_FILE).exists() {
            checks.push(ToolCheck::Detected(root.clone()));
        } else {
            checks.push(ToolCheck::NoMarker(root.clone()));
        }
    }

    checks
}

pub fn command_exists(cmd: &str) -> bool {
    // If it's a path, check if it exists and is executable
    let path = Path::new(cmd);
    if path.is_absolute() || cmd.contains('/') || cmd.contains('\\') {
        return is_executable(path);
    }

    // Search in PATH
    if let Ok(path_var) = std::env::var("PATH") {
        for p in std::env::split_paths(&path_var) {
            let full_path = p.join(cmd);
            if is_executable(&full_path) {
                return true;
            }
            #[cfg(windows)]
            {
                for ext in &["exe", "cmd", "bat", "com"] {
                    if is_executable(&full_path.with_extension(ext)) {
                        return true;
                    }
                }
            }
        }
    }
    false
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
