#[cfg(test)]
mod tests {
    use crate::commands::doctor::{ToolCheck, command_exists, diagnose_tool};
    use mindsync_bridge::config::{MARKER_FILE, Settings};
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_diagnose_reports_configured_and_roots() {
        let tool = TempDir::new().unwrap();
        let with_marker = TempDir::new().unwrap();
        let without_marker = TempDir::new().unwrap();
        fs::write(with_marker.path().join(MARKER_FILE), "").unwrap();

        let settings = Settings {
            tool_path: Some(tool.path().to_path_buf()),
            ..Settings::default()
        };
        let roots = vec![
            without_marker.path().to_path_buf(),
            with_marker.path().to_path_buf(),
        ];

        assert_eq!(
            diagnose_tool(&settings, &roots),
            vec![
                ToolCheck::Configured(tool.path().to_path_buf()),
                ToolCheck::NoMarker(without_marker.path().to_path_buf()),
                ToolCheck::Detected(with_marker.path().to_path_buf()),
            ]
        );
    }

    #[test]
    fn test_diagnose_flags_missing_configured_path() {
        let settings = Settings {
            tool_path: Some(PathBuf::from("/no/such/mindsync")),
            ..Settings::default()
        };

        assert_eq!(
            diagnose_tool(&settings, &[]),
            vec![ToolCheck::ConfiguredMissing(PathBuf::from(
                "/no/such/mindsync"
            ))]
        );
    }

    #[test]
    fn test_diagnose_without_anything_is_empty() {
        assert!(diagnose_tool(&Settings::default(), &[]).is_empty());
    }

    #[test]
    fn test_command_exists_for_missing_path() {
        assert!(!command_exists("/definitely/not/a/real/interpreter"));
        assert!(!command_exists("mindsync-no-such-interpreter"));
    }

    #[cfg(unix)]
    #[test]
    fn test_command_exists_finds_sh() {
        assert!(command_exists("sh"));
    }
}
