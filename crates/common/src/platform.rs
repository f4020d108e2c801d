use std::path::PathBuf;
use tracing::debug;

/// Name used for config, log and project directories
pub const APP_NAME: &str = "hookwatch";

/// File name used when exporting captured requests
pub const EXPORT_FILE_NAME: &str = "webhook-requests.json";

/// Gets the default configuration file path for hookwatch.
/// - Linux: ~/.config/hookwatch/config.toml
/// - macOS: ~/Library/Application Support/dev.hookwatch.hookwatch/config.toml
/// - Windows: %APPDATA%/hookwatch/hookwatch/config/config.toml
pub fn get_config_path() -> Option<PathBuf> {
    let dirs = directories::ProjectDirs::from("dev", APP_NAME, APP_NAME)?;
    let path = dirs.config_dir().join("config.toml");
    debug!("Config path resolved to {:?}", path);
    Some(path)
}

/// Default log file. The TUI owns stdout, so logs always go to a file.
pub fn default_log_path() -> PathBuf {
    std::env::temp_dir().join(format!("{}.log", APP_NAME))
}

/// Where exports land when no directory is configured: the user's
/// download directory, falling back to the working directory.
pub fn default_export_dir() -> PathBuf {
    dirs::download_dir().unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_log_path_is_named_after_app() {
        let path = default_log_path();
        assert_eq!(path.file_name().unwrap(), "hookwatch.log");
    }
}
