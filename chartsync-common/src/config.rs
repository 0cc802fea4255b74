//! Bootstrap configuration and data folder resolution
//!
//! The TOML config file holds settings that cannot change while the
//! service runs (ports, collaborator URLs); edit and restart to apply.
//! The data folder holds the SQLite database and is resolved from four
//! sources in priority order (see [`resolve_root_folder`]).

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{Error, Result};

/// Environment variable naming the chartsync data folder
pub const ROOT_ENV_VAR: &str = "CHARTSYNC_ROOT";

/// Database file name inside the data folder
const DATABASE_FILE: &str = "chartsync.db";

fn default_port() -> u16 {
    5750
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_chart_base_url() -> String {
    "https://www.melon.com".to_string()
}

fn default_catalog_base_url() -> String {
    "https://api.spotify.com/v1".to_string()
}

fn default_auth_base_url() -> String {
    "http://127.0.0.1:5751".to_string()
}

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Data folder override (CLI argument and env var take precedence)
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// Base URL of the chart source
    #[serde(default = "default_chart_base_url")]
    pub chart_base_url: String,

    /// Base URL of the track catalog API
    #[serde(default = "default_catalog_base_url")]
    pub catalog_base_url: String,

    /// Base URL of the auth collaborator
    #[serde(default = "default_auth_base_url")]
    pub auth_base_url: String,

    /// Playlist used when a publish request does not name one
    #[serde(default)]
    pub default_playlist_id: Option<String>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            root_folder: None,
            chart_base_url: default_chart_base_url(),
            catalog_base_url: default_catalog_base_url(),
            auth_base_url: default_auth_base_url(),
            default_playlist_id: None,
            logging: LoggingConfig::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Load the TOML config file.
///
/// An explicit path must exist and parse. Without one, the platform
/// locations are searched and a missing file falls back to defaults so
/// the service starts with zero configuration.
pub fn load_toml_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match find_config_file() {
            Some(path) => path,
            None => return Ok(TomlConfig::default()),
        },
    };

    let text = std::fs::read_to_string(&path).map_err(|e| {
        Error::Config(format!("failed to read config file {}: {}", path.display(), e))
    })?;
    toml::from_str(&text)
        .map_err(|e| Error::Config(format!("failed to parse {}: {}", path.display(), e)))
}

/// Locate the platform config file, if one exists
fn find_config_file() -> Option<PathBuf> {
    if let Some(path) = dirs::config_dir().map(|d| d.join("chartsync").join("config.toml")) {
        if path.exists() {
            return Some(path);
        }
    }

    #[cfg(target_os = "linux")]
    {
        let system = PathBuf::from("/etc/chartsync/config.toml");
        if system.exists() {
            return Some(system);
        }
    }

    None
}

/// Resolve the data folder.
///
/// Priority order:
/// 1. Command-line argument
/// 2. `CHARTSYNC_ROOT` environment variable
/// 3. `root_folder` in the TOML config
/// 4. OS default under the local data directory
pub fn resolve_root_folder(cli_arg: Option<&Path>, config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(ROOT_ENV_VAR) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &config.root_folder {
        return path.clone();
    }

    default_root_folder()
}

/// OS default data folder
pub fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("chartsync"))
        .unwrap_or_else(|| PathBuf::from("./chartsync_data"))
}

/// Ensure the data folder exists and return the database path inside it
pub fn prepare_root_folder(root: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(root)?;
    Ok(root.join(DATABASE_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_cli_argument_wins() {
        std::env::set_var(ROOT_ENV_VAR, "/env/folder");
        let config = TomlConfig {
            root_folder: Some(PathBuf::from("/toml/folder")),
            ..TomlConfig::default()
        };

        let resolved = resolve_root_folder(Some(Path::new("/cli/folder")), &config);
        assert_eq!(resolved, PathBuf::from("/cli/folder"));

        std::env::remove_var(ROOT_ENV_VAR);
    }

    #[test]
    #[serial]
    fn test_env_var_beats_toml() {
        std::env::set_var(ROOT_ENV_VAR, "/env/folder");
        let config = TomlConfig {
            root_folder: Some(PathBuf::from("/toml/folder")),
            ..TomlConfig::default()
        };

        let resolved = resolve_root_folder(None, &config);
        assert_eq!(resolved, PathBuf::from("/env/folder"));

        std::env::remove_var(ROOT_ENV_VAR);
    }

    #[test]
    #[serial]
    fn test_toml_used_without_env() {
        std::env::remove_var(ROOT_ENV_VAR);
        let config = TomlConfig {
            root_folder: Some(PathBuf::from("/toml/folder")),
            ..TomlConfig::default()
        };

        let resolved = resolve_root_folder(None, &config);
        assert_eq!(resolved, PathBuf::from("/toml/folder"));
    }

    #[test]
    #[serial]
    fn test_empty_env_var_is_ignored() {
        std::env::set_var(ROOT_ENV_VAR, "");
        let config = TomlConfig::default();

        let resolved = resolve_root_folder(None, &config);
        assert_eq!(resolved, default_root_folder());

        std::env::remove_var(ROOT_ENV_VAR);
    }

    #[test]
    fn test_load_explicit_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
port = 6000
chart_base_url = "http://charts.local"
default_playlist_id = "playlist-1"

[logging]
level = "debug"
"#,
        )
        .unwrap();

        let config = load_toml_config(Some(&path)).unwrap();
        assert_eq!(config.port, 6000);
        assert_eq!(config.chart_base_url, "http://charts.local");
        assert_eq!(config.default_playlist_id.as_deref(), Some("playlist-1"));
        assert_eq!(config.logging.level, "debug");
        // Unset fields keep their defaults
        assert_eq!(config.catalog_base_url, default_catalog_base_url());
        assert!(config.root_folder.is_none());
    }

    #[test]
    fn test_load_explicit_config_missing_file_errors() {
        let err = load_toml_config(Some(Path::new("/nonexistent/config.toml"))).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_load_explicit_config_rejects_bad_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "port = \"not a number\"").unwrap();

        let err = load_toml_config(Some(&path)).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_prepare_root_folder_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("nested").join("data");

        let db_path = prepare_root_folder(&root).unwrap();
        assert!(root.exists());
        assert_eq!(db_path, root.join("chartsync.db"));
    }
}
