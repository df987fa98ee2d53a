//! Configuration loading and root folder resolution
//!
//! Bootstrap configuration lives in a TOML file; runtime settings live in the
//! database `settings` table (see the engine crate). TOML is read once at
//! startup and cannot change while the daemon runs.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "PULSE_ROOT_FOLDER";

/// Bootstrap configuration loaded from TOML file
///
/// **Minimal by design**: only settings needed before the database is open.
/// Everything else belongs in the `settings` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Root folder holding the database (optional)
    ///
    /// If not specified, resolution falls through to environment → OS default.
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,

    /// API key for the external busyness provider (optional)
    ///
    /// Lowest-priority source; database and environment override it.
    #[serde(default)]
    pub busyness_api_key: Option<String>,

    /// Batch refresh tuning (optional)
    #[serde(default)]
    pub refresh: RefreshConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            root_folder: None,
            logging: LoggingConfig::default(),
            busyness_api_key: None,
            refresh: RefreshConfig::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Batch refresh tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// Minutes between full refresh passes
    #[serde(default = "default_refresh_interval_minutes")]
    pub interval_minutes: u64,

    /// Venues scored concurrently within a pass
    #[serde(default = "default_refresh_chunk_size")]
    pub chunk_size: usize,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_minutes: default_refresh_interval_minutes(),
            chunk_size: default_refresh_chunk_size(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_refresh_interval_minutes() -> u64 {
    10
}

fn default_refresh_chunk_size() -> usize {
    10
}

/// Root folder resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. `PULSE_ROOT_FOLDER` environment variable
/// 3. TOML config file
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_root_folder(cli_arg: Option<&str>, toml_config: &TomlConfig) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return PathBuf::from(path);
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(path) = &toml_config.root_folder {
        return path.clone();
    }

    // Priority 4: OS-dependent compiled default
    get_default_root_folder()
}

/// Get OS-dependent default root folder path
pub fn get_default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/venuepulse (or /var/lib/venuepulse for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join("venuepulse"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/venuepulse"))
    } else if cfg!(target_os = "macos") {
        // ~/Library/Application Support/venuepulse
        dirs::data_dir()
            .map(|d| d.join("venuepulse"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/venuepulse"))
    } else if cfg!(target_os = "windows") {
        // %LOCALAPPDATA%\venuepulse
        dirs::data_local_dir()
            .map(|d| d.join("venuepulse"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\venuepulse"))
    } else {
        PathBuf::from("./venuepulse_data")
    }
}

/// Default configuration file path for the platform
///
/// Linux prefers `~/.config/venuepulse/pulse.toml`, falling back to
/// `/etc/venuepulse/pulse.toml`. Other platforms use the per-user config dir.
pub fn default_config_path() -> Result<PathBuf> {
    if cfg!(target_os = "linux") {
        let user_config = dirs::config_dir().map(|d| d.join("venuepulse").join("pulse.toml"));
        let system_config = PathBuf::from("/etc/venuepulse/pulse.toml");

        if let Some(path) = user_config {
            if path.exists() {
                return Ok(path);
            }
        }
        if system_config.exists() {
            return Ok(system_config);
        }
        // Neither exists yet: report the per-user location for writes
        dirs::config_dir()
            .map(|d| d.join("venuepulse").join("pulse.toml"))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
    } else {
        dirs::config_dir()
            .map(|d| d.join("venuepulse").join("pulse.toml"))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
    }
}

/// Load TOML configuration from the given path
///
/// A missing file yields defaults, not an error; a present but malformed
/// file is a hard error so misconfiguration does not pass silently.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed ({}): {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e)))
}

/// Write TOML configuration atomically (temp + rename)
///
/// On Unix the file is restricted to 0600 since it may carry an API key.
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let tmp_path = path.with_extension("toml.tmp");
    std::fs::write(&tmp_path, &content)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&tmp_path, perms)?;
    }

    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Check whether a TOML config file has looser permissions than 0600
#[cfg(unix)]
pub fn check_toml_permissions_loose(path: &Path) -> Result<bool> {
    use std::os::unix::fs::PermissionsExt;
    let metadata = std::fs::metadata(path)?;
    let mode = metadata.permissions().mode();
    Ok(mode & 0o077 != 0)
}

/// Create the root folder directory if missing
pub fn ensure_root_folder(root: &Path) -> Result<()> {
    std::fs::create_dir_all(root)?;
    Ok(())
}

/// Database file path within the root folder
pub fn database_path(root: &Path) -> PathBuf {
    root.join("pulse.db")
}
