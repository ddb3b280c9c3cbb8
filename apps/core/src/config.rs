use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::folder_store::DEFAULT_FOLDERS_KEY;

const APP_DIR_NAME: &str = "launchpad";
const CONFIG_FILE_NAME: &str = "config.toml";
const SETTINGS_DB_NAME: &str = "settings.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub application_dirs: Vec<PathBuf>,
    pub package_suffix: String,
    pub settings_db_path: PathBuf,
    pub folders_key: String,
    #[serde(skip)]
    pub config_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let base = stable_app_data_dir();
        Self {
            application_dirs: vec![
                PathBuf::from("/Applications"),
                PathBuf::from("/System/Applications"),
            ],
            package_suffix: ".app".to_string(),
            settings_db_path: base.join(SETTINGS_DB_NAME),
            folders_key: DEFAULT_FOLDERS_KEY.to_string(),
            config_path: base.join(CONFIG_FILE_NAME),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(String),
    Serialize(String),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(error) => write!(f, "io error: {error}"),
            Self::Parse(error) => write!(f, "parse error: {error}"),
            Self::Serialize(error) => write!(f, "serialize error: {error}"),
            Self::Invalid(error) => write!(f, "invalid config: {error}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Per-user data directory for the launcher.
pub fn stable_app_data_dir() -> PathBuf {
    platform_data_root()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR_NAME)
}

#[cfg(target_os = "windows")]
fn platform_data_root() -> Option<PathBuf> {
    std::env::var_os("APPDATA").map(PathBuf::from)
}

#[cfg(target_os = "macos")]
fn platform_data_root() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join("Library/Application Support"))
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn platform_data_root() -> Option<PathBuf> {
    std::env::var_os("XDG_DATA_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".local/share")))
}

pub fn validate(cfg: &Config) -> Result<(), String> {
    if cfg.application_dirs.is_empty() {
        return Err("application_dirs must list at least one directory".into());
    }

    if cfg
        .application_dirs
        .iter()
        .any(|dir| dir.as_os_str().is_empty())
    {
        return Err("application_dirs must not contain empty paths".into());
    }

    if !cfg.package_suffix.starts_with('.') || cfg.package_suffix.len() < 2 {
        return Err("package_suffix must look like '.app'".into());
    }

    if cfg.folders_key.trim().is_empty() {
        return Err("folders_key is required".into());
    }

    if cfg.settings_db_path.as_os_str().is_empty() {
        return Err("settings_db_path is required".into());
    }

    Ok(())
}

/// Reads the config file, or returns defaults when it does not exist yet.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let config_path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| Config::default().config_path);

    let mut cfg = if config_path.exists() {
        let raw = std::fs::read_to_string(&config_path)?;
        parse(&raw, &config_path)?
    } else {
        Config::default()
    };
    cfg.config_path = config_path;

    validate(&cfg).map_err(ConfigError::Invalid)?;
    Ok(cfg)
}

pub fn parse(raw: &str, path: &Path) -> Result<Config, ConfigError> {
    if is_json_path(path) {
        json5::from_str(raw).map_err(|error| ConfigError::Parse(error.to_string()))
    } else {
        toml::from_str(raw).map_err(|error| ConfigError::Parse(error.to_string()))
    }
}

pub fn save(cfg: &Config) -> Result<(), ConfigError> {
    validate(cfg).map_err(ConfigError::Invalid)?;
    let encoded =
        toml::to_string_pretty(cfg).map_err(|error| ConfigError::Serialize(error.to_string()))?;
    if let Some(parent) = cfg.config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&cfg.config_path, encoded)?;
    Ok(())
}

fn is_json_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json") || ext.eq_ignore_ascii_case("json5"))
}
