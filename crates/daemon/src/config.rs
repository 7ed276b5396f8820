use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use library::{DirectoryPolicy, ScanOptions};
use serde::{Deserialize, Serialize};

pub const CONFIG_VERSION: u32 = 1;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    pub version: u32,
    pub library_path: String,
    pub index_path: String,
    pub scan_on_start: bool,
    pub watch_library: bool,
    pub watch_debounce_secs: u64,
    pub directory_policy: DirectoryPolicy,
    pub prune_dimensions: bool,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            library_path: "".to_string(),
            index_path: "library.redb".to_string(),
            scan_on_start: true,
            watch_library: true,
            watch_debounce_secs: 2,
            directory_policy: DirectoryPolicy::Direct,
            prune_dimensions: false,
        }
    }
}

impl DaemonConfig {
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            directory_policy: self.directory_policy,
            prune_dimensions: self.prune_dimensions,
        }
    }

    pub fn index_path_or_default(&self) -> &str {
        let value = self.index_path.trim();
        if value.is_empty() {
            "library.redb"
        } else {
            value
        }
    }

    /// `LIBRARY_PATH` wins over the file when set to something non-blank.
    pub fn apply_env_override(&mut self, library_path: Option<String>) {
        if let Some(value) = library_path {
            if !value.trim().is_empty() {
                self.library_path = value;
            }
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Yaml(serde_yaml::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "io error: {}", err),
            ConfigError::Yaml(err) => write!(f, "yaml error: {}", err),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::Yaml(err)
    }
}

pub fn config_path_from_env() -> PathBuf {
    match env::var("TUNEDEX_CONFIG") {
        Ok(value) if !value.trim().is_empty() => PathBuf::from(value),
        _ => default_config_path(),
    }
}

fn default_config_path() -> PathBuf {
    match env::current_exe() {
        Ok(exe) => exe
            .parent()
            .map(|dir| dir.join("config.yaml"))
            .unwrap_or_else(|| PathBuf::from("config.yaml")),
        Err(_) => PathBuf::from("config.yaml"),
    }
}

pub fn load_or_create_config(path: &Path) -> Result<(DaemonConfig, bool), ConfigError> {
    if path.exists() {
        let contents = fs::read_to_string(path)?;
        let mut config: DaemonConfig = serde_yaml::from_str(&contents)?;
        if config.version < CONFIG_VERSION {
            config.version = CONFIG_VERSION;
        }
        if config.watch_debounce_secs == 0 {
            config.watch_debounce_secs = 2;
        }
        return Ok((config, false));
    }

    let config = DaemonConfig::default();
    save_config(path, &config)?;
    Ok((config, true))
}

pub fn save_config(path: &Path, config: &DaemonConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let contents = serde_yaml::to_string(config)?;
    fs::write(path, contents)?;
    Ok(())
}

pub fn resolve_path(config_path: &Path, value: &str) -> PathBuf {
    let raw = PathBuf::from(value);
    if raw.is_absolute() {
        return raw;
    }
    let base = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    base.join(raw)
}

pub fn resolve_library_root(config_path: &Path, value: &str) -> Option<PathBuf> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(resolve_path(config_path, trimmed))
    }
}
