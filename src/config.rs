use color_eyre::eyre::{Context, Result, eyre};
use serde::{Deserialize, Serialize};
use std::{
    env, fs, io,
    path::{Path, PathBuf},
    sync::{OnceLock, RwLock},
};

/// Globally accessible application configuration values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub sidebar_collapsed: bool,
    #[serde(default = "default_server_url_value")]
    pub server_url: String,
    #[serde(default = "default_notes_dir_value")]
    pub notes_dir: String,
    #[serde(default = "default_question_count_value")]
    pub question_count: u16,
}

impl AppConfig {
    fn normalize(&mut self) {
        if self.server_url.trim().is_empty() {
            self.server_url = DEFAULT_SERVER_URL.to_string();
        }
        if self.notes_dir.trim().is_empty() {
            self.notes_dir = DEFAULT_NOTES_DIR.to_string();
        }
        self.question_count = self
            .question_count
            .clamp(QUESTION_COUNT_MIN, QUESTION_COUNT_MAX);
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            sidebar_collapsed: false,
            server_url: DEFAULT_SERVER_URL.to_string(),
            notes_dir: DEFAULT_NOTES_DIR.to_string(),
            question_count: DEFAULT_QUESTION_COUNT,
        }
    }
}

pub const QUESTION_COUNT_MIN: u16 = 1;
pub const QUESTION_COUNT_MAX: u16 = 10;

/// Environment override for the quiz server base URL. A non-empty value takes
/// precedence over the configured one.
pub const SERVER_URL_ENV: &str = "QUIZDECK_SERVER_URL";

const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";
const DEFAULT_NOTES_DIR: &str = "notes";
const DEFAULT_QUESTION_COUNT: u16 = 5;

const CONFIG_FILE_PATH: &str = "config/app_config.toml";

static APP_CONFIG: OnceLock<RwLock<AppConfig>> = OnceLock::new();

fn config_lock() -> &'static RwLock<AppConfig> {
    APP_CONFIG.get_or_init(|| RwLock::new(AppConfig::default()))
}

/// Attempt to load configuration from disk. If loading fails, the in-memory config will be reset to defaults
/// and the error will be returned for the caller to surface if desired.
pub fn initialize() -> Result<()> {
    match load_config_from_disk() {
        Ok(config) => {
            let lock = config_lock();
            *lock.write().expect("config lock poisoned") = config;
            Ok(())
        }
        Err(err) => {
            let lock = config_lock();
            *lock.write().expect("config lock poisoned") = AppConfig::default();
            Err(err)
        }
    }
}

/// Retrieve a clone of the current configuration.
pub fn current() -> AppConfig {
    config_lock().read().expect("config lock poisoned").clone()
}

/// Resolved quiz server base URL with any trailing slash removed. The
/// environment variable wins over the configured value.
pub fn server_url() -> String {
    resolve_server_url(env::var(SERVER_URL_ENV).ok().as_deref(), &current())
}

/// Directory scanned for note files.
pub fn notes_dir() -> PathBuf {
    PathBuf::from(
        config_lock()
            .read()
            .expect("config lock poisoned")
            .notes_dir
            .clone(),
    )
}

/// Apply the provided mutation to the in-memory configuration and persist the result to disk.
pub fn update<F>(mutator: F) -> Result<AppConfig>
where
    F: FnOnce(&mut AppConfig),
{
    let lock = config_lock();
    let mut config = lock.write().expect("config lock poisoned");
    mutator(&mut config);
    config.normalize();
    save_config_to_disk(&config)?;
    Ok(config.clone())
}

/// Path to the configuration file used for persistence.
pub fn config_file_path() -> PathBuf {
    PathBuf::from(CONFIG_FILE_PATH)
}

fn load_config_from_disk() -> Result<AppConfig> {
    read_config(&config_file_path())
}

fn save_config_to_disk(config: &AppConfig) -> Result<()> {
    write_config(config, &config_file_path())
}

fn resolve_server_url(env_value: Option<&str>, config: &AppConfig) -> String {
    let candidate = match env_value {
        Some(value) if !value.trim().is_empty() => value.trim(),
        _ => config.server_url.trim(),
    };
    candidate.trim_end_matches('/').to_string()
}

fn read_config(path: &Path) -> Result<AppConfig> {
    match fs::read_to_string(path) {
        Ok(contents) => {
            let mut config: AppConfig = toml::from_str(&contents)
                .wrap_err_with(|| format!("failed to parse configuration at {}", path.display()))?;
            config.normalize();
            Ok(config)
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(err) => Err(eyre!(format!(
            "failed to read configuration at {}: {}",
            path.display(),
            err
        ))),
    }
}

fn write_config(config: &AppConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).wrap_err_with(|| {
                format!(
                    "failed to create configuration directory {}",
                    parent.display()
                )
            })?;
        }
    }
    let serialized =
        toml::to_string_pretty(config).wrap_err("failed to serialize configuration to TOML")?;
    fs::write(path, serialized)
        .wrap_err_with(|| format!("failed to write configuration to {}", path.display()))
}

const fn default_question_count_value() -> u16 {
    DEFAULT_QUESTION_COUNT
}

fn default_server_url_value() -> String {
    DEFAULT_SERVER_URL.to_string()
}

fn default_notes_dir_value() -> String {
    DEFAULT_NOTES_DIR.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let loaded = read_config(&dir.path().join("absent.toml")).expect("read config");
        assert_eq!(loaded, AppConfig::default());
    }

    #[test]
    fn round_trip_preserves_every_field() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("config/app_config.toml");
        let config = AppConfig {
            sidebar_collapsed: true,
            server_url: "http://quiz.local:8080".to_string(),
            notes_dir: "material".to_string(),
            question_count: 8,
        };
        write_config(&config, &path).expect("write config");
        let loaded = read_config(&path).expect("read config");
        assert_eq!(loaded, config);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("app_config.toml");
        fs::write(&path, "sidebar_collapsed = true\n").expect("write partial config");
        let loaded = read_config(&path).expect("read config");
        assert!(loaded.sidebar_collapsed);
        assert_eq!(loaded.server_url, DEFAULT_SERVER_URL);
        assert_eq!(loaded.notes_dir, DEFAULT_NOTES_DIR);
        assert_eq!(loaded.question_count, DEFAULT_QUESTION_COUNT);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("app_config.toml");
        fs::write(&path, "question_count = \"many\"\n").expect("write malformed config");
        assert!(read_config(&path).is_err());
    }

    #[test]
    fn normalize_clamps_question_count() {
        let mut config = AppConfig {
            question_count: 0,
            ..AppConfig::default()
        };
        config.normalize();
        assert_eq!(config.question_count, QUESTION_COUNT_MIN);

        config.question_count = 99;
        config.normalize();
        assert_eq!(config.question_count, QUESTION_COUNT_MAX);

        config.question_count = 7;
        config.normalize();
        assert_eq!(config.question_count, 7);
    }

    #[test]
    fn normalize_replaces_blank_strings() {
        let mut config = AppConfig {
            server_url: "   ".to_string(),
            notes_dir: String::new(),
            ..AppConfig::default()
        };
        config.normalize();
        assert_eq!(config.server_url, DEFAULT_SERVER_URL);
        assert_eq!(config.notes_dir, DEFAULT_NOTES_DIR);
    }

    #[test]
    fn env_override_beats_configured_value() {
        let config = AppConfig {
            server_url: "http://file.example".to_string(),
            ..AppConfig::default()
        };
        assert_eq!(
            resolve_server_url(Some("http://env.example/"), &config),
            "http://env.example"
        );
        assert_eq!(
            resolve_server_url(Some("   "), &config),
            "http://file.example",
            "blank override is ignored"
        );
        assert_eq!(resolve_server_url(None, &config), "http://file.example");
    }

    #[test]
    fn trailing_slashes_are_trimmed() {
        let config = AppConfig {
            server_url: "http://file.example///".to_string(),
            ..AppConfig::default()
        };
        assert_eq!(resolve_server_url(None, &config), "http://file.example");
    }
}
