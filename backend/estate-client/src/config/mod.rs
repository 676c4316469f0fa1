use crate::error::config::ConfigError;
use crate::session::SIGN_IN_PATH;

use common::ErrorLocation;

use std::env;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::sync::Once;
use std::time::Duration;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use url::Url;

const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_VERSION: u32 = 1;

/// Environment variable that overrides every other base URL source.
pub const BASE_URL_ENV_VAR: &str = "ESTATE_API_BASE_URL";

pub const DEFAULT_API_HOST: &str = "localhost:8080";
pub const DEFAULT_BASE_URL: &str = const_format::concatcp!("http://", DEFAULT_API_HOST, "/api/");

static LOAD_DOTENV_ONCE: Once = Once::new();

// ============================================
// CONFIG STRUCTS
// ============================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiConfig {
    /// Used when the environment override is absent.
    pub base_url: Option<String>,
    /// Whole-request timeout. Unset means the HTTP client default (none).
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionConfig {
    #[serde(default = "default_sign_in_path")]
    pub sign_in_path: String,
    /// Defaults to `session.json` beside the config file.
    pub storage_file: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            sign_in_path: default_sign_in_path(),
            storage_file: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExportConfig {
    /// Defaults to the user's download directory.
    pub download_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EstateConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub export: ExportConfig,
}

impl Default for EstateConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            api: ApiConfig::default(),
            session: SessionConfig::default(),
            export: ExportConfig::default(),
        }
    }
}

// ============================================
// DEFAULT FUNCTIONS
// ============================================

fn default_version() -> u32 {
    CONFIG_VERSION
}
fn default_sign_in_path() -> String {
    SIGN_IN_PATH.to_string()
}

// ============================================
// IMPLEMENTATION
// ============================================

impl EstateConfig {
    /// Load config from {config_dir}/config.json.
    ///
    /// # Returns
    ///
    /// Returns `Ok(EstateConfig)` if loaded successfully or defaults if file missing.
    /// Returns `Err(ConfigError)` if file exists but is corrupted/invalid.
    pub fn load(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            info!(
                "Config file not found at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path).map_err(|e| {
            warn!("Failed to read config file: {}", e);
            ConfigError::ReadError {
                location: ErrorLocation::from(Location::caller()),
                path: config_path.clone(),
                source: e,
            }
        })?;

        let config: EstateConfig = serde_json::from_str(&contents).map_err(|e| {
            warn!("Failed to parse config JSON: {}", e);
            ConfigError::ParseError {
                location: ErrorLocation::from(Location::caller()),
                path: config_path.clone(),
                reason: e.to_string(),
            }
        })?;

        config.validate()?;

        info!("Config loaded from {}", config_path.display());
        Ok(config)
    }

    /// Save config to {config_dir}/config.json using atomic write.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if validation, directory creation, serialization,
    /// write or rename fails.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        self.validate()?;

        std::fs::create_dir_all(config_dir).map_err(|e| ConfigError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: config_dir.to_path_buf(),
            source: e,
        })?;

        let config_path = config_dir.join(CONFIG_FILE_NAME);
        let temp_path = config_dir.join(format!("{}.tmp", CONFIG_FILE_NAME));

        let json = serde_json::to_string_pretty(self).map_err(|e| ConfigError::SerializeError {
            location: ErrorLocation::from(Location::caller()),
            reason: e.to_string(),
        })?;

        std::fs::write(&temp_path, json).map_err(|e| ConfigError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: temp_path.clone(),
            source: e,
        })?;

        std::fs::rename(&temp_path, &config_path).map_err(|e| ConfigError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: config_path.clone(),
            source: e,
        })?;

        info!("Config saved to {}", config_path.display());
        Ok(())
    }

    /// Validate config values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version == 0 || self.version > CONFIG_VERSION {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: format!(
                    "Invalid version: {} (expected 1-{})",
                    self.version, CONFIG_VERSION
                ),
            });
        }

        if let Some(ref url) = self.api.base_url {
            parse_base_url(url)?;
        }

        if self.api.timeout_secs == Some(0) {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: "timeout_secs must be positive when set".to_string(),
            });
        }

        if !self.session.sign_in_path.starts_with('/') {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: format!(
                    "sign_in_path must be absolute: {}",
                    self.session.sign_in_path
                ),
            });
        }

        Ok(())
    }

    /// Base URL from `ESTATE_API_BASE_URL` (process env or `.env`), then the config
    /// file, then [`DEFAULT_BASE_URL`].
    pub fn resolve_base_url(&self) -> Result<Url, ConfigError> {
        LOAD_DOTENV_ONCE.call_once(|| match dotenvy::dotenv() {
            Ok(path) => info!("Loaded .env from: {:?}", path),
            Err(e) => debug!("No .env loaded: {e}"),
        });

        let env_override = match env::var(BASE_URL_ENV_VAR) {
            Ok(value) if !value.trim().is_empty() => Some(value),
            Ok(_) => None,
            Err(env::VarError::NotPresent) => None,
            Err(env::VarError::NotUnicode(_)) => {
                warn!("{BASE_URL_ENV_VAR} contains invalid unicode, ignoring");
                None
            }
        };

        self.resolve_base_url_with(env_override.as_deref())
    }

    /// Same precedence as [`resolve_base_url`](Self::resolve_base_url) with the
    /// override passed in.
    pub fn resolve_base_url_with(&self, env_override: Option<&str>) -> Result<Url, ConfigError> {
        let (source, raw) = match (env_override, self.api.base_url.as_deref()) {
            (Some(value), _) => (BASE_URL_ENV_VAR, value),
            (None, Some(value)) => ("config", value),
            (None, None) => ("default", DEFAULT_BASE_URL),
        };
        let url = parse_base_url(raw)?;
        info!("API base URL ({source}): {url}");
        Ok(url)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.api.timeout_secs.map(Duration::from_secs)
    }

    /// Session storage file, relative paths resolved against `config_dir`.
    pub fn storage_path(&self, config_dir: &Path) -> PathBuf {
        match &self.session.storage_file {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => config_dir.join(path),
            None => config_dir.join("session.json"),
        }
    }
}

/// Parse and normalise a base URL so relative paths join beneath it.
#[track_caller]
pub fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let trimmed = raw.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };

    let url = Url::parse(&with_slash).map_err(|e| ConfigError::BaseUrl {
        location: ErrorLocation::from(Location::caller()),
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::BaseUrl {
            location: ErrorLocation::from(Location::caller()),
            url: raw.to_string(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }

    Ok(url)
}
