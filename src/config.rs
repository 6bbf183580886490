use crate::constants;
use crate::error::{RegistrarError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub endpoints: EndpointConfig,
    pub storage: StorageConfig,
    pub catalog: CatalogConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: constants::DEFAULT_API_URL.to_string(),
            timeout_seconds: 15,
        }
    }
}

/// Backend paths, relative to `api.base_url`
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub request_otp: String,
    pub verify_otp: String,
    pub catalog: String,
    pub cities: String,
    pub locations: String,
    pub slot_dates: String,
    pub slot_times: String,
    pub register: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            request_otp: "students/request-otp".to_string(),
            verify_otp: "students/verify-otp".to_string(),
            catalog: "appointments/catalog".to_string(),
            cities: "cities/".to_string(),
            locations: "locations".to_string(),
            slot_dates: "appointments/dates".to_string(),
            slot_times: "appointments/available".to_string(),
            register: "registrations".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub token_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            token_path: PathBuf::from(constants::DEFAULT_TOKEN_PATH),
        }
    }
}

/// Where the dropdown catalog comes from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogSource {
    /// Single nested catalog request
    #[default]
    Bundled,
    /// Assembled level by level from the cities/locations/slot endpoints
    Granular,
}

impl std::str::FromStr for CatalogSource {
    type Err = RegistrarError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bundled" => Ok(CatalogSource::Bundled),
            "granular" => Ok(CatalogSource::Granular),
            other => Err(RegistrarError::Config(format!(
                "unknown catalog source '{}', expected 'bundled' or 'granular'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub source: CatalogSource,
}

impl Config {
    /// Load from `REGISTRAR_CONFIG` (or `config.toml`), then apply environment
    /// overrides. A missing file falls back to the built-in defaults.
    pub fn load() -> Result<Self> {
        let path = std::env::var(constants::ENV_CONFIG_PATH).unwrap_or_else(|_| "config.toml".to_string());
        let mut config = Self::load_from(Path::new(&path))?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("No config file at '{}', using defaults", path.display());
            return Ok(Self::default());
        }
        let config_content = fs::read_to_string(path).map_err(|e| {
            RegistrarError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&config_content)?;
        debug!("Loaded config from '{}'", path.display());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var(constants::ENV_API_BASE_URL) {
            self.api.base_url = url;
        }
        if let Ok(path) = std::env::var(constants::ENV_TOKEN_PATH) {
            self.storage.token_path = PathBuf::from(path);
        }
        if let Ok(source) = std::env::var(constants::ENV_CATALOG_SOURCE) {
            self.catalog.source = source.parse()?;
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(RegistrarError::Config("api.base_url must not be empty".to_string()));
        }
        if self.api.timeout_seconds == 0 {
            return Err(RegistrarError::Config("api.timeout_seconds must be positive".to_string()));
        }
        Ok(())
    }
}
