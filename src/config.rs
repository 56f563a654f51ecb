use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ConfigError, Result};

pub const ENV_FACILITY_ID: &str = "K9TRACK_FACILITY_ID";
pub const ENV_SUPABASE_URL: &str = "K9TRACK_SUPABASE_URL";
pub const ENV_API_KEY: &str = "K9TRACK_API_KEY";

fn default_tick_interval_ms() -> u64 {
    1000
}

fn default_request_timeout_secs() -> u64 {
    10
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    pub facility_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supabase_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Overrides the platform data directory used by the local store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Connection settings for the hosted backend
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteSettings {
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl Config {
    pub fn new(facility_id: String) -> Self {
        Config {
            facility_id,
            supabase_url: None,
            api_key: None,
            data_dir: None,
            tick_interval_ms: default_tick_interval_ms(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }

    pub fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("com", "k9protrain", "k9track")
    }

    pub fn get_config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|proj_dirs| proj_dirs.config_dir().join("config.json"))
    }

    /// Load from the platform config path, then apply environment overrides.
    ///
    /// A missing file is fine as long as the environment supplies a facility id.
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path().ok_or(ConfigError::NoConfigDir)?;

        let mut config = match Self::load_from(&config_path) {
            Ok(config) => config,
            Err(crate::error::K9Error::Config(ConfigError::NotFound)) => {
                Config::new(String::new())
            }
            Err(e) => return Err(e),
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound.into());
        }

        let config_data = fs::read_to_string(path)
            .map_err(|e| ConfigError::LoadFailed(format!("{}: {}", path.display(), e)))?;

        let config: Config = serde_json::from_str(&config_data)
            .map_err(|e| ConfigError::LoadFailed(format!("{}: {}", path.display(), e)))?;

        Ok(config)
    }

    pub fn save(&self) -> Result<PathBuf> {
        let config_path = Self::get_config_path().ok_or(ConfigError::NoConfigDir)?;
        self.save_to(&config_path)?;
        Ok(config_path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::SaveFailed(e.to_string()))?;
        }

        let config_data = serde_json::to_string_pretty(self)?;

        fs::write(path, config_data).map_err(|e| ConfigError::SaveFailed(e.to_string()))?;

        Ok(())
    }

    /// Apply overrides from an environment-like lookup. Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(facility_id) = non_empty(ENV_FACILITY_ID) {
            self.facility_id = facility_id;
        }
        if let Some(url) = non_empty(ENV_SUPABASE_URL) {
            self.supabase_url = Some(url);
        }
        if let Some(key) = non_empty(ENV_API_KEY) {
            self.api_key = Some(key);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.facility_id.trim().is_empty() {
            return Err(ConfigError::MissingFacility.into());
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "tick_interval_ms".to_string(),
                value: "0".to_string(),
            }
            .into());
        }
        if let Some(url) = &self.supabase_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::InvalidValue {
                    field: "supabase_url".to_string(),
                    value: url.clone(),
                }
                .into());
            }
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Remote settings, present only when both URL and key are configured
    pub fn remote(&self) -> Option<RemoteSettings> {
        match (&self.supabase_url, &self.api_key) {
            (Some(url), Some(key)) if !key.is_empty() => Some(RemoteSettings {
                base_url: url.trim_end_matches('/').to_string(),
                api_key: key.clone(),
                timeout: Duration::from_secs(self.request_timeout_secs),
            }),
            _ => None,
        }
    }

    pub fn store_dir(&self) -> Option<PathBuf> {
        self.data_dir.clone().or_else(|| {
            Self::project_dirs().map(|proj_dirs| proj_dirs.data_dir().join("store"))
        })
    }
}
