// Engine settings, loaded from an optional JSON file and environment overrides
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::EngineError;

/// Names a JSON settings file.
pub const CONFIG_ENV: &str = "FRAGRANCE_SAMPLING_CONFIG";
/// Overrides `data_path`.
pub const DATA_PATH_ENV: &str = "FRAGRANCE_SAMPLING_DATA";

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct EngineSettings {
    pub data_path: PathBuf,
    /// 0 loads once on startup; anything else re-loads on that period.
    pub refresh_interval_secs: u64,
    pub output: OutputFormat,
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            data_path: PathBuf::from("fragrance_sampling/fragrance_sampling_data.csv"),
            refresh_interval_secs: 0,
            output: OutputFormat::Text,
        }
    }
}

impl EngineSettings {
    pub fn from_json_str(json: &str) -> Result<Self, EngineError> {
        let settings: EngineSettings =
            serde_json::from_str(json).map_err(|e| EngineError::Config(format!("invalid settings: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, EngineError> {
        let json = std::fs::read_to_string(path).map_err(|source| EngineError::ConfigFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Defaults, then the file named by `FRAGRANCE_SAMPLING_CONFIG`, then
    /// `FRAGRANCE_SAMPLING_DATA`.
    pub fn load_from_env() -> Result<Self, EngineError> {
        Self::resolve(std::env::var_os(CONFIG_ENV), std::env::var_os(DATA_PATH_ENV))
    }

    fn resolve(config_path: Option<OsString>, data_path: Option<OsString>) -> Result<Self, EngineError> {
        let mut settings = match config_path {
            Some(path) => Self::from_json_file(Path::new(&path))?,
            None => EngineSettings::default(),
        };
        if let Some(data_path) = data_path {
            settings.data_path = PathBuf::from(data_path);
        }
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.data_path.as_os_str().is_empty() {
            return Err(EngineError::Config("data_path must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Option<Duration> {
        (self.refresh_interval_secs > 0).then(|| Duration::from_secs(self.refresh_interval_secs))
    }
}
