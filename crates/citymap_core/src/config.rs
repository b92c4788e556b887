//! Application configuration.
//!
//! # Responsibility
//! - Load settings from a TOML file, falling back to defaults for every key.
//! - Apply the `CITYMAP_DB_PATH` environment override.
//!
//! # Invariants
//! - A loaded config has passed `validate()`.

use crate::render::renderer::DEFAULT_IMAGE_SIZE;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const DB_PATH_ENV: &str = "CITYMAP_DB_PATH";
pub const DEFAULT_DB_FILE_NAME: &str = "cities.db";
const IMAGE_SIZE_RANGE: std::ops::RangeInclusive<u32> = 320..=8000;

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(toml::de::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// SQLite file holding `cities`, `users_cities` and `user_settings`.
    pub database_path: PathBuf,
    /// Directory of `*.geojson` basemap layers. `None` renders plain ocean.
    pub basemap_dir: Option<PathBuf>,
    /// Font for labels and titles. `None` uses the bundled DejaVu Sans.
    pub font_path: Option<PathBuf>,
    /// Where temporary map files are created; defaults to a subdirectory of
    /// the system temp dir.
    pub artifact_dir: Option<PathBuf>,
    /// Long side of rendered maps in pixels.
    pub image_size: u32,
    pub log_level: Option<String>,
    /// Absolute directory for rolling log files. `None` disables file logs.
    pub log_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DB_FILE_NAME),
            basemap_dir: None,
            font_path: None,
            artifact_dir: None,
            image_size: DEFAULT_IMAGE_SIZE,
            log_level: None,
            log_dir: None,
        }
    }
}

impl AppConfig {
    /// Reads a TOML file, then applies environment overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml(&content)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Defaults plus environment overrides, for runs without a config file.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !IMAGE_SIZE_RANGE.contains(&self.image_size) {
            return Err(ConfigError::Invalid(format!(
                "image_size must be within {}..={}, got {}",
                IMAGE_SIZE_RANGE.start(),
                IMAGE_SIZE_RANGE.end(),
                self.image_size
            )));
        }
        if self.database_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("database_path cannot be empty".to_string()));
        }
        if let Some(log_dir) = &self.log_dir {
            if !log_dir.is_absolute() {
                return Err(ConfigError::Invalid(format!(
                    "log_dir must be an absolute path, got `{}`",
                    log_dir.display()
                )));
            }
        }
        Ok(())
    }

    pub fn artifact_dir(&self) -> PathBuf {
        self.artifact_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("citymap-artifacts"))
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(raw) = std::env::var(DB_PATH_ENV) {
            let trimmed = raw.trim();
            if !trimmed.is_empty() {
                self.database_path = PathBuf::from(trimmed);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AppConfig, ConfigError};
    use std::path::PathBuf;

    #[test]
    fn empty_document_yields_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.image_size, 2400);
    }

    #[test]
    fn keys_override_defaults() {
        let config = AppConfig::from_toml(
            r#"
            database_path = "/var/lib/citymap/cities.db"
            basemap_dir = "/srv/naturalearth"
            image_size = 1200
            "#,
        )
        .unwrap();
        assert_eq!(config.database_path, PathBuf::from("/var/lib/citymap/cities.db"));
        assert_eq!(config.basemap_dir, Some(PathBuf::from("/srv/naturalearth")));
        assert_eq!(config.image_size, 1200);
        assert_eq!(config.font_path, None);
    }

    #[test]
    fn out_of_range_image_size_is_rejected() {
        let err = AppConfig::from_toml("image_size = 10").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn relative_log_dir_is_rejected() {
        let err = AppConfig::from_toml(r#"log_dir = "logs""#).unwrap_err();
        assert!(err.to_string().contains("absolute"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = AppConfig::from_toml(r#"databse_path = "typo.db""#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_reports_missing_file_path() {
        let err = AppConfig::load(std::path::Path::new("/nonexistent/citymap.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/citymap.toml"));
    }
}
