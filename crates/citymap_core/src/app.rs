//! Process-wide application context.
//!
//! # Responsibility
//! - Build the immutable renderer (basemap layers, font) once at startup.
//!   Without a configured font the bundled one is used, so maps always
//!   carry labels and a title.
//! - Hand out one fresh database connection per request.
//!
//! # Invariants
//! - The context holds no mutable state; it is shared by reference.
//! - A context is only built after the database opened and migrated once.

use crate::config::{AppConfig, ConfigError};
use crate::db::{open_db, DbError, DbResult};
use crate::render::basemap::Basemap;
use crate::render::renderer::MapRenderer;
use crate::render::RenderError;
use crate::repo::city_repo::{CityRepository, SqliteCityRepository};
use crate::repo::RepoError;
use log::{info, warn};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Db(DbError),
    Repo(RepoError),
    Render(RenderError),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Render(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Render(err) => Some(err),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<DbError> for AppError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<RepoError> for AppError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<RenderError> for AppError {
    fn from(value: RenderError) -> Self {
        Self::Render(value)
    }
}

pub struct AppContext {
    database_path: PathBuf,
    artifact_dir: PathBuf,
    renderer: MapRenderer,
}

impl AppContext {
    /// Loads basemap layers and font, and checks the database is usable.
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        config.validate()?;

        let basemap = match &config.basemap_dir {
            Some(dir) => Basemap::load_dir(dir)?,
            None => {
                warn!("event=basemap_load module=app status=skip reason=no_basemap_dir");
                Basemap::empty()
            }
        };
        let font = match &config.font_path {
            Some(path) => MapRenderer::load_font(path)?,
            None => {
                info!("event=font_load module=app status=ok source=bundled");
                MapRenderer::bundled_font()?
            }
        };
        let renderer = MapRenderer::new(basemap, Some(font), config.image_size);

        let context = Self::new(&config.database_path, config.artifact_dir(), renderer);
        let conn = context.open_connection()?;
        let city_count = SqliteCityRepository::try_new(&conn)?.count_cities()?;
        if city_count == 0 {
            warn!(
                "event=app_init module=app status=ok cities=0 hint=seed_reference_data db={}",
                config.database_path.display()
            );
        } else {
            info!("event=app_init module=app status=ok cities={city_count}");
        }
        Ok(context)
    }

    /// Assembles a context from parts without touching the database.
    pub fn new(
        database_path: impl Into<PathBuf>,
        artifact_dir: impl Into<PathBuf>,
        renderer: MapRenderer,
    ) -> Self {
        Self {
            database_path: database_path.into(),
            artifact_dir: artifact_dir.into(),
            renderer,
        }
    }

    /// Opens a migrated connection for one request.
    pub fn open_connection(&self) -> DbResult<Connection> {
        open_db(&self.database_path)
    }

    pub fn database_path(&self) -> &Path {
        &self.database_path
    }

    pub fn artifact_dir(&self) -> &Path {
        &self.artifact_dir
    }

    pub fn renderer(&self) -> &MapRenderer {
        &self.renderer
    }
}

#[cfg(test)]
mod tests {
    use super::{AppContext, AppError};
    use crate::config::AppConfig;

    #[test]
    fn from_config_migrates_a_fresh_database() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            database_path: dir.path().join("cities.db"),
            artifact_dir: Some(dir.path().join("artifacts")),
            image_size: 400,
            ..AppConfig::default()
        };

        let context = AppContext::from_config(&config).unwrap();
        assert!(context.database_path().exists());
        assert_eq!(context.renderer().image_size(), 400);
        assert!(context.renderer().has_font());
        assert!(context.artifact_dir().ends_with("artifacts"));
    }

    #[test]
    fn missing_font_file_fails_startup() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            database_path: dir.path().join("cities.db"),
            font_path: Some(dir.path().join("missing.ttf")),
            ..AppConfig::default()
        };

        let err = AppContext::from_config(&config).err().unwrap();
        assert!(matches!(err, AppError::Render(_)));
    }
}
