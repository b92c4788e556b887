//! Core domain logic for the city map assistant.
//! Stores, map rendering and chat dispatch; transports plug in through
//! `dispatch::sink::ReplySink`.

pub mod app;
pub mod config;
pub mod db;
pub mod dispatch;
pub mod logging;
pub mod model;
pub mod render;
pub mod repo;
pub mod service;

pub use app::{AppContext, AppError};
pub use config::{AppConfig, ConfigError};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use dispatch::command::{Callback, Command};
pub use dispatch::sink::{Choice, DeliveryError, DeliveryResult, MessageId, ReplySink};
pub use dispatch::{CallbackQuery, DispatchError, DispatchResult, Dispatcher, Requester};
pub use logging::{
    default_log_level, flush_logs, init_logging, init_stderr_logging, logging_status,
};
pub use model::city::{City, Coordinates, PlottedCity};
pub use model::preference::{DeleteOutcome, MarkerColor, SaveOutcome, UnknownColor, UserId};
pub use render::artifact::MapArtifact;
pub use render::basemap::Basemap;
pub use render::renderer::MapRenderer;
pub use render::viewport::Viewport;
pub use render::{RenderError, RenderResult};
pub use repo::city_repo::{CityRepository, SqliteCityRepository};
pub use repo::preference_repo::{PreferenceRepository, SqlitePreferenceRepository};
pub use repo::{RepoError, RepoResult};
pub use service::map_service::{MapService, MapServiceError, RenderOutcome, Resolution};
pub use service::preference_service::PreferenceService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
