//! Map render use-case: resolve names, then paint.
//!
//! # Invariants
//! - Unresolved names are skipped and logged at warn level, never surfaced
//!   one by one to callers.
//! - When no name resolves, no file is written.
//! - The title reflects how many names were requested, not how many resolved.

use crate::model::city::PlottedCity;
use crate::model::preference::MarkerColor;
use crate::render::renderer::MapRenderer;
use crate::render::viewport::Viewport;
use crate::render::RenderError;
use crate::repo::city_repo::CityRepository;
use crate::repo::RepoError;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::time::Instant;

/// Service error for render use-cases.
#[derive(Debug)]
pub enum MapServiceError {
    Repo(RepoError),
    Render(RenderError),
}

impl Display for MapServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Render(err) => write!(f, "{err}"),
        }
    }
}

impl Error for MapServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Render(err) => Some(err),
        }
    }
}

impl From<RepoError> for MapServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<RenderError> for MapServiceError {
    fn from(value: RenderError) -> Self {
        Self::Render(value)
    }
}

/// Names split into plottable cities and misses.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Resolution {
    pub requested: usize,
    pub plotted: Vec<PlottedCity>,
    pub unresolved: Vec<String>,
}

impl Resolution {
    pub fn is_empty(&self) -> bool {
        self.plotted.is_empty()
    }

    /// Title for the map header.
    pub fn title(&self) -> String {
        match self.plotted.as_slice() {
            [only] if self.requested == 1 => format!("City map: {}", only.name),
            _ => "Your cities map".to_string(),
        }
    }
}

/// Result of one render call.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutcome {
    /// File written at the requested path.
    Rendered {
        viewport: Viewport,
        plotted: Vec<String>,
        unresolved: Vec<String>,
    },
    /// No requested name resolved; nothing was written.
    NothingToRender { unresolved: Vec<String> },
}

impl RenderOutcome {
    pub fn is_rendered(&self) -> bool {
        matches!(self, Self::Rendered { .. })
    }
}

pub struct MapService<'r, C: CityRepository> {
    cities: C,
    renderer: &'r MapRenderer,
}

impl<'r, C: CityRepository> MapService<'r, C> {
    pub fn new(cities: C, renderer: &'r MapRenderer) -> Self {
        Self { cities, renderer }
    }

    /// Resolves names to coordinates, logging every miss.
    pub fn resolve(&self, city_names: &[String]) -> Result<Resolution, MapServiceError> {
        let mut resolution = Resolution {
            requested: city_names.len(),
            ..Resolution::default()
        };
        for name in city_names {
            match self.cities.lookup(name)? {
                Some(coordinates) => resolution.plotted.push(PlottedCity {
                    name: name.clone(),
                    coordinates,
                }),
                None => {
                    warn!("event=city_unresolved module=service status=skip city={name:?}");
                    resolution.unresolved.push(name.clone());
                }
            }
        }
        Ok(resolution)
    }

    /// Resolves and renders `city_names` into `output_path`.
    pub fn render(
        &self,
        output_path: &Path,
        city_names: &[String],
        marker_color: MarkerColor,
    ) -> Result<RenderOutcome, MapServiceError> {
        let resolution = self.resolve(city_names)?;
        self.render_resolved(output_path, resolution, marker_color)
    }

    /// Renders an already-resolved set of cities.
    pub fn render_resolved(
        &self,
        output_path: &Path,
        resolution: Resolution,
        marker_color: MarkerColor,
    ) -> Result<RenderOutcome, MapServiceError> {
        if resolution.is_empty() {
            warn!(
                "event=map_render module=service status=skip reason=no_resolved_cities requested={}",
                resolution.requested
            );
            return Ok(RenderOutcome::NothingToRender {
                unresolved: resolution.unresolved,
            });
        }

        let started_at = Instant::now();
        let title = resolution.title();
        let viewport = self
            .renderer
            .render_to_path(output_path, &resolution.plotted, marker_color, &title)?;
        let Some(viewport) = viewport else {
            return Ok(RenderOutcome::NothingToRender {
                unresolved: resolution.unresolved,
            });
        };

        info!(
            "event=map_render module=service status=ok plotted={} unresolved={} duration_ms={}",
            resolution.plotted.len(),
            resolution.unresolved.len(),
            started_at.elapsed().as_millis()
        );
        Ok(RenderOutcome::Rendered {
            viewport,
            plotted: resolution
                .plotted
                .into_iter()
                .map(|city| city.name)
                .collect(),
            unresolved: resolution.unresolved,
        })
    }
}
