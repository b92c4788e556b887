//! Basemap layers loaded from GeoJSON.
//!
//! # Responsibility
//! - Parse Natural Earth style GeoJSON files into drawable shapes once at
//!   startup.
//! - Keep per-shape bounds so the renderer can cull off-screen geometry.
//!
//! # Invariants
//! - A missing layer file is skipped; a malformed one is an error.
//! - Point geometries are ignored; basemaps only carry areas and paths.

use crate::render::viewport::Viewport;
use crate::render::{RenderError, RenderResult};
use geojson::{GeoJson, Geometry, Value};
use image::Rgba;
use log::{info, warn};
use std::path::Path;

/// One `(lon, lat)` vertex.
pub type Vertex = (f64, f64);

/// Basemap layer identity. Draw order follows `LayerKind::DRAW_ORDER`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    Land,
    Ocean,
    Coastline,
    Borders,
    Lakes,
    Rivers,
    States,
}

/// How one layer is painted. Widths are in pixels at the reference size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerStyle {
    pub fill: Option<Rgba<u8>>,
    pub stroke: Option<Rgba<u8>>,
    pub stroke_width: f32,
    /// `(on, off)` dash lengths in pixels at the reference size.
    pub dash: Option<(f32, f32)>,
}

const LAND_COLOR: Rgba<u8> = Rgba([0xEF, 0xEA, 0xE0, 0xFF]);
pub(crate) const OCEAN_COLOR: Rgba<u8> = Rgba([0xE0, 0xF2, 0xF7, 0xFF]);
const BORDER_COLOR: Rgba<u8> = Rgba([0xB0, 0xB0, 0xB0, 0xFF]);
const COASTLINE_COLOR: Rgba<u8> = Rgba([0x80, 0x80, 0x80, 0xFF]);
const RIVER_COLOR: Rgba<u8> = Rgba([0x90, 0xC0, 0xD0, 0xFF]);
const LAKE_COLOR: Rgba<u8> = Rgba([0xA0, 0xD0, 0xE0, 0xFF]);

impl LayerKind {
    pub const DRAW_ORDER: [LayerKind; 7] = [
        LayerKind::Land,
        LayerKind::Ocean,
        LayerKind::Coastline,
        LayerKind::Borders,
        LayerKind::Lakes,
        LayerKind::Rivers,
        LayerKind::States,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            Self::Land => "land.geojson",
            Self::Ocean => "ocean.geojson",
            Self::Coastline => "coastline.geojson",
            Self::Borders => "borders.geojson",
            Self::Lakes => "lakes.geojson",
            Self::Rivers => "rivers.geojson",
            Self::States => "states.geojson",
        }
    }

    /// Color for polygon holes: water cut out of land, land cut out of
    /// ocean and lakes.
    pub fn hole_fill(self) -> Rgba<u8> {
        match self {
            Self::Land => OCEAN_COLOR,
            _ => LAND_COLOR,
        }
    }

    pub fn style(self) -> LayerStyle {
        match self {
            Self::Land => LayerStyle {
                fill: Some(LAND_COLOR),
                stroke: None,
                stroke_width: 0.0,
                dash: None,
            },
            Self::Ocean => LayerStyle {
                fill: Some(OCEAN_COLOR),
                stroke: None,
                stroke_width: 0.0,
                dash: None,
            },
            Self::Coastline => LayerStyle {
                fill: None,
                stroke: Some(COASTLINE_COLOR),
                stroke_width: 2.0,
                dash: None,
            },
            Self::Borders => LayerStyle {
                fill: None,
                stroke: Some(BORDER_COLOR),
                stroke_width: 1.5,
                dash: Some((3.0, 4.0)),
            },
            Self::Lakes => LayerStyle {
                fill: Some(LAKE_COLOR),
                stroke: Some(BORDER_COLOR),
                stroke_width: 1.0,
                dash: None,
            },
            Self::Rivers => LayerStyle {
                fill: None,
                stroke: Some(RIVER_COLOR),
                stroke_width: 1.5,
                dash: None,
            },
            Self::States => LayerStyle {
                fill: None,
                stroke: Some(BORDER_COLOR),
                stroke_width: 1.0,
                dash: Some((2.0, 4.0)),
            },
        }
    }
}

/// Drawable geometry of one feature part.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeGeometry {
    /// Polygon: first ring is the exterior, the rest are holes.
    Area(Vec<Vec<Vertex>>),
    /// Open polyline.
    Path(Vec<Vertex>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub bounds: Viewport,
    pub geometry: ShapeGeometry,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub kind: LayerKind,
    pub shapes: Vec<Shape>,
}

impl Layer {
    /// Parses one GeoJSON document into a layer.
    pub fn from_geojson(kind: LayerKind, source: &str) -> Result<Self, geojson::Error> {
        let document = source.parse::<GeoJson>()?;
        let mut shapes = Vec::new();
        match document {
            GeoJson::FeatureCollection(collection) => {
                for feature in collection.features {
                    if let Some(geometry) = feature.geometry {
                        collect_shapes(&geometry, &mut shapes);
                    }
                }
            }
            GeoJson::Feature(feature) => {
                if let Some(geometry) = feature.geometry {
                    collect_shapes(&geometry, &mut shapes);
                }
            }
            GeoJson::Geometry(geometry) => collect_shapes(&geometry, &mut shapes),
        }
        Ok(Self { kind, shapes })
    }

    /// Shapes whose bounds overlap the viewport.
    pub fn visible<'a>(&'a self, viewport: &'a Viewport) -> impl Iterator<Item = &'a Shape> + 'a {
        self.shapes
            .iter()
            .filter(move |shape| shape.bounds.intersects(viewport))
    }
}

/// Immutable set of basemap layers shared by every render.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Basemap {
    layers: Vec<Layer>,
}

impl Basemap {
    /// Basemap with no layers: renders plain ocean background.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_layers(mut layers: Vec<Layer>) -> Self {
        layers.sort_by_key(|layer| draw_rank(layer.kind));
        Self { layers }
    }

    /// Loads every known layer file present in `dir`.
    pub fn load_dir(dir: &Path) -> RenderResult<Self> {
        let mut layers = Vec::new();
        for kind in LayerKind::DRAW_ORDER {
            let path = dir.join(kind.file_name());
            if !path.is_file() {
                warn!(
                    "event=basemap_layer module=render status=skip layer={} path={}",
                    kind.file_name(),
                    path.display()
                );
                continue;
            }

            let source = std::fs::read_to_string(&path)?;
            let layer = Layer::from_geojson(kind, &source).map_err(|err| RenderError::Basemap {
                path: path.clone(),
                message: err.to_string(),
            })?;
            info!(
                "event=basemap_layer module=render status=ok layer={} shapes={}",
                kind.file_name(),
                layer.shapes.len()
            );
            layers.push(layer);
        }
        Ok(Self::from_layers(layers))
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

fn draw_rank(kind: LayerKind) -> usize {
    LayerKind::DRAW_ORDER
        .iter()
        .position(|candidate| *candidate == kind)
        .unwrap_or(LayerKind::DRAW_ORDER.len())
}

fn collect_shapes(geometry: &Geometry, out: &mut Vec<Shape>) {
    match &geometry.value {
        Value::Point(_) | Value::MultiPoint(_) => {}
        Value::LineString(line) => push_path(line, out),
        Value::MultiLineString(lines) => {
            for line in lines {
                push_path(line, out);
            }
        }
        Value::Polygon(rings) => push_area(rings, out),
        Value::MultiPolygon(polygons) => {
            for rings in polygons {
                push_area(rings, out);
            }
        }
        Value::GeometryCollection(geometries) => {
            for geometry in geometries {
                collect_shapes(geometry, out);
            }
        }
    }
}

fn to_vertices(positions: &[Vec<f64>]) -> Vec<Vertex> {
    positions
        .iter()
        .filter(|position| position.len() >= 2)
        .map(|position| (position[0], position[1]))
        .collect()
}

fn push_path(positions: &[Vec<f64>], out: &mut Vec<Shape>) {
    let vertices = to_vertices(positions);
    if vertices.len() < 2 {
        return;
    }
    if let Some(bounds) = Viewport::bounding(vertices.iter().copied()) {
        out.push(Shape {
            bounds,
            geometry: ShapeGeometry::Path(vertices),
        });
    }
}

fn push_area(rings: &[Vec<Vec<f64>>], out: &mut Vec<Shape>) {
    let rings = rings
        .iter()
        .map(|ring| to_vertices(ring))
        .filter(|ring| ring.len() >= 3)
        .collect::<Vec<_>>();
    let Some(exterior) = rings.first() else {
        return;
    };
    if let Some(bounds) = Viewport::bounding(exterior.iter().copied()) {
        out.push(Shape {
            bounds,
            geometry: ShapeGeometry::Area(rings),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::{Basemap, Layer, LayerKind, ShapeGeometry, LAND_COLOR, OCEAN_COLOR};
    use crate::render::viewport::Viewport;

    const LAND: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": {},
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[0, 0], [10, 0], [10, 10], [0, 10], [0, 0]]]
                }
            },
            {
                "type": "Feature",
                "properties": {},
                "geometry": { "type": "Point", "coordinates": [5, 5] }
            },
            {
                "type": "Feature",
                "properties": {},
                "geometry": {
                    "type": "MultiLineString",
                    "coordinates": [[[40, 40], [50, 50]], [[60, 60]]]
                }
            }
        ]
    }"#;

    #[test]
    fn parses_areas_and_paths_and_skips_points() {
        let layer = Layer::from_geojson(LayerKind::Land, LAND).unwrap();
        assert_eq!(layer.shapes.len(), 2);
        assert!(matches!(layer.shapes[0].geometry, ShapeGeometry::Area(_)));
        assert!(matches!(layer.shapes[1].geometry, ShapeGeometry::Path(_)));
        assert_eq!(layer.shapes[0].bounds.east, 10.0);
    }

    #[test]
    fn visible_culls_shapes_outside_viewport() {
        let layer = Layer::from_geojson(LayerKind::Land, LAND).unwrap();
        let viewport = Viewport {
            west: -5.0,
            east: 5.0,
            south: -5.0,
            north: 5.0,
        };
        assert_eq!(layer.visible(&viewport).count(), 1);
    }

    #[test]
    fn holes_take_the_color_of_what_surrounds_the_layer() {
        assert_eq!(LayerKind::Ocean.hole_fill(), LAND_COLOR);
        assert_eq!(LayerKind::Lakes.hole_fill(), LAND_COLOR);
        assert_eq!(LayerKind::Land.hole_fill(), OCEAN_COLOR);
    }

    #[test]
    fn malformed_geojson_is_rejected() {
        assert!(Layer::from_geojson(LayerKind::Rivers, "{ not json").is_err());
    }

    #[test]
    fn load_dir_skips_missing_files_and_orders_layers() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("rivers.geojson"), LAND).unwrap();
        std::fs::write(dir.path().join("land.geojson"), LAND).unwrap();

        let basemap = Basemap::load_dir(dir.path()).unwrap();
        let kinds = basemap
            .layers()
            .iter()
            .map(|layer| layer.kind)
            .collect::<Vec<_>>();
        assert_eq!(kinds, vec![LayerKind::Land, LayerKind::Rivers]);
    }

    #[test]
    fn load_dir_reports_malformed_file_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("lakes.geojson"), "[]").unwrap();
        let err = Basemap::load_dir(dir.path()).unwrap_err();
        assert!(err.to_string().contains("lakes.geojson"));
    }
}
