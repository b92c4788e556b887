//! Map composition: basemap, graticule, markers, labels and title.
//!
//! # Responsibility
//! - Turn already-resolved cities into a PNG at a caller-chosen path.
//!
//! # Invariants
//! - Nothing is written when the city list is empty.
//! - The image is cropped to the viewport plus the title band; the long side
//!   is `image_size` pixels.
//! - Labels sit `LABEL_OFFSET_DEG` north-east of their marker.
//! - The renderer never deletes what it writes.

use crate::model::city::PlottedCity;
use crate::model::preference::MarkerColor;
use crate::render::basemap::{Basemap, ShapeGeometry, OCEAN_COLOR};
use crate::render::canvas::{
    draw_text_with_halo, measure_text, MapCanvas, MarkerStyle, TextStyle,
};
use crate::render::graticule::{format_degrees, Graticule};
use crate::render::viewport::Viewport;
use crate::render::{RenderError, RenderResult};
use ab_glyph::FontVec;
use image::{imageops, DynamicImage, ImageFormat, Rgba, RgbaImage};
use log::{debug, warn};
use std::path::Path;

pub const DEFAULT_IMAGE_SIZE: u32 = 2400;
pub const LABEL_OFFSET_DEG: f64 = 0.1;

/// DejaVu Sans, used when no font is configured.
const BUNDLED_FONT: &[u8] = include_bytes!("../../assets/DejaVuSans.ttf");

/// Pixel sizes below are tuned for this long-side length and scaled.
const REFERENCE_SIZE: f32 = 2400.0;
const MIN_SIDE_PX: u32 = 160;

const MARKER_RADIUS_PX: f32 = 14.0;
const MARKER_RIM_PX: f32 = 3.5;
const LABEL_FONT_PX: f32 = 40.0;
const TITLE_FONT_PX: f32 = 64.0;
const TICK_FONT_PX: f32 = 26.0;
const HALO_PX: f32 = 3.0;
const GRID_WIDTH_PX: f32 = 1.5;
const GRID_DASH_PX: (f32, f32) = (10.0, 8.0);

const WHITE: Rgba<u8> = Rgba([0xFF, 0xFF, 0xFF, 0xFF]);
const BLACK: Rgba<u8> = Rgba([0x00, 0x00, 0x00, 0xFF]);
const GRID_COLOR: Rgba<u8> = Rgba([0xBE, 0xBE, 0xBE, 0xFF]);
const TICK_COLOR: Rgba<u8> = Rgba([0x80, 0x80, 0x80, 0xFF]);

/// In-memory render result.
pub struct ComposedMap {
    pub image: RgbaImage,
    pub viewport: Viewport,
}

/// Stateless map painter over immutable basemap data.
pub struct MapRenderer {
    basemap: Basemap,
    font: Option<FontVec>,
    image_size: u32,
}

impl MapRenderer {
    pub fn new(basemap: Basemap, font: Option<FontVec>, image_size: u32) -> Self {
        if font.is_none() {
            warn!("event=renderer_init module=render status=skip reason=no_font labels=off");
        }
        Self {
            basemap,
            font,
            image_size: image_size.max(MIN_SIDE_PX),
        }
    }

    /// Loads a TrueType/OpenType font for labels and titles.
    pub fn load_font(path: &Path) -> RenderResult<FontVec> {
        let bytes = std::fs::read(path)?;
        FontVec::try_from_vec(bytes)
            .map_err(|err| RenderError::Font(format!("{}: {err}", path.display())))
    }

    /// Font compiled into the binary for labels and titles.
    pub fn bundled_font() -> RenderResult<FontVec> {
        FontVec::try_from_vec(BUNDLED_FONT.to_vec())
            .map_err(|err| RenderError::Font(format!("bundled DejaVu Sans: {err}")))
    }

    pub fn image_size(&self) -> u32 {
        self.image_size
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Paints the map in memory. Returns `None` for an empty city list.
    pub fn compose(
        &self,
        cities: &[PlottedCity],
        color: MarkerColor,
        title: &str,
    ) -> Option<ComposedMap> {
        let points = cities.iter().map(|city| city.coordinates).collect::<Vec<_>>();
        let viewport = Viewport::fit(&points)?;
        let (width, height) = self.map_dimensions(&viewport);
        let scale = self.image_size as f32 / REFERENCE_SIZE;

        let mut canvas = MapCanvas::new(viewport, width, height, OCEAN_COLOR);
        self.paint_basemap(&mut canvas, &viewport, scale);
        let graticule = Graticule::for_viewport(&viewport);
        paint_graticule(&mut canvas, &viewport, &graticule, scale);

        let marker = MarkerStyle {
            radius: MARKER_RADIUS_PX * scale,
            rim_width: MARKER_RIM_PX * scale,
            fill: rgba(color),
            rim: WHITE,
        };
        for city in cities {
            canvas.draw_marker(city.coordinates.longitude, city.coordinates.latitude, &marker);
        }

        if let Some(font) = &self.font {
            paint_tick_labels(&mut canvas, font, &graticule, scale);
            paint_city_labels(&mut canvas, font, cities, scale);
        }

        let image = match &self.font {
            Some(font) => with_title_band(canvas.into_image(), font, title, scale),
            None => canvas.into_image(),
        };
        Some(ComposedMap { image, viewport })
    }

    /// Paints the map and writes it as PNG to `output`.
    ///
    /// Returns `Ok(None)` without touching the filesystem when `cities` is
    /// empty.
    pub fn render_to_path(
        &self,
        output: &Path,
        cities: &[PlottedCity],
        color: MarkerColor,
        title: &str,
    ) -> RenderResult<Option<Viewport>> {
        let Some(composed) = self.compose(cities, color, title) else {
            return Ok(None);
        };

        let rgb = DynamicImage::ImageRgba8(composed.image).to_rgb8();
        rgb.save_with_format(output, ImageFormat::Png)?;
        debug!(
            "event=map_write module=render status=ok width={} height={} path={}",
            rgb.width(),
            rgb.height(),
            output.display()
        );
        Ok(Some(composed.viewport))
    }

    fn map_dimensions(&self, viewport: &Viewport) -> (u32, u32) {
        let px_per_degree = f64::from(self.image_size) / viewport.lon_span().max(viewport.lat_span());
        let side = |span: f64| ((span * px_per_degree).round() as u32).max(MIN_SIDE_PX);
        (side(viewport.lon_span()), side(viewport.lat_span()))
    }

    fn paint_basemap(&self, canvas: &mut MapCanvas, viewport: &Viewport, scale: f32) {
        for layer in self.basemap.layers() {
            let style = layer.kind.style();
            let stroke_width = (style.stroke_width * scale).max(1.0);
            let dash = style.dash.map(|(on, off)| (on * scale, off * scale));
            for shape in layer.visible(viewport) {
                match &shape.geometry {
                    ShapeGeometry::Area(rings) => {
                        if let Some(fill) = style.fill {
                            canvas.fill_area(rings, fill, layer.kind.hole_fill());
                        }
                        if let Some(stroke) = style.stroke {
                            for ring in rings {
                                canvas.stroke_ring(ring, stroke, stroke_width);
                            }
                        }
                    }
                    ShapeGeometry::Path(points) => {
                        if let Some(stroke) = style.stroke {
                            canvas.stroke_path(points, stroke, stroke_width, dash);
                        }
                    }
                }
            }
        }
    }
}

fn paint_graticule(canvas: &mut MapCanvas, viewport: &Viewport, graticule: &Graticule, scale: f32) {
    let width = (GRID_WIDTH_PX * scale).max(1.0);
    let dash = Some((GRID_DASH_PX.0 * scale, GRID_DASH_PX.1 * scale));
    for &lon in &graticule.meridians {
        let line = [(lon, viewport.north), (lon, viewport.south)];
        canvas.stroke_path(&line, GRID_COLOR, width, dash);
    }
    for &lat in &graticule.parallels {
        let line = [(viewport.west, lat), (viewport.east, lat)];
        canvas.stroke_path(&line, GRID_COLOR, width, dash);
    }
}

fn paint_tick_labels(canvas: &mut MapCanvas, font: &FontVec, graticule: &Graticule, scale: f32) {
    let style = text_style(TICK_FONT_PX * scale, TICK_COLOR, scale);
    let pad = (6.0 * scale).round() as i32;
    let bottom = canvas.height() as i32;

    for &lon in &graticule.meridians {
        let (x, _) = canvas.project(lon, 0.0);
        let text = format_degrees(lon, 'E', 'W');
        let (_, text_height) = measure_text(font, &text, style.size_px);
        let position = (x as i32 + pad, bottom - text_height as i32 - pad);
        draw_text_with_halo(canvas.image_mut(), font, &text, position, &style);
    }
    for &lat in &graticule.parallels {
        let (_, y) = canvas.project(0.0, lat);
        let text = format_degrees(lat, 'N', 'S');
        let (_, text_height) = measure_text(font, &text, style.size_px);
        let position = (pad, y as i32 - text_height as i32 - pad);
        draw_text_with_halo(canvas.image_mut(), font, &text, position, &style);
    }
}

fn paint_city_labels(canvas: &mut MapCanvas, font: &FontVec, cities: &[PlottedCity], scale: f32) {
    let style = text_style(LABEL_FONT_PX * scale, BLACK, scale);
    for city in cities {
        let (x, y) = canvas.project(
            city.coordinates.longitude + LABEL_OFFSET_DEG,
            city.coordinates.latitude + LABEL_OFFSET_DEG,
        );
        // Anchor is bottom-left of the text box.
        let (_, text_height) = measure_text(font, &city.name, style.size_px);
        let position = (x.round() as i32, y.round() as i32 - text_height as i32);
        draw_text_with_halo(canvas.image_mut(), font, &city.name, position, &style);
    }
}

fn with_title_band(map: RgbaImage, font: &FontVec, title: &str, scale: f32) -> RgbaImage {
    let size_px = TITLE_FONT_PX * scale;
    let (text_width, text_height) = measure_text(font, title, size_px);
    let band = (text_height as f32 + size_px).round() as u32;

    let mut image = RgbaImage::from_pixel(map.width(), map.height() + band, WHITE);
    imageops::overlay(&mut image, &map, 0, i64::from(band));

    let x = (map.width() as i32 - text_width as i32).max(0) / 2;
    let y = ((band - text_height) / 2) as i32;
    let style = TextStyle {
        size_px,
        color: BLACK,
        halo: WHITE,
        halo_radius: 0,
    };
    draw_text_with_halo(&mut image, font, title, (x, y), &style);
    image
}

fn text_style(size_px: f32, color: Rgba<u8>, scale: f32) -> TextStyle {
    TextStyle {
        size_px,
        color,
        halo: WHITE,
        halo_radius: (HALO_PX * scale).round().max(1.0) as i32,
    }
}

fn rgba(color: MarkerColor) -> Rgba<u8> {
    let [r, g, b] = color.rgb();
    Rgba([r, g, b, 0xFF])
}
