//! Raster drawing primitives over a plate carrée viewport.
//!
//! # Invariants
//! - Pixel `(0, 0)` is the north-west corner of the viewport.
//! - Degrees map to pixels with the same scale on both axes, except when a
//!   side was raised to the renderer minimum.
//! - Off-canvas geometry is culled or clipped; drawing never panics on it.

use crate::render::basemap::Vertex;
use crate::render::viewport::Viewport;
use ab_glyph::{FontVec, PxScale};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_line_segment_mut, draw_polygon_mut, draw_text_mut, text_size,
};
use imageproc::point::Point;

/// Projected coordinates are clamped here before `i32` conversion.
const MAX_PROJECTED_PX: f32 = 1.0e6;

pub(crate) struct MarkerStyle {
    pub radius: f32,
    pub rim_width: f32,
    pub fill: Rgba<u8>,
    pub rim: Rgba<u8>,
}

pub(crate) struct TextStyle {
    pub size_px: f32,
    pub color: Rgba<u8>,
    pub halo: Rgba<u8>,
    pub halo_radius: i32,
}

pub(crate) struct MapCanvas {
    image: RgbaImage,
    viewport: Viewport,
    px_per_lon: f64,
    px_per_lat: f64,
}

impl MapCanvas {
    pub fn new(viewport: Viewport, width: u32, height: u32, background: Rgba<u8>) -> Self {
        Self {
            image: RgbaImage::from_pixel(width, height, background),
            px_per_lon: f64::from(width) / viewport.lon_span(),
            px_per_lat: f64::from(height) / viewport.lat_span(),
            viewport,
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn project(&self, lon: f64, lat: f64) -> (f32, f32) {
        let x = (lon - self.viewport.west) * self.px_per_lon;
        let y = (self.viewport.north - lat) * self.px_per_lat;
        (clamp_px(x), clamp_px(y))
    }

    /// Fills the exterior ring, then paints holes with `hole_fill`.
    pub fn fill_area(&mut self, rings: &[Vec<Vertex>], fill: Rgba<u8>, hole_fill: Rgba<u8>) {
        for (index, ring) in rings.iter().enumerate() {
            let polygon = self.polygon_points(ring);
            if polygon.len() < 3 || self.polygon_outside(&polygon) {
                continue;
            }
            let color = if index == 0 { fill } else { hole_fill };
            draw_polygon_mut(&mut self.image, &polygon, color);
        }
    }

    pub fn stroke_ring(&mut self, ring: &[Vertex], color: Rgba<u8>, width: f32) {
        let mut closed = ring.to_vec();
        if let (Some(first), Some(last)) = (ring.first(), ring.last()) {
            if first != last {
                closed.push(*first);
            }
        }
        self.stroke_path(&closed, color, width, None);
    }

    pub fn stroke_path(
        &mut self,
        points: &[Vertex],
        color: Rgba<u8>,
        width: f32,
        dash: Option<(f32, f32)>,
    ) {
        let projected = points
            .iter()
            .map(|&(lon, lat)| self.project(lon, lat))
            .collect::<Vec<_>>();

        let segments = match dash {
            Some((on, off)) => dash_segments(&projected, on, off),
            None => projected
                .windows(2)
                .map(|pair| (pair[0], pair[1]))
                .collect(),
        };
        for (start, end) in segments {
            self.thick_segment(start, end, color, width);
        }
    }

    /// Filled disc with a contrasting rim.
    pub fn draw_marker(&mut self, lon: f64, lat: f64, style: &MarkerStyle) {
        let (x, y) = self.project(lon, lat);
        let center = (x.round() as i32, y.round() as i32);
        let outer = (style.radius + style.rim_width).round() as i32;
        draw_filled_circle_mut(&mut self.image, center, outer, style.rim);
        draw_filled_circle_mut(&mut self.image, center, style.radius.round() as i32, style.fill);
    }

    pub fn image_mut(&mut self) -> &mut RgbaImage {
        &mut self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    fn polygon_points(&self, ring: &[Vertex]) -> Vec<Point<i32>> {
        let mut points: Vec<Point<i32>> = Vec::with_capacity(ring.len());
        for &(lon, lat) in ring {
            let (x, y) = self.project(lon, lat);
            let point = Point::new(x.round() as i32, y.round() as i32);
            if points.last() != Some(&point) {
                points.push(point);
            }
        }
        // imageproc rejects polygons whose first and last points coincide.
        while points.len() > 1 && points.first() == points.last() {
            points.pop();
        }
        points
    }

    fn polygon_outside(&self, polygon: &[Point<i32>]) -> bool {
        let (width, height) = (self.width() as i32, self.height() as i32);
        polygon.iter().all(|p| p.x < 0)
            || polygon.iter().all(|p| p.x >= width)
            || polygon.iter().all(|p| p.y < 0)
            || polygon.iter().all(|p| p.y >= height)
    }

    fn thick_segment(&mut self, start: (f32, f32), end: (f32, f32), color: Rgba<u8>, width: f32) {
        let margin = width.max(1.0);
        if segment_outside(start, end, self.width() as f32, self.height() as f32, margin) {
            return;
        }

        if width <= 1.0 {
            draw_line_segment_mut(&mut self.image, start, end, color);
            return;
        }

        let dx = end.0 - start.0;
        let dy = end.1 - start.1;
        let length = (dx * dx + dy * dy).sqrt();
        if length < 0.001 {
            let radius = (width / 2.0).round().max(1.0) as i32;
            draw_filled_circle_mut(
                &mut self.image,
                (start.0 as i32, start.1 as i32),
                radius,
                color,
            );
            return;
        }

        let (nx, ny) = (-dy / length, dx / length);
        let strands = width.round().max(2.0) as i32;
        let half = (strands - 1) as f32 / 2.0;
        for strand in 0..strands {
            let offset = strand as f32 - half;
            draw_line_segment_mut(
                &mut self.image,
                (start.0 + nx * offset, start.1 + ny * offset),
                (end.0 + nx * offset, end.1 + ny * offset),
                color,
            );
        }
    }
}

/// Draws `text` with its top-left corner at `(x, y)`, surrounded by a halo.
pub(crate) fn draw_text_with_halo(
    image: &mut RgbaImage,
    font: &FontVec,
    text: &str,
    position: (i32, i32),
    style: &TextStyle,
) {
    let scale = PxScale::from(style.size_px);
    let (x, y) = position;
    let radius = style.halo_radius;
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if (dx != 0 || dy != 0) && dx * dx + dy * dy <= radius * radius {
                draw_text_mut(image, style.halo, x + dx, y + dy, scale, font, text);
            }
        }
    }
    draw_text_mut(image, style.color, x, y, scale, font, text);
}

pub(crate) fn measure_text(font: &FontVec, text: &str, size_px: f32) -> (u32, u32) {
    text_size(PxScale::from(size_px), font, text)
}

fn clamp_px(value: f64) -> f32 {
    (value as f32).clamp(-MAX_PROJECTED_PX, MAX_PROJECTED_PX)
}

fn segment_outside(
    start: (f32, f32),
    end: (f32, f32),
    width: f32,
    height: f32,
    margin: f32,
) -> bool {
    (start.0 < -margin && end.0 < -margin)
        || (start.0 > width + margin && end.0 > width + margin)
        || (start.1 < -margin && end.1 < -margin)
        || (start.1 > height + margin && end.1 > height + margin)
}

/// Splits a projected polyline into visible dash segments.
pub(crate) fn dash_segments(
    points: &[(f32, f32)],
    on: f32,
    off: f32,
) -> Vec<((f32, f32), (f32, f32))> {
    let mut segments = Vec::new();
    if on <= 0.0 {
        return segments;
    }

    let mut drawing = true;
    let mut remaining = on;
    for pair in points.windows(2) {
        let (mut x, mut y) = pair[0];
        let (ex, ey) = pair[1];
        let mut left = ((ex - x).powi(2) + (ey - y).powi(2)).sqrt();
        if left <= f32::EPSILON {
            continue;
        }
        let (ux, uy) = ((ex - x) / left, (ey - y) / left);

        while left > 0.0 {
            let step = remaining.min(left);
            let (nx, ny) = (x + ux * step, y + uy * step);
            if drawing {
                segments.push(((x, y), (nx, ny)));
            }
            x = nx;
            y = ny;
            left -= step;
            remaining -= step;
            if remaining <= f32::EPSILON {
                drawing = !drawing;
                remaining = if drawing { on } else { off.max(f32::EPSILON) };
            }
        }
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::{dash_segments, MapCanvas};
    use crate::render::viewport::Viewport;
    use image::Rgba;

    fn canvas() -> MapCanvas {
        MapCanvas::new(
            Viewport {
                west: -2.0,
                east: 12.0,
                south: -1.5,
                north: 1.5,
            },
            1400,
            300,
            Rgba([255, 255, 255, 255]),
        )
    }

    #[test]
    fn project_maps_viewport_corners_to_image_corners() {
        let canvas = canvas();
        assert_eq!(canvas.project(-2.0, 1.5), (0.0, 0.0));
        assert_eq!(canvas.project(12.0, -1.5), (1400.0, 300.0));
        assert_eq!(canvas.project(0.0, 0.0), (200.0, 150.0));
    }

    #[test]
    fn dashes_alternate_on_and_off() {
        let segments = dash_segments(&[(0.0, 0.0), (10.0, 0.0)], 2.0, 3.0);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0], ((0.0, 0.0), (2.0, 0.0)));
        assert_eq!(segments[1], ((5.0, 0.0), (7.0, 0.0)));
    }

    #[test]
    fn closed_rings_fill_without_panicking() {
        let mut canvas = canvas();
        let ring = vec![(0.0, 0.0), (5.0, 0.0), (5.0, 1.0), (0.0, 0.0)];
        canvas.fill_area(&[ring], Rgba([1, 2, 3, 255]), Rgba([9, 9, 9, 255]));
        assert_eq!(canvas.image_mut().get_pixel(400, 130), &Rgba([1, 2, 3, 255]));
    }

    #[test]
    fn off_canvas_geometry_is_ignored() {
        let mut canvas = canvas();
        canvas.stroke_path(
            &[(100.0, 50.0), (120.0, 60.0)],
            Rgba([0, 0, 0, 255]),
            3.0,
            None,
        );
        canvas.fill_area(
            &[vec![(100.0, 50.0), (120.0, 50.0), (120.0, 60.0)]],
            Rgba([0, 0, 0, 255]),
            Rgba([0, 0, 0, 255]),
        );
        assert!(canvas
            .into_image()
            .pixels()
            .all(|pixel| *pixel == Rgba([255, 255, 255, 255])));
    }
}
