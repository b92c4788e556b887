//! Map extent fitting.
//!
//! # Invariants
//! - One point: symmetric `SINGLE_CITY_PADDING_DEG` box around it.
//! - Several points: bounding box padded per axis by
//!   `max(span * SPAN_PADDING_RATIO, MIN_PADDING_DEG)`, so clustered or
//!   colinear cities never produce a zero-area extent.
//! - `west < east` and `south < north` for every fitted viewport.

use crate::model::city::Coordinates;

pub const SINGLE_CITY_PADDING_DEG: f64 = 4.0;
pub const SPAN_PADDING_RATIO: f64 = 0.2;
pub const MIN_PADDING_DEG: f64 = 1.5;

/// Geographic rectangle in plate carrée degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub west: f64,
    pub east: f64,
    pub south: f64,
    pub north: f64,
}

impl Viewport {
    /// Fits a viewport around the given points. Returns `None` for no points.
    pub fn fit(points: &[Coordinates]) -> Option<Self> {
        match points {
            [] => None,
            [single] => Some(Self {
                west: single.longitude - SINGLE_CITY_PADDING_DEG,
                east: single.longitude + SINGLE_CITY_PADDING_DEG,
                south: single.latitude - SINGLE_CITY_PADDING_DEG,
                north: single.latitude + SINGLE_CITY_PADDING_DEG,
            }),
            many => {
                let bounds = Self::bounding(many.iter().map(|p| (p.longitude, p.latitude)))?;
                let pad_lon = axis_padding(bounds.lon_span());
                let pad_lat = axis_padding(bounds.lat_span());
                Some(Self {
                    west: bounds.west - pad_lon,
                    east: bounds.east + pad_lon,
                    south: bounds.south - pad_lat,
                    north: bounds.north + pad_lat,
                })
            }
        }
    }

    /// Tight min/max box of `(lon, lat)` pairs, without padding.
    pub fn bounding(points: impl IntoIterator<Item = (f64, f64)>) -> Option<Self> {
        let mut iter = points.into_iter();
        let (lon, lat) = iter.next()?;
        let mut bounds = Self {
            west: lon,
            east: lon,
            south: lat,
            north: lat,
        };
        for (lon, lat) in iter {
            bounds.west = bounds.west.min(lon);
            bounds.east = bounds.east.max(lon);
            bounds.south = bounds.south.min(lat);
            bounds.north = bounds.north.max(lat);
        }
        Some(bounds)
    }

    pub fn lon_span(&self) -> f64 {
        self.east - self.west
    }

    pub fn lat_span(&self) -> f64 {
        self.north - self.south
    }

    pub fn contains(&self, point: &Coordinates) -> bool {
        (self.west..=self.east).contains(&point.longitude)
            && (self.south..=self.north).contains(&point.latitude)
    }

    pub fn intersects(&self, other: &Viewport) -> bool {
        self.west <= other.east
            && other.west <= self.east
            && self.south <= other.north
            && other.south <= self.north
    }
}

fn axis_padding(span: f64) -> f64 {
    (span * SPAN_PADDING_RATIO).max(MIN_PADDING_DEG)
}

#[cfg(test)]
mod tests {
    use super::Viewport;
    use crate::model::city::Coordinates;

    #[test]
    fn empty_input_has_no_viewport() {
        assert_eq!(Viewport::fit(&[]), None);
    }

    #[test]
    fn single_point_gets_fixed_four_degree_padding() {
        let viewport = Viewport::fit(&[Coordinates::new(55.75, 37.62)]).unwrap();
        assert_eq!(viewport.west, 37.62 - 4.0);
        assert_eq!(viewport.east, 37.62 + 4.0);
        assert_eq!(viewport.south, 55.75 - 4.0);
        assert_eq!(viewport.north, 55.75 + 4.0);
    }

    #[test]
    fn two_points_on_equator_pad_by_ratio_and_floor() {
        let viewport = Viewport::fit(&[
            Coordinates::new(0.0, 0.0),
            Coordinates::new(0.0, 10.0),
        ])
        .unwrap();
        assert_eq!(viewport.west, -2.0);
        assert_eq!(viewport.east, 12.0);
        assert_eq!(viewport.south, -1.5);
        assert_eq!(viewport.north, 1.5);
    }

    #[test]
    fn wide_spans_use_twenty_percent_padding() {
        let viewport = Viewport::fit(&[
            Coordinates::new(-20.0, -50.0),
            Coordinates::new(30.0, 50.0),
            Coordinates::new(0.0, 0.0),
        ])
        .unwrap();
        assert!((viewport.west - -70.0).abs() < 1e-9);
        assert!((viewport.east - 70.0).abs() < 1e-9);
        assert!((viewport.south - -30.0).abs() < 1e-9);
        assert!((viewport.north - 40.0).abs() < 1e-9);
    }

    #[test]
    fn identical_points_still_produce_positive_area() {
        let point = Coordinates::new(48.85, 2.35);
        let viewport = Viewport::fit(&[point, point]).unwrap();
        assert!((viewport.lon_span() - 3.0).abs() < 1e-9);
        assert!((viewport.lat_span() - 3.0).abs() < 1e-9);
        assert!(viewport.contains(&point));
    }

    #[test]
    fn intersects_detects_overlap_and_separation() {
        let a = Viewport {
            west: 0.0,
            east: 10.0,
            south: 0.0,
            north: 10.0,
        };
        let b = Viewport {
            west: 5.0,
            east: 15.0,
            south: 5.0,
            north: 15.0,
        };
        let c = Viewport {
            west: 20.0,
            east: 30.0,
            south: 0.0,
            north: 10.0,
        };
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }
}
