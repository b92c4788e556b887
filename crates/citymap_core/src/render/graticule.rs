//! Graticule line placement.

use crate::render::viewport::Viewport;

const NICE_STEPS: [f64; 9] = [0.5, 1.0, 2.0, 2.5, 5.0, 10.0, 15.0, 30.0, 60.0];
const TARGET_LINES: f64 = 6.0;

/// Gridline positions for one viewport, in degrees.
#[derive(Debug, Clone, PartialEq)]
pub struct Graticule {
    pub step: f64,
    pub meridians: Vec<f64>,
    pub parallels: Vec<f64>,
}

impl Graticule {
    pub fn for_viewport(viewport: &Viewport) -> Self {
        let step = nice_step(viewport.lon_span().max(viewport.lat_span()));
        Self {
            step,
            meridians: multiples_within(viewport.west, viewport.east, step),
            parallels: multiples_within(viewport.south, viewport.north, step),
        }
    }
}

/// Smallest palette step giving at most `TARGET_LINES` lines over `span`.
pub fn nice_step(span: f64) -> f64 {
    NICE_STEPS
        .iter()
        .copied()
        .find(|step| span / step <= TARGET_LINES)
        .unwrap_or(NICE_STEPS[NICE_STEPS.len() - 1])
}

fn multiples_within(start: f64, end: f64, step: f64) -> Vec<f64> {
    let first = (start / step).ceil() as i64;
    let last = (end / step).floor() as i64;
    (first..=last).map(|k| k as f64 * step).collect()
}

/// Formats a gridline label such as `12.5°E` or `40°S`.
pub fn format_degrees(value: f64, positive: char, negative: char) -> String {
    let hemisphere = if value > 0.0 {
        Some(positive)
    } else if value < 0.0 {
        Some(negative)
    } else {
        None
    };
    let magnitude = value.abs();
    let number = if magnitude.fract() == 0.0 {
        format!("{magnitude:.0}")
    } else {
        format!("{magnitude:.1}")
    };
    match hemisphere {
        Some(letter) => format!("{number}°{letter}"),
        None => format!("{number}°"),
    }
}

#[cfg(test)]
mod tests {
    use super::{format_degrees, nice_step, Graticule};
    use crate::render::viewport::Viewport;

    #[test]
    fn nice_step_grows_with_span() {
        assert_eq!(nice_step(3.0), 0.5);
        assert_eq!(nice_step(8.0), 2.0);
        assert_eq!(nice_step(100.0), 30.0);
        assert_eq!(nice_step(1000.0), 60.0);
    }

    #[test]
    fn lines_are_multiples_of_step_inside_viewport() {
        let graticule = Graticule::for_viewport(&Viewport {
            west: -2.0,
            east: 12.0,
            south: -1.5,
            north: 1.5,
        });
        assert_eq!(graticule.step, 2.5);
        assert_eq!(graticule.meridians, vec![0.0, 2.5, 5.0, 7.5, 10.0]);
        assert_eq!(graticule.parallels, vec![0.0]);
    }

    #[test]
    fn degree_labels_carry_hemisphere() {
        assert_eq!(format_degrees(12.5, 'E', 'W'), "12.5°E");
        assert_eq!(format_degrees(-40.0, 'N', 'S'), "40°S");
        assert_eq!(format_degrees(0.0, 'E', 'W'), "0°");
    }
}
