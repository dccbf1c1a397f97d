//! Geometry primitives shared across the parser stages (§4.1).

use std::f64::consts::PI;

/// A 2D point, always in millimetres, Y-down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn distance(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Convert a center/start/end/direction arc description into a start/mid/end
/// representation. `clockwise` selects which lobe of the circle the arc
/// sweeps through.
///
/// The returned midpoint always lies on the swept arc, never the
/// complementary lobe: angles are adjusted so the sweep direction matches
/// `clockwise` before averaging start/end to find the midpoint angle.
pub fn arc_center_to_mid(start: Point, end: Point, center: Point, clockwise: bool) -> Point {
    let a_start = (start.y - center.y).atan2(start.x - center.x);
    let mut a_end = (end.y - center.y).atan2(end.x - center.x);

    if clockwise {
        if a_end >= a_start {
            a_end -= 2.0 * PI;
        }
    } else if a_end <= a_start {
        a_end += 2.0 * PI;
    }

    let a_mid = (a_start + a_end) / 2.0;
    let radius = start.distance(&center);

    Point::new(center.x + radius * a_mid.cos(), center.y + radius * a_mid.sin())
}
