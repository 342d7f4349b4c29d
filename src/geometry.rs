// Geometry helpers shared by placement, derivation and dragging.
//
// Everything here is pure. Coordinates are f64 pixels; callers decide whether a
// point is in local diagram space or screen space.

use serde::{Deserialize, Serialize};

use crate::model::Priority;

#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PointF {
    pub x: f64,
    pub y: f64,
}

impl PointF {
    pub const ORIGIN: PointF = PointF { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset(self, by: PointF) -> PointF {
        PointF { x: self.x + by.x, y: self.y + by.y }
    }

    pub fn minus(self, other: PointF) -> PointF {
        PointF { x: self.x - other.x, y: self.y - other.y }
    }
}

/// Pixel size of the rendering surface.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: f64,
    pub height: f64,
}

impl CanvasSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> PointF {
        PointF { x: self.width / 2.0, y: self.height / 2.0 }
    }

    pub fn min_side(&self) -> f64 {
        self.width.min(self.height)
    }
}

/// Node radius for a priority: high 75, medium 55, low 40.
pub fn radius_for_priority(priority: Priority) -> f64 {
    match priority {
        Priority::High => 75.0,
        Priority::Medium => 55.0,
        Priority::Low => 40.0,
    }
}

pub fn distance(a: PointF, b: PointF) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    (dx * dx + dy * dy).sqrt()
}

/// Angle of the vector a→b in radians.
pub fn angle(a: PointF, b: PointF) -> f64 {
    (b.y - a.y).atan2(b.x - a.x)
}

/// Angle of the vector a→b in degrees, as used for line rotation.
pub fn angle_degrees(a: PointF, b: PointF) -> f64 {
    angle(a, b) * (180.0 / std::f64::consts::PI)
}

/// Clamp `value` into `[min, max]`.
///
/// Unlike `f64::clamp` this never panics: an inverted interval (`min > max`)
/// resolves to its midpoint.
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    if min > max {
        return (min + max) / 2.0;
    }
    value.max(min).min(max)
}

/// Keep a circle of `radius` centered at `point` inside the canvas.
///
/// On a canvas narrower than `2 * radius` the axis resolves to the middle of
/// the canvas, so a position is defined even before the first layout pass.
pub fn clamp_to_bounds(point: PointF, radius: f64, canvas: CanvasSize) -> PointF {
    PointF {
        x: clamp(point.x, radius, canvas.width - radius),
        y: clamp(point.y, radius, canvas.height - radius),
    }
}

/// A straight connector, positioned at its origin and rotated about it.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct EdgeLine {
    pub x: f64,
    pub y: f64,
    pub length: f64,
    /// Rotation in degrees, clockwise in screen space.
    pub angle: f64,
}

pub fn edge_line(from: PointF, to: PointF) -> EdgeLine {
    EdgeLine {
        x: from.x,
        y: from.y,
        length: distance(from, to),
        angle: angle_degrees(from, to),
    }
}
