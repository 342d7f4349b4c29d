// Spatial hash grid for circle clearance queries.
//
// Occupied circles are bucketed by the cells their bounding boxes touch, so a
// candidate is only compared against circles in nearby cells. Circles or
// queries spanning more than MAX_CELL_SPAN cells per axis, and grids without a
// usable cell size, fall back to scanning every circle.

use std::collections::{HashMap, HashSet};

use crate::geometry::{distance, PointF};

/// Largest per-axis cell span that is bucketed.
const MAX_CELL_SPAN: f64 = 64.0;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Circle {
    pub center: PointF,
    pub radius: f64,
}

/// A spatial hash grid of occupied circles.
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    /// Size of each cell, or `None` when every query is a full scan.
    cell_size: Option<f64>,
    /// Map from cell coordinates to indices into `circles`.
    cells: HashMap<(i64, i64), Vec<usize>>,
    /// Circles too large to bucket; checked by every query.
    oversized: Vec<usize>,
    circles: Vec<Circle>,
}

impl SpatialGrid {
    /// Create a new grid. Cell size should be at least the diameter of the
    /// largest query, so a query touches no more than four cells.
    pub fn new(cell_size: f64) -> Self {
        let cell_size = (cell_size.is_finite() && cell_size > 0.0).then(|| cell_size.max(1.0));
        Self {
            cell_size,
            cells: HashMap::new(),
            oversized: Vec::new(),
            circles: Vec::new(),
        }
    }

    /// Cells overlapped by the square of half-width `reach` around `center`,
    /// or `None` if that square is too large (or not finite) to enumerate.
    fn cell_range(&self, center: PointF, reach: f64) -> Option<Vec<(i64, i64)>> {
        let size = self.cell_size?;
        let min_x = ((center.x - reach) / size).floor();
        let max_x = ((center.x + reach) / size).floor();
        let min_y = ((center.y - reach) / size).floor();
        let max_y = ((center.y + reach) / size).floor();
        // Negated so NaN spans are rejected too.
        if !(max_x - min_x <= MAX_CELL_SPAN && max_y - min_y <= MAX_CELL_SPAN) {
            return None;
        }

        let mut cells = Vec::new();
        for cx in min_x as i64..=max_x as i64 {
            for cy in min_y as i64..=max_y as i64 {
                cells.push((cx, cy));
            }
        }
        Some(cells)
    }

    pub fn insert(&mut self, circle: Circle) {
        let idx = self.circles.len();
        self.circles.push(circle);
        match self.cell_range(circle.center, circle.radius) {
            Some(cells) => {
                for cell in cells {
                    self.cells.entry(cell).or_default().push(idx);
                }
            }
            None => self.oversized.push(idx),
        }
    }

    /// Circles whose bounding boxes share a cell with the query square.
    /// May include false positives; callers do the exact distance check.
    pub fn query(&self, center: PointF, reach: f64) -> Vec<Circle> {
        let Some(cells) = self.cell_range(center, reach) else {
            return self.circles.clone();
        };
        let mut seen = HashSet::new();
        let mut result: Vec<Circle> = self.oversized.iter().map(|&idx| self.circles[idx]).collect();
        for cell in cells {
            if let Some(indices) = self.cells.get(&cell) {
                for &idx in indices {
                    if seen.insert(idx) {
                        result.push(self.circles[idx]);
                    }
                }
            }
        }
        result
    }

    /// True when a circle of `radius` at `center` keeps at least `padding`
    /// between its edge and every stored circle.
    ///
    /// `max_radius` must be at least the largest stored radius.
    pub fn is_clear(&self, center: PointF, radius: f64, padding: f64, max_radius: f64) -> bool {
        let reach = radius + padding + max_radius;
        self.query(center, reach)
            .iter()
            .all(|c| distance(center, c.center) >= c.radius + radius + padding)
    }

    pub fn len(&self) -> usize {
        self.circles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.circles.is_empty()
    }
}
