// Placement of subtask nodes around the project node.
//
// Two entry points:
// - initial_layout: deterministic ring, one slot per subtask in input order
// - find_insertion_point: rejection sampling for one new node, falling back to
//   the canvas center when the canvas is too crowded
//
// Submodules:
// - spatial_grid: clearance checks against already placed circles
//
// All positions produced here are in local diagram space and already clamped
// so the node's circle stays on the canvas.

use std::f64::consts::PI;

use rand::Rng;
use tracing::{debug, warn};

use crate::config::MindmapConfig;
use crate::geometry::{clamp_to_bounds, radius_for_priority, CanvasSize, PointF};
use crate::model::{PositionMap, PositionRecord, Subtask};

pub mod spatial_grid;

use spatial_grid::{Circle, SpatialGrid};

/// Place `subtasks` evenly on a ring around the canvas center.
///
/// Subtask `i` of `n` sits at angle `i * 2π / n` on a ring of radius
/// `min(w, h) / ring_divisor`, then is clamped with its own priority radius.
/// The same input always yields the same map.
pub fn initial_layout(subtasks: &[Subtask], canvas: CanvasSize, cfg: &MindmapConfig) -> PositionMap {
    let mut positions = PositionMap::with_capacity(subtasks.len());
    if subtasks.is_empty() {
        return positions;
    }

    let center = canvas.center();
    let ring = canvas.min_side() / cfg.ring_divisor;
    let n = subtasks.len() as f64;

    for (i, subtask) in subtasks.iter().enumerate() {
        let theta = i as f64 * 2.0 * PI / n;
        let raw = PointF {
            x: center.x + ring * theta.cos(),
            y: center.y + ring * theta.sin(),
        };
        let radius = radius_for_priority(subtask.priority);
        let p = clamp_to_bounds(raw, radius, canvas);
        positions.insert(subtask.id.clone(), PositionRecord::new(p.x, p.y, radius));
    }

    debug!(count = subtasks.len(), ring, "initial ring layout");
    positions
}

/// Find a spot for one new node that keeps clear of every existing record.
///
/// Best effort: after `cfg.insertion_attempts` rejected draws the canvas
/// center is returned even though it may overlap something.
pub fn find_insertion_point<R: Rng>(
    existing: &PositionMap,
    canvas: CanvasSize,
    cfg: &MindmapConfig,
    rng: &mut R,
) -> PositionRecord {
    let radius = radius_for_priority(cfg.insertion_priority);
    let padding = cfg.insertion_padding;

    let max_radius = existing.values().map(|p| p.radius).fold(0.0_f64, f64::max);
    let mut grid = SpatialGrid::new(2.0 * (max_radius + radius + padding));
    for record in existing.values() {
        grid.insert(Circle { center: record.point(), radius: record.radius });
    }

    let span_x = canvas.width - 2.0 * radius;
    let span_y = canvas.height - 2.0 * radius;

    for attempt in 0..cfg.insertion_attempts {
        // An axis narrower than the node resolves to the canvas midpoint.
        let candidate = clamp_to_bounds(
            PointF {
                x: radius + rng.random::<f64>() * span_x,
                y: radius + rng.random::<f64>() * span_y,
            },
            radius,
            canvas,
        );
        if grid.is_clear(candidate, radius, padding, max_radius) {
            debug!(attempt, x = candidate.x, y = candidate.y, "insertion point found");
            return PositionRecord::new(candidate.x, candidate.y, radius);
        }
    }

    let center = canvas.center();
    warn!(
        occupied = existing.len(),
        attempts = cfg.insertion_attempts,
        "no free spot for new node, using canvas center"
    );
    PositionRecord::new(center.x, center.y, radius)
}

/// Pull every record back inside `canvas`, keeping radii.
pub fn clamp_layout(positions: &PositionMap, canvas: CanvasSize) -> PositionMap {
    positions
        .iter()
        .map(|(id, record)| {
            let p = clamp_to_bounds(record.point(), record.radius, canvas);
            (id.clone(), PositionRecord::new(p.x, p.y, record.radius))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Priority;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn medium(id: &str) -> Subtask {
        Subtask::new(id, format!("task {id}"), Priority::Medium)
    }

    #[test]
    fn test_empty_layout() {
        let cfg = MindmapConfig::default();
        let positions = initial_layout(&[], CanvasSize::new(800.0, 500.0), &cfg);
        assert!(positions.is_empty());
    }

    #[test]
    fn test_three_medium_nodes_on_ring() {
        let cfg = MindmapConfig::default();
        let canvas = CanvasSize::new(800.0, 500.0);
        let subtasks = vec![medium("1"), medium("2"), medium("3")];
        let positions = initial_layout(&subtasks, canvas, &cfg);

        let ring = 500.0 / 3.0;
        for (i, id) in ["1", "2", "3"].iter().enumerate() {
            let theta = (i as f64) * 120.0_f64.to_radians();
            let p = positions[*id];
            assert!((p.x - (400.0 + ring * theta.cos())).abs() < 1e-9);
            assert!((p.y - (250.0 + ring * theta.sin())).abs() < 1e-9);
            assert_eq!(p.radius, 55.0);
            assert!(p.x >= 55.0 && p.x <= 745.0);
            assert!(p.y >= 55.0 && p.y <= 445.0);
        }
    }

    #[test]
    fn test_layout_clamps_with_priority_radius() {
        let cfg = MindmapConfig::default();
        // Ring radius 100 on a 300x300 canvas pushes the first node to x=250,
        // which a high priority node (r=75) cannot reach.
        let canvas = CanvasSize::new(300.0, 300.0);
        let subtasks = vec![Subtask::new("a", "a", Priority::High)];
        let positions = initial_layout(&subtasks, canvas, &cfg);
        assert_eq!(positions["a"], PositionRecord::new(225.0, 150.0, 75.0));
    }

    #[test]
    fn test_insertion_avoids_existing() {
        let cfg = MindmapConfig::default();
        let canvas = CanvasSize::new(800.0, 500.0);
        let existing = initial_layout(&[medium("1"), medium("2")], canvas, &cfg);
        let mut rng = StdRng::seed_from_u64(7);

        let record = find_insertion_point(&existing, canvas, &cfg, &mut rng);
        assert_eq!(record.radius, 55.0);
        for other in existing.values() {
            let d = crate::geometry::distance(record.point(), other.point());
            assert!(d >= other.radius + 55.0 + 20.0);
        }
    }

    #[test]
    fn test_insertion_saturated_falls_back_to_center() {
        let cfg = MindmapConfig::default();
        let canvas = CanvasSize::new(800.0, 500.0);
        let mut existing = PositionMap::new();
        existing.insert("huge".to_string(), PositionRecord::new(400.0, 250.0, 1000.0));
        let mut rng = StdRng::seed_from_u64(1);

        let record = find_insertion_point(&existing, canvas, &cfg, &mut rng);
        assert_eq!(record, PositionRecord::new(400.0, 250.0, 55.0));
    }

    #[test]
    fn test_clamp_layout() {
        let mut positions = PositionMap::new();
        positions.insert("a".to_string(), PositionRecord::new(700.0, 450.0, 40.0));
        positions.insert("b".to_string(), PositionRecord::new(100.0, 100.0, 40.0));

        let clamped = clamp_layout(&positions, CanvasSize::new(400.0, 300.0));
        assert_eq!(clamped["a"], PositionRecord::new(360.0, 260.0, 40.0));
        assert_eq!(clamped["b"], positions["b"]);
    }

    #[test]
    fn test_insertion_with_huge_existing_radius() {
        let cfg = MindmapConfig::default();
        let mut existing = PositionMap::new();
        existing.insert("big".into(), PositionRecord::new(400.0, 250.0, 1e308));
        let mut rng = StdRng::seed_from_u64(9);
        let record = find_insertion_point(&existing, CanvasSize::new(800.0, 500.0), &cfg, &mut rng);
        assert_eq!(record, PositionRecord::new(400.0, 250.0, 55.0));
    }

    #[test]
    fn test_insertion_on_narrow_canvas_uses_midpoint() {
        let cfg = MindmapConfig::default();
        let mut rng = StdRng::seed_from_u64(5);

        let record = find_insertion_point(&PositionMap::new(), CanvasSize::new(0.0, 0.0), &cfg, &mut rng);
        assert_eq!(record, PositionRecord::new(0.0, 0.0, 55.0));

        for _ in 0..20 {
            let record = find_insertion_point(&PositionMap::new(), CanvasSize::new(60.0, 500.0), &cfg, &mut rng);
            assert_eq!(record.x, 30.0);
            assert!((55.0..=445.0).contains(&record.y));
        }
    }
}
