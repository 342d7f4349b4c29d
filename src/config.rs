use serde::Deserialize;

use crate::model::{PositionRecord, Priority};

/// What the host does with stored positions when the canvas changes size.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizePolicy {
    /// Recompute the ring layout for the new size (drops dragged positions).
    #[default]
    Relayout,
    /// Keep positions, pull any that fall outside back into the canvas.
    Clamp,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MindmapConfig {
    /// Radius of the project node.
    pub center_radius: f64,
    /// Extra clearance between a new node and existing ones.
    pub insertion_padding: f64,
    /// Random draws before giving up and using the canvas center.
    pub insertion_attempts: usize,
    /// Priority used to size newly inserted nodes.
    pub insertion_priority: Priority,
    /// Ring radius for the initial layout is `min(w, h) / ring_divisor`.
    pub ring_divisor: f64,
    /// Used for a subtask whose position record has not been created yet.
    pub fallback: PositionRecord,
    pub resize_policy: ResizePolicy,
}

impl Default for MindmapConfig {
    fn default() -> Self {
        Self {
            center_radius: 90.0,
            insertion_padding: 20.0,
            insertion_attempts: 100,
            insertion_priority: Priority::Medium,
            ring_divisor: 3.0,
            fallback: PositionRecord { x: 400.0, y: 250.0, radius: 55.0 },
            resize_policy: ResizePolicy::Relayout,
        }
    }
}
