// Derivation of drawable nodes and edges from host state.
//
// Nothing here is cached. The derivation is cheap (linear in the number of
// subtasks) and is meant to be rerun on every pointer move.

use std::collections::HashMap;

use tracing::trace;

use crate::config::MindmapConfig;
use crate::geometry::{distance, CanvasSize, PointF};
use crate::model::{PositionMap, Project, CENTER_NODE_ID};
use crate::output::{DiagramOutput, EdgeOutput, NodeOutput};

/// Everything a derivation reads. All borrowed; nothing is written back.
#[derive(Debug, Clone, Copy)]
pub struct DiagramInput<'a> {
    pub project: &'a Project,
    pub positions: &'a PositionMap,
    pub canvas: CanvasSize,
    pub pan: PointF,
    /// Provisional positions of nodes being dragged, local space.
    pub drag: &'a HashMap<String, PointF>,
    pub cfg: &'a MindmapConfig,
}

pub fn derive_diagram(input: &DiagramInput<'_>) -> DiagramOutput {
    let project = input.project;
    let mut nodes = Vec::with_capacity(project.subtasks.len() + 1);

    let center = input.canvas.center();
    nodes.push(NodeOutput {
        id: CENTER_NODE_ID.to_string(),
        label: project.title.clone(),
        x: center.x,
        y: center.y,
        radius: input.cfg.center_radius,
        screen: center.offset(input.pan),
        is_center: true,
        priority: project.priority,
        progress: project.progress.min(100),
        payload: None,
    });

    for subtask in &project.subtasks {
        let record = match input.positions.get(&subtask.id) {
            Some(record) => *record,
            None => {
                trace!(id = %subtask.id, "no position record, using fallback");
                input.cfg.fallback
            }
        };
        let base = input.drag.get(&subtask.id).copied().unwrap_or(record.point());
        nodes.push(NodeOutput {
            id: subtask.id.clone(),
            label: subtask.title.clone(),
            x: record.x,
            y: record.y,
            radius: record.radius,
            screen: base.offset(input.pan),
            is_center: false,
            priority: subtask.priority,
            progress: subtask.progress.min(100),
            payload: Some(subtask.clone()),
        });
    }

    let edges = project
        .subtasks
        .iter()
        .map(|s| EdgeOutput {
            id: format!("edge-{}", s.id),
            from: CENTER_NODE_ID.to_string(),
            to: s.id.clone(),
        })
        .collect();

    DiagramOutput { nodes, edges }
}

/// What a pointer-down landed on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointerTarget {
    Background,
    Center,
    Subtask(String),
}

/// Resolve the top-most node under a screen point.
///
/// Nodes later in the list are drawn on top, so they are tested first.
pub fn hit_test(nodes: &[NodeOutput], screen: PointF) -> PointerTarget {
    for node in nodes.iter().rev() {
        if distance(screen, node.screen) <= node.radius {
            return if node.is_center {
                PointerTarget::Center
            } else {
                PointerTarget::Subtask(node.id.clone())
            };
        }
    }
    PointerTarget::Background
}
