//! Output types for the rendering layer.
//!
//! These structs are serialized to JSON and sent to the frontend for drawing
//! the mindmap. They are rebuilt from scratch on every derivation.

use serde::Serialize;

use crate::geometry::{edge_line, EdgeLine, PointF};
use crate::model::{Priority, Subtask};

/// A node ready to draw.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeOutput {
    pub id: String,
    pub label: String,
    /// Stored position in local diagram space.
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    /// Where the node is drawn: drag-provisional (or stored) position plus pan.
    pub screen: PointF,
    pub is_center: bool,
    pub priority: Priority,
    pub progress: u8,
    /// The subtask behind a satellite node; `None` for the project node.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Subtask>,
}

/// A connector from the project node to one subtask node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EdgeOutput {
    pub id: String,
    pub from: String,
    pub to: String,
}

/// Nodes (project node first) and edges, in subtask order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagramOutput {
    pub nodes: Vec<NodeOutput>,
    pub edges: Vec<EdgeOutput>,
}

impl DiagramOutput {
    pub fn node(&self, id: &str) -> Option<&NodeOutput> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn center(&self) -> Option<&NodeOutput> {
        self.nodes.iter().find(|n| n.is_center)
    }

    /// Screen-space line for an edge, or `None` if an endpoint is missing.
    pub fn edge_line(&self, edge: &EdgeOutput) -> Option<EdgeLine> {
        let from = self.node(&edge.from)?;
        let to = self.node(&edge.to)?;
        Some(edge_line(from.screen, to.screen))
    }

    pub fn edge_lines(&self) -> Vec<EdgeLine> {
        self.edges.iter().filter_map(|e| self.edge_line(e)).collect()
    }
}
