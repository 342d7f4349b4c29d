//! The seam between the mindmap engine and whoever owns the records.
//!
//! The engine only reads project data and positions through this trait and
//! proposes changes through its notification methods. The host decides what
//! to store.

use crate::geometry::CanvasSize;
use crate::model::{PositionMap, Project, Subtask};

pub trait DiagramHost {
    fn project(&self) -> &Project;
    fn positions(&self) -> &PositionMap;

    /// A dragged node moved. Coordinates are local and already clamped.
    fn position_changed(&mut self, id: &str, x: f64, y: f64);

    fn subtask_clicked(&mut self, _subtask: &Subtask) {}
    fn edit_requested(&mut self, _subtask: &Subtask) {}
    fn delete_requested(&mut self, _id: &str) {}
    fn canvas_resized(&mut self, _size: CanvasSize) {}
}
