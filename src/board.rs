// Reference host: owns a project, its position records and the canvas size.
//
// This is the record lifecycle of the project detail page:
// - positions are created by the initial ring layout or, for new subtasks, by
//   the insertion search
// - drags update x/y only, priority edits update the radius only
// - deleting a subtask deletes its record
// - a canvas resize either relays everything out or clamps what is there

use std::collections::HashSet;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, warn};

use crate::config::{MindmapConfig, ResizePolicy};
use crate::error::{BoardError, Result};
use crate::geometry::{radius_for_priority, CanvasSize};
use crate::host::DiagramHost;
use crate::layout::{clamp_layout, find_insertion_point, initial_layout};
use crate::model::{PositionMap, PositionRecord, Project, Subtask, CENTER_NODE_ID};

#[derive(Debug, Clone)]
pub struct Board {
    project: Project,
    positions: PositionMap,
    canvas: CanvasSize,
    cfg: MindmapConfig,
    rng: StdRng,
    /// Last clicked subtask.
    selected: Option<String>,
    /// Subtask the user asked to edit, waiting for the edit form.
    editing: Option<Subtask>,
}

impl Board {
    /// Lay out `project` on a canvas of `canvas`. `seed` drives the insertion
    /// search for subtasks added later.
    ///
    /// Fails if a subtask uses the project node's id or two subtasks share one.
    pub fn new(project: Project, canvas: CanvasSize, cfg: MindmapConfig, seed: u64) -> Result<Self> {
        check_ids(&project)?;
        let positions = initial_layout(&project.subtasks, canvas, &cfg);
        Ok(Self {
            project,
            positions,
            canvas,
            cfg,
            rng: StdRng::seed_from_u64(seed),
            selected: None,
            editing: None,
        })
    }

    pub fn canvas(&self) -> CanvasSize {
        self.canvas
    }

    pub fn config(&self) -> &MindmapConfig {
        &self.cfg
    }

    pub fn selected(&self) -> Option<&Subtask> {
        self.selected.as_deref().and_then(|id| self.project.subtask(id))
    }

    pub fn take_editing(&mut self) -> Option<Subtask> {
        self.editing.take()
    }

    /// Replace the project and lay it out from scratch. On error the board
    /// is left unchanged.
    pub fn load(&mut self, project: Project) -> Result<()> {
        check_ids(&project)?;
        self.positions = initial_layout(&project.subtasks, self.canvas, &self.cfg);
        self.project = project;
        self.selected = None;
        self.editing = None;
        Ok(())
    }

    /// Replace stored positions wholesale, e.g. from a saved session.
    /// Records for ids that are not subtasks are dropped; subtasks without a
    /// record get one from the insertion search.
    pub fn restore_positions(&mut self, mut positions: PositionMap) {
        positions.retain(|id, _| self.project.subtask(id).is_some());
        self.positions = positions;
        let missing: Vec<String> = self
            .project
            .subtasks
            .iter()
            .filter(|s| !self.positions.contains_key(&s.id))
            .map(|s| s.id.clone())
            .collect();
        for id in missing {
            let record = find_insertion_point(&self.positions, self.canvas, &self.cfg, &mut self.rng);
            self.positions.insert(id, record);
        }
    }

    /// Append a subtask and find it a free spot.
    pub fn add_subtask(&mut self, subtask: Subtask) -> Result<PositionRecord> {
        if subtask.id == CENTER_NODE_ID {
            return Err(BoardError::ReservedId(subtask.id));
        }
        if self.project.subtask(&subtask.id).is_some() {
            return Err(BoardError::DuplicateSubtask(subtask.id));
        }
        let record = find_insertion_point(&self.positions, self.canvas, &self.cfg, &mut self.rng);
        debug!(id = %subtask.id, x = record.x, y = record.y, "subtask added");
        self.positions.insert(subtask.id.clone(), record);
        self.project.subtasks.push(subtask);
        Ok(record)
    }

    /// Replace a subtask's fields. Its position stays; its radius follows
    /// the (possibly new) priority.
    pub fn edit_subtask(&mut self, updated: Subtask) -> Result<()> {
        let slot = self
            .project
            .subtasks
            .iter_mut()
            .find(|s| s.id == updated.id)
            .ok_or_else(|| BoardError::UnknownSubtask(updated.id.clone()))?;

        let radius = radius_for_priority(updated.priority);
        match self.positions.get_mut(&updated.id) {
            Some(record) => record.radius = radius,
            None => {
                let mut record = find_insertion_point(&self.positions, self.canvas, &self.cfg, &mut self.rng);
                record.radius = radius;
                self.positions.insert(updated.id.clone(), record);
            }
        }
        debug!(id = %updated.id, radius, "subtask edited");
        *slot = updated;
        Ok(())
    }

    pub fn delete_subtask(&mut self, id: &str) -> Result<Subtask> {
        let idx = self
            .project
            .subtasks
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| BoardError::UnknownSubtask(id.to_string()))?;
        let removed = self.project.subtasks.remove(idx);
        self.positions.remove(id);
        if self.selected.as_deref() == Some(id) {
            self.selected = None;
        }
        if self.editing.as_ref().is_some_and(|s| s.id == id) {
            self.editing = None;
        }
        debug!(%id, "subtask deleted");
        Ok(removed)
    }

    pub fn resize(&mut self, canvas: CanvasSize) {
        self.canvas = canvas;
        self.positions = match self.cfg.resize_policy {
            ResizePolicy::Relayout => initial_layout(&self.project.subtasks, canvas, &self.cfg),
            ResizePolicy::Clamp => clamp_layout(&self.positions, canvas),
        };
    }
}

fn check_ids(project: &Project) -> Result<()> {
    let mut seen = HashSet::with_capacity(project.subtasks.len());
    for subtask in &project.subtasks {
        if subtask.id == CENTER_NODE_ID {
            return Err(BoardError::ReservedId(subtask.id.clone()));
        }
        if !seen.insert(subtask.id.as_str()) {
            return Err(BoardError::DuplicateSubtask(subtask.id.clone()));
        }
    }
    Ok(())
}

impl DiagramHost for Board {
    fn project(&self) -> &Project {
        &self.project
    }

    fn positions(&self) -> &PositionMap {
        &self.positions
    }

    fn position_changed(&mut self, id: &str, x: f64, y: f64) {
        match self.positions.get_mut(id) {
            Some(record) => {
                record.x = x;
                record.y = y;
            }
            None => warn!(%id, "position change for unknown subtask ignored"),
        }
    }

    fn subtask_clicked(&mut self, subtask: &Subtask) {
        self.selected = Some(subtask.id.clone());
    }

    fn edit_requested(&mut self, subtask: &Subtask) {
        self.editing = Some(subtask.clone());
    }

    fn delete_requested(&mut self, id: &str) {
        if let Err(e) = self.delete_subtask(id) {
            warn!(%id, error = %e, "delete request failed");
        }
    }

    fn canvas_resized(&mut self, size: CanvasSize) {
        self.resize(size);
    }
}
