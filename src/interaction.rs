//! Pointer interaction: panning the mindmap and dragging subtask nodes.
//!
//! [`InteractionController`] is a small state machine fed with raw pointer
//! events (positions relative to the canvas). It owns only transient view
//! state; stored positions belong to the [`DiagramHost`] and are changed by
//! notifying it.
//!
//! # State Machine
//!
//! ```text
//! Idle --down(background)--> Panning --move--> Panning --up--> Idle
//! Idle --down(subtask)-----> DraggingNode --move--> DraggingNode --up--> Idle
//! ```
//!
//! A pointer-down on the project node does nothing.
//!
//! # Invariants
//!
//! 1. Document-wide move/up listeners are held only while a gesture is
//!    active, and released on the transition back to `Idle`.
//! 2. Drag positions are local (pan already removed) and clamped so the
//!    node's circle stays on the canvas.
//! 3. Events that arrive in a state that does not expect them are ignored.
//! 4. A press and release on a subtask with no movement in between is a click;
//!    a drag is never also reported as a click.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::config::MindmapConfig;
use crate::diagram::{derive_diagram, hit_test, DiagramInput, PointerTarget};
use crate::geometry::{clamp_to_bounds, CanvasSize, PointF};
use crate::host::DiagramHost;
use crate::output::DiagramOutput;
use crate::subscription::Subscription;

/// Which gesture a document-wide listener registration serves.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Gesture {
    Pan,
    NodeDrag,
}

/// Source of pointer move/up events that keeps delivering after the pointer
/// leaves the canvas (the document, in a browser).
///
/// The returned subscription removes the listeners when released.
pub trait GlobalPointer {
    fn subscribe(&mut self, gesture: Gesture) -> Subscription;
}

#[derive(Debug, Clone, PartialEq)]
pub enum GestureState {
    Idle,
    Panning {
        /// Last pointer position seen, screen space.
        anchor: PointF,
    },
    DraggingNode {
        id: String,
        /// Pointer position at press time.
        origin: PointF,
        moved: bool,
    },
}

/// Cursor to show over the canvas.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Cursor {
    Grab,
    Grabbing,
}

impl Cursor {
    pub fn as_css(self) -> &'static str {
        match self {
            Cursor::Grab => "grab",
            Cursor::Grabbing => "grabbing",
        }
    }
}

#[derive(Debug)]
pub struct InteractionController {
    cfg: MindmapConfig,
    state: GestureState,
    pan: PointF,
    drag_positions: HashMap<String, PointF>,
    canvas: CanvasSize,
    listeners: Option<Subscription>,
}

impl InteractionController {
    pub fn new(cfg: MindmapConfig) -> Self {
        Self {
            cfg,
            state: GestureState::Idle,
            pan: PointF::ORIGIN,
            drag_positions: HashMap::new(),
            canvas: CanvasSize::default(),
            listeners: None,
        }
    }

    pub fn state(&self) -> &GestureState {
        &self.state
    }

    pub fn pan_offset(&self) -> PointF {
        self.pan
    }

    pub fn drag_positions(&self) -> &HashMap<String, PointF> {
        &self.drag_positions
    }

    pub fn canvas_size(&self) -> CanvasSize {
        self.canvas
    }

    pub fn config(&self) -> &MindmapConfig {
        &self.cfg
    }

    pub fn has_global_listeners(&self) -> bool {
        self.listeners.is_some()
    }

    pub fn cursor(&self) -> Cursor {
        match self.state {
            GestureState::Panning { .. } => Cursor::Grabbing,
            _ => Cursor::Grab,
        }
    }

    /// Derive the drawable diagram for the host's current records.
    pub fn render<H: DiagramHost + ?Sized>(&self, host: &H) -> DiagramOutput {
        derive_diagram(&DiagramInput {
            project: host.project(),
            positions: host.positions(),
            canvas: self.canvas,
            pan: self.pan,
            drag: &self.drag_positions,
            cfg: &self.cfg,
        })
    }

    /// Record a new canvas size and pass it on to the host.
    pub fn canvas_resized<H: DiagramHost + ?Sized>(&mut self, host: &mut H, size: CanvasSize) {
        debug!(width = size.width, height = size.height, "canvas resized");
        self.canvas = size;
        host.canvas_resized(size);
    }

    /// Pointer pressed at `screen`. Nodes are hit-tested before the press
    /// falls through to the background.
    pub fn pointer_down<H: DiagramHost + ?Sized>(
        &mut self,
        host: &H,
        pointer: &mut dyn GlobalPointer,
        screen: PointF,
    ) -> PointerTarget {
        let target = hit_test(&self.render(host).nodes, screen);
        self.pointer_down_on(host, pointer, target.clone(), screen);
        target
    }

    /// Pointer pressed on an already resolved target.
    pub fn pointer_down_on<H: DiagramHost + ?Sized>(
        &mut self,
        host: &H,
        pointer: &mut dyn GlobalPointer,
        target: PointerTarget,
        screen: PointF,
    ) {
        if self.state != GestureState::Idle {
            trace!(?target, "pointer down during active gesture ignored");
            return;
        }

        match target {
            PointerTarget::Center => {}
            PointerTarget::Background => {
                self.state = GestureState::Panning { anchor: screen };
                self.listeners = Some(pointer.subscribe(Gesture::Pan));
                debug!(x = screen.x, y = screen.y, "pan started");
            }
            PointerTarget::Subtask(id) => {
                if host.project().subtask(&id).is_none() {
                    trace!(%id, "pointer down on unknown subtask ignored");
                    return;
                }
                let seed = host
                    .positions()
                    .get(&id)
                    .map(|r| r.point())
                    .unwrap_or(self.cfg.fallback.point());
                self.drag_positions.insert(id.clone(), seed);
                self.listeners = Some(pointer.subscribe(Gesture::NodeDrag));
                debug!(%id, x = seed.x, y = seed.y, "node drag started");
                self.state = GestureState::DraggingNode { id, origin: screen, moved: false };
            }
        }
    }

    pub fn pointer_move<H: DiagramHost + ?Sized>(&mut self, host: &mut H, screen: PointF) {
        match &mut self.state {
            GestureState::Idle => {}
            GestureState::Panning { anchor } => {
                let delta = screen.minus(*anchor);
                self.pan = self.pan.offset(delta);
                *anchor = screen;
                trace!(pan_x = self.pan.x, pan_y = self.pan.y, "pan");
            }
            GestureState::DraggingNode { id, origin, moved } => {
                if screen != *origin {
                    *moved = true;
                }
                let id = id.clone();
                if host.project().subtask(&id).is_none() {
                    debug!(%id, "dragged subtask disappeared, ending drag");
                    self.finish();
                    return;
                }
                let radius = host
                    .positions()
                    .get(&id)
                    .map(|r| r.radius)
                    .unwrap_or(self.cfg.fallback.radius);
                let local = clamp_to_bounds(screen.minus(self.pan), radius, self.canvas);
                self.drag_positions.insert(id.clone(), local);
                trace!(%id, x = local.x, y = local.y, "node dragged");
                host.position_changed(&id, local.x, local.y);
            }
        }
    }

    pub fn pointer_up<H: DiagramHost + ?Sized>(&mut self, host: &mut H) {
        match std::mem::replace(&mut self.state, GestureState::Idle) {
            GestureState::Idle => return,
            GestureState::Panning { .. } => {
                debug!(pan_x = self.pan.x, pan_y = self.pan.y, "pan ended");
            }
            GestureState::DraggingNode { id, moved, .. } => {
                self.drag_positions.remove(&id);
                debug!(%id, moved, "node drag ended");
                if !moved {
                    if let Some(subtask) = host.project().subtask(&id).cloned() {
                        host.subtask_clicked(&subtask);
                    }
                }
            }
        }
        self.release_listeners();
    }

    /// Forward an edit request for a subtask node. The project node has no
    /// edit action.
    pub fn request_edit<H: DiagramHost + ?Sized>(&self, host: &mut H, id: &str) {
        if let Some(subtask) = host.project().subtask(id).cloned() {
            host.edit_requested(&subtask);
        } else {
            trace!(%id, "edit request ignored");
        }
    }

    pub fn request_delete<H: DiagramHost + ?Sized>(&self, host: &mut H, id: &str) {
        if host.project().subtask(id).is_some() {
            host.delete_requested(id);
        } else {
            trace!(%id, "delete request ignored");
        }
    }

    /// Abandon any gesture without notifying the host. Pan offset is kept.
    pub fn reset(&mut self) {
        self.finish();
    }

    fn finish(&mut self) {
        if let GestureState::DraggingNode { id, .. } = &self.state {
            self.drag_positions.remove(id);
        }
        self.state = GestureState::Idle;
        self.release_listeners();
    }

    fn release_listeners(&mut self) {
        if let Some(listeners) = self.listeners.take() {
            listeners.cancel();
        }
    }
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new(MindmapConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PositionMap, PositionRecord, Priority, Project, Subtask};
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        Moved(String, f64, f64),
        Clicked(String),
        Edit(String),
        Delete(String),
        Resized(CanvasSize),
    }

    struct TestHost {
        project: Project,
        positions: PositionMap,
        events: Vec<Event>,
    }

    impl TestHost {
        fn new() -> Self {
            let mut project = Project::new("Website", Priority::High);
            project.subtasks.push(Subtask::new("a", "A", Priority::Medium));
            project.subtasks.push(Subtask::new("b", "B", Priority::Low));
            let mut positions = PositionMap::new();
            positions.insert("a".into(), PositionRecord::new(100.0, 100.0, 55.0));
            positions.insert("b".into(), PositionRecord::new(650.0, 400.0, 40.0));
            Self { project, positions, events: Vec::new() }
        }
    }

    impl DiagramHost for TestHost {
        fn project(&self) -> &Project {
            &self.project
        }
        fn positions(&self) -> &PositionMap {
            &self.positions
        }
        fn position_changed(&mut self, id: &str, x: f64, y: f64) {
            if let Some(r) = self.positions.get_mut(id) {
                r.x = x;
                r.y = y;
            }
            self.events.push(Event::Moved(id.into(), x, y));
        }
        fn subtask_clicked(&mut self, subtask: &Subtask) {
            self.events.push(Event::Clicked(subtask.id.clone()));
        }
        fn edit_requested(&mut self, subtask: &Subtask) {
            self.events.push(Event::Edit(subtask.id.clone()));
        }
        fn delete_requested(&mut self, id: &str) {
            self.events.push(Event::Delete(id.into()));
        }
        fn canvas_resized(&mut self, size: CanvasSize) {
            self.events.push(Event::Resized(size));
        }
    }

    #[derive(Default)]
    struct FakePointer {
        active: Rc<Cell<i32>>,
        subscribed: Vec<Gesture>,
    }

    impl GlobalPointer for FakePointer {
        fn subscribe(&mut self, gesture: Gesture) -> Subscription {
            self.subscribed.push(gesture);
            self.active.set(self.active.get() + 1);
            let active = self.active.clone();
            Subscription::new(move || active.set(active.get() - 1))
        }
    }

    fn setup() -> (InteractionController, TestHost, FakePointer) {
        let mut ctl = InteractionController::default();
        let mut host = TestHost::new();
        ctl.canvas_resized(&mut host, CanvasSize::new(800.0, 500.0));
        host.events.clear();
        (ctl, host, FakePointer::default())
    }

    #[test]
    fn test_pan_accumulates_and_persists() {
        let (mut ctl, mut host, mut pointer) = setup();

        let target = ctl.pointer_down(&host, &mut pointer, PointF::new(300.0, 450.0));
        assert_eq!(target, PointerTarget::Background);
        assert_eq!(ctl.cursor(), Cursor::Grabbing);
        ctl.pointer_move(&mut host, PointF::new(310.0, 440.0));
        ctl.pointer_move(&mut host, PointF::new(330.0, 445.0));
        ctl.pointer_up(&mut host);

        assert_eq!(ctl.pan_offset(), PointF::new(30.0, -5.0));
        assert_eq!(*ctl.state(), GestureState::Idle);
        assert_eq!(ctl.cursor(), Cursor::Grab);

        // A second gesture continues from the kept offset.
        ctl.pointer_down(&host, &mut pointer, PointF::new(300.0, 450.0));
        ctl.pointer_move(&mut host, PointF::new(290.0, 450.0));
        ctl.pointer_up(&mut host);
        assert_eq!(ctl.pan_offset(), PointF::new(20.0, -5.0));
        assert!(host.events.is_empty());
    }

    #[test]
    fn test_drag_commits_local_clamped_position() {
        let (mut ctl, mut host, mut pointer) = setup();
        // Pan by (50, -20) first.
        ctl.pointer_down(&host, &mut pointer, PointF::new(400.0, 480.0));
        ctl.pointer_move(&mut host, PointF::new(450.0, 460.0));
        ctl.pointer_up(&mut host);
        assert_eq!(ctl.pan_offset(), PointF::new(50.0, -20.0));

        // Node "a" sits at local (100, 100), drawn at (150, 80).
        let target = ctl.pointer_down(&host, &mut pointer, PointF::new(150.0, 80.0));
        assert_eq!(target, PointerTarget::Subtask("a".into()));
        assert_eq!(ctl.drag_positions()["a"], PointF::new(100.0, 100.0));

        ctl.pointer_move(&mut host, PointF::new(170.0, 130.0));
        assert_eq!(host.events, vec![Event::Moved("a".into(), 120.0, 150.0)]);
        assert_eq!(ctl.drag_positions()["a"], PointF::new(120.0, 150.0));

        // Far outside the canvas: clamped by radius 55.
        ctl.pointer_move(&mut host, PointF::new(-500.0, 2000.0));
        assert_eq!(host.events.last(), Some(&Event::Moved("a".into(), 55.0, 445.0)));

        ctl.pointer_up(&mut host);
        assert!(ctl.drag_positions().is_empty());
        assert_eq!(host.positions["a"], PositionRecord::new(55.0, 445.0, 55.0));
        assert!(!host.events.iter().any(|e| matches!(e, Event::Clicked(_))));
    }

    #[test]
    fn test_edges_follow_live_drag() {
        let (mut ctl, mut host, mut pointer) = setup();
        ctl.pointer_down(&host, &mut pointer, PointF::new(100.0, 100.0));
        ctl.pointer_move(&mut host, PointF::new(200.0, 150.0));

        let out = ctl.render(&host);
        let edge = out.edges.iter().find(|e| e.to == "a").unwrap();
        let line = out.edge_line(edge).unwrap();
        let expected = crate::geometry::distance(PointF::new(400.0, 250.0), PointF::new(200.0, 150.0));
        assert!((line.length - expected).abs() < 1e-9);
    }

    #[test]
    fn test_center_node_is_not_draggable() {
        let (mut ctl, mut host, mut pointer) = setup();
        let target = ctl.pointer_down(&host, &mut pointer, PointF::new(400.0, 250.0));
        assert_eq!(target, PointerTarget::Center);
        assert_eq!(*ctl.state(), GestureState::Idle);
        assert!(pointer.subscribed.is_empty());

        ctl.pointer_move(&mut host, PointF::new(500.0, 300.0));
        ctl.pointer_up(&mut host);
        assert_eq!(ctl.pan_offset(), PointF::ORIGIN);
        assert!(host.events.is_empty());
    }

    #[test]
    fn test_click_without_move() {
        let (mut ctl, mut host, mut pointer) = setup();
        ctl.pointer_down(&host, &mut pointer, PointF::new(650.0, 400.0));
        ctl.pointer_move(&mut host, PointF::new(650.0, 400.0));
        ctl.pointer_up(&mut host);
        assert_eq!(host.events, vec![
            Event::Moved("b".into(), 650.0, 400.0),
            Event::Clicked("b".into()),
        ]);
    }

    #[test]
    fn test_listeners_released_per_gesture() {
        let (mut ctl, mut host, mut pointer) = setup();
        for _ in 0..3 {
            ctl.pointer_down(&host, &mut pointer, PointF::new(10.0, 490.0));
            assert_eq!(pointer.active.get(), 1);
            ctl.pointer_up(&mut host);
            assert_eq!(pointer.active.get(), 0);

            ctl.pointer_down(&host, &mut pointer, PointF::new(100.0, 100.0));
            assert!(ctl.has_global_listeners());
            ctl.pointer_up(&mut host);
            assert!(!ctl.has_global_listeners());
        }
        assert_eq!(pointer.subscribed.len(), 6);
        assert_eq!(pointer.active.get(), 0);
    }

    #[test]
    fn test_second_down_during_gesture_does_not_resubscribe() {
        let (mut ctl, mut host, mut pointer) = setup();
        ctl.pointer_down(&host, &mut pointer, PointF::new(10.0, 490.0));
        ctl.pointer_down(&host, &mut pointer, PointF::new(100.0, 100.0));
        assert_eq!(pointer.active.get(), 1);
        assert!(matches!(ctl.state(), GestureState::Panning { .. }));
        ctl.pointer_up(&mut host);
        assert_eq!(pointer.active.get(), 0);
    }

    #[test]
    fn test_stale_events_after_up_are_ignored() {
        let (mut ctl, mut host, mut pointer) = setup();
        ctl.pointer_down(&host, &mut pointer, PointF::new(100.0, 100.0));
        ctl.pointer_move(&mut host, PointF::new(120.0, 120.0));
        ctl.pointer_up(&mut host);
        let before = host.events.len();

        ctl.pointer_move(&mut host, PointF::new(300.0, 300.0));
        ctl.pointer_up(&mut host);
        assert_eq!(host.events.len(), before);
        assert_eq!(host.positions["a"], PositionRecord::new(120.0, 120.0, 55.0));
        assert_eq!(ctl.pan_offset(), PointF::ORIGIN);
    }

    #[test]
    fn test_drag_of_deleted_subtask_ends() {
        let (mut ctl, mut host, mut pointer) = setup();
        ctl.pointer_down(&host, &mut pointer, PointF::new(100.0, 100.0));
        host.project.subtasks.retain(|s| s.id != "a");
        host.positions.remove("a");

        ctl.pointer_move(&mut host, PointF::new(200.0, 200.0));
        assert_eq!(*ctl.state(), GestureState::Idle);
        assert!(ctl.drag_positions().is_empty());
        assert_eq!(pointer.active.get(), 0);
        assert!(host.events.is_empty());
    }

    #[test]
    fn test_reset_and_drop_release_listeners() {
        let (mut ctl, host, mut pointer) = setup();
        ctl.pointer_down(&host, &mut pointer, PointF::new(100.0, 100.0));
        ctl.reset();
        assert_eq!(pointer.active.get(), 0);
        assert!(ctl.drag_positions().is_empty());

        ctl.pointer_down(&host, &mut pointer, PointF::new(10.0, 490.0));
        assert_eq!(pointer.active.get(), 1);
        drop(ctl);
        assert_eq!(pointer.active.get(), 0);
    }

    #[test]
    fn test_edit_and_delete_requests() {
        let (ctl, mut host, _) = setup();
        ctl.request_edit(&mut host, "a");
        ctl.request_delete(&mut host, "b");
        ctl.request_edit(&mut host, crate::model::CENTER_NODE_ID);
        ctl.request_delete(&mut host, crate::model::CENTER_NODE_ID);
        assert_eq!(host.events, vec![Event::Edit("a".into()), Event::Delete("b".into())]);
    }

    #[test]
    fn test_resize_notifies_host() {
        let (mut ctl, mut host, _) = setup();
        ctl.canvas_resized(&mut host, CanvasSize::new(1024.0, 640.0));
        assert_eq!(ctl.canvas_size(), CanvasSize::new(1024.0, 640.0));
        assert_eq!(host.events, vec![Event::Resized(CanvasSize::new(1024.0, 640.0))]);
        assert_eq!(ctl.render(&host).center().unwrap().x, 512.0);
    }
}
