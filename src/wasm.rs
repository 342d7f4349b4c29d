//! WASM bindings for the mindmap core.
//!
//! All functions and classes exposed to JavaScript via wasm-bindgen are
//! defined here. Host callbacks are collected while the view is borrowed and
//! only invoked after the borrow ends, so a callback may call straight back
//! into the view (typically `render()`).

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use js_sys::{Function, Reflect};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Element, MouseEvent, ResizeObserver, ResizeObserverEntry};

use crate::board::Board;
use crate::canvas::{CanvasSizeObserver, ResizeSurface};
use crate::config::MindmapConfig;
use crate::diagram::PointerTarget;
use crate::error::BindingError;
use crate::geometry::{CanvasSize, EdgeLine, PointF};
use crate::host::DiagramHost;
use crate::interaction::{Gesture, GlobalPointer, InteractionController};
use crate::layout;
use crate::model::{PositionMap, Priority, Project, Subtask};
use crate::output::{EdgeOutput, NodeOutput};
use crate::subscription::Subscription;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console, js_name = log)]
    pub fn console_log(s: &str);

    #[wasm_bindgen(js_namespace = console, js_name = error)]
    pub fn console_error(s: &str);
}

impl From<BindingError> for JsValue {
    fn from(e: BindingError) -> Self {
        console_error(&e.to_string());
        JsValue::from_str(&e.to_string())
    }
}

/// Canvas size used until the surface reports its real size.
const INITIAL_CANVAS: CanvasSize = CanvasSize { width: 800.0, height: 500.0 };

fn random_seed() -> u64 {
    (js_sys::Math::random() * 9_007_199_254_740_992.0) as u64
}

#[wasm_bindgen]
pub fn radius_for_priority(label: &str) -> f64 {
    Priority::from_label(label).radius()
}

/// Ring layout for a JSON array of subtasks. Returns a JSON object keyed by
/// subtask id, or `{}` if the input cannot be read.
#[wasm_bindgen]
pub fn initial_layout(subtasks_json: &str, width: f64, height: f64) -> String {
    let subtasks: Vec<Subtask> = match serde_json::from_str(subtasks_json) {
        Ok(s) => s,
        Err(e) => {
            console_error(&format!("Error reading subtasks: {e}"));
            return "{}".to_string();
        }
    };
    let positions = layout::initial_layout(&subtasks, CanvasSize::new(width, height), &MindmapConfig::default());
    serde_json::to_string(&positions).unwrap_or_else(|_| "{}".to_string())
}

/// A free spot for one new node, given a JSON object of existing records.
#[wasm_bindgen]
pub fn find_insertion_point(positions_json: &str, width: f64, height: f64) -> String {
    let positions: PositionMap = match serde_json::from_str(positions_json) {
        Ok(p) => p,
        Err(e) => {
            console_error(&format!("Error reading positions: {e}"));
            PositionMap::new()
        }
    };
    let mut rng = StdRng::seed_from_u64(random_seed());
    let record = layout::find_insertion_point(
        &positions,
        CanvasSize::new(width, height),
        &MindmapConfig::default(),
        &mut rng,
    );
    serde_json::to_string(&record).unwrap_or_else(|_| "null".to_string())
}

// ---------------------------------------------------------------------------
// Host callbacks
// ---------------------------------------------------------------------------

/// Things to tell JavaScript once the view is no longer borrowed.
#[derive(Debug)]
enum Notice {
    PositionChanged { id: String, x: f64, y: f64 },
    Clicked(Subtask),
    Edit(Subtask),
    Delete(String),
    Resized(CanvasSize),
}

#[derive(Default)]
struct JsCallbacks {
    on_position_change: Option<Function>,
    on_subtask_click: Option<Function>,
    on_edit_subtask: Option<Function>,
    on_delete_subtask: Option<Function>,
    on_canvas_resize: Option<Function>,
    /// Called after anything that changes what `render()` returns.
    on_update: Option<Function>,
}

impl JsCallbacks {
    fn from_object(obj: &JsValue) -> Self {
        let get = |name: &str| -> Option<Function> {
            if obj.is_undefined() || obj.is_null() {
                return None;
            }
            Reflect::get(obj, &JsValue::from_str(name)).ok()?.dyn_into::<Function>().ok()
        };
        Self {
            on_position_change: get("onPositionChange"),
            on_subtask_click: get("onSubtaskClick"),
            on_edit_subtask: get("onEditSubtask"),
            on_delete_subtask: get("onDeleteSubtask"),
            on_canvas_resize: get("onCanvasResize"),
            on_update: get("onUpdate"),
        }
    }

    fn dispatch(&self, notices: Vec<Notice>) {
        for notice in notices {
            let result = match notice {
                Notice::PositionChanged { id, x, y } => self.on_position_change.as_ref().map(|f| {
                    f.call3(&JsValue::NULL, &JsValue::from_str(&id), &JsValue::from_f64(x), &JsValue::from_f64(y))
                }),
                Notice::Clicked(subtask) => self
                    .on_subtask_click
                    .as_ref()
                    .map(|f| f.call1(&JsValue::NULL, &subtask_to_js(&subtask))),
                Notice::Edit(subtask) => self
                    .on_edit_subtask
                    .as_ref()
                    .map(|f| f.call1(&JsValue::NULL, &subtask_to_js(&subtask))),
                Notice::Delete(id) => self
                    .on_delete_subtask
                    .as_ref()
                    .map(|f| f.call1(&JsValue::NULL, &JsValue::from_str(&id))),
                Notice::Resized(size) => self.on_canvas_resize.as_ref().map(|f| {
                    f.call2(&JsValue::NULL, &JsValue::from_f64(size.width), &JsValue::from_f64(size.height))
                }),
            };
            if let Some(Err(e)) = result {
                console_error(&BindingError::Js(format!("{e:?}")).to_string());
            }
        }
        if let Some(f) = &self.on_update {
            if let Err(e) = f.call0(&JsValue::NULL) {
                console_error(&BindingError::Js(format!("{e:?}")).to_string());
            }
        }
    }
}

fn subtask_to_js(subtask: &Subtask) -> JsValue {
    serde_json::to_string(subtask)
        .ok()
        .and_then(|s| js_sys::JSON::parse(&s).ok())
        .unwrap_or(JsValue::NULL)
}

/// The board as seen by the controller, recording what JavaScript must hear.
struct RecordingHost<'a> {
    board: &'a mut Board,
    notices: &'a mut Vec<Notice>,
}

impl DiagramHost for RecordingHost<'_> {
    fn project(&self) -> &Project {
        self.board.project()
    }

    fn positions(&self) -> &PositionMap {
        self.board.positions()
    }

    fn position_changed(&mut self, id: &str, x: f64, y: f64) {
        self.board.position_changed(id, x, y);
        self.notices.push(Notice::PositionChanged { id: id.to_string(), x, y });
    }

    fn subtask_clicked(&mut self, subtask: &Subtask) {
        self.board.subtask_clicked(subtask);
        self.notices.push(Notice::Clicked(subtask.clone()));
    }

    fn edit_requested(&mut self, subtask: &Subtask) {
        self.board.edit_requested(subtask);
        self.notices.push(Notice::Edit(subtask.clone()));
    }

    fn delete_requested(&mut self, id: &str) {
        self.board.delete_requested(id);
        self.notices.push(Notice::Delete(id.to_string()));
    }

    fn canvas_resized(&mut self, size: CanvasSize) {
        self.board.canvas_resized(size);
        self.notices.push(Notice::Resized(size));
    }
}

// ---------------------------------------------------------------------------
// Browser surfaces
// ---------------------------------------------------------------------------

/// A DOM element watched with a `ResizeObserver`.
#[derive(Clone)]
pub struct HtmlSurface(Element);

impl ResizeSurface for HtmlSurface {
    fn is_same(&self, other: &Self) -> bool {
        let a: &JsValue = self.0.as_ref();
        let b: &JsValue = other.0.as_ref();
        js_sys::Object::is(a, b)
    }

    fn observe(&self, mut on_resize: Box<dyn FnMut(CanvasSize)>) -> Subscription {
        let callback = Closure::<dyn FnMut(js_sys::Array)>::new(move |entries: js_sys::Array| {
            let Ok(entry) = entries.get(0).dyn_into::<ResizeObserverEntry>() else {
                return;
            };
            let rect = entry.content_rect();
            on_resize(CanvasSize::new(rect.width(), rect.height()));
        });
        let observer = match ResizeObserver::new(callback.as_ref().unchecked_ref()) {
            Ok(observer) => observer,
            Err(e) => {
                console_error(&format!("ResizeObserver unavailable: {e:?}"));
                return Subscription::noop();
            }
        };
        observer.observe(&self.0);
        Subscription::new(move || {
            observer.disconnect();
            drop(callback);
        })
    }
}

/// Document-level mouse listeners, so drags keep tracking outside the canvas.
struct DocumentPointer {
    view: Weak<RefCell<ViewInner>>,
}

impl GlobalPointer for DocumentPointer {
    fn subscribe(&mut self, gesture: Gesture) -> Subscription {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            console_error(&format!("No document for {gesture:?} listeners"));
            return Subscription::noop();
        };

        let view = self.view.clone();
        let on_move = Closure::<dyn FnMut(MouseEvent)>::new(move |e: MouseEvent| {
            if let Some(view) = view.upgrade() {
                let client = PointF::new(e.client_x() as f64, e.client_y() as f64);
                with_view(&view, |inner, notices| inner.pointer_move(client, notices));
                e.prevent_default();
            }
        });
        let view = self.view.clone();
        let on_up = Closure::<dyn FnMut(MouseEvent)>::new(move |_e: MouseEvent| {
            if let Some(view) = view.upgrade() {
                with_view(&view, |inner, notices| inner.pointer_up(notices));
            }
        });

        let target: &web_sys::EventTarget = document.as_ref();
        if let Err(e) = target
            .add_event_listener_with_callback("mousemove", on_move.as_ref().unchecked_ref())
            .and_then(|_| target.add_event_listener_with_callback("mouseup", on_up.as_ref().unchecked_ref()))
        {
            console_error(&format!("Failed to add {gesture:?} listeners: {e:?}"));
        }

        Subscription::new(move || {
            let target: &web_sys::EventTarget = document.as_ref();
            let _ = target.remove_event_listener_with_callback("mousemove", on_move.as_ref().unchecked_ref());
            let _ = target.remove_event_listener_with_callback("mouseup", on_up.as_ref().unchecked_ref());
            drop(on_move);
            drop(on_up);
        })
    }
}

// ---------------------------------------------------------------------------
// MindmapView
// ---------------------------------------------------------------------------

struct ViewInner {
    board: Board,
    controller: InteractionController,
    observer: CanvasSizeObserver<HtmlSurface>,
    callbacks: Rc<JsCallbacks>,
}

impl ViewInner {
    fn host<'a>(board: &'a mut Board, notices: &'a mut Vec<Notice>) -> RecordingHost<'a> {
        RecordingHost { board, notices }
    }

    /// Client (viewport) coordinates to canvas coordinates.
    fn to_canvas(&self, client: PointF) -> PointF {
        match self.observer.surface() {
            Some(surface) => {
                let rect = surface.0.get_bounding_client_rect();
                PointF::new(client.x - rect.left(), client.y - rect.top())
            }
            None => client,
        }
    }

    fn pointer_move(&mut self, client: PointF, notices: &mut Vec<Notice>) {
        let p = self.to_canvas(client);
        let mut host = Self::host(&mut self.board, notices);
        self.controller.pointer_move(&mut host, p);
    }

    fn pointer_up(&mut self, notices: &mut Vec<Notice>) {
        let mut host = Self::host(&mut self.board, notices);
        self.controller.pointer_up(&mut host);
    }

    fn resized(&mut self, size: CanvasSize, notices: &mut Vec<Notice>) {
        let mut host = Self::host(&mut self.board, notices);
        self.controller.canvas_resized(&mut host, size);
    }
}

/// Borrow the view, run `f`, release the borrow, then tell JavaScript.
fn with_view<T>(view: &Rc<RefCell<ViewInner>>, f: impl FnOnce(&mut ViewInner, &mut Vec<Notice>) -> T) -> T {
    let mut notices = Vec::new();
    let (result, callbacks) = {
        let mut inner = view.borrow_mut();
        let result = f(&mut inner, &mut notices);
        (result, inner.callbacks.clone())
    };
    callbacks.dispatch(notices);
    result
}

#[derive(Serialize)]
struct RenderFrame<'a> {
    nodes: &'a [NodeOutput],
    edges: &'a [EdgeOutput],
    lines: Vec<EdgeLine>,
    pan: PointF,
    cursor: &'static str,
}

/// One interactive mindmap bound to a canvas element.
#[wasm_bindgen]
pub struct MindmapView {
    inner: Rc<RefCell<ViewInner>>,
}

#[wasm_bindgen]
impl MindmapView {
    /// `config_json` may be empty for defaults. `callbacks` is an object with
    /// any of `onPositionChange`, `onSubtaskClick`, `onEditSubtask`,
    /// `onDeleteSubtask`, `onCanvasResize`, `onUpdate`.
    #[wasm_bindgen(constructor)]
    pub fn new(project_json: &str, config_json: &str, callbacks: JsValue) -> Result<MindmapView, JsValue> {
        let project: Project = serde_json::from_str(project_json).map_err(BindingError::from)?;
        let cfg: MindmapConfig = if config_json.trim().is_empty() {
            MindmapConfig::default()
        } else {
            serde_json::from_str(config_json).map_err(BindingError::from)?
        };

        let mut board =
            Board::new(project, INITIAL_CANVAS, cfg.clone(), random_seed()).map_err(BindingError::from)?;
        let mut controller = InteractionController::new(cfg);
        controller.canvas_resized(&mut board, INITIAL_CANVAS);

        Ok(MindmapView {
            inner: Rc::new(RefCell::new(ViewInner {
                board,
                controller,
                observer: CanvasSizeObserver::new(),
                callbacks: Rc::new(JsCallbacks::from_object(&callbacks)),
            })),
        })
    }

    /// Watch `element` for size changes. Re-attaching the same element is a
    /// no-op; a different element replaces the previous one.
    pub fn attach_canvas(&self, element: Element) {
        let weak = Rc::downgrade(&self.inner);
        let mut inner = self.inner.borrow_mut();
        inner.observer.attach(HtmlSurface(element), move |size| {
            if let Some(view) = weak.upgrade() {
                with_view(&view, |inner, notices| inner.resized(size, notices));
            }
        });
    }

    pub fn detach_canvas(&self) {
        self.inner.borrow_mut().observer.detach();
    }

    /// Set the canvas size directly, for hosts that measure it themselves.
    pub fn resize(&self, width: f64, height: f64) {
        with_view(&self.inner, |inner, notices| inner.resized(CanvasSize::new(width, height), notices));
    }

    /// Returns `"background"`, `"center"` or the pressed subtask id.
    pub fn pointer_down(&self, client_x: f64, client_y: f64) -> String {
        let mut pointer = DocumentPointer { view: Rc::downgrade(&self.inner) };
        let target = with_view(&self.inner, |inner, notices| {
            let p = inner.to_canvas(PointF::new(client_x, client_y));
            let host = ViewInner::host(&mut inner.board, notices);
            inner.controller.pointer_down(&host, &mut pointer, p)
        });
        match target {
            PointerTarget::Background => "background".to_string(),
            PointerTarget::Center => "center".to_string(),
            PointerTarget::Subtask(id) => id,
        }
    }

    pub fn pointer_move(&self, client_x: f64, client_y: f64) {
        with_view(&self.inner, |inner, notices| inner.pointer_move(PointF::new(client_x, client_y), notices));
    }

    pub fn pointer_up(&self) {
        with_view(&self.inner, |inner, notices| inner.pointer_up(notices));
    }

    pub fn cursor(&self) -> String {
        self.inner.borrow().controller.cursor().as_css().to_string()
    }

    /// Nodes, edges and resolved edge lines as JSON.
    pub fn render(&self) -> Result<String, JsValue> {
        let inner = self.inner.borrow();
        let out = inner.controller.render(&inner.board);
        let frame = RenderFrame {
            nodes: &out.nodes,
            edges: &out.edges,
            lines: out.edge_lines(),
            pan: inner.controller.pan_offset(),
            cursor: inner.controller.cursor().as_css(),
        };
        Ok(serde_json::to_string(&frame).map_err(BindingError::from)?)
    }

    pub fn positions(&self) -> Result<String, JsValue> {
        let inner = self.inner.borrow();
        Ok(serde_json::to_string(inner.board.positions()).map_err(BindingError::from)?)
    }

    pub fn restore_positions(&self, positions_json: &str) -> Result<(), JsValue> {
        let positions: PositionMap = serde_json::from_str(positions_json).map_err(BindingError::from)?;
        with_view(&self.inner, |inner, _| inner.board.restore_positions(positions));
        Ok(())
    }

    /// Add a subtask; returns its new position record as JSON.
    pub fn add_subtask(&self, subtask_json: &str) -> Result<String, JsValue> {
        let subtask: Subtask = serde_json::from_str(subtask_json).map_err(BindingError::from)?;
        let record = with_view(&self.inner, |inner, _| inner.board.add_subtask(subtask)).map_err(BindingError::from)?;
        Ok(serde_json::to_string(&record).map_err(BindingError::from)?)
    }

    pub fn edit_subtask(&self, subtask_json: &str) -> Result<(), JsValue> {
        let subtask: Subtask = serde_json::from_str(subtask_json).map_err(BindingError::from)?;
        with_view(&self.inner, |inner, _| inner.board.edit_subtask(subtask)).map_err(BindingError::from)?;
        Ok(())
    }

    pub fn delete_subtask(&self, id: &str) -> Result<(), JsValue> {
        with_view(&self.inner, |inner, _| {
            inner.controller.reset();
            inner.board.delete_subtask(id).map(|_| ())
        })
        .map_err(BindingError::from)?;
        Ok(())
    }

    /// The node's edit button was pressed.
    pub fn request_edit(&self, id: &str) {
        with_view(&self.inner, |inner, notices| {
            let mut host = ViewInner::host(&mut inner.board, notices);
            inner.controller.request_edit(&mut host, id);
        });
    }

    /// The node's delete button was pressed.
    pub fn request_delete(&self, id: &str) {
        with_view(&self.inner, |inner, notices| {
            let mut host = ViewInner::host(&mut inner.board, notices);
            inner.controller.request_delete(&mut host, id);
        });
    }

    /// Release the canvas observer and any gesture listeners.
    pub fn destroy(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.controller.reset();
        inner.observer.detach();
    }
}
