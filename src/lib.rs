pub mod board;
pub mod canvas;
pub mod config;
pub mod diagram;
pub mod error;
pub mod geometry;
pub mod host;
pub mod interaction;
pub mod layout;
pub mod model;
pub mod output;
pub mod subscription;
mod wasm;

pub use board::Board;
pub use config::{MindmapConfig, ResizePolicy};
pub use diagram::{derive_diagram, hit_test, DiagramInput, PointerTarget};
pub use error::{BindingError, BoardError};
pub use geometry::{CanvasSize, EdgeLine, PointF};
pub use host::DiagramHost;
pub use interaction::{Cursor, Gesture, GestureState, GlobalPointer, InteractionController};
pub use layout::{clamp_layout, find_insertion_point, initial_layout};
pub use model::{PositionMap, PositionRecord, Priority, Project, Subtask, CENTER_NODE_ID};
pub use output::{DiagramOutput, EdgeOutput, NodeOutput};
pub use subscription::Subscription;
pub use wasm::{HtmlSurface, MindmapView};
