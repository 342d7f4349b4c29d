//! Tracking the pixel size of the surface the mindmap is drawn on.
//!
//! A [`CanvasSizeObserver`] holds at most one live observation. Attaching a
//! different surface replaces it; dropping the observer releases it.

use tracing::debug;

use crate::geometry::CanvasSize;
use crate::subscription::Subscription;

/// Something whose size can be watched, such as a DOM element.
pub trait ResizeSurface {
    /// Identity, not structural equality: two handles to the same element
    /// are the same surface.
    fn is_same(&self, other: &Self) -> bool;

    /// Start reporting size changes to `on_resize`. The callback may fire
    /// later from the event loop, never after the subscription is released.
    fn observe(&self, on_resize: Box<dyn FnMut(CanvasSize)>) -> Subscription;
}

struct Attached<S> {
    surface: S,
    subscription: Subscription,
}

pub struct CanvasSizeObserver<S: ResizeSurface> {
    attached: Option<Attached<S>>,
}

impl<S: ResizeSurface> CanvasSizeObserver<S> {
    pub fn new() -> Self {
        Self { attached: None }
    }

    /// Observe `surface`. A no-op if it is already the observed surface;
    /// otherwise the previous observation is released first.
    pub fn attach(&mut self, surface: S, on_resize: impl FnMut(CanvasSize) + 'static) {
        if let Some(current) = &self.attached {
            if current.surface.is_same(&surface) {
                return;
            }
        }
        self.detach();
        let subscription = surface.observe(Box::new(on_resize));
        debug!("canvas observer attached");
        self.attached = Some(Attached { surface, subscription });
    }

    pub fn detach(&mut self) {
        if let Some(attached) = self.attached.take() {
            attached.subscription.cancel();
            debug!("canvas observer detached");
        }
    }

    pub fn is_attached(&self) -> bool {
        self.attached.is_some()
    }

    pub fn surface(&self) -> Option<&S> {
        self.attached.as_ref().map(|a| &a.surface)
    }
}

impl<S: ResizeSurface> Default for CanvasSizeObserver<S> {
    fn default() -> Self {
        Self::new()
    }
}
