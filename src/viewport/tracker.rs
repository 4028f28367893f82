//! Scroll position and viewport size, coalesced to at most one update per frame.

use std::collections::BTreeMap;

use crate::foundation::error::{RidgelineError, RidgelineResult};

/// Snapshot of the visible window.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Viewport {
    /// Document scroll offset in CSS pixels.
    pub scroll_y: f64,
    /// Viewport width.
    pub width: f64,
    /// Viewport height.
    pub height: f64,
}

impl Viewport {
    /// Build a validated viewport.
    pub fn new(scroll_y: f64, width: f64, height: f64) -> RidgelineResult<Self> {
        if !scroll_y.is_finite() {
            return Err(RidgelineError::configuration("scroll_y must be finite"));
        }
        if !(width.is_finite() && height.is_finite()) || width <= 0.0 || height <= 0.0 {
            return Err(RidgelineError::configuration(
                "viewport width/height must be finite and > 0",
            ));
        }
        Ok(Self {
            scroll_y,
            width,
            height,
        })
    }
}

/// What changed between two flushed frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct ViewportChange {
    /// The scroll offset moved.
    pub scrolled: bool,
    /// The viewport size changed.
    pub resized: bool,
}

/// Unsubscribe token returned by [`ViewportTracker::on_scroll_or_resize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Subscription(u64);

type Listener = Box<dyn FnMut(&Viewport, ViewportChange)>;

/// Tracks scroll/resize input and notifies subscribers once per frame.
///
/// Raw events only record the latest pending value; [`ViewportTracker::flush`], called from the
/// frame callback, applies it and fans out to subscribers. Two scroll events inside one frame
/// therefore produce a single notification carrying the last position.
pub struct ViewportTracker {
    current: Viewport,
    pending_scroll: Option<f64>,
    pending_size: Option<(f64, f64)>,
    listeners: BTreeMap<Subscription, Listener>,
    next: u64,
}

impl std::fmt::Debug for ViewportTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewportTracker")
            .field("current", &self.current)
            .field("pending_scroll", &self.pending_scroll)
            .field("pending_size", &self.pending_size)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl ViewportTracker {
    /// Start tracking from `initial`.
    pub fn new(initial: Viewport) -> Self {
        Self {
            current: initial,
            pending_scroll: None,
            pending_size: None,
            listeners: BTreeMap::new(),
            next: 0,
        }
    }

    /// Scroll offset as of the last flush.
    pub fn current_scroll_y(&self) -> f64 {
        self.current.scroll_y
    }

    /// Viewport height as of the last flush.
    pub fn viewport_height(&self) -> f64 {
        self.current.height
    }

    /// Full snapshot as of the last flush.
    pub fn viewport(&self) -> Viewport {
        self.current
    }

    /// Register a listener called from [`ViewportTracker::flush`].
    pub fn on_scroll_or_resize(
        &mut self,
        listener: impl FnMut(&Viewport, ViewportChange) + 'static,
    ) -> Subscription {
        self.next += 1;
        let sub = Subscription(self.next);
        self.listeners.insert(sub, Box::new(listener));
        sub
    }

    /// Remove a listener. Returns `false` when it was already removed.
    pub fn unsubscribe(&mut self, sub: Subscription) -> bool {
        self.listeners.remove(&sub).is_some()
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Record a raw scroll event; non-finite offsets are dropped.
    pub fn push_scroll(&mut self, scroll_y: f64) {
        if scroll_y.is_finite() {
            self.pending_scroll = Some(scroll_y);
        }
    }

    /// Record a raw resize event; degenerate sizes are dropped.
    pub fn push_resize(&mut self, width: f64, height: f64) {
        if width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0 {
            self.pending_size = Some((width, height));
        }
    }

    /// Apply pending input and notify listeners. Returns `None` when nothing changed.
    pub fn flush(&mut self) -> Option<ViewportChange> {
        let mut change = ViewportChange {
            scrolled: false,
            resized: false,
        };
        if let Some(y) = self.pending_scroll.take() {
            if y != self.current.scroll_y {
                self.current.scroll_y = y;
                change.scrolled = true;
            }
        }
        if let Some((w, h)) = self.pending_size.take() {
            if w != self.current.width || h != self.current.height {
                self.current.width = w;
                self.current.height = h;
                change.resized = true;
            }
        }
        if !change.scrolled && !change.resized {
            return None;
        }

        let snapshot = self.current;
        for listener in self.listeners.values_mut() {
            listener(&snapshot, change);
        }
        Some(change)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/viewport/tracker.rs"]
mod tests;
