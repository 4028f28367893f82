//! Pointer position in viewport pixels, coalesced like scroll input.

use crate::foundation::core::Point;

/// What the pointer did between two flushed frames.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub enum PointerChange {
    /// Moved to a new client position.
    Moved(Point),
    /// Left the document.
    Left,
}

/// Latest pointer state plus the input recorded since the last flush.
///
/// `pending` holds `Some(None)` for a recorded leave, so a move followed by a leave inside one
/// frame flushes as a single leave.
#[derive(Debug, Default)]
pub struct PointerTracker {
    current: Option<Point>,
    pending: Option<Option<Point>>,
}

impl PointerTracker {
    /// Tracker that has not seen a pointer yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Client position as of the last flush; `None` before the first move or after a leave.
    pub fn position(&self) -> Option<Point> {
        self.current
    }

    /// Record a raw move event; non-finite coordinates are dropped.
    pub fn push_move(&mut self, x: f64, y: f64) {
        if x.is_finite() && y.is_finite() {
            self.pending = Some(Some(Point::new(x, y)));
        }
    }

    /// Record the pointer leaving the document.
    pub fn push_leave(&mut self) {
        self.pending = Some(None);
    }

    /// Apply pending input. Returns `None` when the position did not change.
    pub fn flush(&mut self) -> Option<PointerChange> {
        let next = self.pending.take()?;
        if next == self.current {
            return None;
        }
        self.current = next;
        Some(match next {
            Some(p) => PointerChange::Moved(p),
            None => PointerChange::Left,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/viewport/pointer.rs"]
mod tests;
