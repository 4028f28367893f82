//! The page the stage animates, seen through a narrow trait.
//!
//! Effects never touch markup directly: they look elements up by stable marker, ask the host
//! for canvases and decorative nodes, and push interpolated property values through
//! [`Host::apply`].

use std::collections::{BTreeMap, HashMap};

use crate::foundation::core::ElementRect;
use crate::foundation::error::RidgelineResult;
use crate::foundation::ids::NodeId;
use crate::render::surface::Surface;

/// In-memory page host.
pub mod page;
/// Buffered property writes.
pub mod properties;

pub use page::{ElementDef, PageDef, StaticPage};
pub use properties::PropertyStore;

/// Read-only element geometry.
pub trait LayoutSource {
    /// Page-space box of the element carrying `marker`, or `None` when absent.
    fn element_rect(&self, marker: &str) -> Option<ElementRect>;
}

impl LayoutSource for HashMap<String, ElementRect> {
    fn element_rect(&self, marker: &str) -> Option<ElementRect> {
        self.get(marker).copied()
    }
}

impl LayoutSource for BTreeMap<String, ElementRect> {
    fn element_rect(&self, marker: &str) -> Option<ElementRect> {
        self.get(marker).copied()
    }
}

/// Everything the stage needs from the embedding page.
pub trait Host: LayoutSource {
    /// Inject a canvas sized to `container`'s box. Fails with a missing-target error when the
    /// container is absent and a resource-exhaustion error when no 2D context is available.
    fn attach_canvas(&mut self, container: &str) -> RidgelineResult<(NodeId, Box<dyn Surface>)>;

    /// Split `marker`'s text into one injected span per word; returns the new nodes and their
    /// markers in reading order.
    fn split_words(&mut self, marker: &str) -> RidgelineResult<Vec<(NodeId, String)>>;

    /// Remove an injected node. Returns `false` when it was already removed.
    fn remove_node(&mut self, node: NodeId) -> bool;

    /// Write one style property. Fails when the element is gone.
    fn apply(&mut self, marker: &str, property: &str, value: f64) -> RidgelineResult<()>;

    /// The user's reduced-motion preference, read once when the stage starts.
    fn prefers_reduced_motion(&self) -> bool {
        false
    }
}
