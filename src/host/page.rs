use std::collections::BTreeMap;

use crate::foundation::core::ElementRect;
use crate::foundation::error::{RidgelineError, RidgelineResult};
use crate::foundation::ids::{IdGen, NodeId};
use crate::host::{Host, LayoutSource};
use crate::render::cpu::{PixmapSurface, SharedCanvas};
use crate::render::surface::Surface;

/// A marked element as authored in a page description.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ElementDef {
    /// Page-space box.
    #[serde(flatten)]
    pub rect: ElementRect,
    /// Text content, used when splitting into word spans.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Serializable description of a static page.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PageDef {
    /// Elements by marker.
    #[serde(default)]
    pub elements: BTreeMap<String, ElementDef>,
    /// Simulated `prefers-reduced-motion`.
    #[serde(default)]
    pub reduced_motion: bool,
    /// Simulate a browser without a 2D canvas context.
    #[serde(default)]
    pub canvas_unavailable: bool,
}

#[derive(Debug)]
struct Element {
    rect: ElementRect,
    text: Option<String>,
    styles: BTreeMap<String, f64>,
}

#[derive(Debug)]
enum Injected {
    Canvas { container: String, canvas: SharedCanvas },
    Span { marker: String },
}

/// In-memory host: fixed element boxes, recorded styles, CPU-rasterized canvases.
#[derive(Debug, Default)]
pub struct StaticPage {
    elements: BTreeMap<String, Element>,
    nodes: BTreeMap<NodeId, Injected>,
    ids: IdGen,
    reduced_motion: bool,
    canvas_unavailable: bool,
}

impl StaticPage {
    /// Page with no elements.
    pub fn new() -> Self {
        Self::default()
    }

    /// Page built from a serialized definition.
    pub fn from_def(def: PageDef) -> Self {
        let mut page = Self {
            reduced_motion: def.reduced_motion,
            canvas_unavailable: def.canvas_unavailable,
            ..Self::default()
        };
        for (marker, el) in def.elements {
            page.elements.insert(
                marker,
                Element {
                    rect: el.rect,
                    text: el.text,
                    styles: BTreeMap::new(),
                },
            );
        }
        page
    }

    /// Builder-style element insertion.
    pub fn with_element(mut self, marker: impl Into<String>, rect: ElementRect) -> Self {
        self.set_rect(marker, rect);
        self
    }

    /// Insert or move an element (layout change).
    pub fn set_rect(&mut self, marker: impl Into<String>, rect: ElementRect) {
        self.elements
            .entry(marker.into())
            .and_modify(|e| e.rect = rect)
            .or_insert(Element {
                rect,
                text: None,
                styles: BTreeMap::new(),
            });
    }

    /// Set the text later split into words.
    pub fn set_text(&mut self, marker: &str, text: impl Into<String>) {
        if let Some(el) = self.elements.get_mut(marker) {
            el.text = Some(text.into());
        }
    }

    /// Make every later canvas request fail.
    pub fn set_canvas_unavailable(&mut self, unavailable: bool) {
        self.canvas_unavailable = unavailable;
    }

    /// Set the reduced-motion preference reported to new stages.
    pub fn set_reduced_motion(&mut self, reduced: bool) {
        self.reduced_motion = reduced;
    }

    /// Remove an element as if its markup was deleted; canvases inside it are detached.
    pub fn remove_element(&mut self, marker: &str) -> bool {
        let removed = self.elements.remove(marker).is_some();
        for node in self.nodes.values() {
            if let Injected::Canvas { container, canvas } = node {
                if container == marker {
                    canvas.borrow_mut().attached = false;
                }
            }
        }
        removed
    }

    /// Last value written to an element property.
    pub fn style(&self, marker: &str, property: &str) -> Option<f64> {
        self.elements.get(marker)?.styles.get(property).copied()
    }

    /// All written properties of an element.
    pub fn styles(&self, marker: &str) -> Option<&BTreeMap<String, f64>> {
        self.elements.get(marker).map(|e| &e.styles)
    }

    /// `true` while the element exists.
    pub fn has_element(&self, marker: &str) -> bool {
        self.elements.contains_key(marker)
    }

    /// Markers of every element, sorted.
    pub fn markers(&self) -> Vec<String> {
        self.elements.keys().cloned().collect()
    }

    /// Canvas behind an injected node.
    pub fn canvas(&self, node: NodeId) -> Option<SharedCanvas> {
        match self.nodes.get(&node)? {
            Injected::Canvas { canvas, .. } => Some(canvas.clone()),
            Injected::Span { .. } => None,
        }
    }

    /// Attached canvases with their container markers.
    pub fn canvases(&self) -> Vec<(NodeId, String, SharedCanvas)> {
        self.nodes
            .iter()
            .filter_map(|(id, node)| match node {
                Injected::Canvas { container, canvas } if canvas.borrow().attached => {
                    Some((*id, container.clone(), canvas.clone()))
                }
                _ => None,
            })
            .collect()
    }

    /// Number of injected nodes still in the page.
    pub fn injected_count(&self) -> usize {
        self.nodes.len()
    }
}

impl LayoutSource for StaticPage {
    fn element_rect(&self, marker: &str) -> Option<ElementRect> {
        self.elements.get(marker).map(|e| e.rect)
    }
}

impl Host for StaticPage {
    fn attach_canvas(&mut self, container: &str) -> RidgelineResult<(NodeId, Box<dyn Surface>)> {
        let rect = self.element_rect(container).ok_or_else(|| {
            RidgelineError::missing_target(format!("canvas container '{container}'"))
        })?;
        if self.canvas_unavailable {
            return Err(RidgelineError::resource_exhaustion(
                "2d canvas context unavailable",
            ));
        }
        let (w, h) = rect.surface_size();
        let (surface, canvas) = PixmapSurface::new(w, h)?;
        let id = NodeId(self.ids.next());
        self.nodes.insert(
            id,
            Injected::Canvas {
                container: container.to_owned(),
                canvas,
            },
        );
        Ok((id, Box::new(surface)))
    }

    fn split_words(&mut self, marker: &str) -> RidgelineResult<Vec<(NodeId, String)>> {
        let el = self
            .elements
            .get(marker)
            .ok_or_else(|| RidgelineError::missing_target(format!("text element '{marker}'")))?;
        let Some(text) = el.text.clone() else {
            return Ok(Vec::new());
        };
        let rect = el.rect;

        let words: Vec<&str> = text.split_whitespace().collect();
        let chars: usize = words.iter().map(|w| w.chars().count()).sum();
        let mut out = Vec::with_capacity(words.len());
        let mut x = rect.left;
        for (i, word) in words.iter().enumerate() {
            let share = word.chars().count() as f64 / chars.max(1) as f64;
            let width = rect.width * share;
            let child = format!("{marker}/word-{i}");
            self.elements.insert(
                child.clone(),
                Element {
                    rect: ElementRect::new(x, rect.top, width, rect.height),
                    text: Some((*word).to_owned()),
                    styles: BTreeMap::new(),
                },
            );
            x += width;
            let id = NodeId(self.ids.next());
            self.nodes.insert(
                id,
                Injected::Span {
                    marker: child.clone(),
                },
            );
            out.push((id, child));
        }
        Ok(out)
    }

    fn remove_node(&mut self, node: NodeId) -> bool {
        match self.nodes.remove(&node) {
            Some(Injected::Canvas { canvas, .. }) => {
                canvas.borrow_mut().attached = false;
                true
            }
            Some(Injected::Span { marker }) => {
                self.elements.remove(&marker);
                true
            }
            None => false,
        }
    }

    fn apply(&mut self, marker: &str, property: &str, value: f64) -> RidgelineResult<()> {
        let el = self
            .elements
            .get_mut(marker)
            .ok_or_else(|| RidgelineError::missing_target(format!("element '{marker}' is gone")))?;
        el.styles.insert(property.to_owned(), value);
        Ok(())
    }

    fn prefers_reduced_motion(&self) -> bool {
        self.reduced_motion
    }
}

#[cfg(test)]
#[path = "../../tests/unit/host/page.rs"]
mod tests;
