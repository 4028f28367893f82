//! Coalesced property writes between timeline sampling and the host.

use std::collections::HashMap;

use crate::animation::timeline::{PropertySink, PropertyWrite, Target};
use crate::foundation::ids::TimelineId;

/// Per-frame write buffer: one slot per `(target, property)`, last write wins, slots kept in
/// first-write order.
#[derive(Debug, Default)]
pub struct PropertyStore {
    writes: Vec<PropertyWrite>,
    index: HashMap<(Target, String), usize>,
}

impl PropertyStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the buffered writes, leaving the store empty.
    pub fn drain(&mut self) -> Vec<PropertyWrite> {
        self.index.clear();
        std::mem::take(&mut self.writes)
    }

    /// Number of distinct `(target, property)` slots.
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    /// `true` when nothing was written since the last drain.
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}

impl PropertySink for PropertyStore {
    fn write(&mut self, source: TimelineId, target: &Target, property: &str, value: f64) {
        let key = (target.clone(), property.to_owned());
        match self.index.get(&key) {
            Some(&slot) => {
                let w = &mut self.writes[slot];
                w.source = source;
                w.value = value;
            }
            None => {
                self.index.insert(key, self.writes.len());
                self.writes.push(PropertyWrite {
                    source,
                    target: target.clone(),
                    property: property.to_owned(),
                    value,
                });
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/host/properties.rs"]
mod tests;
