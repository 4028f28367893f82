//! One-shot animation-frame callbacks with explicit, idempotent cancellation.

use std::collections::BTreeMap;

use crate::foundation::ids::{FollowerId, SystemId, TimelineId};

/// Who a pending frame callback belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
pub enum FrameOwner {
    /// A timeline advancing its time cursor.
    Timeline(TimelineId),
    /// A particle system's step/render loop.
    Particles(SystemId),
    /// A follower easing toward the pointer.
    Follower(FollowerId),
}

/// Handle to a pending frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
pub struct FrameHandle(u64);

/// Emulates the host's request/cancel animation-frame primitive.
///
/// Requests made while frame `N` runs are delivered in frame `N + 1`. An owner has at most one
/// pending request: asking again returns the handle already queued.
#[derive(Debug, Default)]
pub struct FrameScheduler {
    next: u64,
    pending: BTreeMap<FrameHandle, FrameOwner>,
    by_owner: BTreeMap<FrameOwner, FrameHandle>,
}

impl FrameScheduler {
    /// Create an empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `owner` for the next frame.
    pub fn request(&mut self, owner: FrameOwner) -> FrameHandle {
        if let Some(&existing) = self.by_owner.get(&owner) {
            return existing;
        }
        self.next += 1;
        let handle = FrameHandle(self.next);
        self.pending.insert(handle, owner);
        self.by_owner.insert(owner, handle);
        handle
    }

    /// Cancel a pending callback. Returns `false` when it already ran or was cancelled.
    pub fn cancel(&mut self, handle: FrameHandle) -> bool {
        match self.pending.remove(&handle) {
            Some(owner) => {
                self.by_owner.remove(&owner);
                true
            }
            None => false,
        }
    }

    /// Drain every callback due this frame, in request order.
    pub fn take_due(&mut self) -> Vec<FrameOwner> {
        self.by_owner.clear();
        std::mem::take(&mut self.pending).into_values().collect()
    }

    /// Return `true` when `owner` has a pending callback.
    pub fn is_pending(&self, owner: FrameOwner) -> bool {
        self.by_owner.contains_key(&owner)
    }

    /// Number of pending callbacks.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/frame.rs"]
mod tests;
