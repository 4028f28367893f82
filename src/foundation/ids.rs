//! Typed handles for stage-owned resources.
//!
//! Ids are allocated from monotonically increasing counters and never reused, so a stale id
//! always misses instead of aliasing a newer resource.

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            serde::Serialize,
            serde::Deserialize,
        )]
        pub struct $name(pub u64);
    };
}

id_type!(
    /// A timeline owned by the composer.
    TimelineId
);
id_type!(
    /// A particle system owned by the particle engine.
    SystemId
);
id_type!(
    /// A scroll- or time-driven canvas reveal.
    RevealId
);
id_type!(
    /// A pointer-driven follower.
    FollowerId
);
id_type!(
    /// A registered effect instance.
    EffectId
);
id_type!(
    /// A node injected into the page by an effect (canvas, decorative span).
    NodeId
);

/// Monotonic id allocator.
#[derive(Debug, Default, Clone)]
pub(crate) struct IdGen(u64);

impl IdGen {
    pub(crate) fn next(&mut self) -> u64 {
        self.0 += 1;
        self.0
    }
}
