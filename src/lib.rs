//! Ridgeline orchestrates scroll-driven motion for long landing pages.
//!
//! A [`Stage`] owns every animation resource of one page and is driven once per host animation
//! frame:
//!
//! 1. **Viewport**: coalesce raw scroll/resize input into one [`ViewportChange`]
//! 2. **Triggers**: recompute zone progress and emit enter/leave/update events
//! 3. **Timelines**: advance, sample and flush property writes to the [`Host`]
//! 4. **Pointer**: move followers toward the latest pointer position
//! 5. **Canvases**: step particle systems and redraw reveal covers
//!
//! Effects are created by name through [`Stage::init_effect`] and released per section with
//! [`Stage::teardown_section`]. [`StaticPage`] is an in-memory host with CPU-rasterized canvases.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

/// Easing curves, timelines and pointer followers.
pub mod animation;
/// Named effects and their configuration.
pub mod effects;
/// Ids, errors, geometry and frame scheduling.
pub mod foundation;
/// The page seen through layout and property traits, plus an in-memory page.
pub mod host;
/// Canvas particle systems.
pub mod particles;
/// Canvas surfaces and reveal covers.
pub mod render;
/// The per-page orchestrator, effect registry and scripted scenes.
pub mod stage;
/// Scroll zones and their anchors.
pub mod trigger;
/// Coalesced scroll, resize and pointer input.
pub mod viewport;

pub use crate::animation::ease::{CubicBezier, Ease};
pub use crate::animation::follow::{Chase, Follower, Response};
pub use crate::animation::timeline::{
    Composer, Mutation, PlayState, RepeatMode, Segment, Target, Timeline, TimelineConfig,
};
pub use crate::effects::config::{EffectConfig, EffectKind, TriggerConfig};
pub use crate::foundation::core::{ElementRect, Rgba8};
pub use crate::foundation::error::{RidgelineError, RidgelineResult};
pub use crate::foundation::ids::{
    EffectId, FollowerId, NodeId, RevealId, SystemId, TimelineId,
};
pub use crate::host::{ElementDef, Host, LayoutSource, PageDef, StaticPage};
pub use crate::particles::system::{EdgeMode, ParticleConfig, SpawnPolicy};
pub use crate::render::reveal::RevealKind;
pub use crate::stage::config::{MotionPolicy, StageConfig};
pub use crate::stage::registry::EffectHandle;
pub use crate::stage::scene::{Scene, SceneDef, SceneTrace};
pub use crate::stage::stage::{FrameReport, Stage};
pub use crate::trigger::anchor::{Anchor, Edge};
pub use crate::trigger::scheduler::{
    TriggerCallbacks, TriggerEvent, TriggerHandle, TriggerKind, ZoneMode, ZoneSpec,
};
pub use crate::viewport::pointer::PointerChange;
pub use crate::viewport::tracker::{Viewport, ViewportChange};
