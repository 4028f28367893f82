/// Stage configuration.
pub mod config;
/// Effect and section bookkeeping.
pub mod registry;
/// Scripted scroll sessions over a static page.
pub mod scene;
/// The orchestrator.
#[allow(clippy::module_inception)]
pub mod stage;
