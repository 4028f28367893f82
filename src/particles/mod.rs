/// Owner of every particle system.
pub mod engine;
/// One particle system and its loop.
pub mod system;
