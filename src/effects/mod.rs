/// Construction of each effect from its config.
pub mod build;
/// Effect names and config validation.
pub mod config;
