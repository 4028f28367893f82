/// Geometry, colors and value ranges.
pub mod core;
/// Crate error type.
pub mod error;
/// Animation frame requests.
pub mod frame;
/// Typed ids.
pub mod ids;
