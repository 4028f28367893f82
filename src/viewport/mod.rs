/// Pointer position tracking.
pub mod pointer;
/// Scroll and resize coalescing.
pub mod tracker;
