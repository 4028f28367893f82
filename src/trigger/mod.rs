/// `"<element edge> <viewport edge>"` anchors.
pub mod anchor;
/// Zone registration and enter/leave detection.
pub mod scheduler;
