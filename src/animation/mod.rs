/// Named easing curves.
pub mod ease;
/// Values that chase the pointer.
pub mod follow;
/// Segmented timelines and the composer that runs them.
pub mod timeline;
