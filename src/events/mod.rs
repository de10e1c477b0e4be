pub mod inter;
pub mod intra;
pub mod sampling;
pub mod splitter;
pub mod types;

pub use splitter::split_events;
pub use types::{Event, EventKind};
