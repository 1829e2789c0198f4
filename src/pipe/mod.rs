//! The two pipe contracts (spec.md §4.B/C) and the lifecycle they share.

pub mod asynch;
pub mod sync;

pub use asynch::{AsyncPipe, Listener, ListenerSet};
pub use sync::SyncPipe;

/// Lifecycle states common to both pipe models (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipeState {
    Created,
    Started,
    Draining,
    Closed,
}
