//! Bridges between the two pipe execution models (spec.md §4.F).

mod async_to_sync;
mod sync_to_async;

pub use async_to_sync::AsyncToSync;
pub use sync_to_async::{PipeSupplier, SyncToAsync};
