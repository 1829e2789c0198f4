//! Source stages (spec.md §4.D) — entry points producing items with no
//! upstream.

mod async_seq_gen;
mod collection;
mod empty;
mod error_source;
mod queue_reader;
mod seq_gen;

pub use async_seq_gen::AsyncSeqGen;
pub use collection::Collection;
pub use empty::Empty;
pub use error_source::ErrorSource;
pub use queue_reader::QueueReader;
pub use seq_gen::SeqGen;
