//! Multi-file read orchestrator (spec.md §4.G).

mod bucket;
mod fake_bucket;
mod orchestrator;

pub use bucket::{Bucket, FileMeta};
pub use fake_bucket::FakeBucket;
pub use orchestrator::{build, MultiFileConfig, ShardSelector};
