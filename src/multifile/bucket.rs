//! Storage-connector contract (spec.md §6): "capabilities required —
//! `listFiles`, `getAsStream`, `downloadTo`, `writeFromStream`". `FileMeta`
//! is opaque to the core; only `name` and `size` are read.

use std::io::Read;
use std::path::Path;

use regex::Regex;

use crate::error::PipeError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMeta {
    pub name: String,
    pub size: u64,
}

impl FileMeta {
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self { name: name.into(), size }
    }
}

/// Object-storage collaborator the multi-file orchestrator pulls files
/// through. `writeFromStream` is part of the external contract (§6) but has
/// no caller in this read-only orchestrator; implementors may leave it
/// unused.
pub trait Bucket: Send + Sync {
    fn list_files(&self, prefix: &str, filter: Option<&Regex>) -> Result<Vec<FileMeta>, PipeError>;
    fn get_as_stream(&self, file: &FileMeta) -> Result<Box<dyn Read + Send>, PipeError>;
    fn download_to(&self, file: &FileMeta, local: &Path) -> Result<(), PipeError>;
}
