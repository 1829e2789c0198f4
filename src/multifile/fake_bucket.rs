//! In-memory `Bucket` test double (mirrors how the teacher exercises
//! `TcpConnection` over a loopback `TcpListener` rather than a real broker —
//! here, an in-process map stands in for the real object store).

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use parking_lot::Mutex;
use regex::Regex;

use super::bucket::{Bucket, FileMeta};
use crate::error::PipeError;

pub struct FakeBucket {
    files: HashMap<String, Vec<u8>>,
    downloads: Mutex<Vec<String>>,
}

impl FakeBucket {
    pub fn new(files: Vec<(&str, &[u8])>) -> Self {
        Self {
            files: files.into_iter().map(|(name, bytes)| (name.to_string(), bytes.to_vec())).collect(),
            downloads: Mutex::new(Vec::new()),
        }
    }

    /// File names downloaded so far, in the order `download_to` was called.
    pub fn downloaded(&self) -> Vec<String> {
        self.downloads.lock().clone()
    }
}

impl Bucket for FakeBucket {
    fn list_files(&self, prefix: &str, filter: Option<&Regex>) -> Result<Vec<FileMeta>, PipeError> {
        let mut matches: Vec<FileMeta> = self
            .files
            .iter()
            .filter(|(name, _)| name.starts_with(prefix))
            .filter(|(name, _)| filter.is_none_or(|re| re.is_match(name)))
            .map(|(name, bytes)| FileMeta::new(name.clone(), bytes.len() as u64))
            .collect();
        matches.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(matches)
    }

    fn get_as_stream(&self, file: &FileMeta) -> Result<Box<dyn Read + Send>, PipeError> {
        let bytes = self
            .files
            .get(&file.name)
            .ok_or_else(|| PipeError::io(format!("no such file: {}", file.name)))?
            .clone();
        Ok(Box::new(std::io::Cursor::new(bytes)))
    }

    fn download_to(&self, file: &FileMeta, local: &Path) -> Result<(), PipeError> {
        let bytes = self
            .files
            .get(&file.name)
            .ok_or_else(|| PipeError::io(format!("no such file: {}", file.name)))?;
        std::fs::write(local, bytes)?;
        self.downloads.lock().push(file.name.clone());
        Ok(())
    }
}
