//! Multi-file read orchestrator (spec.md §4.G): list, optionally shard,
//! optionally download-first, then wrap one [`crate::bridge::SyncToAsync`]
//! source over the resulting per-file pipe suppliers.

use std::cmp::Ordering;
use std::path::PathBuf;
use std::sync::Arc;

use regex::Regex;

use super::bucket::{Bucket, FileMeta};
use crate::bridge::SyncToAsync;
use crate::error::PipeError;
use crate::hash::shard_for;
use crate::pipe::SyncPipe;
use crate::scheduler::{schedule, Job};

/// Optional step-2 sharding: this worker's id and the total worker count
/// (spec.md §4.G step 2).
#[derive(Debug, Clone, Copy)]
pub struct ShardSelector {
    pub worker_id: usize,
    pub worker_count: usize,
}

pub struct MultiFileConfig {
    pub prefix: String,
    pub filter: Option<Regex>,
    /// Defaults to lexicographic by file name (spec.md §4.G).
    pub comparator: Option<Box<dyn Fn(&FileMeta, &FileMeta) -> Ordering + Send + Sync>>,
    pub shard: Option<ShardSelector>,
    pub download_first: bool,
    pub thread_count: usize,
}

impl Default for MultiFileConfig {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            filter: None,
            comparator: None,
            shard: None,
            download_first: false,
            thread_count: 1,
        }
    }
}

/// A sync pipe that deletes its backing local file on close, so a
/// download-first supplier leaves no temp-folder residue behind once its
/// pipe has been fully drained (spec.md §4.G step 3: "reads local and
/// deletes on close").
struct DeleteOnClose<T> {
    inner: Box<dyn SyncPipe<Item = T>>,
    path: PathBuf,
    // Keeps the temp folder alive until this pipe (and every sibling
    // sharing it) has been closed; otherwise the folder is removed as soon
    // as `build` returns, before any supplier has actually run.
    _dir: Arc<tempfile::TempDir>,
}

impl<T: Send> SyncPipe for DeleteOnClose<T> {
    type Item = T;

    fn start(&mut self) -> Result<(), PipeError> {
        self.inner.start()
    }

    fn next(&mut self) -> Result<Option<T>, PipeError> {
        self.inner.next()
    }

    fn peek(&mut self) -> Result<Option<&T>, PipeError> {
        self.inner.peek()
    }

    fn progress(&self) -> f32 {
        self.inner.progress()
    }

    fn close(&mut self) -> Result<(), PipeError> {
        let result = self.inner.close();
        let _ = std::fs::remove_file(&self.path);
        result
    }
}

/// Builds the `SyncToAsync` source described by spec.md §4.G. `pipe_for`
/// turns an opened byte stream plus its file's metadata into the sync pipe
/// that reads it; it is called once per file, lazily, on whichever worker
/// thread claims that file.
pub fn build<T: Clone + Send + Sync + 'static>(
    bucket: Arc<dyn Bucket>,
    config: MultiFileConfig,
    pipe_for: impl Fn(Box<dyn std::io::Read + Send>, FileMeta) -> Box<dyn SyncPipe<Item = T>>
        + Send
        + Sync
        + 'static,
) -> Result<Arc<SyncToAsync<T>>, PipeError> {
    // Step 1: list.
    let mut files = bucket.list_files(&config.prefix, config.filter.as_ref())?;
    match &config.comparator {
        Some(cmp) => files.sort_by(|a, b| cmp(a, b)),
        None => files.sort_by(|a, b| a.name.cmp(&b.name)),
    }

    // Step 2: optional sharding.
    if let Some(ShardSelector { worker_id, worker_count }) = config.shard {
        files.retain(|f| shard_for(f.name.as_bytes(), worker_count.max(1)) == worker_id);
    }

    let pipe_for = Arc::new(pipe_for);
    let thread_count = config.thread_count.max(1);

    let suppliers = if config.download_first {
        // Step 3: parallel download to a temp folder, jobs weighted by size.
        let dir = Arc::new(tempfile::tempdir().map_err(PipeError::from)?);
        let jobs: Vec<Job> = files.iter().enumerate().map(|(i, f)| Job::new(i, f.size)).collect();
        let assignment = schedule(&jobs, thread_count);

        let local_paths: Vec<Option<PathBuf>> = {
            let mut slots: Vec<Option<PathBuf>> = vec![None; files.len()];
            let handles: Vec<_> = assignment
                .into_iter()
                .map(|worker_jobs| {
                    let bucket = bucket.clone();
                    let dir = dir.clone();
                    let files: Vec<FileMeta> =
                        worker_jobs.iter().map(|job| files[job.id].clone()).collect();
                    let ids: Vec<usize> = worker_jobs.iter().map(|job| job.id).collect();
                    std::thread::spawn(move || -> Result<Vec<(usize, PathBuf)>, PipeError> {
                        let mut downloaded = Vec::with_capacity(files.len());
                        for (id, meta) in ids.into_iter().zip(files.into_iter()) {
                            let local = dir.path().join(sanitize_file_name(&meta.name));
                            bucket.download_to(&meta, &local)?;
                            downloaded.push((id, local));
                        }
                        Ok(downloaded)
                    })
                })
                .collect();

            for handle in handles {
                let downloaded = handle
                    .join()
                    .map_err(|_| PipeError::internal("download worker thread panicked"))??;
                for (id, path) in downloaded {
                    slots[id] = Some(path);
                }
            }
            slots
        };

        files
            .into_iter()
            .zip(local_paths)
            .filter_map(|(meta, path)| path.map(|path| (meta, path)))
            .map(|(meta, path)| {
                let pipe_for = pipe_for.clone();
                let dir = dir.clone();
                Box::new(move || -> Box<dyn SyncPipe<Item = T>> {
                    let reader: Box<dyn std::io::Read + Send> = match std::fs::File::open(&path) {
                        Ok(file) => Box::new(file),
                        Err(e) => {
                            // Surfaced on `start()` via the failing reader, not here:
                            // the supplier contract only allows constructing the pipe.
                            Box::new(FailingReader(e))
                        }
                    };
                    Box::new(DeleteOnClose {
                        inner: pipe_for(reader, meta.clone()),
                        path: path.clone(),
                        _dir: dir.clone(),
                    })
                }) as crate::bridge::PipeSupplier<T>
            })
            .collect()
    } else {
        // Step 4: stream directly from the bucket.
        files
            .into_iter()
            .map(|meta| {
                let bucket = bucket.clone();
                let pipe_for = pipe_for.clone();
                Box::new(move || -> Box<dyn SyncPipe<Item = T>> {
                    match bucket.get_as_stream(&meta) {
                        Ok(stream) => pipe_for(stream, meta.clone()),
                        Err(e) => Box::new(FailingPipe(Some(e), std::marker::PhantomData)) as Box<dyn SyncPipe<Item = T>>,
                    }
                }) as crate::bridge::PipeSupplier<T>
            })
            .collect()
    };

    // Step 5: wrap in SyncToAsync.
    Ok(SyncToAsync::new(suppliers, thread_count))
}

/// Replaces path separators so a bucket key like `a/b/c.txt` never escapes
/// the temp directory it's downloaded into.
fn sanitize_file_name(name: &str) -> String {
    name.replace(['/', '\\'], "_")
}

struct FailingReader(std::io::Error);

impl std::io::Read for FailingReader {
    fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
        Err(std::io::Error::new(self.0.kind(), self.0.to_string()))
    }
}

/// A sync pipe whose `start()` immediately surfaces a construction-time
/// error (e.g. the bucket refused to open a stream).
struct FailingPipe<T>(Option<PipeError>, std::marker::PhantomData<T>);

impl<T: Send> SyncPipe for FailingPipe<T> {
    type Item = T;

    fn start(&mut self) -> Result<(), PipeError> {
        Err(self.0.take().unwrap_or_else(|| PipeError::internal("pipe already failed")))
    }

    fn next(&mut self) -> Result<Option<T>, PipeError> {
        Ok(None)
    }

    fn peek(&mut self) -> Result<Option<&T>, PipeError> {
        Ok(None)
    }

    fn progress(&self) -> f32 {
        1.0
    }

    fn close(&mut self) -> Result<(), PipeError> {
        Ok(())
    }
}
