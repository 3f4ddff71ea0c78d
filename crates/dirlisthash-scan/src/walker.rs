//! Deterministic depth-first walker producing inventory records.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use compact_str::CompactString;
use jwalk::{DirEntryIter, Parallelism, WalkDir};
use rayon::ThreadPool;
use rayon::prelude::*;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use dirlisthash_core::{
    Digests, HashAlgorithm, Record, RunConfig, RunSummary, ScanWarning, WalkError,
};

use crate::hasher::HashEngine;
use crate::metadata::{FsKind, read_metadata};
use crate::progress::{ProgressTracker, WalkProgress};

/// Entries taken from discovery per batch when hashing on a worker pool.
const PARALLEL_BATCH: usize = 256;

/// Walks a root directory and yields one [`Record`] per file and directory.
///
/// Discovery is sequential and sorted: depth-first, a directory's record
/// before its children, siblings in byte order of their names. Symbolic
/// links are never followed; they and special files are skipped with a
/// warning. Per-entry failures become warnings in the [`RunSummary`].
pub struct Walker {
    root: PathBuf,
    algorithms: &'static [HashAlgorithm],
    engine: HashEngine,
    pool: Option<ThreadPool>,
    progress_tx: broadcast::Sender<WalkProgress>,
    interrupt: Option<Arc<AtomicBool>>,
}

impl Walker {
    /// Create a walker for a run.
    pub fn new(config: &RunConfig) -> Result<Self, WalkError> {
        let pool = if config.is_parallel() {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(config.threads)
                .thread_name(|i| format!("dirlisthash-hash-{i}"))
                .build()
                .map_err(|e| WalkError::ThreadPool {
                    message: e.to_string(),
                })?;
            Some(pool)
        } else {
            None
        };

        let (progress_tx, _) = broadcast::channel(256);

        Ok(Self {
            root: config.root.clone(),
            algorithms: config.hash_mode.algorithms(),
            engine: HashEngine::new(config.chunk_size),
            pool,
            progress_tx,
            interrupt: None,
        })
    }

    /// Stop discovering new entries once `flag` is set.
    pub fn with_interrupt(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupt = Some(flag);
        self
    }

    /// Subscribe to per-entry progress updates.
    ///
    /// Slow receivers lag and lose updates; the walk never waits for them.
    pub fn subscribe(&self) -> broadcast::Receiver<WalkProgress> {
        self.progress_tx.subscribe()
    }

    /// Configured root path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of hashing threads, or `None` for the sequential pipeline.
    pub fn hash_threads(&self) -> Option<usize> {
        self.pool.as_ref().map(ThreadPool::current_num_threads)
    }

    /// Start a fresh walk.
    ///
    /// Fails with [`WalkError::RootInvalid`] if the root does not exist or is
    /// not a directory.
    pub fn walk(&self) -> Result<Walk<'_>, WalkError> {
        let root = self
            .root
            .canonicalize()
            .map_err(|e| WalkError::root_io(&self.root, &e))?;

        if !root.is_dir() {
            return Err(WalkError::not_a_directory(root));
        }

        let entries = WalkDir::new(&root)
            .parallelism(Parallelism::Serial)
            .sort(true)
            .skip_hidden(false)
            .follow_links(false)
            .min_depth(1)
            .into_iter();

        debug!(
            root = %root.display(),
            algorithms = ?self.algorithms,
            threads = ?self.hash_threads(),
            "starting walk"
        );

        Ok(Walk {
            walker: self,
            entries,
            ready: VecDeque::new(),
            summary: RunSummary::new(root),
            tracker: ProgressTracker::new(),
            exhausted: false,
        })
    }

    fn interrupt_requested(&self) -> bool {
        self.interrupt
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }
}

/// An in-progress walk. Iterate it to receive records in traversal order,
/// then call [`Walk::finish`] for the summary.
pub struct Walk<'a> {
    walker: &'a Walker,
    entries: DirEntryIter<((), ())>,
    ready: VecDeque<Record>,
    summary: RunSummary,
    tracker: ProgressTracker,
    exhausted: bool,
}

impl Walk<'_> {
    /// Canonical root of this walk.
    pub fn root(&self) -> &Path {
        &self.summary.root
    }

    /// Summary of the records emitted so far.
    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    /// End the walk and return its summary.
    pub fn finish(mut self) -> RunSummary {
        self.summary.duration = self.tracker.elapsed();
        info!(
            files = self.summary.files,
            directories = self.summary.directories,
            bytes = self.summary.total_bytes,
            warnings = self.summary.warning_count(),
            interrupted = self.summary.interrupted,
            "walk finished"
        );
        self.summary
    }

    /// Pull up to `limit` entries from discovery.
    fn discover(&mut self, limit: usize) -> Vec<Discovered> {
        let mut batch = Vec::with_capacity(limit);

        while batch.len() < limit {
            if self.walker.interrupt_requested() {
                debug!("interrupt requested, stopping discovery");
                self.summary.interrupted = true;
                self.exhausted = true;
                break;
            }

            match self.entries.next() {
                None => {
                    self.exhausted = true;
                    break;
                }
                Some(Ok(mut entry)) => {
                    let path = entry.path();
                    // The directory itself is still recorded; only its children are lost.
                    if let Some(err) = entry.read_children_error.take() {
                        self.warn(ScanWarning::read_dir(&path, err.to_string()));
                    }
                    batch.push(Discovered {
                        name: CompactString::new(entry.file_name().to_string_lossy()),
                        is_symlink: entry.file_type().is_symlink(),
                        path,
                    });
                }
                Some(Err(err)) => {
                    let path = err
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| self.summary.root.clone());
                    self.warn(ScanWarning::read_dir(path, err.to_string()));
                }
            }
        }

        batch
    }

    /// Process discovered entries until at least one record is ready.
    fn fill(&mut self) {
        let walker = self.walker;

        while self.ready.is_empty() && !self.exhausted {
            let limit = if walker.pool.is_some() { PARALLEL_BATCH } else { 1 };
            let batch = self.discover(limit);

            // Indexed collect keeps discovery order regardless of which
            // worker finishes first.
            let outcomes: Vec<Outcome> = match &walker.pool {
                Some(pool) => pool.install(|| {
                    batch
                        .into_par_iter()
                        .map(|entry| visit(&walker.engine, walker.algorithms, entry))
                        .collect()
                }),
                None => batch
                    .into_iter()
                    .map(|entry| visit(&walker.engine, walker.algorithms, entry))
                    .collect(),
            };

            for outcome in outcomes {
                self.accept(outcome);
            }
        }
    }

    fn accept(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Emit {
                record,
                hashed,
                warning,
            } => {
                if let Some(warning) = warning {
                    self.warn(warning);
                }
                if hashed {
                    self.summary.record_hashed();
                }
                self.ready.push_back(record);
            }
            Outcome::Skip(warning) => self.warn(warning),
        }
    }

    fn warn(&mut self, warning: ScanWarning) {
        warn!(path = %warning.path.display(), kind = %warning.kind, "{}", warning.message);
        self.tracker.record_warning();
        self.summary.warn(warning);
    }
}

impl Iterator for Walk<'_> {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        self.fill();
        let record = self.ready.pop_front()?;

        self.summary.record(&record);
        if record.is_dir() {
            self.tracker.record_dir();
        } else {
            self.tracker.record_file(record.size_bytes);
        }

        if self.walker.progress_tx.receiver_count() > 0 {
            let _ = self
                .walker
                .progress_tx
                .send(self.tracker.snapshot(&record.full_path));
        }

        Some(record)
    }
}

/// An entry as found by discovery, before metadata is read.
struct Discovered {
    path: PathBuf,
    name: CompactString,
    is_symlink: bool,
}

/// Result of visiting one discovered entry.
enum Outcome {
    Emit {
        record: Record,
        hashed: bool,
        warning: Option<ScanWarning>,
    },
    Skip(ScanWarning),
}

/// Read metadata and, for files, digests. Never fails: problems become warnings.
fn visit(engine: &HashEngine, algorithms: &[HashAlgorithm], entry: Discovered) -> Outcome {
    if entry.is_symlink {
        return Outcome::Skip(ScanWarning::symlink_skipped(entry.path));
    }

    let meta = match read_metadata(&entry.path) {
        Ok(meta) => meta,
        Err(err) => return Outcome::Skip(ScanWarning::from(&err)),
    };

    match meta.kind {
        FsKind::Directory => Outcome::Emit {
            record: Record::new_directory(entry.path, entry.name, meta.timestamps),
            hashed: false,
            warning: None,
        },
        FsKind::File => {
            let (digests, hashed, warning) = match engine.compute(&entry.path, algorithms) {
                Ok(digests) => (digests, !algorithms.is_empty(), None),
                Err(err) => (Digests::default(), false, Some(ScanWarning::from(&err))),
            };
            Outcome::Emit {
                record: Record::new_file(
                    entry.path,
                    entry.name,
                    meta.size_bytes,
                    digests,
                    meta.timestamps,
                ),
                hashed,
                warning,
            }
        }
        // Replaced by a link between discovery and stat.
        FsKind::Symlink => Outcome::Skip(ScanWarning::symlink_skipped(entry.path)),
        FsKind::Other => Outcome::Skip(ScanWarning::unsupported(entry.path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dirlisthash_core::HashMode;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_tree() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();

        fs::create_dir(root.join("dir1")).unwrap();
        fs::create_dir(root.join("dir2")).unwrap();
        fs::create_dir(root.join("dir1/subdir")).unwrap();

        fs::write(root.join("file1.txt"), "hello").unwrap();
        fs::write(root.join("dir1/file2.txt"), "world world world").unwrap();
        fs::write(root.join("dir1/subdir/file3.txt"), "test").unwrap();
        fs::write(root.join("dir2/file4.txt"), "another file here").unwrap();
        fs::write(root.join(".hidden"), "kept").unwrap();

        temp
    }

    fn names(records: &[Record], root: &Path) -> Vec<String> {
        records
            .iter()
            .map(|r| {
                r.full_path
                    .strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect()
    }

    #[test]
    fn test_depth_first_sorted_order() {
        let temp = create_test_tree();
        let walker = Walker::new(&RunConfig::new(temp.path())).unwrap();
        let walk = walker.walk().unwrap();
        let root = walk.root().to_path_buf();
        let records: Vec<Record> = walk.collect();

        assert_eq!(
            names(&records, &root),
            vec![
                ".hidden",
                "dir1",
                "dir1/file2.txt",
                "dir1/subdir",
                "dir1/subdir/file3.txt",
                "dir2",
                "dir2/file4.txt",
                "file1.txt",
            ]
        );
    }

    #[test]
    fn test_summary_counts() {
        let temp = create_test_tree();
        let walker = Walker::new(&RunConfig::new(temp.path())).unwrap();
        let mut walk = walker.walk().unwrap();
        let count = walk.by_ref().count();
        let summary = walk.finish();

        assert_eq!(count, 8);
        assert_eq!(summary.files, 5);
        assert_eq!(summary.directories, 3);
        assert_eq!(summary.total_bytes, 5 + 17 + 4 + 17 + 4);
        assert_eq!(summary.hashed_files, 0);
        assert!(!summary.has_warnings());
    }

    #[test]
    fn test_root_must_be_directory() {
        let temp = create_test_tree();
        let walker = Walker::new(&RunConfig::new(temp.path().join("file1.txt"))).unwrap();
        assert!(matches!(walker.walk(), Err(WalkError::RootInvalid { .. })));

        let walker = Walker::new(&RunConfig::new(temp.path().join("missing"))).unwrap();
        assert!(matches!(walker.walk(), Err(WalkError::RootInvalid { .. })));
    }

    #[test]
    fn test_interrupt_stops_discovery() {
        let temp = create_test_tree();
        let flag = Arc::new(AtomicBool::new(true));
        let walker = Walker::new(&RunConfig::new(temp.path()))
            .unwrap()
            .with_interrupt(Arc::clone(&flag));

        let mut walk = walker.walk().unwrap();
        assert!(walk.next().is_none());
        assert!(walk.finish().interrupted);
    }

    #[test]
    fn test_parallel_hashing_keeps_order() {
        let temp = create_test_tree();
        let sequential = RunConfig::new(temp.path()).with_hash_mode(HashMode::Both);
        let mut parallel = sequential.clone();
        parallel.threads = 4;

        let seq_walker = Walker::new(&sequential).unwrap();
        let par_walker = Walker::new(&parallel).unwrap();
        assert_eq!(par_walker.hash_threads(), Some(4));

        let seq: Vec<Record> = seq_walker.walk().unwrap().collect();
        let par: Vec<Record> = par_walker.walk().unwrap().collect();

        let seq_keys: Vec<_> = seq.iter().map(|r| (&r.full_path, &r.digests)).collect();
        let par_keys: Vec<_> = par.iter().map(|r| (&r.full_path, &r.digests)).collect();
        assert_eq!(seq_keys, par_keys);
    }

    #[test]
    fn test_progress_events() {
        let temp = create_test_tree();
        let walker = Walker::new(&RunConfig::new(temp.path())).unwrap();
        let mut rx = walker.subscribe();

        let emitted = walker.walk().unwrap().count();

        let mut received = 0;
        let mut last = None;
        while let Ok(progress) = rx.try_recv() {
            received += 1;
            last = Some(progress);
        }
        assert_eq!(received, emitted);
        assert_eq!(last.unwrap().total_items(), emitted as u64);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_are_skipped() {
        let temp = create_test_tree();
        std::os::unix::fs::symlink(temp.path().join("dir1"), temp.path().join("link_to_dir1"))
            .unwrap();

        let walker = Walker::new(&RunConfig::new(temp.path())).unwrap();
        let mut walk = walker.walk().unwrap();
        let records: Vec<Record> = walk.by_ref().collect();
        let summary = walk.finish();

        assert_eq!(records.len(), 8);
        assert!(records.iter().all(|r| r.name.as_str() != "link_to_dir1"));
        assert_eq!(summary.warning_count(), 1);
        assert_eq!(summary.skipped_count(), 1);
    }
}
