//! Run directory discovery and parsing.
//!
//! [`RunRecordLoader`] walks each root for directories holding both
//! `config.json` and `run.json`, then parses every candidate into a
//! [`RunRecord`]. A bad directory never aborts the scan: it is recorded as a
//! [`LoadFailure`] and logged, and the scan moves on.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::Instrument;
use walkdir::WalkDir;

use super::{RunRecord, CONFIG_FILE, RUN_FILE};
use crate::error::LoadError;
use crate::obs::{
    emit_record_skipped, emit_scan_finished, emit_scan_started, scan_span, ScanSpan,
};

/// A directory that was skipped, with the reason.
#[derive(Debug)]
pub struct LoadFailure {
    pub dir: PathBuf,
    pub error: LoadError,
}

impl LoadFailure {
    pub fn new(dir: impl Into<PathBuf>, error: LoadError) -> Self {
        Self {
            dir: dir.into(),
            error,
        }
    }

    pub fn reason(&self) -> String {
        self.error.to_string()
    }
}

/// Candidate run directories in discovery order, plus walk-level failures.
#[derive(Debug, Default)]
pub struct Discovery {
    pub dirs: Vec<PathBuf>,
    pub failures: Vec<LoadFailure>,
}

/// Records that loaded, and every directory that did not.
#[derive(Debug, Default)]
pub struct LoadOutcome {
    /// Successfully parsed records, in discovery order.
    pub records: Vec<RunRecord>,
    /// Skipped directories, in the order they were encountered.
    pub failures: Vec<LoadFailure>,
}

/// Returns `true` when `dir` holds both run documents as regular files.
pub fn is_run_dir(dir: &Path) -> bool {
    dir.join(CONFIG_FILE).is_file() && dir.join(RUN_FILE).is_file()
}

/// Discovers and parses run directories under a set of roots.
#[derive(Debug, Clone)]
pub struct RunRecordLoader {
    roots: Vec<PathBuf>,
}

impl RunRecordLoader {
    pub fn new<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
        }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Find run directories under every root.
    ///
    /// Roots are visited in order and each is walked depth-first with
    /// entries sorted by file name. A matched directory is not descended
    /// into. A directory reachable from several roots is reported once.
    pub fn discover(&self) -> Discovery {
        let mut discovery = Discovery::default();
        let mut seen = HashSet::new();
        for root in &self.roots {
            walk_root(root, &mut seen, &mut discovery);
        }
        discovery
    }

    /// Discover and parse sequentially.
    pub fn load(&self) -> LoadOutcome {
        let _span = ScanSpan::enter(self.roots.len());
        emit_scan_started(&self.roots);

        let Discovery { dirs, failures } = self.discover();
        let discovered = dirs.len();
        let mut outcome = LoadOutcome {
            records: Vec::with_capacity(discovered),
            failures,
        };
        for dir in dirs {
            absorb(&mut outcome, dir.clone(), RunRecord::load_from_dir(&dir));
        }

        emit_scan_finished(discovered, outcome.records.len(), outcome.failures.len());
        outcome
    }

    /// Discover sequentially, then parse on the blocking pool with at most
    /// `jobs` directories in flight.
    ///
    /// The outcome is ordered exactly as [`load`](Self::load) would order it.
    pub async fn load_concurrent(&self, jobs: usize) -> LoadOutcome {
        self.parse_concurrent(jobs)
            .instrument(scan_span(self.roots.len()))
            .await
    }

    async fn parse_concurrent(&self, jobs: usize) -> LoadOutcome {
        emit_scan_started(&self.roots);

        let Discovery { dirs, failures } = self.discover();
        let discovered = dirs.len();
        let permits = Arc::new(Semaphore::new(jobs.max(1)));
        let mut join_set = JoinSet::new();

        for (idx, dir) in dirs.iter().cloned().enumerate() {
            let permits = Arc::clone(&permits);
            join_set.spawn(async move {
                let _permit = permits.acquire_owned().await;
                let parsed = tokio::task::spawn_blocking(move || RunRecord::load_from_dir(&dir))
                    .await
                    .unwrap_or_else(|e| Err(LoadError::Task(e.to_string())));
                (idx, parsed)
            });
        }

        let mut slots: Vec<Option<Result<RunRecord, LoadError>>> =
            dirs.iter().map(|_| None).collect();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((idx, parsed)) => slots[idx] = Some(parsed),
                Err(e) => tracing::error!(error = %e, "loader task join error"),
            }
        }

        let mut outcome = LoadOutcome {
            records: Vec::with_capacity(discovered),
            failures,
        };
        for (dir, slot) in dirs.into_iter().zip(slots) {
            let parsed = slot
                .unwrap_or_else(|| Err(LoadError::Task("loader task did not finish".to_string())));
            absorb(&mut outcome, dir, parsed);
        }

        emit_scan_finished(discovered, outcome.records.len(), outcome.failures.len());
        outcome
    }
}

fn absorb(outcome: &mut LoadOutcome, dir: PathBuf, parsed: Result<RunRecord, LoadError>) {
    match parsed {
        Ok(record) => outcome.records.push(record),
        Err(error) => {
            emit_record_skipped(&dir, &error);
            outcome.failures.push(LoadFailure::new(dir, error));
        }
    }
}

fn walk_root(root: &Path, seen: &mut HashSet<PathBuf>, discovery: &mut Discovery) {
    if !root.exists() {
        let error = LoadError::MissingRoot(root.to_path_buf());
        emit_record_skipped(root, &error);
        discovery.failures.push(LoadFailure::new(root, error));
        return;
    }
    if !root.is_dir() {
        let error = LoadError::NotADirectory(root.to_path_buf());
        emit_record_skipped(root, &error);
        discovery.failures.push(LoadFailure::new(root, error));
        return;
    }

    let mut walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter();

    while let Some(entry) = walker.next() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                let dir = err
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| root.to_path_buf());
                let error = LoadError::Walk(err);
                emit_record_skipped(&dir, &error);
                discovery.failures.push(LoadFailure::new(dir, error));
                continue;
            }
        };

        if !entry.file_type().is_dir() || !is_run_dir(entry.path()) {
            continue;
        }
        walker.skip_current_dir();

        let key = entry
            .path()
            .canonicalize()
            .unwrap_or_else(|_| entry.path().to_path_buf());
        if seen.insert(key) {
            discovery.dirs.push(entry.into_path());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_run(dir: &Path, config: &str, run: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(CONFIG_FILE), config).unwrap();
        fs::write(dir.join(RUN_FILE), run).unwrap();
    }

    #[test]
    fn is_run_dir_requires_both_files() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(!is_run_dir(tmp.path()));
        fs::write(tmp.path().join(CONFIG_FILE), "{}").unwrap();
        assert!(!is_run_dir(tmp.path()));
        fs::write(tmp.path().join(RUN_FILE), "{}").unwrap();
        assert!(is_run_dir(tmp.path()));
    }

    #[test]
    fn discovery_is_sorted_and_does_not_descend_into_matches() {
        let tmp = tempfile::tempdir().unwrap();
        write_run(&tmp.path().join("b/2"), "{}", "{}");
        write_run(&tmp.path().join("a/1"), "{}", "{}");
        // Nested inside a matched run directory: must be ignored.
        write_run(&tmp.path().join("a/1/inner"), "{}", "{}");

        let discovery = RunRecordLoader::new([tmp.path()]).discover();
        assert!(discovery.failures.is_empty());
        assert_eq!(
            discovery.dirs,
            vec![tmp.path().join("a/1"), tmp.path().join("b/2")]
        );
    }

    #[test]
    fn nested_roots_are_deduplicated() {
        let tmp = tempfile::tempdir().unwrap();
        write_run(&tmp.path().join("sweep/1"), "{}", "{}");

        let loader = RunRecordLoader::new([tmp.path().to_path_buf(), tmp.path().join("sweep")]);
        assert_eq!(loader.discover().dirs.len(), 1);
    }

    #[test]
    fn missing_root_is_a_failure_not_a_panic() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("nope");
        let outcome = RunRecordLoader::new([&missing]).load();
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.failures.len(), 1);
        assert!(matches!(outcome.failures[0].error, LoadError::MissingRoot(_)));
    }

    #[test]
    fn file_root_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("runs.txt");
        fs::write(&file, "not a directory").unwrap();
        write_run(&tmp.path().join("sweep/1"), "{}", "{}");

        let discovery = RunRecordLoader::new([file.clone(), tmp.path().join("sweep")]).discover();
        assert_eq!(discovery.dirs, vec![tmp.path().join("sweep/1")]);
        assert_eq!(discovery.failures.len(), 1);
        assert_eq!(discovery.failures[0].dir, file);
        assert!(matches!(
            discovery.failures[0].error,
            LoadError::NotADirectory(_)
        ));
    }

    #[test]
    fn malformed_json_is_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        write_run(&tmp.path().join("1"), "{not json", "{}");
        write_run(&tmp.path().join("2"), "{}", r#"{"status": "COMPLETED"}"#);

        let outcome = RunRecordLoader::new([tmp.path()]).load();
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].dir(), tmp.path().join("2"));
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].dir, tmp.path().join("1"));
        assert!(outcome.failures[0].reason().contains("invalid JSON"));
    }

    #[test]
    fn root_that_is_itself_a_run_dir() {
        let tmp = tempfile::tempdir().unwrap();
        write_run(tmp.path(), "{}", "{}");
        let outcome = RunRecordLoader::new([tmp.path()]).load();
        assert_eq!(outcome.records.len(), 1);
    }
}
