//! Directory-level batch runs.
//!
//! Ink files and label-graph files are discovered recursively and paired by
//! file stem. Each pair is one independent task on a rayon pool; a failing
//! document is recorded in the [`BatchReport`] and never stops the others.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use indicatif::{ProgressBar, ProgressStyle};
use miette::Diagnostic;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{MissingGroundTruth, OracleConfig};
use crate::error::OracleResult;
use crate::lg;
use crate::oracle::{Document, OracleMode};

pub const INK_EXTENSION: &str = "inkml";
pub const LABEL_GRAPH_EXTENSION: &str = "lg";

#[derive(Debug, Error, Diagnostic)]
pub enum BatchError {
    #[error("no ground-truth file for {ink_path}")]
    #[diagnostic(
        code(oracle::batch::missing_ground_truth),
        help(
            "Add a .lg file with the same stem to the ground-truth directory, \
             or run without --strict to skip it."
        )
    )]
    MissingGroundTruth { ink_path: String },

    #[error("failed to start worker pool: {message}")]
    #[diagnostic(
        code(oracle::batch::thread_pool),
        help("Try a smaller --workers value.")
    )]
    ThreadPool { message: String },

    #[error("failed to write report: {path}")]
    #[diagnostic(
        code(oracle::batch::report),
        help("Ensure the report's parent directory exists and is writable.")
    )]
    Report {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize report: {message}")]
    #[diagnostic(code(oracle::batch::serialize))]
    Serialize { message: String },
}

pub type BatchResult<T> = std::result::Result<T, BatchError>;

/// An ink file and its ground truth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentPair {
    pub ink: PathBuf,
    pub ground_truth: PathBuf,
}

/// Result of scanning the input directories.
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    /// Sorted by ink path.
    pub pairs: Vec<DocumentPair>,
    /// Ink files without a ground-truth file, sorted.
    pub missing: Vec<PathBuf>,
    /// Ink files whose stem an earlier ink file already uses. Both would
    /// write the same output file, so only the first is converted.
    pub duplicates: Vec<PathBuf>,
}

/// Files under `root` with extension `ext`, sorted.
fn files_with_extension(root: &Path, ext: &str) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(
                    root = %root.display(),
                    error = %e,
                    "skipping unreadable directory entry"
                );
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .filter(|path| path.extension().is_some_and(|e| e == ext))
        .collect();
    files.sort();
    files
}

/// Pair every ink file under `ink_dir` with the label graph of the same stem
/// under `ground_truth_dir`.
///
/// Under [`MissingGroundTruth::Fail`] the first unpaired ink file is an
/// error; otherwise unpaired files are logged and listed in
/// [`Discovery::missing`].
pub fn discover(
    ink_dir: &Path,
    ground_truth_dir: &Path,
    policy: MissingGroundTruth,
) -> BatchResult<Discovery> {
    let mut by_stem: HashMap<String, PathBuf> = HashMap::new();
    for path in files_with_extension(ground_truth_dir, LABEL_GRAPH_EXTENSION) {
        let Some(stem) = path.file_stem() else {
            continue;
        };
        let stem = stem.to_string_lossy().into_owned();
        if let Some(existing) = by_stem.get(&stem) {
            tracing::warn!(
                stem = %stem,
                kept = %existing.display(),
                ignored = %path.display(),
                "duplicate ground-truth stem"
            );
            continue;
        }
        by_stem.insert(stem, path);
    }

    let mut discovery = Discovery::default();
    let mut ink_stems: HashMap<String, PathBuf> = HashMap::new();
    for ink in files_with_extension(ink_dir, INK_EXTENSION) {
        let stem = ink
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        if let Some(existing) = ink_stems.get(&stem) {
            tracing::warn!(
                stem = %stem,
                kept = %existing.display(),
                ignored = %ink.display(),
                "duplicate ink stem, outputs would collide"
            );
            discovery.duplicates.push(ink);
            continue;
        }
        ink_stems.insert(stem.clone(), ink.clone());
        match by_stem.get(&stem) {
            Some(gt) => discovery.pairs.push(DocumentPair {
                ground_truth: gt.clone(),
                ink,
            }),
            None if policy == MissingGroundTruth::Fail => {
                return Err(BatchError::MissingGroundTruth {
                    ink_path: ink.display().to_string(),
                });
            }
            None => {
                tracing::warn!(path = %ink.display(), "no ground-truth file, skipping");
                discovery.missing.push(ink);
            }
        }
    }
    tracing::info!(
        documents = discovery.pairs.len(),
        missing = discovery.missing.len(),
        duplicates = discovery.duplicates.len(),
        "discovery complete"
    );
    Ok(discovery)
}

/// A document that could not be converted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentFailure {
    pub path: PathBuf,
    pub error: String,
}

/// Summary of a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub mode: Option<OracleMode>,
    /// Documents written successfully.
    pub processed: usize,
    pub failed: Vec<DocumentFailure>,
    /// Ink files with no ground truth.
    pub skipped_missing: Vec<PathBuf>,
    /// Ink files skipped because another ink file has the same stem.
    #[serde(default)]
    pub skipped_duplicate: Vec<PathBuf>,
    /// Documents not started because the run was cancelled.
    pub cancelled: usize,
}

impl BatchReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
            && self.skipped_missing.is_empty()
            && self.skipped_duplicate.is_empty()
            && self.cancelled == 0
    }

    /// Write the report as pretty JSON.
    pub fn write_json(&self, path: &Path) -> BatchResult<()> {
        let json = serde_json::to_string_pretty(self).map_err(|e| BatchError::Serialize {
            message: e.to_string(),
        })?;
        std::fs::write(path, json).map_err(|e| BatchError::Report {
            path: path.display().to_string(),
            source: e,
        })
    }
}

enum Outcome {
    Written,
    Failed(DocumentFailure),
    Cancelled,
}

/// Load, run and write one document. Returns the output path.
pub fn process_document(
    pair: &DocumentPair,
    mode: OracleMode,
    config: &OracleConfig,
) -> OracleResult<PathBuf> {
    let document = Document::load(&pair.ink, &pair.ground_truth, config.coordinate_scale)?;
    let output = document.run(mode)?;
    Ok(lg::write(&config.output_dir, &pair.ink, &output)?)
}

fn progress_bar(len: usize, enabled: bool) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb
}

/// Convert every discovered document with `mode`.
///
/// `cancel` is checked before each document starts; documents not yet
/// started when it is set are counted as cancelled.
pub fn run_batch(
    discovery: &Discovery,
    mode: OracleMode,
    config: &OracleConfig,
    cancel: &AtomicBool,
) -> BatchResult<BatchReport> {
    let workers = config.effective_workers();
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("oracle-worker-{i}"))
        .build()
        .map_err(|e| BatchError::ThreadPool {
            message: e.to_string(),
        })?;

    let pb = progress_bar(discovery.pairs.len(), config.progress);
    pb.set_message(mode.name());
    tracing::info!(
        mode = %mode,
        documents = discovery.pairs.len(),
        workers,
        output = %config.output_dir.display(),
        "starting batch"
    );

    let outcomes: Vec<Outcome> = pool.install(|| {
        discovery
            .pairs
            .par_iter()
            .map(|pair| {
                if cancel.load(Ordering::SeqCst) {
                    return Outcome::Cancelled;
                }
                let outcome = match process_document(pair, mode, config) {
                    Ok(path) => {
                        tracing::debug!(
                            input = %pair.ink.display(),
                            output = %path.display(),
                            "document converted"
                        );
                        Outcome::Written
                    }
                    Err(e) => {
                        tracing::warn!(path = %pair.ink.display(), error = %e, "document failed");
                        Outcome::Failed(DocumentFailure {
                            path: pair.ink.clone(),
                            error: e.to_string(),
                        })
                    }
                };
                pb.inc(1);
                outcome
            })
            .collect()
    });
    pb.finish_and_clear();

    let mut report = BatchReport {
        mode: Some(mode),
        skipped_missing: discovery.missing.clone(),
        skipped_duplicate: discovery.duplicates.clone(),
        ..Default::default()
    };
    for outcome in outcomes {
        match outcome {
            Outcome::Written => report.processed += 1,
            Outcome::Failed(failure) => report.failed.push(failure),
            Outcome::Cancelled => report.cancelled += 1,
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn pairs_by_stem_recursively() {
        let dir = tempfile::tempdir().unwrap();
        let ink = dir.path().join("ink");
        let gt = dir.path().join("gt");
        touch(&ink.join("b.inkml"), "");
        touch(&ink.join("nested/a.inkml"), "");
        touch(&ink.join("notes.txt"), "");
        touch(&gt.join("deep/er/a.lg"), "");
        touch(&gt.join("b.lg"), "");

        let found = discover(&ink, &gt, MissingGroundTruth::Skip).unwrap();
        assert!(found.missing.is_empty());
        let stems: Vec<_> = found
            .pairs
            .iter()
            .map(|p| p.ink.file_stem().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(stems, vec!["b", "a"]);
        assert_eq!(found.pairs[1].ground_truth, gt.join("deep/er/a.lg"));
    }

    #[test]
    fn missing_ground_truth_policy() {
        let dir = tempfile::tempdir().unwrap();
        let ink = dir.path().join("ink");
        let gt = dir.path().join("gt");
        touch(&ink.join("a.inkml"), "");
        touch(&ink.join("b.inkml"), "");
        touch(&gt.join("a.lg"), "");

        let found = discover(&ink, &gt, MissingGroundTruth::Skip).unwrap();
        assert_eq!(found.pairs.len(), 1);
        assert_eq!(found.missing, vec![ink.join("b.inkml")]);

        assert!(matches!(
            discover(&ink, &gt, MissingGroundTruth::Fail),
            Err(BatchError::MissingGroundTruth { .. })
        ));
    }

    #[test]
    fn duplicate_ink_stems_keep_the_first() {
        let dir = tempfile::tempdir().unwrap();
        let ink = dir.path().join("ink");
        let gt = dir.path().join("gt");
        touch(&ink.join("a.inkml"), "");
        touch(&ink.join("x/a.inkml"), "");
        touch(&gt.join("a.lg"), "");

        let found = discover(&ink, &gt, MissingGroundTruth::Fail).unwrap();
        assert_eq!(found.pairs.len(), 1);
        assert_eq!(found.pairs[0].ink, ink.join("a.inkml"));
        assert_eq!(found.duplicates, vec![ink.join("x/a.inkml")]);
    }

    #[test]
    fn cancelled_batch_processes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let discovery = Discovery {
            pairs: vec![DocumentPair {
                ink: dir.path().join("a.inkml"),
                ground_truth: dir.path().join("a.lg"),
            }],
            ..Default::default()
        };
        let config = OracleConfig {
            output_dir: dir.path().join("out"),
            workers: 1,
            progress: false,
            ..Default::default()
        };
        let report =
            run_batch(&discovery, OracleMode::LrStroke, &config, &AtomicBool::new(true)).unwrap();
        assert_eq!(report.cancelled, 1);
        assert_eq!(report.processed, 0);
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn report_round_trips_as_json() {
        let dir = tempfile::tempdir().unwrap();
        let report = BatchReport {
            mode: Some(OracleMode::MstSymbol),
            processed: 3,
            failed: vec![DocumentFailure {
                path: PathBuf::from("x.inkml"),
                error: "boom".into(),
            }],
            skipped_missing: vec![PathBuf::from("y.inkml")],
            skipped_duplicate: Vec::new(),
            cancelled: 0,
        };
        let path = dir.path().join("report.json");
        report.write_json(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"mst_symbol\""));
        let back: BatchReport = serde_json::from_str(&text).unwrap();
        assert_eq!(back, report);
        assert!(!back.is_clean());
    }
}
