//! Batch driver running the transformer over many files
//!
//! Each file is an independent unit of work on tokio's blocking pool; at most
//! `concurrency` files are in flight. One file's failure never affects another.

use std::path::PathBuf;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{error, info};

use crate::bounce::transformer::{
    BounceMode, FileReport, Transformer, UnresolvedBlock, UnresolvedReason,
};
use crate::error::BounceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    pub concurrency: usize,
    pub dry_run: bool,
}

/// Aggregated outcome of a batch run, sorted by path
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    pub changed: Vec<PathBuf>,
    pub unchanged: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
    pub unresolved: Vec<(PathBuf, UnresolvedBlock)>,
}

impl BatchSummary {
    fn record(&mut self, path: PathBuf, result: Result<FileReport, BounceError>) {
        match result {
            Ok(report) => {
                self.unresolved.extend(
                    report
                        .unresolved
                        .into_iter()
                        .map(|entry| (report.path.clone(), entry)),
                );
                if report.changed {
                    self.changed.push(report.path);
                } else {
                    self.unchanged.push(report.path);
                }
            }
            Err(e) => {
                error!("Failed to process {}: {}", path.display(), e);
                self.failed.push((path, e.to_string()));
            }
        }
    }

    fn sort(&mut self) {
        self.changed.sort();
        self.unchanged.sort();
        self.failed.sort();
        self.unresolved
            .sort_by(|(a, x), (b, y)| a.cmp(b).then(x.line.cmp(&y.line)));
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    /// Blocks skipped because their module is not published
    pub fn not_found(&self) -> impl Iterator<Item = &(PathBuf, UnresolvedBlock)> {
        self.unresolved
            .iter()
            .filter(|(_, entry)| entry.reason == UnresolvedReason::NotFound)
    }

    /// Blocks skipped because of an invalid source or a registry error
    pub fn errors(&self) -> impl Iterator<Item = &(PathBuf, UnresolvedBlock)> {
        self.unresolved
            .iter()
            .filter(|(_, entry)| entry.reason != UnresolvedReason::NotFound)
    }
}

/// Process every path, writing only files that changed
pub async fn run_batch(
    transformer: Arc<Transformer>,
    mode: Arc<BounceMode>,
    paths: Vec<PathBuf>,
    options: BatchOptions,
) -> BatchSummary {
    info!(
        "Processing {} file(s) in {} mode",
        paths.len(),
        mode.name()
    );

    let results: Vec<(PathBuf, Result<FileReport, BounceError>)> = stream::iter(paths)
        .map(|path| {
            let transformer = Arc::clone(&transformer);
            let mode = Arc::clone(&mode);
            async move {
                let task_path = path.clone();
                let joined = tokio::task::spawn_blocking(move || {
                    transformer.process_file(&task_path, &mode, options.dry_run)
                })
                .await;

                let result = joined.unwrap_or_else(|e| Err(BounceError::Task(e.to_string())));
                (path, result)
            }
        })
        .buffer_unordered(options.concurrency.max(1))
        .collect()
        .await;

    let mut summary = BatchSummary::default();
    for (path, result) in results {
        summary.record(path, result);
    }
    summary.sort();

    info!(
        "{} changed, {} unchanged, {} failed",
        summary.changed.len(),
        summary.unchanged.len(),
        summary.failed.len()
    );
    summary
}
