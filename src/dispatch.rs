//! Parallel fan-out of directory pipelines
//!
//! One pipeline per immediate subdirectory of a root, bounded by a worker pool
//! sized to the host's parallelism. Workers share nothing but the filesystem,
//! and each owns its directory subtree exclusively; directory discovery rejects
//! symlinks so no two candidates can alias the same tree. Results are collected
//! after all workers complete, and one directory failing - or panicking - never
//! disturbs the others.

use crate::config::{is_c_or_cpp_source, ToolchainConfig};
use crate::pipeline::{DirectoryPipeline, PipelineOutcome};
use crate::progress::{LoggingHandler, ProgressEvent, ProgressHandler};
use anyhow::{Context, Result};
use ignore::WalkBuilder;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

/// Runs one [`DirectoryPipeline`] per candidate directory on a bounded pool
pub struct ParallelDispatcher {
    config: Arc<ToolchainConfig>,
    require_c_sources: bool,
    progress_handler: Option<LoggingHandler>,
}

impl ParallelDispatcher {
    pub fn new(config: Arc<ToolchainConfig>) -> Self {
        Self {
            config,
            require_c_sources: false,
            progress_handler: None,
        }
    }

    /// Skip directories containing no C/C++ sources instead of building them
    pub fn require_c_sources(mut self, enabled: bool) -> Self {
        self.require_c_sources = enabled;
        self
    }

    pub fn with_progress(mut self, handler: LoggingHandler) -> Self {
        self.progress_handler = Some(handler);
        self
    }

    /// Runs the pipeline over every immediate subdirectory of `root`
    ///
    /// The returned mapping has exactly one outcome per discovered directory.
    /// This is a single join point: no partial results are surfaced while
    /// workers are still running.
    pub async fn run(&self, root: &Path) -> Result<BTreeMap<PathBuf, PipelineOutcome>> {
        let start = Instant::now();
        let candidates = discover_directories(root)?;

        info!(
            root = %root.display(),
            candidates = candidates.len(),
            workers = self.config.effective_jobs(),
            "Dispatching directory pipelines"
        );

        let semaphore = Arc::new(Semaphore::new(self.config.effective_jobs()));
        let mut handles = Vec::with_capacity(candidates.len());

        for dir in candidates {
            let config = Arc::clone(&self.config);
            let semaphore = Arc::clone(&semaphore);
            let require_c_sources = self.require_c_sources;
            let progress = self.progress_handler;
            let task_dir = dir.clone();

            let handle = tokio::spawn(async move {
                let dir = task_dir;
                let _permit = semaphore
                    .acquire()
                    .await
                    .expect("dispatcher semaphore closed");

                if require_c_sources && !has_c_or_cpp_files(&dir) {
                    debug!(dir = %dir.display(), "No C/C++ sources, skipping");
                    return (dir, PipelineOutcome::skipped("no C/C++ sources"));
                }

                let mut pipeline = DirectoryPipeline::new(&config);
                if let Some(handler) = progress {
                    pipeline = pipeline.with_progress(handler);
                }
                let outcome = pipeline.execute(&dir).await;
                (dir, outcome)
            });
            handles.push((dir, handle));
        }

        let mut outcomes = BTreeMap::new();
        for (dir, handle) in handles {
            match handle.await {
                Ok((dir, outcome)) => {
                    outcomes.insert(dir, outcome);
                }
                Err(err) => {
                    // A panicked or cancelled worker is contained here; the
                    // directory still gets an outcome of its own.
                    warn!(dir = %dir.display(), error = %err, "Pipeline worker did not complete");
                    outcomes.insert(
                        dir,
                        PipelineOutcome::failure("dispatch", format!("worker failed: {}", err)),
                    );
                }
            }
        }

        if let Some(handler) = &self.progress_handler {
            handler.on_progress(&ProgressEvent::DispatchComplete {
                directories: outcomes.len(),
                total_time: start.elapsed(),
            });
        }

        Ok(outcomes)
    }
}

/// Enumerates candidate project directories: the immediate, non-hidden,
/// non-symlink subdirectories of `root`, in sorted order
pub fn discover_directories(root: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(root)
        .with_context(|| format!("Failed to read root directory {}", root.display()))?;

    let mut candidates = Vec::new();
    for entry in entries {
        let entry = entry.context("Failed to read directory entry")?;
        let path = entry.path();

        let file_type = entry.file_type().context("Failed to stat directory entry")?;
        if !file_type.is_dir() || file_type.is_symlink() {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if name.starts_with('.') {
                continue;
            }
        }
        candidates.push(path);
    }

    candidates.sort();
    Ok(candidates)
}

/// True when any file under `dir` is a C/C++ translation unit
fn has_c_or_cpp_files(dir: &Path) -> bool {
    for result in WalkBuilder::new(dir).standard_filters(false).build() {
        if let Ok(entry) = result {
            let path = entry.path();
            if path.is_file() && is_c_or_cpp_source(path) {
                return true;
            }
        }
    }
    false
}
