//! Sequential stage orchestration for one directory

use super::analyze::AnalyzeStage;
use super::build::BuildStage;
use super::context::DirectoryContext;
use super::link::LinkStage;
use super::normalize::NormalizeStage;
use super::outcome::{PipelineOutcome, StageStatus};
use super::stage::{HarvestStage, PipelineStage};
use crate::config::ToolchainConfig;
use crate::progress::{LoggingHandler, ProgressEvent, ProgressHandler};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Runs the fixed stage chain for one project directory
///
/// Stages execute strictly in order and every external call blocks this
/// directory's worker only. The run always ends in exactly one
/// [`PipelineOutcome`]; plumbing errors inside a stage become a `Failure`
/// outcome rather than propagating out.
pub struct DirectoryPipeline<'a> {
    config: &'a ToolchainConfig,
    progress_handler: Option<LoggingHandler>,
}

impl<'a> DirectoryPipeline<'a> {
    pub fn new(config: &'a ToolchainConfig) -> Self {
        Self {
            config,
            progress_handler: None,
        }
    }

    pub fn with_progress(mut self, handler: LoggingHandler) -> Self {
        self.progress_handler = Some(handler);
        self
    }

    pub async fn execute(&self, dir: &Path) -> PipelineOutcome {
        let start = Instant::now();
        info!(dir = %dir.display(), "Starting directory pipeline");

        if let Some(handler) = &self.progress_handler {
            handler.on_progress(&ProgressEvent::PipelineStarted {
                directory: dir.display().to_string(),
            });
        }

        let stages: Vec<Box<dyn PipelineStage>> = vec![
            Box::new(BuildStage),
            Box::new(HarvestStage),
            Box::new(LinkStage),
            Box::new(NormalizeStage),
            Box::new(AnalyzeStage),
        ];

        let mut ctx = DirectoryContext::new(dir);
        let mut outcome = PipelineOutcome::Success;

        for stage in stages {
            if let Some(handler) = &self.progress_handler {
                handler.on_progress(&ProgressEvent::StageStarted {
                    stage: stage.name().to_string(),
                });
            }

            let stage_start = Instant::now();
            match stage.execute(self.config, &mut ctx).await {
                Ok(StageStatus::Continue) => {
                    debug!(stage = stage.name(), "Stage complete");
                    if let Some(handler) = &self.progress_handler {
                        handler.on_progress(&ProgressEvent::StageComplete {
                            stage: stage.name().to_string(),
                            duration: stage_start.elapsed(),
                        });
                    }
                }
                Ok(StageStatus::Halt(halted)) => {
                    outcome = halted;
                    break;
                }
                Err(err) => {
                    outcome = PipelineOutcome::failure(stage.name(), format!("{:#}", err));
                    break;
                }
            }
        }

        info!(
            dir = %dir.display(),
            outcome = %outcome,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Directory pipeline finished"
        );
        if let Some(handler) = &self.progress_handler {
            handler.on_progress(&ProgressEvent::PipelineComplete {
                directory: dir.display().to_string(),
                outcome: outcome.to_string(),
                total_time: start.elapsed(),
            });
        }

        outcome
    }
}
