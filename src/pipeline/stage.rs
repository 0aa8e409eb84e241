//! The stage seam the directory pipeline is composed from

use super::context::DirectoryContext;
use super::outcome::{PipelineOutcome, StageStatus};
use crate::artifact::HarvestStep;
use crate::config::ToolchainConfig;
use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

/// One step of the per-directory workflow
///
/// A stage reads and extends the [`DirectoryContext`]. Returning
/// `StageStatus::Halt` ends the directory's run with a final outcome; an `Err`
/// is plumbing trouble (I/O, spawn failure) that the pipeline converts into a
/// `Failure` outcome for this directory only.
#[async_trait]
pub trait PipelineStage: Send + Sync {
    fn name(&self) -> &'static str;

    async fn execute(
        &self,
        config: &ToolchainConfig,
        ctx: &mut DirectoryContext,
    ) -> Result<StageStatus>;
}

/// Collects analyzable artifacts from the build output trees
pub struct HarvestStage;

#[async_trait]
impl PipelineStage for HarvestStage {
    fn name(&self) -> &'static str {
        "harvest"
    }

    async fn execute(
        &self,
        _config: &ToolchainConfig,
        ctx: &mut DirectoryContext,
    ) -> Result<StageStatus> {
        let harvested = HarvestStep::harvest(&ctx.dir);

        info!(
            dir = %ctx.dir.display(),
            native_objects = harvested.native_objects.len(),
            ir_modules = harvested.ir_modules.len(),
            "Harvested build artifacts"
        );

        ctx.native_objects = harvested.native_objects;
        ctx.ir_modules = harvested.ir_modules;

        if ctx.native_objects.is_empty() {
            // A directory that built but produced no native bitcode object has
            // nothing for the native side of the check to run against.
            return Ok(StageStatus::Halt(PipelineOutcome::skipped(
                "no native artifact",
            )));
        }

        Ok(StageStatus::Continue)
    }
}
