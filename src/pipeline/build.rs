//! External build invocation for one project directory

use super::context::DirectoryContext;
use super::outcome::{PipelineOutcome, StageStatus};
use super::stage::PipelineStage;
use crate::config::ToolchainConfig;
use crate::exec::ToolRunner;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::fs;
use tracing::{debug, info};

/// Clears prior build state and runs the external build
///
/// Cleaning first makes a rerun over a previously processed directory start
/// from scratch: stale merged objects and stale target trees would otherwise
/// be harvested as if the current build produced them. Build output is
/// captured, not streamed; a failed build halts the directory with the
/// captured diagnostics and nothing downstream runs.
pub struct BuildStage;

#[async_trait]
impl PipelineStage for BuildStage {
    fn name(&self) -> &'static str {
        "build"
    }

    async fn execute(
        &self,
        config: &ToolchainConfig,
        ctx: &mut DirectoryContext,
    ) -> Result<StageStatus> {
        let runner = ToolRunner::new(config.tool_timeout);
        let env = config.build_env();

        // Stale merged object from a previous run
        let link_output = ctx.link_output_path();
        match fs::remove_file(&link_output) {
            Ok(()) => debug!(path = %link_output.display(), "Removed stale link output"),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => {
                return Err(err).with_context(|| {
                    format!("Failed to remove stale {}", link_output.display())
                })
            }
        }

        let clean = runner
            .run(&config.cargo, ["clean"], Some(&ctx.dir), &env)
            .await?;
        if !clean.success() {
            return Ok(StageStatus::Halt(PipelineOutcome::failure(
                self.name(),
                format!("cargo clean failed: {}", clean.diagnostics()),
            )));
        }

        info!(dir = %ctx.dir.display(), "Building");
        let build = runner
            .run(&config.cargo, ["build"], Some(&ctx.dir), &env)
            .await?;
        if !build.success() {
            info!(dir = %ctx.dir.display(), "Build failed");
            return Ok(StageStatus::Halt(PipelineOutcome::failure(
                self.name(),
                format!("cargo build failed: {}", build.diagnostics()),
            )));
        }

        Ok(StageStatus::Continue)
    }
}
