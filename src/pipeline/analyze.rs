//! Cross-boundary analysis of the native object and the IR modules
//!
//! The analyzer runs twice per directory. The native-side call checks the C
//! half of the property and persists the function manifest the Rust-side calls
//! consume. The directory passes when the native side passes and at least one
//! IR module demonstrates the property against that manifest.

use super::context::DirectoryContext;
use super::outcome::{PipelineOutcome, StageStatus};
use super::stage::PipelineStage;
use crate::config::ToolchainConfig;
use crate::exec::ToolRunner;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Invokes the external analyzer for one side of the boundary
pub struct AnalysisStep<'a> {
    config: &'a ToolchainConfig,
}

impl<'a> AnalysisStep<'a> {
    pub fn new(config: &'a ToolchainConfig) -> Self {
        Self { config }
    }

    /// Native-side check; enumerates the shared C functions into `manifest`
    pub async fn check_native(&self, object: &Path, manifest: &Path) -> Result<bool> {
        let runner = ToolRunner::new(self.config.tool_timeout);
        let output = runner
            .run(
                &self.config.analyzer,
                [
                    object.as_os_str(),
                    "--print-c-source-functions".as_ref(),
                    manifest.as_os_str(),
                    "--alloc".as_ref(),
                ],
                None,
                &[],
            )
            .await
            .context("Failed to run analyzer on native object")?;

        if !output.success() {
            info!(
                object = %object.display(),
                diagnostics = %output.diagnostics(),
                "Native-side analysis failed"
            );
        }
        Ok(output.success())
    }

    /// Rust-side check of one IR module against the manifest
    ///
    /// The analyzer's full transcript is persisted to `log_path` for post-hoc
    /// inspection; nothing is printed. The module is disassembled afterwards,
    /// also for inspection only.
    pub async fn check_module(
        &self,
        module: &Path,
        manifest: &Path,
        log_path: &Path,
    ) -> Result<bool> {
        let runner = ToolRunner::new(self.config.tool_timeout);
        let output = runner
            .run(
                &self.config.analyzer,
                [
                    module.as_os_str(),
                    "-c-source-functions".as_ref(),
                    manifest.as_os_str(),
                ],
                None,
                &[],
            )
            .await
            .context("Failed to run analyzer on IR module")?;

        fs::write(log_path, output.transcript())
            .with_context(|| format!("Failed to write {}", log_path.display()))?;

        let dis = runner
            .run(&self.config.llvm_dis(), [module.as_os_str()], None, &[])
            .await
            .context("Failed to run llvm-dis")?;
        if !dis.success() {
            warn!(
                module = %module.display(),
                diagnostics = %dis.diagnostics(),
                "llvm-dis failed after module analysis"
            );
        }

        debug!(
            module = %module.display(),
            passed = output.success(),
            log = %log_path.display(),
            "Module analysis complete"
        );
        Ok(output.success())
    }
}

/// Pipeline stage combining both analyzer sides into the directory verdict
pub struct AnalyzeStage;

#[async_trait]
impl PipelineStage for AnalyzeStage {
    fn name(&self) -> &'static str {
        "analyze"
    }

    async fn execute(
        &self,
        config: &ToolchainConfig,
        ctx: &mut DirectoryContext,
    ) -> Result<StageStatus> {
        let step = AnalysisStep::new(config);
        let manifest = ctx.manifest_path();

        let object = ctx
            .linked_object
            .clone()
            .context("analyze stage reached without a linked object")?;

        if !step.check_native(&object, &manifest).await? {
            return Ok(StageStatus::Halt(PipelineOutcome::failure(
                self.name(),
                "native-side analysis failed",
            )));
        }

        // OR over the modules, false when there are none: a directory with no
        // Rust-side bitcode cannot demonstrate the cross-boundary property.
        let mut any_module_passed = false;
        for module in &ctx.ir_modules {
            let log_path = ctx.module_log_path(&module.path);
            let passed = step
                .check_module(&module.path, &manifest, &log_path)
                .await?;
            any_module_passed = any_module_passed || passed;
        }

        if any_module_passed {
            info!(dir = %ctx.dir.display(), "Cross-boundary property verified");
            Ok(StageStatus::Continue)
        } else {
            Ok(StageStatus::Halt(PipelineOutcome::failure(
                self.name(),
                if ctx.ir_modules.is_empty() {
                    "no IR modules to analyze".to_string()
                } else {
                    format!(
                        "none of {} IR modules satisfied the property",
                        ctx.ir_modules.len()
                    )
                },
            )))
        }
    }
}
