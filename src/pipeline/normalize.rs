//! Bitcode canonicalization through a fixed pass sequence
//!
//! The C and Rust compilers emit bitcode with different idioms: different
//! atomic usage, different exception lowering, different default optimization.
//! Running every module through the same ordered pass sequence is what makes
//! bitcode from both origins structurally comparable to the analyzer. The
//! order is load-bearing; no API accepts a caller-supplied sequence.

use super::context::DirectoryContext;
use super::outcome::StageStatus;
use super::stage::PipelineStage;
use crate::config::ToolchainConfig;
use crate::exec::ToolRunner;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// The canonicalization sequence, applied strictly in this order:
/// atomics first, then unwind edges, then stack-slot promotion, constant
/// propagation, loop canonicalization, and finally CFG cleanup.
pub const PASS_SEQUENCE: [&str; 6] = [
    "loweratomic",
    "lowerinvoke",
    "mem2reg",
    "sccp",
    "loop-simplify",
    "simplifycfg",
];

/// Result of one pass over one module
#[derive(Debug, Clone, Serialize)]
pub struct PassOutcome {
    pub pass: &'static str,
    pub success: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub diagnostics: String,
}

/// Per-module record of the full sequence
#[derive(Debug, Clone, Serialize)]
pub struct NormalizationReport {
    pub module: PathBuf,
    pub passes: Vec<PassOutcome>,
}

impl NormalizationReport {
    /// True when every pass in the sequence exited cleanly
    pub fn all_passed(&self) -> bool {
        self.passes.iter().all(|p| p.success)
    }

    /// Passes that exited non-zero
    pub fn failed_passes(&self) -> Vec<&'static str> {
        self.passes
            .iter()
            .filter(|p| !p.success)
            .map(|p| p.pass)
            .collect()
    }
}

/// Rewrites one module in place through [`PASS_SEQUENCE`]
///
/// An individual pass exiting non-zero does not abort the sequence: the module
/// is left as the previous pass wrote it and the failure is recorded in the
/// report, leaving the abort-or-continue policy to the caller.
pub struct BitcodeNormalizer<'a> {
    config: &'a ToolchainConfig,
}

impl<'a> BitcodeNormalizer<'a> {
    pub fn new(config: &'a ToolchainConfig) -> Self {
        Self { config }
    }

    pub async fn normalize(&self, module: &Path) -> Result<NormalizationReport> {
        let runner = ToolRunner::new(self.config.tool_timeout);
        let mut passes = Vec::with_capacity(PASS_SEQUENCE.len());

        for pass in PASS_SEQUENCE {
            let output = runner
                .run(
                    &self.config.opt(),
                    [
                        format!("-passes={}", pass).as_ref(),
                        module.as_os_str(),
                        "-o".as_ref(),
                        module.as_os_str(),
                    ],
                    None,
                    &[],
                )
                .await
                .with_context(|| format!("Failed to run opt -passes={}", pass))?;

            if output.success() {
                debug!(module = %module.display(), pass, "Pass applied");
            } else {
                warn!(
                    module = %module.display(),
                    pass,
                    diagnostics = %output.diagnostics(),
                    "Normalization pass failed, continuing with previous output"
                );
            }

            passes.push(PassOutcome {
                pass,
                success: output.success(),
                diagnostics: if output.success() {
                    String::new()
                } else {
                    output.diagnostics()
                },
            });
        }

        Ok(NormalizationReport {
            module: module.to_path_buf(),
            passes,
        })
    }
}

/// Pipeline stage normalizing the linked object and every IR module
pub struct NormalizeStage;

#[async_trait]
impl PipelineStage for NormalizeStage {
    fn name(&self) -> &'static str {
        "normalize"
    }

    async fn execute(
        &self,
        config: &ToolchainConfig,
        ctx: &mut DirectoryContext,
    ) -> Result<StageStatus> {
        let normalizer = BitcodeNormalizer::new(config);

        let mut targets: Vec<PathBuf> = Vec::new();
        if let Some(linked) = &ctx.linked_object {
            targets.push(linked.clone());
        }
        targets.extend(ctx.ir_modules.iter().map(|m| m.path.clone()));

        for target in targets {
            let report = normalizer.normalize(&target).await?;
            ctx.normalization.push(report);
        }

        Ok(StageStatus::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    fn fake_opt(dir: &Path, script: &str) {
        let path = dir.join("opt");
        fs::write(&path, format!("#!/bin/sh\n{}\n", script)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    fn config_with_tools(tools: &Path) -> ToolchainConfig {
        ToolchainConfig::from_env().with_llvm_bin(tools)
    }

    #[test]
    fn test_sequence_order_is_fixed() {
        assert_eq!(
            PASS_SEQUENCE,
            [
                "loweratomic",
                "lowerinvoke",
                "mem2reg",
                "sccp",
                "loop-simplify",
                "simplifycfg"
            ]
        );
    }

    #[tokio::test]
    async fn test_all_passes_recorded_in_order() {
        let tools = TempDir::new().unwrap();
        let work = TempDir::new().unwrap();
        // Log each requested pass, leave the module alone
        fake_opt(tools.path(), "echo \"$1\" >> \"$(dirname \"$2\")/passes.log\"");
        let config = config_with_tools(tools.path());

        let module = work.path().join("app.bc");
        fs::write(&module, b"bc").unwrap();

        let report = BitcodeNormalizer::new(&config)
            .normalize(&module)
            .await
            .unwrap();

        assert!(report.all_passed());
        assert_eq!(report.passes.len(), PASS_SEQUENCE.len());

        let log = fs::read_to_string(work.path().join("passes.log")).unwrap();
        let requested: Vec<&str> = log
            .lines()
            .map(|l| l.trim_start_matches("-passes="))
            .collect();
        assert_eq!(requested, PASS_SEQUENCE);
    }

    #[tokio::test]
    async fn test_pass_failure_is_tolerated() {
        let tools = TempDir::new().unwrap();
        let work = TempDir::new().unwrap();
        fake_opt(
            tools.path(),
            "case \"$1\" in *mem2reg*) echo 'pass crashed' >&2; exit 1;; esac\nexit 0",
        );
        let config = config_with_tools(tools.path());

        let module = work.path().join("app.bc");
        fs::write(&module, b"bc").unwrap();

        let report = BitcodeNormalizer::new(&config)
            .normalize(&module)
            .await
            .unwrap();

        assert!(!report.all_passed());
        assert_eq!(report.failed_passes(), vec!["mem2reg"]);
        // The failure never aborts the remainder of the sequence
        assert_eq!(report.passes.len(), PASS_SEQUENCE.len());
        let mem2reg = report.passes.iter().find(|p| p.pass == "mem2reg").unwrap();
        assert!(mem2reg.diagnostics.contains("pass crashed"));
    }

    #[tokio::test]
    async fn test_normalization_is_idempotent_at_harness_level() {
        let tools = TempDir::new().unwrap();
        let work = TempDir::new().unwrap();
        fake_opt(tools.path(), "exit 0");
        let config = config_with_tools(tools.path());

        let module = work.path().join("app.bc");
        fs::write(&module, b"canonical").unwrap();

        let normalizer = BitcodeNormalizer::new(&config);
        normalizer.normalize(&module).await.unwrap();
        let after_first = fs::read(&module).unwrap();
        normalizer.normalize(&module).await.unwrap();
        let after_second = fs::read(&module).unwrap();

        assert_eq!(after_first, after_second);
    }

    #[tokio::test]
    async fn test_stage_normalizes_linked_object_and_modules() {
        let tools = TempDir::new().unwrap();
        let work = TempDir::new().unwrap();
        fake_opt(
            tools.path(),
            "echo \"$2\" >> \"$BRIDGECHECK_OPT_LOG\"",
        );
        let config = config_with_tools(tools.path());

        let linked = work.path().join("link-obj.o");
        let module = work.path().join("app.bc");
        fs::write(&linked, b"o").unwrap();
        fs::write(&module, b"bc").unwrap();

        let log = work.path().join("opt.log");
        std::env::set_var("BRIDGECHECK_OPT_LOG", &log);

        let mut ctx = DirectoryContext::new(work.path());
        ctx.linked_object = Some(linked.clone());
        ctx.ir_modules
            .push(crate::artifact::Artifact::new(&module, crate::artifact::ArtifactKind::IrModule));

        NormalizeStage.execute(&config, &mut ctx).await.unwrap();
        std::env::remove_var("BRIDGECHECK_OPT_LOG");

        assert_eq!(ctx.normalization.len(), 2);
        let logged = fs::read_to_string(&log).unwrap();
        assert!(logged.contains("link-obj.o"));
        assert!(logged.contains("app.bc"));
    }
}
