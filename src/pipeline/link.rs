//! Merging a directory's native objects into one analyzable artifact

use super::context::DirectoryContext;
use super::outcome::{PipelineOutcome, StageStatus};
use super::stage::PipelineStage;
use crate::config::ToolchainConfig;
use crate::exec::ToolRunner;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Linker errors
#[derive(Debug, Error)]
pub enum LinkError {
    /// Nothing to link; the directory has no native-side artifact
    #[error("no native objects to link")]
    NoObjects,

    /// llvm-link exited non-zero
    #[error("llvm-link failed: {diagnostics}")]
    LinkerFailed { diagnostics: String },

    /// Filesystem or spawn trouble around the link
    #[error(transparent)]
    Io(#[from] anyhow::Error),
}

/// Merges native objects with llvm-link
///
/// With exactly one object the linker is a no-op and the object is used
/// downstream untouched. With two or more, any pre-existing file at the output
/// path is removed and the inputs are merged into a single artifact.
pub struct ArtifactLinker<'a> {
    config: &'a ToolchainConfig,
}

impl<'a> ArtifactLinker<'a> {
    pub fn new(config: &'a ToolchainConfig) -> Self {
        Self { config }
    }

    /// Links `objects` into `out_path`, returning the path to use downstream
    pub async fn link(&self, objects: &[PathBuf], out_path: &Path) -> Result<PathBuf, LinkError> {
        match objects {
            [] => Err(LinkError::NoObjects),
            [only] => {
                debug!(object = %only.display(), "Single native object, link is a no-op");
                Ok(only.clone())
            }
            _ => {
                self.merge(objects, out_path).await?;
                Ok(out_path.to_path_buf())
            }
        }
    }

    async fn merge(&self, objects: &[PathBuf], out_path: &Path) -> Result<(), LinkError> {
        let runner = ToolRunner::new(self.config.tool_timeout);

        match fs::remove_file(out_path) {
            Ok(()) => debug!(path = %out_path.display(), "Removed pre-existing link output"),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => {
                return Err(LinkError::Io(anyhow::Error::from(err).context(format!(
                    "Failed to remove pre-existing {}",
                    out_path.display()
                ))))
            }
        }

        // Disassembled inputs are kept next to the objects for inspection
        for object in objects {
            let dis = runner
                .run(&self.config.llvm_dis(), [object.as_os_str()], None, &[])
                .await
                .context("Failed to run llvm-dis")?;
            if !dis.success() {
                warn!(
                    object = %object.display(),
                    diagnostics = %dis.diagnostics(),
                    "llvm-dis failed on link input"
                );
            }
        }

        info!(
            inputs = objects.len(),
            output = %out_path.display(),
            "Linking native objects"
        );

        let mut args: Vec<&std::ffi::OsStr> = vec!["-o".as_ref(), out_path.as_os_str()];
        args.extend(objects.iter().map(|o| o.as_os_str()));

        let link = runner
            .run(&self.config.llvm_link(), args, None, &[])
            .await
            .context("Failed to run llvm-link")?;

        if !link.success() {
            return Err(LinkError::LinkerFailed {
                diagnostics: link.diagnostics(),
            });
        }
        Ok(())
    }
}

/// Pipeline stage wrapping [`ArtifactLinker`]
pub struct LinkStage;

#[async_trait]
impl PipelineStage for LinkStage {
    fn name(&self) -> &'static str {
        "link"
    }

    async fn execute(
        &self,
        config: &ToolchainConfig,
        ctx: &mut DirectoryContext,
    ) -> Result<StageStatus> {
        let objects: Vec<PathBuf> = ctx
            .native_objects
            .iter()
            .map(|a| a.path.clone())
            .collect();

        let linker = ArtifactLinker::new(config);
        match linker.link(&objects, &ctx.link_output_path()).await {
            Ok(linked) => {
                ctx.linked_object = Some(linked);
                Ok(StageStatus::Continue)
            }
            Err(LinkError::NoObjects) => Ok(StageStatus::Halt(PipelineOutcome::skipped(
                "no native artifact",
            ))),
            Err(LinkError::LinkerFailed { diagnostics }) => Ok(StageStatus::Halt(
                PipelineOutcome::failure(self.name(), diagnostics),
            )),
            Err(LinkError::Io(err)) => Err(err),
        }
    }
}
