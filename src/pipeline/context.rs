//! Mutable state threaded through one directory's stage chain

use super::normalize::NormalizationReport;
use super::{LINK_OBJECT_NAME, SOURCE_FUNCTIONS_LOG};
use crate::artifact::Artifact;
use std::path::{Path, PathBuf};

/// Per-directory pipeline state
///
/// Owned exclusively by one pipeline run; nothing here is shared across
/// directories. Stages fill in the fields as they execute.
#[derive(Debug, Clone)]
pub struct DirectoryContext {
    /// The project directory under verification
    pub dir: PathBuf,

    /// Native objects found by the harvest stage
    pub native_objects: Vec<Artifact>,

    /// IR modules found by the harvest stage
    pub ir_modules: Vec<Artifact>,

    /// The single native object handed to the analyzer: either the sole
    /// harvested object or the merged link output
    pub linked_object: Option<PathBuf>,

    /// Per-module normalization reports
    pub normalization: Vec<NormalizationReport>,
}

impl DirectoryContext {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            native_objects: Vec::new(),
            ir_modules: Vec::new(),
            linked_object: None,
            normalization: Vec::new(),
        }
    }

    /// Where the native-side analysis persists the function manifest
    pub fn manifest_path(&self) -> PathBuf {
        self.dir.join(SOURCE_FUNCTIONS_LOG)
    }

    /// Where the linker writes the merged object
    pub fn link_output_path(&self) -> PathBuf {
        self.dir.join(LINK_OBJECT_NAME)
    }

    /// Where a module's analyzer transcript is persisted
    pub fn module_log_path(&self, module: &Path) -> PathBuf {
        let file_name = module
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "module".to_string());
        self.dir.join(format!("{}-output.log", file_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persisted_paths() {
        let ctx = DirectoryContext::new("/work/proj-a");

        assert_eq!(
            ctx.manifest_path(),
            PathBuf::from("/work/proj-a/source_functions.log")
        );
        assert_eq!(
            ctx.link_output_path(),
            PathBuf::from("/work/proj-a/link-obj.o")
        );
    }

    #[test]
    fn test_module_log_path_uses_file_name() {
        let ctx = DirectoryContext::new("/work/proj-a");
        let log = ctx.module_log_path(Path::new("/work/proj-a/target/debug/deps/app-1a2b.bc"));

        assert_eq!(
            log,
            PathBuf::from("/work/proj-a/app-1a2b.bc-output.log")
        );
    }
}
