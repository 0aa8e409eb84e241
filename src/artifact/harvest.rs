//! Artifact harvesting from a project's build output trees

use super::{classify, Artifact, ArtifactKind};
use ignore::WalkBuilder;
use std::path::Path;
use tracing::{debug, warn};

/// Output roots cargo populates under a project directory
const OUTPUT_ROOTS: [&str; 2] = ["target/debug/deps", "target/debug/build"];

/// Harvested artifacts for one directory, split by kind
#[derive(Debug, Clone, Default)]
pub struct HarvestedArtifacts {
    pub native_objects: Vec<Artifact>,
    pub ir_modules: Vec<Artifact>,
}

impl HarvestedArtifacts {
    pub fn is_empty(&self) -> bool {
        self.native_objects.is_empty() && self.ir_modules.is_empty()
    }
}

/// Walks a project's build output and collects classified artifacts
///
/// The walk covers `target/debug/deps` and `target/debug/build`. Build trees
/// are routinely gitignored, so the walker runs with standard filters off;
/// paths are visited in sorted order so repeated harvests of the same tree
/// produce identical sequences.
pub struct HarvestStep;

impl HarvestStep {
    pub fn harvest(project_dir: &Path) -> HarvestedArtifacts {
        let mut harvested = HarvestedArtifacts::default();

        for root in OUTPUT_ROOTS {
            let root_path = project_dir.join(root);
            if !root_path.is_dir() {
                debug!(root = %root_path.display(), "Output root missing, skipping");
                continue;
            }
            Self::harvest_root(&root_path, &mut harvested);
        }

        debug!(
            dir = %project_dir.display(),
            native_objects = harvested.native_objects.len(),
            ir_modules = harvested.ir_modules.len(),
            "Harvest complete"
        );

        harvested
    }

    fn harvest_root(root: &Path, harvested: &mut HarvestedArtifacts) {
        let walker = WalkBuilder::new(root)
            .standard_filters(false)
            .sort_by_file_path(|a: &Path, b: &Path| a.cmp(b))
            .build();

        for result in walker {
            let entry = match result {
                Ok(e) => e,
                Err(err) => {
                    warn!(error = %err, "Failed to read directory entry");
                    continue;
                }
            };
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            match classify(path) {
                ArtifactKind::NativeObject => {
                    debug!(path = %path.display(), "Harvested native object");
                    harvested
                        .native_objects
                        .push(Artifact::new(path, ArtifactKind::NativeObject));
                }
                ArtifactKind::IrModule => {
                    debug!(path = %path.display(), "Harvested IR module");
                    harvested
                        .ir_modules
                        .push(Artifact::new(path, ArtifactKind::IrModule));
                }
                ArtifactKind::Irrelevant => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const BITCODE_MAGIC: [u8; 4] = [0x42, 0x43, 0xC0, 0xDE];

    fn create_project() -> TempDir {
        let dir = TempDir::new().unwrap();
        let base = dir.path();

        fs::create_dir_all(base.join("target/debug/deps")).unwrap();
        fs::create_dir_all(base.join("target/debug/build/ffi-lib/out")).unwrap();

        // Rust-side bitcode modules in deps
        fs::write(base.join("target/debug/deps/app-1a2b.bc"), BITCODE_MAGIC).unwrap();
        fs::write(base.join("target/debug/deps/dep-3c4d.bc"), BITCODE_MAGIC).unwrap();

        // C-side thin-LTO object in build
        fs::write(
            base.join("target/debug/build/ffi-lib/out/wrap.o"),
            BITCODE_MAGIC,
        )
        .unwrap();

        // Byproducts that must not be harvested
        fs::write(base.join("target/debug/deps/app-1a2b.d"), b"depinfo").unwrap();
        fs::write(
            base.join("target/debug/build/ffi-lib/out/real.o"),
            [0x7F, b'E', b'L', b'F'],
        )
        .unwrap();

        dir
    }

    #[test]
    fn test_harvest_splits_by_kind() {
        let project = create_project();
        let harvested = HarvestStep::harvest(project.path());

        assert_eq!(harvested.native_objects.len(), 1);
        assert_eq!(harvested.ir_modules.len(), 2);
        assert!(harvested
            .native_objects
            .iter()
            .all(|a| a.kind == ArtifactKind::NativeObject));
        assert!(harvested
            .ir_modules
            .iter()
            .all(|a| a.kind == ArtifactKind::IrModule));
    }

    #[test]
    fn test_harvest_is_deterministic() {
        let project = create_project();
        let first = HarvestStep::harvest(project.path());
        let second = HarvestStep::harvest(project.path());

        assert_eq!(first.ir_modules, second.ir_modules);
        assert_eq!(first.native_objects, second.native_objects);
    }

    #[test]
    fn test_harvest_sequences_are_disjoint() {
        let project = create_project();
        let harvested = HarvestStep::harvest(project.path());

        for native in &harvested.native_objects {
            assert!(!harvested.ir_modules.iter().any(|m| m.path == native.path));
        }
    }

    #[test]
    fn test_harvest_missing_roots() {
        let dir = TempDir::new().unwrap();
        let harvested = HarvestStep::harvest(dir.path());

        assert!(harvested.is_empty());
    }

    #[test]
    fn test_harvest_ignores_files_outside_roots() {
        let project = create_project();
        fs::write(project.path().join("stray.bc"), BITCODE_MAGIC).unwrap();

        let harvested = HarvestStep::harvest(project.path());
        assert!(!harvested
            .ir_modules
            .iter()
            .any(|m| m.path.ends_with("stray.bc")));
    }
}
