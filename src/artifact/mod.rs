//! Build artifact classification and harvesting
//!
//! Build trees contain far more files than the analyzer can use. A file counts
//! as an artifact only when its extension and its binary signature agree: a
//! `.o` or `.bc` name alone is not enough, because unrelated build byproducts
//! share those extensions.

mod classify;
mod harvest;

pub use classify::{classify, ArtifactKind};
pub use harvest::{HarvestStep, HarvestedArtifacts};

use std::path::PathBuf;

/// One classified build output file
///
/// The kind is fixed at classification time; normalization rewrites a module's
/// contents but never its kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    pub kind: ArtifactKind,
}

impl Artifact {
    pub fn new(path: impl Into<PathBuf>, kind: ArtifactKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}
