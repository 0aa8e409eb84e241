//! The per-directory verification pipeline
//!
//! One directory flows through a fixed chain of stages: build, harvest, link,
//! normalize, analyze. Stages communicate through a mutable [`DirectoryContext`]
//! and halt the chain by yielding a [`PipelineOutcome`]; failure is always a
//! value, never an exception crossing the directory boundary.

mod analyze;
mod build;
mod context;
mod directory;
mod link;
mod normalize;
mod outcome;
mod stage;

pub use analyze::{AnalysisStep, AnalyzeStage};
pub use build::BuildStage;
pub use context::DirectoryContext;
pub use directory::DirectoryPipeline;
pub use link::{ArtifactLinker, LinkError, LinkStage};
pub use normalize::{
    BitcodeNormalizer, NormalizationReport, NormalizeStage, PassOutcome, PASS_SEQUENCE,
};
pub use outcome::{PipelineOutcome, StageStatus};
pub use stage::{HarvestStage, PipelineStage};

/// Function manifest file written at each directory's root by the native-side analysis
pub const SOURCE_FUNCTIONS_LOG: &str = "source_functions.log";

/// Merged native object produced when a directory yields more than one
pub const LINK_OBJECT_NAME: &str = "link-obj.o";
