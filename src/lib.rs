//! bridgecheck - cross-language build verification harness
//!
//! This library drives an LLVM toolchain and an external cross-language analyzer
//! over a collection of mixed C/Rust project directories. Each directory is built
//! to LLVM bitcode, its build outputs are harvested and canonicalized through a
//! fixed optimization pipeline, and the analyzer then checks whether functions
//! shared across the C/Rust boundary satisfy an allocation-consistency property.
//!
//! # Core Concepts
//!
//! - **Artifacts**: build outputs classified as native objects (`.o` holding LLVM
//!   bitcode) or IR modules (`.bc`), by binary signature and extension together
//! - **Pipeline**: the per-directory workflow of build, harvest, link, normalize,
//!   analyze, producing one tri-state outcome
//! - **Dispatch**: bounded parallel fan-out of independent pipelines over the
//!   subdirectories of a root, with per-directory fault isolation
//!
//! # Example Usage
//!
//! ```ignore
//! use bridgecheck::config::ToolchainConfig;
//! use bridgecheck::dispatch::ParallelDispatcher;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! async fn check_all(root: &Path) -> anyhow::Result<()> {
//!     let config = ToolchainConfig::from_env();
//!     config.validate()?;
//!
//!     let dispatcher = ParallelDispatcher::new(Arc::new(config));
//!     let outcomes = dispatcher.run(root).await?;
//!
//!     for (dir, outcome) in &outcomes {
//!         println!("{}: {}", dir.display(), outcome);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Project Structure
//!
//! - [`artifact`]: artifact classification and harvesting
//! - [`pipeline`]: the per-directory stage chain and its outcome types
//! - [`dispatch`]: parallel fan-out over candidate directories

pub mod artifact;
pub mod cli;
pub mod config;
pub mod dispatch;
pub mod exec;
pub mod pipeline;
pub mod progress;
pub mod util;

pub use artifact::{Artifact, ArtifactKind};
pub use config::{ConfigError, ToolchainConfig};
pub use dispatch::ParallelDispatcher;
pub use exec::{CapturedOutput, ToolRunner};
pub use pipeline::{DirectoryPipeline, PipelineOutcome};
pub use util::{init_default, init_from_env, init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_exists() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_name_is_bridgecheck() {
        assert_eq!(NAME, "bridgecheck");
    }
}
