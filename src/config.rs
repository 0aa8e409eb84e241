//! Configuration management for bridgecheck
//!
//! This module provides the immutable toolchain configuration shared by every
//! external invocation in a run. Settings load from environment variables with
//! sensible defaults and are never mutated after construction; stages receive
//! the configuration by reference.
//!
//! # Environment Variables
//!
//! - `BRIDGECHECK_LLVM_BIN`: Directory holding clang/opt/llvm-link/llvm-dis/llvm-ar
//! - `BRIDGECHECK_ANALYZER`: Path to the cross-language analyzer binary - **required**
//! - `BRIDGECHECK_CARGO`: Cargo binary to drive Rust builds - default: "cargo" from PATH
//! - `BRIDGECHECK_CFLAGS`: C compiler flags - default: "-flto=thin -fuse-ld=lld"
//! - `BRIDGECHECK_RUSTFLAGS`: Rust build flags - default requests bitcode emission
//!   and routes linking through clang/lld
//! - `BRIDGECHECK_TOOL_TIMEOUT`: Per-invocation timeout in seconds - default: "600"
//! - `BRIDGECHECK_JOBS`: Worker pool size - default: host parallelism
//! - `BRIDGECHECK_LOG_LEVEL`: Logging level - default: "info"
//!
//! # Example
//!
//! ```no_run
//! use bridgecheck::ToolchainConfig;
//!
//! let config = ToolchainConfig::from_env();
//! config.validate().expect("Invalid configuration");
//!
//! // The same environment is handed to every cargo invocation
//! for (key, value) in config.build_env() {
//!     println!("{}={}", key, value);
//! }
//! ```

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default values for configuration
const DEFAULT_CFLAGS: &str = "-flto=thin -fuse-ld=lld";
const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 600;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Analyzer binary not specified
    #[error("Analyzer not specified. Set BRIDGECHECK_ANALYZER to the analyzer binary path")]
    MissingAnalyzer,

    /// A configured tool path does not exist
    #[error("Tool not found: {tool} at {path}")]
    ToolNotFound { tool: &'static str, path: PathBuf },

    /// Failed to parse configuration value
    #[error("Failed to parse {field}: {error}")]
    ParseError { field: String, error: String },
}

/// Immutable toolchain configuration for a whole run
///
/// Holds the paths and flags for every external tool the harness invokes. It is
/// constructed once (usually via [`ToolchainConfig::from_env`]) and passed by
/// reference into each pipeline stage; nothing mutates it afterwards.
#[derive(Debug, Clone)]
pub struct ToolchainConfig {
    /// Directory holding the LLVM tools (clang, opt, llvm-link, llvm-dis, llvm-ar)
    pub llvm_bin: PathBuf,

    /// Cross-language analyzer binary
    pub analyzer: PathBuf,

    /// Cargo binary driving Rust builds
    pub cargo: PathBuf,

    /// C compiler flags; must request thin-LTO-compatible output and the lld backend
    pub cflags: String,

    /// Rust build flags; must request bitcode emission and the matching linker
    pub rustflags: String,

    /// Timeout applied to every external invocation
    pub tool_timeout: Duration,

    /// Worker pool size override; `None` means host parallelism
    pub jobs: Option<usize>,
}

impl ToolchainConfig {
    /// Creates a configuration from environment variables with defaults
    ///
    /// Missing optional values fall back to defaults; a missing analyzer path is
    /// only reported later by [`validate`](Self::validate) so that commands which
    /// never invoke the analyzer can still construct a configuration.
    pub fn from_env() -> Self {
        let llvm_bin = env::var("BRIDGECHECK_LLVM_BIN")
            .map(PathBuf::from)
            .unwrap_or_default();

        let analyzer = env::var("BRIDGECHECK_ANALYZER")
            .map(PathBuf::from)
            .unwrap_or_default();

        let cargo = env::var("BRIDGECHECK_CARGO")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("cargo"));

        let cflags =
            env::var("BRIDGECHECK_CFLAGS").unwrap_or_else(|_| DEFAULT_CFLAGS.to_string());

        let tool_timeout_secs = env::var("BRIDGECHECK_TOOL_TIMEOUT")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TOOL_TIMEOUT_SECS);

        let jobs = env::var("BRIDGECHECK_JOBS")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|&n| n > 0);

        let mut config = Self {
            llvm_bin,
            analyzer,
            cargo,
            cflags,
            rustflags: String::new(),
            tool_timeout: Duration::from_secs(tool_timeout_secs),
            jobs,
        };

        config.rustflags = env::var("BRIDGECHECK_RUSTFLAGS")
            .unwrap_or_else(|_| config.default_rustflags());

        config
    }

    fn default_rustflags(&self) -> String {
        format!(
            "--emit=llvm-bc -Clinker={} -Clink-arg=-fuse-ld=lld",
            self.clang().display()
        )
    }

    fn llvm_tool(&self, name: &str) -> PathBuf {
        if self.llvm_bin.as_os_str().is_empty() {
            PathBuf::from(name)
        } else {
            self.llvm_bin.join(name)
        }
    }

    /// Path to the C compiler
    pub fn clang(&self) -> PathBuf {
        self.llvm_tool("clang")
    }

    /// Path to the bitcode pass driver
    pub fn opt(&self) -> PathBuf {
        self.llvm_tool("opt")
    }

    /// Path to the bitcode linker
    pub fn llvm_link(&self) -> PathBuf {
        self.llvm_tool("llvm-link")
    }

    /// Path to the bitcode disassembler
    pub fn llvm_dis(&self) -> PathBuf {
        self.llvm_tool("llvm-dis")
    }

    /// Path to the archiver
    pub fn llvm_ar(&self) -> PathBuf {
        self.llvm_tool("llvm-ar")
    }

    /// Path to lld, used as the linker backend for both build pipelines
    pub fn lld(&self) -> PathBuf {
        self.llvm_tool("lld")
    }

    /// Environment handed to every external build for this run
    ///
    /// Routes both the C and the Rust pipeline through the same clang/lld
    /// backend so that every emitted object carries bitcode the analyzer
    /// can inspect.
    pub fn build_env(&self) -> Vec<(String, String)> {
        vec![
            ("CC".to_string(), self.clang().display().to_string()),
            ("LLD".to_string(), self.lld().display().to_string()),
            ("CFLAGS".to_string(), self.cflags.clone()),
            ("RUSTFLAGS".to_string(), self.rustflags.clone()),
            ("AR".to_string(), self.llvm_ar().display().to_string()),
        ]
    }

    /// Validates the configuration
    ///
    /// Checks that the analyzer is configured and that explicitly configured
    /// tool paths exist. Tools resolved from PATH (empty `llvm_bin`) are left
    /// to fail at invocation time with a captured diagnostic.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.analyzer.as_os_str().is_empty() {
            return Err(ConfigError::MissingAnalyzer);
        }
        if !self.analyzer.exists() {
            return Err(ConfigError::ToolNotFound {
                tool: "analyzer",
                path: self.analyzer.clone(),
            });
        }
        if !self.llvm_bin.as_os_str().is_empty() {
            for (tool, path) in [
                ("clang", self.clang()),
                ("opt", self.opt()),
                ("llvm-link", self.llvm_link()),
            ] {
                if !path.exists() {
                    return Err(ConfigError::ToolNotFound { tool, path });
                }
            }
        }
        Ok(())
    }

    /// Effective worker pool size for parallel dispatch
    pub fn effective_jobs(&self) -> usize {
        self.jobs.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }

    /// Replaces the LLVM tool directory
    pub fn with_llvm_bin(mut self, llvm_bin: impl Into<PathBuf>) -> Self {
        self.llvm_bin = llvm_bin.into();
        self
    }

    /// Replaces the analyzer binary path
    pub fn with_analyzer(mut self, analyzer: impl Into<PathBuf>) -> Self {
        self.analyzer = analyzer.into();
        self
    }

    /// Replaces the cargo binary path
    pub fn with_cargo(mut self, cargo: impl Into<PathBuf>) -> Self {
        self.cargo = cargo.into();
        self
    }

    /// Replaces the per-invocation timeout
    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = timeout;
        self
    }

    /// Fixes the worker pool size
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = Some(jobs);
        self
    }
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Returns true when the path looks like a C/C++ translation unit
pub fn is_c_or_cpp_source(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()).map(|e| e.to_ascii_lowercase()),
        Some(ref ext) if ext == "c" || ext == "cc" || ext == "cpp"
    )
}
