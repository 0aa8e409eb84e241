//! Subcommand handlers
//!
//! Each handler owns one command's workflow end to end and reports its result
//! through the process exit code; diagnostics go to stderr, reports to stdout
//! (or a file).

use super::commands::{DirArgs, ModuleArgs, NativeArgs, ScanArgs};
use super::output::{OutputFormatter, ScanReport};
use crate::config::{is_c_or_cpp_source, ToolchainConfig};
use crate::dispatch::ParallelDispatcher;
use crate::exec::ToolRunner;
use crate::pipeline::{AnalysisStep, BitcodeNormalizer, DirectoryPipeline, PipelineOutcome};
use crate::progress::LoggingHandler;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

const EXIT_OK: i32 = 0;
const EXIT_CHECK_FAILED: i32 = 1;
const EXIT_ERROR: i32 = 2;

fn load_config() -> Result<ToolchainConfig> {
    let config = ToolchainConfig::from_env();
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Native-side analysis of a single artifact
pub async fn handle_native(args: &NativeArgs) -> i32 {
    match run_native(args).await {
        Ok(true) => {
            println!("{}: pass", args.artifact.display());
            EXIT_OK
        }
        Ok(false) => {
            println!("{}: fail", args.artifact.display());
            EXIT_CHECK_FAILED
        }
        Err(err) => {
            error!(error = %format!("{:#}", err), "Native analysis failed");
            eprintln!("Error: {:#}", err);
            EXIT_ERROR
        }
    }
}

async fn run_native(args: &NativeArgs) -> Result<bool> {
    let config = load_config()?;

    let artifact = if is_c_or_cpp_source(&args.artifact) {
        compile_c_source(&config, &args.artifact).await?
    } else {
        args.artifact.clone()
    };

    let report = BitcodeNormalizer::new(&config).normalize(&artifact).await?;
    if !report.all_passed() {
        info!(
            failed_passes = ?report.failed_passes(),
            "Normalization completed with failed passes"
        );
    }

    AnalysisStep::new(&config)
        .check_native(&artifact, &args.manifest)
        .await
}

/// Compiles a C translation unit to a bitcode artifact next to the source
async fn compile_c_source(config: &ToolchainConfig, source: &Path) -> Result<PathBuf> {
    let target = source.with_extension("bc");
    let runner = ToolRunner::new(config.tool_timeout);

    info!(source = %source.display(), target = %target.display(), "Compiling C source to bitcode");
    let output = runner
        .run(
            &config.clang(),
            [
                source.as_os_str(),
                "-emit-llvm".as_ref(),
                "-c".as_ref(),
                "-o".as_ref(),
                target.as_os_str(),
            ],
            None,
            &[],
        )
        .await?;

    if !output.success() {
        anyhow::bail!("clang failed: {}", output.diagnostics());
    }
    Ok(target)
}

/// Rust-side analysis of a single IR module
pub async fn handle_module(args: &ModuleArgs) -> i32 {
    match run_module(args).await {
        Ok(true) => {
            println!("{}: pass", args.artifact.display());
            EXIT_OK
        }
        Ok(false) => {
            println!("{}: fail", args.artifact.display());
            EXIT_CHECK_FAILED
        }
        Err(err) => {
            error!(error = %format!("{:#}", err), "Module analysis failed");
            eprintln!("Error: {:#}", err);
            EXIT_ERROR
        }
    }
}

async fn run_module(args: &ModuleArgs) -> Result<bool> {
    let config = load_config()?;

    let report = BitcodeNormalizer::new(&config)
        .normalize(&args.artifact)
        .await?;
    if !report.all_passed() {
        info!(
            failed_passes = ?report.failed_passes(),
            "Normalization completed with failed passes"
        );
    }

    let file_name = args
        .artifact
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "module".to_string());
    let log_path = args
        .artifact
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(format!("{}-output.log", file_name));

    AnalysisStep::new(&config)
        .check_module(&args.artifact, &args.manifest, &log_path)
        .await
}

/// Full pipeline for one directory
pub async fn handle_dir(args: &DirArgs) -> i32 {
    let config = match load_config() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            return EXIT_ERROR;
        }
    };

    let outcome = DirectoryPipeline::new(&config)
        .with_progress(LoggingHandler)
        .execute(&args.path)
        .await;

    println!("{}: {}", args.path.display(), outcome);
    if let PipelineOutcome::Failure { diagnostics, .. } = &outcome {
        eprintln!("{}", diagnostics);
    }

    if outcome.is_success() {
        EXIT_OK
    } else {
        EXIT_CHECK_FAILED
    }
}

/// Parallel pipelines over a root's subdirectories
pub async fn handle_scan(args: &ScanArgs) -> i32 {
    match run_scan(args).await {
        Ok(all_passed) => {
            if all_passed {
                EXIT_OK
            } else {
                EXIT_CHECK_FAILED
            }
        }
        Err(err) => {
            error!(error = %format!("{:#}", err), "Scan failed");
            eprintln!("Error: {:#}", err);
            EXIT_ERROR
        }
    }
}

async fn run_scan(args: &ScanArgs) -> Result<bool> {
    let mut config = load_config()?;
    if let Some(jobs) = args.jobs {
        config = config.with_jobs(jobs);
    }

    let dispatcher = ParallelDispatcher::new(Arc::new(config))
        .require_c_sources(args.require_c_sources)
        .with_progress(LoggingHandler);

    let outcomes = dispatcher.run(&args.root).await?;
    let report = ScanReport::new(&args.root, outcomes);

    let formatted = OutputFormatter::new(args.format.into()).format(&report)?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, &formatted)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            info!(path = %path.display(), "Report written");
        }
        None => print!("{}", formatted),
    }

    Ok(report.all_passed())
}
