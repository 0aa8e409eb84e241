//! Output formatting for scan reports
//!
//! Formatters for JSON, YAML, and human-readable text. The human format is a
//! per-directory outcome list with a summary line; the structured formats
//! serialize the same report for machine consumption.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::pipeline::PipelineOutcome;

/// Output format enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON format (machine-readable)
    Json,
    /// YAML format (human-friendly, version-control friendly)
    Yaml,
    /// Human-readable formatted text
    Human,
}

/// Per-run scan report: one outcome per discovered directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub root: PathBuf,
    pub outcomes: BTreeMap<String, PipelineOutcome>,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl ScanReport {
    pub fn new(root: &Path, outcomes: BTreeMap<PathBuf, PipelineOutcome>) -> Self {
        let outcomes: BTreeMap<String, PipelineOutcome> = outcomes
            .into_iter()
            .map(|(dir, outcome)| {
                let key = dir
                    .strip_prefix(root)
                    .unwrap_or(&dir)
                    .display()
                    .to_string();
                (key, outcome)
            })
            .collect();

        let passed = outcomes.values().filter(|o| o.is_success()).count();
        let skipped = outcomes.values().filter(|o| o.is_skipped()).count();
        let failed = outcomes.len() - passed - skipped;

        Self {
            root: root.to_path_buf(),
            outcomes,
            passed,
            failed,
            skipped,
        }
    }

    /// True when no directory failed (skips do not count against the run)
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

/// Output formatter for scan reports
pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a scan report according to the configured format
    pub fn format(&self, report: &ScanReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(report)
                .context("Failed to serialize scan report to JSON"),
            OutputFormat::Yaml => serde_yaml::to_string(report)
                .context("Failed to serialize scan report to YAML"),
            OutputFormat::Human => Ok(self.format_human(report)),
        }
    }

    fn format_human(&self, report: &ScanReport) -> String {
        let mut output = String::new();

        output.push_str("bridgecheck Scan Report\n");
        output.push_str(&"\u{2501}".repeat(42));
        output.push_str("\n\n");
        output.push_str(&format!("Root: {}\n\n", report.root.display()));

        for (dir, outcome) in &report.outcomes {
            let symbol = match outcome {
                PipelineOutcome::Success => "\u{2713}",
                PipelineOutcome::Failure { .. } => "\u{2717}",
                PipelineOutcome::Skipped { .. } => "-",
            };
            output.push_str(&format!("{} {}: {}\n", symbol, dir, outcome));
            if let PipelineOutcome::Failure { diagnostics, .. } = outcome {
                for line in diagnostics.lines().take(5) {
                    output.push_str(&format!("    {}\n", line));
                }
            }
        }

        output.push_str(&format!(
            "\n{} passed, {} failed, {} skipped\n",
            report.passed, report.failed, report.skipped
        ));

        output
    }
}
