use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Cross-language build verification harness for C/Rust FFI allocation analysis
#[derive(Parser, Debug)]
#[command(
    name = "bridgecheck",
    about = "Cross-language build verification harness for C/Rust FFI allocation analysis",
    version,
    author,
    long_about = "bridgecheck builds mixed C/Rust project directories to LLVM bitcode, \
                  canonicalizes the bitcode through a fixed pass pipeline, and runs an \
                  external analyzer to check that functions shared across the FFI \
                  boundary handle allocation consistently. Directories are processed \
                  independently and in parallel."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(
        short = 'v',
        long,
        global = true,
        help = "Increase verbosity"
    )]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Analyze the native side of one artifact",
        long_about = "Runs the native-side half of the cross-boundary check on a single \
                      object file, persisting the shared-function manifest. A C source \
                      file is compiled to bitcode first.\n\n\
                      Examples:\n  \
                      bridgecheck native wrap.o --manifest proj/source_functions.log\n  \
                      bridgecheck native ffi.c --manifest proj/source_functions.log"
    )]
    Native(NativeArgs),

    #[command(
        about = "Analyze the Rust side of one IR module",
        long_about = "Checks one bitcode module against a previously produced \
                      shared-function manifest and captures the analyzer transcript to \
                      <module>-output.log next to the project.\n\n\
                      Examples:\n  \
                      bridgecheck module target/debug/deps/app.bc --manifest proj/source_functions.log"
    )]
    Module(ModuleArgs),

    #[command(
        about = "Run the full pipeline for one project directory",
        long_about = "Builds the directory, harvests and links its artifacts, normalizes \
                      the bitcode, and runs both analyzer sides.\n\n\
                      Examples:\n  \
                      bridgecheck dir crates-under-test/proj-a"
    )]
    Dir(DirArgs),

    #[command(
        about = "Run pipelines for every subdirectory of a root, in parallel",
        long_about = "Discovers the immediate subdirectories of ROOT and runs one full \
                      pipeline per directory on a bounded worker pool, then prints a \
                      per-directory outcome report.\n\n\
                      Examples:\n  \
                      bridgecheck scan crates-under-test\n  \
                      bridgecheck scan crates-under-test --jobs 4 --format json\n  \
                      bridgecheck scan crates-under-test --require-c-sources"
    )]
    Scan(ScanArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct NativeArgs {
    #[arg(value_name = "ARTIFACT", help = "Object file, bitcode file, or C source")]
    pub artifact: PathBuf,

    #[arg(
        short = 'm',
        long,
        value_name = "FILE",
        help = "Path where the shared-function manifest is written"
    )]
    pub manifest: PathBuf,
}

#[derive(Parser, Debug, Clone)]
pub struct ModuleArgs {
    #[arg(value_name = "ARTIFACT", help = "Bitcode module to check")]
    pub artifact: PathBuf,

    #[arg(
        short = 'm',
        long,
        value_name = "FILE",
        help = "Shared-function manifest produced by the native-side analysis"
    )]
    pub manifest: PathBuf,
}

#[derive(Parser, Debug, Clone)]
pub struct DirArgs {
    #[arg(value_name = "PATH", help = "Project directory to verify")]
    pub path: PathBuf,
}

#[derive(Parser, Debug, Clone)]
pub struct ScanArgs {
    #[arg(value_name = "ROOT", help = "Root whose subdirectories are verified")]
    pub root: PathBuf,

    #[arg(
        short = 'j',
        long,
        value_name = "N",
        help = "Worker pool size (defaults to host parallelism)"
    )]
    pub jobs: Option<usize>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,

    #[arg(
        long,
        help = "Skip directories that contain no C/C++ sources instead of building them"
    )]
    pub require_c_sources: bool,

    #[arg(
        short = 'o',
        long,
        value_name = "FILE",
        help = "Write the report to a file instead of stdout"
    )]
    pub output: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    Yaml,
    Human,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Yaml => super::output::OutputFormat::Yaml,
            OutputFormatArg::Human => super::output::OutputFormat::Human,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_args_verify() {
        // Verify that CLI structure is valid
        CliArgs::command().debug_assert();
    }

    #[test]
    fn test_default_scan_args() {
        let args = CliArgs::parse_from(["bridgecheck", "scan", "/tmp/root"]);
        match args.command {
            Commands::Scan(scan_args) => {
                assert_eq!(scan_args.root, PathBuf::from("/tmp/root"));
                assert_eq!(scan_args.format, OutputFormatArg::Human);
                assert!(scan_args.jobs.is_none());
                assert!(!scan_args.require_c_sources);
                assert!(scan_args.output.is_none());
            }
            _ => panic!("Expected Scan command"),
        }
    }

    #[test]
    fn test_scan_with_options() {
        let args = CliArgs::parse_from([
            "bridgecheck",
            "scan",
            "/tmp/root",
            "--jobs",
            "4",
            "--format",
            "json",
            "--require-c-sources",
            "-o",
            "report.json",
        ]);
        match args.command {
            Commands::Scan(scan_args) => {
                assert_eq!(scan_args.jobs, Some(4));
                assert_eq!(scan_args.format, OutputFormatArg::Json);
                assert!(scan_args.require_c_sources);
                assert_eq!(scan_args.output, Some(PathBuf::from("report.json")));
            }
            _ => panic!("Expected Scan command"),
        }
    }

    #[test]
    fn test_native_command() {
        let args = CliArgs::parse_from([
            "bridgecheck",
            "native",
            "wrap.o",
            "--manifest",
            "proj/source_functions.log",
        ]);
        match args.command {
            Commands::Native(native_args) => {
                assert_eq!(native_args.artifact, PathBuf::from("wrap.o"));
                assert_eq!(
                    native_args.manifest,
                    PathBuf::from("proj/source_functions.log")
                );
            }
            _ => panic!("Expected Native command"),
        }
    }

    #[test]
    fn test_module_command() {
        let args = CliArgs::parse_from([
            "bridgecheck",
            "module",
            "app.bc",
            "-m",
            "source_functions.log",
        ]);
        match args.command {
            Commands::Module(module_args) => {
                assert_eq!(module_args.artifact, PathBuf::from("app.bc"));
            }
            _ => panic!("Expected Module command"),
        }
    }

    #[test]
    fn test_dir_command() {
        let args = CliArgs::parse_from(["bridgecheck", "dir", "proj-a"]);
        match args.command {
            Commands::Dir(dir_args) => {
                assert_eq!(dir_args.path, PathBuf::from("proj-a"));
            }
            _ => panic!("Expected Dir command"),
        }
    }

    #[test]
    fn test_global_verbose_flag() {
        let args = CliArgs::parse_from(["bridgecheck", "-v", "dir", "proj-a"]);
        assert!(args.verbose);
        assert!(!args.quiet);
    }

    #[test]
    fn test_global_quiet_flag() {
        let args = CliArgs::parse_from(["bridgecheck", "-q", "dir", "proj-a"]);
        assert!(!args.verbose);
        assert!(args.quiet);
    }

    #[test]
    fn test_log_level_flag() {
        let args = CliArgs::parse_from(["bridgecheck", "--log-level", "debug", "dir", "p"]);
        assert_eq!(args.log_level, Some("debug".to_string()));
    }
}
