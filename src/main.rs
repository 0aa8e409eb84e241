use bridgecheck::cli::commands::{CliArgs, Commands};
use bridgecheck::cli::handlers;
use bridgecheck::util::logging::{self, LoggingConfig};
use clap::Parser;
use tracing::Level;

fn init_logging_from_args(args: &CliArgs) {
    let level = if args.quiet {
        Level::ERROR
    } else if args.verbose {
        Level::DEBUG
    } else {
        match &args.log_level {
            Some(level_str) => logging::parse_level(level_str),
            None => Level::INFO,
        }
    };
    logging::init_logging(LoggingConfig::with_level(level));
}

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    init_logging_from_args(&args);

    let exit_code = match &args.command {
        Commands::Native(native_args) => handlers::handle_native(native_args).await,
        Commands::Module(module_args) => handlers::handle_module(module_args).await,
        Commands::Dir(dir_args) => handlers::handle_dir(dir_args).await,
        Commands::Scan(scan_args) => handlers::handle_scan(scan_args).await,
    };

    std::process::exit(exit_code);
}
