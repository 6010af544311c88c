//! routegen CLI - inspect and check route tables resolved from scanner manifests.

mod colors;
mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::commands::Options;

#[derive(Parser)]
#[command(name = "routegen")]
#[command(author, version, about = "Resolve handler manifests into HTTP route tables", long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, env = "ROUTEGEN_CONFIG", default_value = "routegen.toml")]
    config: PathBuf,
    /// API root directory, overriding the configuration file
    #[arg(long, global = true, env = "ROUTEGEN_API_ROOT")]
    api_root: Option<PathBuf>,
    /// Import-path prefix recorded on every route
    #[arg(long, global = true, env = "ROUTEGEN_PACKAGE_PREFIX")]
    package_prefix: Option<String>,
    /// Output directory of generated code, used to derive the package prefix
    #[arg(long, global = true, env = "ROUTEGEN_OUT", default_value = ".")]
    out: PathBuf,
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Log output format
    #[arg(long, global = true, env = "ROUTEGEN_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Display version information
    Version,
    /// Resolve a manifest and list its routes
    Routes {
        /// Path to the scanner manifest (JSON)
        manifest: PathBuf,
        /// Print the full route table as JSON
        #[arg(long)]
        json: bool,
        /// Re-resolve whenever the manifest changes
        #[arg(short, long)]
        watch: bool,
    },
    /// Report every error in a manifest; exits non-zero if there is any
    Check {
        /// Path to the scanner manifest (JSON)
        manifest: PathBuf,
    },
}

fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_format);

    let options = Options {
        config: cli.config,
        api_root: cli.api_root,
        package_prefix: cli.package_prefix,
        output: cli.out,
    };

    match cli.command {
        Some(Commands::Version) => {
            print_version();
        }
        Some(Commands::Routes {
            manifest,
            json,
            watch,
        }) => {
            let config = commands::routes::RoutesConfig {
                manifest,
                json,
                watch,
            };
            if let Err(e) = commands::routes::execute(&options, config) {
                eprintln!("{} {}", "Error:".red().bold(), e);
                std::process::exit(1);
            }
        }
        Some(Commands::Check { manifest }) => {
            if let Err(e) = commands::check::execute(&options, &manifest) {
                eprintln!("{} {}", "Error:".red().bold(), e);
                std::process::exit(1);
            }
        }
        None => {
            print_version();
            println!();
            println!("Run {} for usage information.", "routegen --help".cyan());
        }
    }
}

fn init_tracing(verbose: bool, format: LogFormat) {
    let default = if verbose { "routegen=debug" } else { "routegen=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

fn print_version() {
    println!("routegen-cli {}", env!("CARGO_PKG_VERSION"));
}
