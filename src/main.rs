//! hat-netlist: generate the Autokit HAT netlist.
//!
//! Declares the HAT's parts and nets, prints the connector definitions it
//! resolved, and writes the netlist to standard output or a file.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

use hat_netlist::config::{self, Config};
use hat_netlist::error::Result;
use hat_netlist::hat::AutokitHat;
use hat_netlist::netlist::catalog::{CONNECTOR_CATEGORY, RPI_HEADER_NAME, USB_C_RECEPTACLE_NAME};
use hat_netlist::netlist::{Catalog, OutputFormat};

/// Generate the netlist of the Autokit USB-C/GPIO HAT.
///
/// The connector definitions are printed to stderr; the netlist goes to
/// stdout unless an output file is given.
#[derive(Parser, Debug)]
#[command(name = "hat-netlist")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Write the netlist to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Netlist format (overrides the configuration file)
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Extra part catalog (JSON) merged over the built-in templates
    #[arg(long, value_name = "CATALOG_FILE")]
    catalog: Option<PathBuf>,

    /// Increase logging verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease logging verbosity (only show errors)
    #[arg(short, long)]
    quiet: bool,
}

/// Determines the log level from CLI arguments.
#[allow(clippy::match_same_arms)] // Explicit "warn" arm for clarity
fn get_log_level(verbose: u8, quiet: bool, config_level: &str) -> Level {
    if quiet {
        return Level::ERROR;
    }

    match verbose {
        0 => match config_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::WARN,
        },
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Initialises the tracing subscriber for logging.
fn init_tracing(level: Level) {
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Builds the HAT and writes its netlist.
fn run(args: &Args, cfg: &Config) -> Result<()> {
    let mut catalog = Catalog::builtin();
    if let Some(path) = args.catalog.as_ref().or(cfg.catalog_path.as_ref()) {
        let added = catalog.load_json(path)?;
        info!(path = %path.display(), templates = added, "Merged part catalog");
    }

    if !args.quiet {
        eprintln!("{}", catalog.describe(CONNECTOR_CATEGORY, RPI_HEADER_NAME)?);
        eprintln!("{}", catalog.describe(CONNECTOR_CATEGORY, USB_C_RECEPTACLE_NAME)?);
    }

    let hat = AutokitHat::build(catalog)?;
    let netlist = hat.design.generate_netlist();

    let format = args.format.unwrap_or(cfg.output.format);
    match args.output.as_ref().or(cfg.output.path.as_ref()) {
        Some(path) => netlist.save(format, path)?,
        None => netlist.write(format, io::stdout().lock())?,
    }
    Ok(())
}

/// Entry point for hat-netlist.
fn main() -> ExitCode {
    let args = Args::parse();

    // Load configuration
    let config_path = args.config.as_deref();
    let cfg = match config::load_config(config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            if config_path.is_none() {
                if let Some(default_path) = config::default_config_path() {
                    eprintln!("\nWhile reading default config: {}", default_path.display());
                }
            }
            return ExitCode::FAILURE;
        }
    };

    // Initialise logging
    let log_level = get_log_level(args.verbose, args.quiet, &cfg.logging.level);
    init_tracing(log_level);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Generating Autokit HAT netlist"
    );

    match run(&args, &cfg) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Netlist generation failed");
            ExitCode::FAILURE
        }
    }
}
