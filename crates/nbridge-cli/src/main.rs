use anyhow::{Context, Result};
use clap::Parser;
use nbridge_config::BridgeConfig;
use std::path::PathBuf;

mod call;
mod logger;

/// Call an exported function of a native library.
///
/// With no arguments, loads the `native` library, calls
/// `add(i32, i32) -> i32` with 20 and 40, and prints the result.
///
/// EXAMPLES:
///     nbridge                         Run the default call
///     nbridge -L ./target/native      Look in ./target/native first
///     nbridge -c nbridge.toml         Describe the call in a file
///     nbridge -vv                     Show resolution details
#[derive(Parser)]
#[command(name = "nbridge")]
#[command(version)]
struct Cli {
    /// Directory searched for the library before the defaults (repeatable)
    #[arg(long = "search-path", short = 'L', value_name = "DIR")]
    search_paths: Vec<PathBuf>,

    /// Path to an nbridge.toml call description
    #[arg(long, short = 'c', value_name = "FILE")]
    config: Option<PathBuf>,

    /// Raise log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(long, short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::init(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => BridgeConfig::load_from_file(path).with_context(|| {
            format!("Failed to load configuration: {}", path.display())
        })?,
        None => BridgeConfig::default(),
    };
    // Command-line paths take precedence over configured ones
    config.prepend_search_paths(cli.search_paths);

    let value = call::run(&config)?;
    println!("{}{}", config.output.label, value);
    Ok(())
}
