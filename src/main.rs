//! OpenAPI annotations - command-line tool.
//!
//! Reads a manifest of annotation comments and aggregate declarations, parses
//! the comments, resolves every referenced type and prints the resulting
//! bundle.
//!
//! # Usage
//!
//! ```bash
//! openapi-annotations [OPTIONS] <MANIFEST>
//! ```
//!
//! # Examples
//!
//! ```bash
//! openapi-annotations api.yaml -o bundle.yaml
//! openapi-annotations api.yaml -f json -o bundle.json
//! openapi-annotations api.yaml -v
//! ```

use anyhow::Result;
use clap::Parser;
use log::info;
use openapi_annotations::cli;

fn main() -> Result<()> {
    // Parse once so the verbose flag can pick the log level
    let args = cli::CliArgs::parse();

    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("OpenAPI annotations starting...");

    let args = cli::parse_args_from_parsed(args)?;
    cli::run(args)?;

    info!("Bundle generation completed successfully");

    Ok(())
}
