//! Command-line front end for `swagger-from-routes`.
//!
//! ```bash
//! swagger-from-routes --manifest conf/api.yaml --routes conf/routes \
//!     --models app/models --base-path /apitest -o public/swagger.yaml
//! ```
//!
//! Add `-f json` for JSON output and `-v` for debug logging.

use anyhow::Result;
use clap::Parser;
use log::info;
use swagger_from_routes::cli;

fn main() -> Result<()> {
    let args = cli::CliArgs::parse();

    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("swagger-from-routes starting...");

    let args = cli::validate_args(args)?;
    cli::run(args)?;

    info!("Swagger document generation completed successfully");

    Ok(())
}
