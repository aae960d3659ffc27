//! # pixml
//!
//! Command-line tool for PI-XML time series.
//!
//! ## Usage
//!
//! ```bash
//! # Convert a PI-XML export to Parquet
//! pixml convert export.xml export.pixml.parquet
//!
//! # Check a document for duplicate series
//! pixml validate export.xml
//!
//! # Summarize the series of a document
//! pixml info export.xml
//!
//! # Re-serialize a document in another offset
//! pixml rewrite export.xml export_utc.xml --timezone 0
//! ```

mod cli;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli::init_logging(cli.verbosity());
    cli::dispatch(cli)
}
