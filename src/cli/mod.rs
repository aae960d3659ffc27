use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod config;
mod convert;
mod info;
mod output;
mod rewrite;
mod validate;


/// pixml - PI-XML time series converter
#[derive(Parser)]
#[command(name = "pixml")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a PI-XML document to Parquet
    Convert {
        /// Input PI-XML file path
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output Parquet file path (defaults to INPUT with .pixml.parquet)
        #[arg(value_name = "OUTPUT")]
        output: Option<PathBuf>,

        /// Load settings from a TOML config file
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Rows per extracted batch
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Compression level for ZSTD (1-22, default: 3)
        #[arg(short = 'c', long)]
        compression_level: Option<i32>,

        /// Rows per Parquet row group (default: the chunk size)
        #[arg(short = 'r', long)]
        row_group_size: Option<usize>,
    },

    /// Check a PI-XML document for duplicate series
    Validate {
        /// Input PI-XML file path
        #[arg(value_name = "INPUT")]
        input: PathBuf,
    },

    /// Display the series of a PI-XML document
    Info {
        /// Input PI-XML file path
        #[arg(value_name = "INPUT")]
        input: PathBuf,
    },

    /// Re-serialize a PI-XML document
    Rewrite {
        /// Input PI-XML file path
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output PI-XML file path
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        /// Offset of the output in decimal hours (default: the input's)
        #[arg(long, allow_negative_numbers = true)]
        timezone: Option<f64>,

        /// Write without indentation
        #[arg(long)]
        compact: bool,

        /// Load settings from a TOML config file
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Rows per extracted batch
        #[arg(long)]
        chunk_size: Option<usize>,
    },
}

impl Cli {
    pub fn verbosity(&self) -> u8 {
        self.verbose
    }
}

pub fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}

pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Convert {
            input,
            output,
            config,
            chunk_size,
            compression_level,
            row_group_size,
        } => convert::run(
            input,
            output,
            config,
            chunk_size,
            compression_level,
            row_group_size,
        ),
        Commands::Validate { input } => validate::run(input),
        Commands::Info { input } => info::run(input),
        Commands::Rewrite {
            input,
            output,
            timezone,
            compact,
            config,
            chunk_size,
        } => rewrite::run(input, output, timezone, compact, config, chunk_size),
    }
}
