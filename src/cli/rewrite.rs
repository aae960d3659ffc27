use anyhow::{Context, Result};
use log::info;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use pixml::model::TimezoneOffset;
use pixml::pixml::{
    BulkReader, ExtractConfig, PiXmlWriter, PiXmlWriterConfig, DEFAULT_CHUNK_SIZE, PI_VERSION,
};

use super::config::Config;
use super::output::StagedOutput;

/// Re-serialize a PI-XML document, optionally into another offset
pub fn run(
    input: PathBuf,
    output: PathBuf,
    timezone: Option<f64>,
    compact: bool,
    config: Option<PathBuf>,
    chunk_size: Option<usize>,
) -> Result<()> {
    if !input.exists() {
        anyhow::bail!("Input file does not exist: {}", input.display());
    }

    let file_config = Config::load(config.as_deref())?;
    let chunk_size = chunk_size
        .or(file_config.conversion.chunk_size)
        .unwrap_or(DEFAULT_CHUNK_SIZE);

    let reader = BulkReader::with_config(input.clone(), ExtractConfig::with_chunk_size(chunk_size));
    let batches = reader
        .batches()
        .with_context(|| format!("Failed to read {}", input.display()))?;

    let target = timezone
        .map(TimezoneOffset::from_hours)
        .unwrap_or_else(|| batches.timezone());
    let writer_config = PiXmlWriterConfig {
        pretty: !compact && file_config.export.pretty.unwrap_or(true),
        version: file_config
            .export
            .version
            .unwrap_or_else(|| PI_VERSION.to_string()),
        timezone: target,
    };

    info!("Input:  {} ({})", input.display(), batches.timezone());
    info!("Output: {} ({})", output.display(), target);

    let staged = StagedOutput::new(&output)?;
    let mut writer = PiXmlWriter::new(BufWriter::new(staged.file()?), &writer_config)
        .context("Failed to start output")?;
    writer.write_batches(batches).context("Rewrite failed")?;
    let (mut file, stats) = writer.finish().context("Failed to finalize output")?;
    file.flush()?;
    drop(file);
    staged.commit()?;

    info!("Rewrite complete: {}", stats);
    Ok(())
}
