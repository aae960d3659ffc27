use anyhow::{Context, Result};
use log::info;
use std::path::PathBuf;

use pixml::pixml::{BulkReader, ExtractConfig, DEFAULT_CHUNK_SIZE};
use pixml::schema::PIXML_PARQUET_EXTENSION;
use pixml::writer::{BatchWriter, CompressionType, WriterConfig};

use super::config::Config;
use super::output::StagedOutput;

const DEFAULT_COMPRESSION_LEVEL: i32 = 3;

/// Convert a PI-XML document to Parquet
pub fn run(
    input: PathBuf,
    output: Option<PathBuf>,
    config: Option<PathBuf>,
    chunk_size: Option<usize>,
    compression_level: Option<i32>,
    row_group_size: Option<usize>,
) -> Result<()> {
    if !input.exists() {
        anyhow::bail!("Input file does not exist: {}", input.display());
    }

    let file_config = Config::load(config.as_deref())?.conversion;
    let chunk_size = chunk_size
        .or(file_config.chunk_size)
        .unwrap_or(DEFAULT_CHUNK_SIZE);
    let compression_level = compression_level
        .or(file_config.compression_level)
        .unwrap_or(DEFAULT_COMPRESSION_LEVEL);
    let row_group_size = row_group_size
        .or(file_config.row_group_size)
        .unwrap_or(chunk_size);

    let output = output.unwrap_or_else(|| {
        let stem = input.file_stem().unwrap_or_default().to_string_lossy();
        input.with_file_name(format!("{}{}", stem, PIXML_PARQUET_EXTENSION))
    });

    info!("pixml Converter - PI-XML to Parquet");
    info!("===================================");
    info!("Input:  {}", input.display());
    info!("Output: {}", output.display());
    info!("Chunk size: {}", chunk_size);
    info!("Compression level: {}", compression_level);
    info!("Row group size: {}", row_group_size);

    let reader = BulkReader::with_config(input.clone(), ExtractConfig::with_chunk_size(chunk_size));
    let batches = reader
        .batches()
        .with_context(|| format!("Failed to read {}", input.display()))?;
    info!("Timezone: {}", batches.timezone());

    let writer_config = WriterConfig {
        compression: CompressionType::Zstd(compression_level),
        row_group_size,
        ..Default::default()
    };
    let staged = StagedOutput::new(&output)?;
    let mut writer = BatchWriter::new(staged.file()?, batches.timezone(), writer_config)
        .context("Failed to create Parquet writer")?
        .with_source_file(input.display().to_string());

    info!("Starting conversion...");
    writer.write_all(batches).context("Conversion failed")?;
    let stats = writer.finish().context("Failed to finalize Parquet file")?;
    staged.commit()?;

    info!("Conversion complete!");
    info!("  Series: {}", stats.series_written);
    info!("  Events: {}", stats.rows_written);
    info!("  Batches: {}", stats.batches_written);
    info!("  Row groups: {}", stats.row_groups_written);

    let file_size = std::fs::metadata(&output).map(|m| m.len()).unwrap_or(0);
    info!(
        "  Output file size: {} bytes ({:.2} MB)",
        file_size,
        file_size as f64 / 1024.0 / 1024.0
    );

    Ok(())
}
